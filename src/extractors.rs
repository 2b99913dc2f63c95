// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request extractors shared by the handlers.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, FromRequest, FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::AppError;
use crate::services::ClientInfo;
use crate::AppState;

/// JSON body that has passed `validator` checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state).await?;
        inner.validate()?;

        Ok(ValidatedJson(inner))
    }
}

impl FromRequestParts<Arc<AppState>> for ClientInfo {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        Ok(ClientInfo {
            user_agent: user_agent(&parts.headers),
            ip_address: client_ip(&parts.headers, peer, state.config.trust_proxy_headers)
                .map(|ip| ip.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }
}

pub fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

/// Client address. With `trust_proxy_headers` the first `X-Forwarded-For`
/// hop, then `X-Real-IP`, win over the socket peer; otherwise only the peer
/// counts.
pub fn client_ip(
    headers: &HeaderMap,
    peer: Option<IpAddr>,
    trust_proxy_headers: bool,
) -> Option<IpAddr> {
    if !trust_proxy_headers {
        return peer;
    }

    if let Some(ip) = headers
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse().ok())
    {
        return Some(ip);
    }

    if let Some(ip) = headers
        .get("X-Real-IP")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
    {
        return Some(ip);
    }

    peer
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_forwarded_for_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Forwarded-For",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        headers.insert("X-Real-IP", HeaderValue::from_static("198.51.100.1"));
        assert_eq!(
            client_ip(&headers, None, true),
            Some("203.0.113.9".parse().unwrap())
        );
    }

    #[test]
    fn test_proxy_headers_ignored_unless_trusted() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Forwarded-For", HeaderValue::from_static("203.0.113.9"));
        headers.insert("X-Real-IP", HeaderValue::from_static("198.51.100.1"));
        let peer: IpAddr = "192.0.2.10".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(peer), false), Some(peer));
        assert_eq!(client_ip(&headers, None, false), None);
    }

    #[test]
    fn test_falls_back_to_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Forwarded-For", HeaderValue::from_static("garbage"));
        let peer: IpAddr = "127.0.0.1".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(peer), true), Some(peer));
        assert_eq!(client_ip(&HeaderMap::new(), None, true), None);
    }

    #[test]
    fn test_user_agent_default() {
        assert_eq!(user_agent(&HeaderMap::new()), "unknown");
    }
}
