//! User model for storage and API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// App user stored in the `users` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// bcrypt hash, never the plaintext
    #[serde(skip_serializing)]
    pub password: String,
    pub birthday: NaiveDate,
    pub country: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Short public name, e.g. `J.Smith`.
    pub fn display_name(&self) -> String {
        format_display_name(&self.first_name, &self.last_name)
    }
}

/// Fields needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub birthday: NaiveDate,
    pub country: String,
}

/// First initial uppercased, a dot, then the last name.
pub fn format_display_name(first_name: &str, last_name: &str) -> String {
    match first_name.trim().chars().next() {
        Some(initial) => format!("{}.{}", initial.to_uppercase(), last_name.trim()),
        None => last_name.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_uses_initial() {
        assert_eq!(format_display_name("alice", "Bower"), "A.Bower");
        assert_eq!(format_display_name(" émile", "Zola"), "É.Zola");
    }

    #[test]
    fn test_display_name_without_first_name() {
        assert_eq!(format_display_name("", "Bower"), "Bower");
    }
}
