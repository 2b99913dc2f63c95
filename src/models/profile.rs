//! Social profiles and the follow graph between them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Who can see a profile's activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Privacy {
    Public,
    Private,
}

/// Per-user social profile, 1:1 with `users`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Profile {
    pub id: i64,
    pub user_id: i64,
    pub display_name: String,
    pub privacy: Privacy,
    pub avatar_version: i64,
    pub is_notifications_enabled: bool,
    pub fitness_experience: String,
    pub experience_points: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile joined with the owning user's public fields.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileWithUser {
    #[sqlx(flatten)]
    pub profile: Profile,
    pub first_name: String,
    pub last_name: String,
    pub country: String,
}

#[derive(Debug, Clone)]
pub struct NewProfile {
    pub user_id: i64,
    pub display_name: String,
}

/// Fields to overwrite on update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
    pub display_name: Option<String>,
    pub avatar_version: Option<i64>,
    pub is_notifications_enabled: Option<bool>,
    pub privacy: Option<Privacy>,
    pub fitness_experience: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        *self == ProfileChanges::default()
    }
}

/// Directed edge: `follower_profile_id` follows `profile_id`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileFollow {
    pub id: i64,
    pub profile_id: i64,
    pub follower_profile_id: i64,
    pub created_at: DateTime<Utc>,
}
