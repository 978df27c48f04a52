//! User rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::UserId;

/// Public user profile.
///
/// `email` is only populated for lookups that are allowed to see it
/// (detail reads); list views leave it empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User id.
    pub id: UserId,
    /// Unique handle.
    pub username: String,
    /// Email address, when visible.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    /// Sum of the scores of everything the user authored.
    pub karma: i64,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

/// Login projection for the external authentication layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCredentials {
    /// User id.
    pub id: UserId,
    /// Unique handle.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Opaque password hash.
    pub password_hash: String,
}

/// Input for registering a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    /// Email address (unique).
    pub email: String,
    /// Handle (unique).
    pub username: String,
    /// Already-hashed password.
    pub password_hash: String,
}

/// Input for changing profile fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    /// New email address.
    pub email: String,
    /// New handle.
    pub username: String,
}
