//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use stockpile_core::{Email, UserId, Username};

/// A registered user.
///
/// The password hash is never part of this type; it is fetched separately
/// for login verification only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Normalized, unique email address.
    pub email: Email,
    /// Unique handle.
    pub user_name: Username,
    /// Optional given name.
    pub first_name: Option<String>,
    /// Optional family name.
    pub last_name: Option<String>,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Validated input for inserting a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub user_name: Username,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Argon2 PHC string.
    pub password_hash: String,
}
