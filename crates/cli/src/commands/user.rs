//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! sp-cli user create -e ana@example.com -u ana -p 'long passphrase'
//! ```
//!
//! # Environment Variables
//!
//! - `STOCKPILE_DATABASE_URL` - `PostgreSQL` connection string (or `DATABASE_URL`)

use stockpile_core::UserId;
use stockpile_server::db::PgStore;
use stockpile_server::services::auth::{AuthService, RegisterPayload};

use super::{CommandError, connect};

/// Create a user with the same validation as `POST /auth/register`.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns `CommandError::Auth` if validation fails or the email or user name
/// is taken.
pub async fn create(
    email: String,
    user_name: String,
    password: String,
    first_name: Option<String>,
    last_name: Option<String>,
) -> Result<UserId, CommandError> {
    let pool = connect().await?;
    let store = PgStore::new(pool);

    let user = AuthService::new(&store)
        .register(RegisterPayload {
            email: Some(email),
            user_name: Some(user_name),
            password: Some(password),
            first_name,
            last_name,
        })
        .await?;

    tracing::info!(user = %user.id, email = %user.email, "User created");
    Ok(user.id)
}
