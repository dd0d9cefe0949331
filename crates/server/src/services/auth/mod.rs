//! Authentication service.
//!
//! Provides registration and email/password login. Passwords are stored as
//! Argon2id PHC strings.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Deserialize;
use tracing::{info, instrument};

use stockpile_core::{Email, UserId, Username};

use crate::db::{RecordStore, RepositoryError};
use crate::models::{NewUser, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// JSON body for `POST /auth/register`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    pub email: Option<String>,
    pub user_name: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// JSON body for `POST /auth/login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginPayload {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Authentication service.
///
/// Handles user registration and password login.
pub struct AuthService<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// Register a new user.
    ///
    /// Email is checked for uniqueness before user name, so a request that
    /// collides on both reports the email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` if email, user name or password is absent.
    /// Returns `AuthError::InvalidEmail` / `AuthError::InvalidUsername` on bad formats.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::EmailTaken` / `AuthError::UsernameTaken` on collisions.
    #[instrument(skip(self, payload))]
    pub async fn register(&self, payload: RegisterPayload) -> Result<User, AuthError> {
        let email = Email::parse(&required(payload.email, "email")?)?;
        let user_name = Username::parse(&required(payload.user_name, "userName")?)?;
        let password = required(payload.password, "password")?;
        validate_password(&password)?;

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }
        if self.store.find_user_by_username(&user_name).await?.is_some() {
            return Err(AuthError::UsernameTaken);
        }

        let password_hash = hash_password(&password)?;

        let user = self
            .store
            .insert_user(&NewUser {
                email,
                user_name,
                first_name: optional(payload.first_name),
                last_name: optional(payload.last_name),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(field) if field == "user_name" => {
                    AuthError::UsernameTaken
                }
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })?;

        info!(user = %user.id, "user registered");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, payload))]
    pub async fn login(&self, payload: LoginPayload) -> Result<User, AuthError> {
        let email = Email::parse(&required(payload.email, "email")?)?;
        let password = required(payload.password, "password")?;

        let (user, password_hash) = self
            .store
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(&password, &password_hash)?;

        Ok(user)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, AuthError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(AuthError::MissingField(field))
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn register_payload(email: &str, user_name: &str) -> RegisterPayload {
        RegisterPayload {
            email: Some(email.to_owned()),
            user_name: Some(user_name.to_owned()),
            password: Some("correct horse".to_owned()),
            first_name: Some("Ana".to_owned()),
            last_name: None,
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);

        let user = auth
            .register(register_payload("Ana@Example.com", "ana"))
            .await
            .unwrap();
        assert_eq!(user.email.as_str(), "ana@example.com");
        assert_eq!(user.first_name.as_deref(), Some("Ana"));

        let logged_in = auth
            .login(LoginPayload {
                email: Some("ana@example.com".to_owned()),
                password: Some("correct horse".to_owned()),
            })
            .await
            .unwrap();
        assert_eq!(logged_in.id, user.id);

        let err = auth
            .login(LoginPayload {
                email: Some("ana@example.com".to_owned()),
                password: Some("wrong horse".to_owned()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_register_conflicts() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        auth.register(register_payload("ana@example.com", "ana"))
            .await
            .unwrap();

        let err = auth
            .register(register_payload("ana@example.com", "other"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));

        let err = auth
            .register(register_payload("bo@example.com", "ana"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UsernameTaken));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);

        let mut payload = register_payload("ana@example.com", "ana");
        payload.password = Some("short".to_owned());
        assert!(matches!(
            auth.register(payload).await,
            Err(AuthError::WeakPassword(_))
        ));

        let mut payload = register_payload("ana@example.com", "ana");
        payload.user_name = None;
        assert!(matches!(
            auth.register(payload).await,
            Err(AuthError::MissingField("userName"))
        ));

        assert!(matches!(
            auth.register(register_payload("not-an-email", "ana")).await,
            Err(AuthError::InvalidEmail(_))
        ));
    }
}
