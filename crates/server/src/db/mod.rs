//! Record store for products, companies and users.
//!
//! # Database: `PostgreSQL`, schema `inventory`
//!
//! ## Tables
//!
//! - `inventory.company` - Companies, including the `product_ids` back-reference array
//! - `inventory.product` - Products, `company_id` references `inventory.company`
//! - `inventory.user_account` - Users (unique email and user name)
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! # Stores
//!
//! [`RecordStore`] is the seam the services are written against:
//! - [`PgStore`] - production store backed by the tables above
//! - [`MemoryStore`] - in-process store used by tests, with failure injection
//!
//! Every trait method is a single atomic read or write. Sequences of calls
//! (a reassignment touches two companies and a product) are not atomic.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p stockpile-cli -- migrate
//! ```

pub mod companies;
pub mod memory;
pub mod postgres;
pub mod products;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use stockpile_core::{CompanyId, Email, ProductId, UserId, Username};

use crate::models::{
    Company, CompanyChanges, NewCompany, NewProduct, NewUser, Product, ProductChanges,
    ProductFilter, User,
};

pub use companies::CompanyRepository;
pub use memory::{MemoryStore, StoreOperation};
pub use postgres::PgStore;
pub use products::ProductRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A foreign key points at a record that does not exist.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// The store could not serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence operations for the three record types.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Check that the store can serve requests.
    async fn ping(&self) -> Result<(), RepositoryError>;

    // =========================================================================
    // Products
    // =========================================================================

    /// Insert a product.
    ///
    /// Fails with `InvalidReference` if `product.company` does not exist.
    async fn insert_product(&self, product: &NewProduct) -> Result<Product, RepositoryError>;

    /// Point lookup.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Filtered scan, newest first (`created_at` then `id`, both descending).
    async fn list_products(&self, filter: &ProductFilter)
    -> Result<Vec<Product>, RepositoryError>;

    /// Total number of products, unfiltered.
    async fn count_products(&self) -> Result<i64, RepositoryError>;

    /// Number of products whose `company` is `company`.
    ///
    /// Reads the product side, not the company's back-reference list.
    async fn count_products_by_company(&self, company: CompanyId)
    -> Result<i64, RepositoryError>;

    /// Apply a partial update. Returns `None` if the product does not exist.
    async fn update_product(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Delete a product. Returns `false` if it did not exist.
    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError>;

    // =========================================================================
    // Companies
    // =========================================================================

    /// Insert a company with an empty back-reference list.
    async fn insert_company(&self, company: &NewCompany) -> Result<Company, RepositoryError>;

    /// Point lookup.
    async fn get_company(&self, id: CompanyId) -> Result<Option<Company>, RepositoryError>;

    /// Batch lookup. Missing IDs are skipped.
    async fn get_companies(&self, ids: &[CompanyId]) -> Result<Vec<Company>, RepositoryError>;

    /// All companies by name.
    async fn list_companies(&self) -> Result<Vec<Company>, RepositoryError>;

    /// Apply a partial update. Returns `None` if the company does not exist.
    async fn update_company(
        &self,
        id: CompanyId,
        changes: &CompanyChanges,
    ) -> Result<Option<Company>, RepositoryError>;

    /// Delete a company. Fails with `Conflict` while products still reference it.
    async fn delete_company(&self, id: CompanyId) -> Result<bool, RepositoryError>;

    /// Append a product ID to a company's back-reference list.
    ///
    /// Returns `false` (and changes nothing) if the company does not exist.
    async fn push_product_ref(
        &self,
        company: CompanyId,
        product: ProductId,
    ) -> Result<bool, RepositoryError>;

    /// Remove every occurrence of a product ID from a company's list.
    ///
    /// Returns `false` (and changes nothing) if the company does not exist.
    async fn pull_product_ref(
        &self,
        company: CompanyId,
        product: ProductId,
    ) -> Result<bool, RepositoryError>;

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a user. Fails with `Conflict("email")` or `Conflict("user_name")`.
    async fn insert_user(&self, user: &NewUser) -> Result<User, RepositoryError>;

    /// Point lookup.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Lookup by normalized email.
    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Lookup by user name.
    async fn find_user_by_username(
        &self,
        user_name: &Username,
    ) -> Result<Option<User>, RepositoryError>;

    /// Fetch a user together with their password hash, for login.
    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Translate constraint violations into repository errors.
///
/// Unique violations become `Conflict` carrying the constraint name and
/// foreign-key violations become `InvalidReference`.
pub(crate) fn map_constraint_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err {
        let constraint = db_err.constraint().unwrap_or("unknown").to_owned();
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(constraint);
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::InvalidReference(constraint);
        }
    }
    RepositoryError::Database(err)
}
