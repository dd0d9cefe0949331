//! Business logic services for the inventory server.
//!
//! # Services
//!
//! - `integrity` - Product writes that keep company back-reference lists in step
//! - `catalog` - Product queries (filtering, paging, company expansion)
//! - `companies` - Company CRUD
//! - `auth` - User registration and password login
//!
//! Services borrow a [`RecordStore`](crate::db::RecordStore) for the duration
//! of a request and hold no state of their own.

pub mod auth;
pub mod catalog;
pub mod companies;
pub mod integrity;

use thiserror::Error;

use stockpile_core::{CompanyId, ProductId};

use crate::db::RepositoryError;
use crate::models::ValidationError;

pub use catalog::{Catalog, ListProductsParams};
pub use companies::CompanyService;
pub use integrity::IntegrityMaintainer;

/// Errors raised by the product and company services.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The request was rejected before touching the store.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No product with this ID.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// No company with this ID.
    #[error("company {0} not found")]
    CompanyNotFound(CompanyId),

    /// The company still owns products and cannot be deleted.
    #[error("company {0} still owns {1} product(s)")]
    CompanyInUse(CompanyId, usize),

    /// The record store failed. Earlier writes of the same request stay applied.
    #[error("store error: {0}")]
    Store(#[from] RepositoryError),
}
