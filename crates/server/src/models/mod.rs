//! Domain models for the inventory server.
//!
//! Each record type has three shapes:
//! - the stored record (`Product`, `Company`, `User`)
//! - a validated input (`NewProduct`, `ProductChanges`, ...) that the
//!   record store accepts
//! - a loose request payload (`ProductPayload`, ...) deserialized from JSON,
//!   which validates into one of the inputs

pub mod company;
pub mod product;
pub mod session;
pub mod user;

use serde::Deserialize;
use thiserror::Error;

use stockpile_core::CompanyId;

pub use company::{Company, CompanyChanges, CompanyPayload, NewCompany};
pub use product::{
    DEFAULT_PRODUCT_IMAGE, NewProduct, Product, ProductChanges, ProductFilter, ProductPayload,
    ProductWithCompany,
};
pub use session::{CurrentUser, session_keys};
pub use user::{NewUser, User};

/// A request payload failed validation.
///
/// Raised before any store call, so a rejected request has no side effects.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was absent or null.
    #[error("{0} is required")]
    Missing(&'static str),

    /// A string field was empty or whitespace.
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    /// A field could not be interpreted.
    #[error("{field} is invalid: {reason}")]
    Invalid {
        /// Payload field name.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The referenced company does not exist.
    #[error("company {0} does not exist")]
    UnknownCompany(CompanyId),
}

/// A JSON value that may arrive either typed or as a string.
///
/// Form-driven clients post `"12"` where a number is expected. Both shapes
/// are accepted and the string form is parsed during validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Loose<T> {
    /// Already the expected JSON type.
    Value(T),
    /// A string to be parsed.
    Text(String),
}

impl<T: std::str::FromStr> Loose<T> {
    /// Resolve into the typed value.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::Invalid` if the string form does not parse.
    pub fn resolve(self, field: &'static str) -> Result<T, ValidationError> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Text(text) => text.trim().parse().map_err(|_| ValidationError::Invalid {
                field,
                reason: format!("{text:?} is not a valid value"),
            }),
        }
    }
}

/// Require a non-empty string, trimming surrounding whitespace.
pub(crate) fn required_text(
    value: Option<String>,
    field: &'static str,
) -> Result<String, ValidationError> {
    let value = value.ok_or(ValidationError::Missing(field))?;
    non_empty_text(value, field)
}

/// Trim and reject empty strings.
pub(crate) fn non_empty_text(value: String, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(trimmed.to_owned())
}
