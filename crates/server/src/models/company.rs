//! Company domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockpile_core::{CompanyId, ProductId};

use super::{ValidationError, non_empty_text, required_text};

/// A stored company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    /// Unique company ID.
    pub id: CompanyId,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Back-reference list: IDs of products whose `company` points here,
    /// in the order they were attached.
    pub products: Vec<ProductId>,
    /// When the company was created.
    pub created_at: DateTime<Utc>,
    /// When the company was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Validated input for inserting a company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCompany {
    pub name: String,
    pub description: Option<String>,
}

/// Validated partial update for a company.
///
/// The back-reference list is deliberately absent: only the integrity
/// maintainer writes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// JSON body for `POST /companies` and `PATCH /companies/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyPayload {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl CompanyPayload {
    /// Validate a create request.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the name is missing or empty.
    pub fn into_new_company(self) -> Result<NewCompany, ValidationError> {
        Ok(NewCompany {
            name: required_text(self.name, "name")?,
            description: normalize_description(self.description),
        })
    }

    /// Validate an update request.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if a present name is empty.
    pub fn into_changes(self) -> Result<CompanyChanges, ValidationError> {
        Ok(CompanyChanges {
            name: self.name.map(|v| non_empty_text(v, "name")).transpose()?,
            description: normalize_description(self.description),
        })
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_owned())
        .filter(|d| !d.is_empty())
}
