//! Company CRUD.
//!
//! The back-reference list is never written here; see
//! [`IntegrityMaintainer`](super::IntegrityMaintainer).

use tracing::{info, instrument, warn};

use stockpile_core::CompanyId;

use super::InventoryError;
use crate::db::{RecordStore, RepositoryError};
use crate::models::{Company, CompanyChanges, NewCompany};

/// Company operations.
pub struct CompanyService<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> CompanyService<'a> {
    /// Create a company service over a record store.
    #[must_use]
    pub const fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// All companies, by name.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Store` if the store fails.
    pub async fn list(&self) -> Result<Vec<Company>, InventoryError> {
        Ok(self.store.list_companies().await?)
    }

    /// Get a company.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::CompanyNotFound` if it does not exist.
    pub async fn get(&self, id: CompanyId) -> Result<Company, InventoryError> {
        self.store
            .get_company(id)
            .await?
            .ok_or(InventoryError::CompanyNotFound(id))
    }

    /// Create a company with an empty product list.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Store` if the store fails.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: NewCompany) -> Result<Company, InventoryError> {
        let company = self.store.insert_company(&input).await?;
        info!(company = %company.id, "company created");
        Ok(company)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::CompanyNotFound` if it does not exist.
    #[instrument(skip(self, changes))]
    pub async fn update(
        &self,
        id: CompanyId,
        changes: CompanyChanges,
    ) -> Result<Company, InventoryError> {
        self.store
            .update_company(id, &changes)
            .await?
            .ok_or(InventoryError::CompanyNotFound(id))
    }

    /// Delete a company that owns no products.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::CompanyNotFound` if it does not exist.
    /// Returns `InventoryError::CompanyInUse` if any product still references it.
    ///
    /// Ownership is read from the products themselves. The back-reference
    /// list can hold stale IDs after a partial failure and is not consulted.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: CompanyId) -> Result<(), InventoryError> {
        let company = self.get(id).await?;
        let owned = self.store.count_products_by_company(id).await?;
        if owned > 0 {
            return Err(InventoryError::CompanyInUse(
                id,
                usize::try_from(owned).unwrap_or(usize::MAX),
            ));
        }
        if !company.products.is_empty() {
            warn!(
                company = %id,
                stale = ?company.products,
                "deleting company whose product list holds stale references"
            );
        }

        match self.store.delete_company(id).await {
            Ok(true) => {
                info!(company = %id, "company deleted");
                Ok(())
            }
            Ok(false) => Err(InventoryError::CompanyNotFound(id)),
            // A product was attached between the count and the delete.
            Err(RepositoryError::Conflict(_)) => Err(InventoryError::CompanyInUse(id, 0)),
            Err(e) => Err(e.into()),
        }
    }
}
