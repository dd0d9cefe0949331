//! Referential integrity between products and company back-reference lists.
//!
//! Every product write goes through [`IntegrityMaintainer`], which pairs the
//! product write with the matching `push_product_ref` / `pull_product_ref`
//! calls. The steps are separate store calls with no transaction around
//! them:
//!
//! | Operation | Steps, in order |
//! |-----------|-----------------|
//! | create    | insert product, push onto owner |
//! | reassign  | pull from old owner, push onto new owner, write product |
//! | delete    | pull from owner, delete product |
//!
//! If a later step fails, earlier steps are not undone. A failed reassign
//! leaves the product pointing at the old company while only the new company
//! lists it. Concurrent reassigns of the same product are not serialized and
//! can leave duplicate or missing list entries.

use tracing::{info, instrument, warn};

use stockpile_core::{CompanyId, ProductId};

use super::InventoryError;
use crate::db::{RecordStore, RepositoryError};
use crate::models::{NewProduct, Product, ProductChanges, ValidationError};

/// Product writes with back-reference maintenance.
pub struct IntegrityMaintainer<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> IntegrityMaintainer<'a> {
    /// Create a maintainer over a record store.
    #[must_use]
    pub const fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// Insert a product and append its ID to the owning company's list.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Validation` if the company does not exist.
    /// Returns `InventoryError::Store` if either write fails. A failure of the
    /// append leaves the product stored but unlisted.
    #[instrument(skip(self, input), fields(company = %input.company))]
    pub async fn on_create(&self, input: NewProduct) -> Result<Product, InventoryError> {
        self.require_company(input.company).await?;

        let product = self
            .store
            .insert_product(&input)
            .await
            .map_err(|e| reference_error(e, input.company))?;

        if let Err(e) = self.store.push_product_ref(product.company, product.id).await {
            warn!(
                product = %product.id,
                company = %product.company,
                error = %e,
                "product stored but not listed on its company"
            );
            return Err(e.into());
        }

        info!(product = %product.id, "product created");
        Ok(product)
    }

    /// Apply a partial update to a product.
    ///
    /// When `changes.company` names a different company than the stored one,
    /// this delegates to [`Self::on_reassign`]. A `company` equal to the stored
    /// one is a plain field update.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::ProductNotFound` if the product does not exist.
    /// Returns `InventoryError::Validation` if the new company does not exist.
    /// Returns `InventoryError::Store` if a write fails.
    #[instrument(skip(self, changes))]
    pub async fn on_update(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Product, InventoryError> {
        let product = self
            .store
            .get_product(id)
            .await?
            .ok_or(InventoryError::ProductNotFound(id))?;

        match changes.company {
            Some(new_company) if new_company != product.company => {
                self.require_company(new_company).await?;
                self.on_reassign(&product, new_company, &changes).await
            }
            _ => self.write_product(id, &changes).await,
        }
    }

    /// Move a product to another company.
    ///
    /// Pulls the ID from the old company's list, pushes it onto the new one,
    /// then writes the product with `changes` (which carries the new company
    /// and any other updated fields).
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Store` if any step fails. Steps already
    /// applied are kept.
    #[instrument(skip(self, product, changes), fields(product = %product.id, from = %product.company))]
    pub async fn on_reassign(
        &self,
        product: &Product,
        new_company: CompanyId,
        changes: &ProductChanges,
    ) -> Result<Product, InventoryError> {
        let old_company = product.company;

        self.store.pull_product_ref(old_company, product.id).await?;

        if let Err(e) = self.store.push_product_ref(new_company, product.id).await {
            warn!(
                product = %product.id,
                from = %old_company,
                to = %new_company,
                error = %e,
                "product pulled from old company but not pushed onto new one"
            );
            return Err(e.into());
        }

        let changes = ProductChanges {
            company: Some(new_company),
            ..changes.clone()
        };

        match self.write_product(product.id, &changes).await {
            Ok(updated) => {
                info!(product = %product.id, to = %new_company, "product reassigned");
                Ok(updated)
            }
            Err(e) => {
                warn!(
                    product = %product.id,
                    from = %old_company,
                    to = %new_company,
                    error = %e,
                    "company lists updated but product still points at old company"
                );
                Err(e)
            }
        }
    }

    /// Remove a product from its company's list, then delete it.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::ProductNotFound` if the product does not exist.
    /// Returns `InventoryError::Store` if either write fails. A failed delete
    /// leaves the product stored but unlisted.
    #[instrument(skip(self))]
    pub async fn on_delete(&self, id: ProductId) -> Result<(), InventoryError> {
        let product = self
            .store
            .get_product(id)
            .await?
            .ok_or(InventoryError::ProductNotFound(id))?;

        self.store.pull_product_ref(product.company, id).await?;

        match self.store.delete_product(id).await {
            Ok(true) => {
                info!(product = %id, "product deleted");
                Ok(())
            }
            Ok(false) => Err(InventoryError::ProductNotFound(id)),
            Err(e) => {
                warn!(
                    product = %id,
                    company = %product.company,
                    error = %e,
                    "product pulled from company but not deleted"
                );
                Err(e.into())
            }
        }
    }

    async fn require_company(&self, id: CompanyId) -> Result<(), InventoryError> {
        if self.store.get_company(id).await?.is_none() {
            return Err(ValidationError::UnknownCompany(id).into());
        }
        Ok(())
    }

    async fn write_product(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Product, InventoryError> {
        let company = changes.company;
        self.store
            .update_product(id, changes)
            .await
            .map_err(|e| match company {
                Some(company) => reference_error(e, company),
                None => e.into(),
            })?
            .ok_or(InventoryError::ProductNotFound(id))
    }
}

/// A foreign-key failure means the company vanished after it was checked.
fn reference_error(err: RepositoryError, company: CompanyId) -> InventoryError {
    match err {
        RepositoryError::InvalidReference(_) => ValidationError::UnknownCompany(company).into(),
        other => other.into(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, StoreOperation};
    use crate::models::{Company, DEFAULT_PRODUCT_IMAGE, NewCompany};

    async fn company(store: &MemoryStore, name: &str) -> Company {
        store
            .insert_company(&NewCompany {
                name: name.to_owned(),
                description: None,
            })
            .await
            .unwrap()
    }

    fn new_product(name: &str, company: CompanyId) -> NewProduct {
        NewProduct {
            name: name.to_owned(),
            category: "Parts".to_owned(),
            quantity: 10.0,
            unit: "pcs".to_owned(),
            img: DEFAULT_PRODUCT_IMAGE.to_owned(),
            company,
        }
    }

    fn move_to(company: CompanyId) -> ProductChanges {
        ProductChanges {
            company: Some(company),
            ..ProductChanges::default()
        }
    }

    async fn listed(store: &MemoryStore, id: CompanyId) -> Vec<ProductId> {
        store.get_company(id).await.unwrap().unwrap().products
    }

    #[tokio::test]
    async fn test_create_lists_product_exactly_once() {
        let store = MemoryStore::new();
        let acme = company(&store, "Acme").await;
        let maintainer = IntegrityMaintainer::new(&store);

        let bolt = maintainer.on_create(new_product("Bolt", acme.id)).await.unwrap();
        let nut = maintainer.on_create(new_product("Nut", acme.id)).await.unwrap();

        assert_eq!(listed(&store, acme.id).await, vec![bolt.id, nut.id]);
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_company_without_side_effects() {
        let store = MemoryStore::new();
        let maintainer = IntegrityMaintainer::new(&store);

        let err = maintainer
            .on_create(new_product("Bolt", CompanyId::new(404)))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            InventoryError::Validation(ValidationError::UnknownCompany(_))
        ));
        assert_eq!(store.count_products().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reassign_moves_back_reference() {
        let store = MemoryStore::new();
        let acme = company(&store, "Acme").await;
        let globex = company(&store, "Globex").await;
        let maintainer = IntegrityMaintainer::new(&store);

        let bolt = maintainer.on_create(new_product("Bolt", acme.id)).await.unwrap();
        let moved = maintainer
            .on_update(
                bolt.id,
                ProductChanges {
                    name: Some("Hex bolt".to_owned()),
                    ..move_to(globex.id)
                },
            )
            .await
            .unwrap();

        assert_eq!(moved.company, globex.id);
        assert_eq!(moved.name, "Hex bolt");
        assert!(listed(&store, acme.id).await.is_empty());
        assert_eq!(listed(&store, globex.id).await, vec![bolt.id]);
    }

    #[tokio::test]
    async fn test_update_to_same_company_leaves_list_alone() {
        let store = MemoryStore::new();
        let acme = company(&store, "Acme").await;
        let maintainer = IntegrityMaintainer::new(&store);

        let bolt = maintainer.on_create(new_product("Bolt", acme.id)).await.unwrap();
        store.fail_on(StoreOperation::PullProductRef);
        store.fail_on(StoreOperation::PushProductRef);

        let updated = maintainer
            .on_update(
                bolt.id,
                ProductChanges {
                    quantity: Some(3.0),
                    ..move_to(acme.id)
                },
            )
            .await
            .unwrap();

        assert!((updated.quantity - 3.0).abs() < f64::EPSILON);
        assert_eq!(listed(&store, acme.id).await, vec![bolt.id]);
    }

    #[tokio::test]
    async fn test_reassign_to_unknown_company_is_rejected_before_writes() {
        let store = MemoryStore::new();
        let acme = company(&store, "Acme").await;
        let maintainer = IntegrityMaintainer::new(&store);

        let bolt = maintainer.on_create(new_product("Bolt", acme.id)).await.unwrap();
        let err = maintainer
            .on_update(bolt.id, move_to(CompanyId::new(404)))
            .await
            .unwrap_err();

        assert!(matches!(err, InventoryError::Validation(_)));
        assert_eq!(listed(&store, acme.id).await, vec![bolt.id]);
    }

    #[tokio::test]
    async fn test_failed_product_write_keeps_company_side_changes() {
        let store = MemoryStore::new();
        let acme = company(&store, "Acme").await;
        let globex = company(&store, "Globex").await;
        let maintainer = IntegrityMaintainer::new(&store);

        let bolt = maintainer.on_create(new_product("Bolt", acme.id)).await.unwrap();
        store.fail_on(StoreOperation::UpdateProduct);

        let err = maintainer
            .on_update(bolt.id, move_to(globex.id))
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::Store(_)));

        let stored = store.get_product(bolt.id).await.unwrap().unwrap();
        assert_eq!(stored.company, acme.id);
        assert!(listed(&store, acme.id).await.is_empty());
        assert_eq!(listed(&store, globex.id).await, vec![bolt.id]);
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let store = MemoryStore::new();
        let maintainer = IntegrityMaintainer::new(&store);

        let err = maintainer
            .on_update(ProductId::new(1), ProductChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::ProductNotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_reference() {
        let store = MemoryStore::new();
        let acme = company(&store, "Acme").await;
        let maintainer = IntegrityMaintainer::new(&store);

        let bolt = maintainer.on_create(new_product("Bolt", acme.id)).await.unwrap();
        let nut = maintainer.on_create(new_product("Nut", acme.id)).await.unwrap();

        maintainer.on_delete(bolt.id).await.unwrap();

        assert!(store.get_product(bolt.id).await.unwrap().is_none());
        assert_eq!(listed(&store, acme.id).await, vec![nut.id]);

        let err = maintainer.on_delete(bolt.id).await.unwrap_err();
        assert!(matches!(err, InventoryError::ProductNotFound(_)));
    }

    #[tokio::test]
    async fn test_failed_delete_leaves_product_unlisted() {
        let store = MemoryStore::new();
        let acme = company(&store, "Acme").await;
        let maintainer = IntegrityMaintainer::new(&store);

        let bolt = maintainer.on_create(new_product("Bolt", acme.id)).await.unwrap();
        store.fail_on(StoreOperation::DeleteProduct);

        assert!(maintainer.on_delete(bolt.id).await.is_err());
        assert!(store.get_product(bolt.id).await.unwrap().is_some());
        assert!(listed(&store, acme.id).await.is_empty());
    }

    #[tokio::test]
    async fn test_company_product_lifecycle() {
        let store = MemoryStore::new();
        let maintainer = IntegrityMaintainer::new(&store);

        let c1 = company(&store, "C1").await;
        let p1 = maintainer.on_create(new_product("P1", c1.id)).await.unwrap();
        assert_eq!(listed(&store, c1.id).await, vec![p1.id]);

        let c2 = company(&store, "C2").await;
        maintainer.on_update(p1.id, move_to(c2.id)).await.unwrap();
        assert_eq!(listed(&store, c2.id).await, vec![p1.id]);
        assert!(listed(&store, c1.id).await.is_empty());

        maintainer.on_delete(p1.id).await.unwrap();
        assert!(listed(&store, c2.id).await.is_empty());
    }
}
