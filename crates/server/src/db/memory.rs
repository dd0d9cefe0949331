//! In-process [`RecordStore`] for tests and local experiments.
//!
//! Enforces the same constraints as the `PostgreSQL` schema: products must
//! reference an existing company, a referenced company cannot be deleted,
//! and user email and user name are unique. Individual operations can be
//! made to fail with [`MemoryStore::fail_on`] to exercise partial-failure
//! paths.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use stockpile_core::{CompanyId, Email, ProductId, UserId, Username};

use super::{RecordStore, RepositoryError};
use crate::models::{
    Company, CompanyChanges, NewCompany, NewProduct, NewUser, Product, ProductChanges,
    ProductFilter, User,
};

/// A store operation that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Ping,
    InsertProduct,
    ListProducts,
    UpdateProduct,
    DeleteProduct,
    PushProductRef,
    PullProductRef,
    InsertCompany,
    UpdateCompany,
    DeleteCompany,
    InsertUser,
}

/// Record store held entirely in memory.
///
/// Lock order is companies, then products, then users.
#[derive(Debug, Default)]
pub struct MemoryStore {
    companies: RwLock<BTreeMap<CompanyId, Company>>,
    products: RwLock<BTreeMap<ProductId, Product>>,
    users: RwLock<BTreeMap<UserId, (User, String)>>,
    next_company: AtomicI32,
    next_product: AtomicI32,
    next_user: AtomicI32,
    failures: Mutex<HashSet<StoreOperation>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call of `op` fail with `Unavailable`.
    pub fn fail_on(&self, op: StoreOperation) {
        self.failures
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(op);
    }

    /// Let `op` succeed again.
    pub fn clear_failure(&self, op: StoreOperation) {
        self.failures
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(&op);
    }

    fn check(&self, op: StoreOperation) -> Result<(), RepositoryError> {
        let failing = self
            .failures
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains(&op);
        if failing {
            return Err(RepositoryError::Unavailable(format!("{op:?} failed")));
        }
        Ok(())
    }

    fn next_id(counter: &AtomicI32) -> i32 {
        counter.fetch_add(1, Ordering::Relaxed) + 1
    }
}

fn missing_company(id: CompanyId) -> RepositoryError {
    RepositoryError::InvalidReference(format!("company {id} does not exist"))
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        self.check(StoreOperation::Ping)
    }

    // =========================================================================
    // Products
    // =========================================================================

    async fn insert_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        self.check(StoreOperation::InsertProduct)?;

        let companies = self.companies.read().await;
        if !companies.contains_key(&product.company) {
            return Err(missing_company(product.company));
        }

        let now = Utc::now();
        let stored = Product {
            id: ProductId::new(Self::next_id(&self.next_product)),
            name: product.name.clone(),
            category: product.category.clone(),
            quantity: product.quantity,
            unit: product.unit.clone(),
            img: product.img.clone(),
            company: product.company,
            created_at: now,
            updated_at: now,
        };

        self.products.write().await.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, RepositoryError> {
        self.check(StoreOperation::ListProducts)?;

        let needle = filter.search.as_deref().map(str::to_lowercase);
        let products = self.products.read().await;

        let mut matching: Vec<Product> = products
            .values()
            .filter(|p| filter.company.is_none_or(|c| p.company == c))
            .filter(|p| {
                needle
                    .as_deref()
                    .is_none_or(|n| p.name.to_lowercase().contains(n))
            })
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let skip = usize::try_from(filter.skip).unwrap_or(0);
        let limit = filter
            .limit
            .and_then(|l| usize::try_from(l).ok())
            .unwrap_or(usize::MAX);

        Ok(matching.into_iter().skip(skip).take(limit).collect())
    }

    async fn count_products(&self) -> Result<i64, RepositoryError> {
        let count = self.products.read().await.len();
        i64::try_from(count).map_err(|e| RepositoryError::DataCorruption(e.to_string()))
    }

    async fn count_products_by_company(
        &self,
        company: CompanyId,
    ) -> Result<i64, RepositoryError> {
        let count = self
            .products
            .read()
            .await
            .values()
            .filter(|p| p.company == company)
            .count();
        i64::try_from(count).map_err(|e| RepositoryError::DataCorruption(e.to_string()))
    }

    async fn update_product(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Option<Product>, RepositoryError> {
        self.check(StoreOperation::UpdateProduct)?;

        let companies = self.companies.read().await;
        if let Some(company) = changes.company
            && !companies.contains_key(&company)
        {
            return Err(missing_company(company));
        }

        let mut products = self.products.write().await;
        let Some(product) = products.get_mut(&id) else {
            return Ok(None);
        };

        changes.apply_to(product);
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        self.check(StoreOperation::DeleteProduct)?;
        Ok(self.products.write().await.remove(&id).is_some())
    }

    // =========================================================================
    // Companies
    // =========================================================================

    async fn insert_company(&self, company: &NewCompany) -> Result<Company, RepositoryError> {
        self.check(StoreOperation::InsertCompany)?;

        let now = Utc::now();
        let stored = Company {
            id: CompanyId::new(Self::next_id(&self.next_company)),
            name: company.name.clone(),
            description: company.description.clone(),
            products: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.companies
            .write()
            .await
            .insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_company(&self, id: CompanyId) -> Result<Option<Company>, RepositoryError> {
        Ok(self.companies.read().await.get(&id).cloned())
    }

    async fn get_companies(&self, ids: &[CompanyId]) -> Result<Vec<Company>, RepositoryError> {
        let companies = self.companies.read().await;
        Ok(ids.iter().filter_map(|id| companies.get(id).cloned()).collect())
    }

    async fn list_companies(&self) -> Result<Vec<Company>, RepositoryError> {
        let mut all: Vec<Company> = self.companies.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn update_company(
        &self,
        id: CompanyId,
        changes: &CompanyChanges,
    ) -> Result<Option<Company>, RepositoryError> {
        self.check(StoreOperation::UpdateCompany)?;

        let mut companies = self.companies.write().await;
        let Some(company) = companies.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = &changes.name {
            company.name.clone_from(name);
        }
        if let Some(description) = &changes.description {
            company.description = Some(description.clone());
        }
        company.updated_at = Utc::now();
        Ok(Some(company.clone()))
    }

    async fn delete_company(&self, id: CompanyId) -> Result<bool, RepositoryError> {
        self.check(StoreOperation::DeleteCompany)?;

        let mut companies = self.companies.write().await;
        let products = self.products.read().await;
        if products.values().any(|p| p.company == id) {
            return Err(RepositoryError::Conflict("product_company_id_fkey".to_owned()));
        }

        Ok(companies.remove(&id).is_some())
    }

    async fn push_product_ref(
        &self,
        company: CompanyId,
        product: ProductId,
    ) -> Result<bool, RepositoryError> {
        self.check(StoreOperation::PushProductRef)?;

        let mut companies = self.companies.write().await;
        let Some(company) = companies.get_mut(&company) else {
            return Ok(false);
        };

        company.products.push(product);
        company.updated_at = Utc::now();
        Ok(true)
    }

    async fn pull_product_ref(
        &self,
        company: CompanyId,
        product: ProductId,
    ) -> Result<bool, RepositoryError> {
        self.check(StoreOperation::PullProductRef)?;

        let mut companies = self.companies.write().await;
        let Some(company) = companies.get_mut(&company) else {
            return Ok(false);
        };

        company.products.retain(|p| *p != product);
        company.updated_at = Utc::now();
        Ok(true)
    }

    // =========================================================================
    // Users
    // =========================================================================

    async fn insert_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        self.check(StoreOperation::InsertUser)?;

        let mut users = self.users.write().await;
        if users.values().any(|(u, _)| u.email == user.email) {
            return Err(RepositoryError::Conflict("email".to_owned()));
        }
        if users.values().any(|(u, _)| u.user_name == user.user_name) {
            return Err(RepositoryError::Conflict("user_name".to_owned()));
        }

        let now = Utc::now();
        let stored = User {
            id: UserId::new(Self::next_id(&self.next_user)),
            email: user.email.clone(),
            user_name: user.user_name.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            created_at: now,
            updated_at: now,
        };

        users.insert(stored.id, (stored.clone(), user.password_hash.clone()));
        Ok(stored)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().await.get(&id).map(|(u, _)| u.clone()))
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|(u, _)| &u.email == email)
            .map(|(u, _)| u.clone()))
    }

    async fn find_user_by_username(
        &self,
        user_name: &Username,
    ) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|(u, _)| &u.user_name == user_name)
            .map(|(u, _)| u.clone()))
    }

    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|(u, _)| &u.email == email)
            .cloned())
    }
}
