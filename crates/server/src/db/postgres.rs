//! `PostgreSQL`-backed [`RecordStore`].

use async_trait::async_trait;
use sqlx::PgPool;

use stockpile_core::{CompanyId, Email, ProductId, UserId, Username};

use super::{CompanyRepository, ProductRepository, RecordStore, RepositoryError, UserRepository};
use crate::models::{
    Company, CompanyChanges, NewCompany, NewProduct, NewUser, Product, ProductChanges,
    ProductFilter, User,
};

/// Record store over a shared connection pool.
///
/// Each call borrows the pool for one repository statement.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        ProductRepository::new(&self.pool).create(product).await
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        ProductRepository::new(&self.pool).get(id).await
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, RepositoryError> {
        ProductRepository::new(&self.pool).list(filter).await
    }

    async fn count_products(&self) -> Result<i64, RepositoryError> {
        ProductRepository::new(&self.pool).count().await
    }

    async fn count_products_by_company(
        &self,
        company: CompanyId,
    ) -> Result<i64, RepositoryError> {
        ProductRepository::new(&self.pool)
            .count_by_company(company)
            .await
    }

    async fn update_product(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Option<Product>, RepositoryError> {
        ProductRepository::new(&self.pool).update(id, changes).await
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        ProductRepository::new(&self.pool).delete(id).await
    }

    async fn insert_company(&self, company: &NewCompany) -> Result<Company, RepositoryError> {
        CompanyRepository::new(&self.pool).create(company).await
    }

    async fn get_company(&self, id: CompanyId) -> Result<Option<Company>, RepositoryError> {
        CompanyRepository::new(&self.pool).get(id).await
    }

    async fn get_companies(&self, ids: &[CompanyId]) -> Result<Vec<Company>, RepositoryError> {
        CompanyRepository::new(&self.pool).get_many(ids).await
    }

    async fn list_companies(&self) -> Result<Vec<Company>, RepositoryError> {
        CompanyRepository::new(&self.pool).list().await
    }

    async fn update_company(
        &self,
        id: CompanyId,
        changes: &CompanyChanges,
    ) -> Result<Option<Company>, RepositoryError> {
        CompanyRepository::new(&self.pool).update(id, changes).await
    }

    async fn delete_company(&self, id: CompanyId) -> Result<bool, RepositoryError> {
        CompanyRepository::new(&self.pool).delete(id).await
    }

    async fn push_product_ref(
        &self,
        company: CompanyId,
        product: ProductId,
    ) -> Result<bool, RepositoryError> {
        CompanyRepository::new(&self.pool)
            .push_product(company, product)
            .await
    }

    async fn pull_product_ref(
        &self,
        company: CompanyId,
        product: ProductId,
    ) -> Result<bool, RepositoryError> {
        CompanyRepository::new(&self.pool)
            .pull_product(company, product)
            .await
    }

    async fn insert_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        UserRepository::new(&self.pool).create(user).await
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        UserRepository::new(&self.pool).get_by_id(id).await
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        UserRepository::new(&self.pool).get_by_email(email).await
    }

    async fn find_user_by_username(
        &self,
        user_name: &Username,
    ) -> Result<Option<User>, RepositoryError> {
        UserRepository::new(&self.pool)
            .get_by_username(user_name)
            .await
    }

    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        UserRepository::new(&self.pool).get_password_hash(email).await
    }
}
