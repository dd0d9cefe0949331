//! Company repository for database operations.
//!
//! The back-reference list is an `INTEGER[]` column. Appends and removals
//! are single `UPDATE` statements, so each one is atomic on its own.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use stockpile_core::{CompanyId, ProductId};

use super::{RepositoryError, map_constraint_error};
use crate::models::{Company, CompanyChanges, NewCompany};

/// Internal row type for company queries.
#[derive(Debug, sqlx::FromRow)]
struct CompanyRow {
    id: i32,
    name: String,
    description: Option<String>,
    product_ids: Vec<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CompanyRow> for Company {
    fn from(row: CompanyRow) -> Self {
        Self {
            id: CompanyId::new(row.id),
            name: row.name,
            description: row.description,
            products: row.product_ids.into_iter().map(ProductId::new).collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const COMPANY_COLUMNS: &str = "id, name, description, product_ids, created_at, updated_at";

/// Repository for company database operations.
pub struct CompanyRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CompanyRepository<'a> {
    /// Create a new company repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a company.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, input: &NewCompany) -> Result<Company, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO inventory.company (name, description)
            VALUES ($1, $2)
            RETURNING {COMPANY_COLUMNS}
            "
        );

        let row = sqlx::query_as::<_, CompanyRow>(&sql)
            .bind(&input.name)
            .bind(input.description.as_deref())
            .fetch_one(self.pool)
            .await?;

        Ok(row.into())
    }

    /// Get a company by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CompanyId) -> Result<Option<Company>, RepositoryError> {
        let sql = format!("SELECT {COMPANY_COLUMNS} FROM inventory.company WHERE id = $1");

        let row = sqlx::query_as::<_, CompanyRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Get every company whose ID is in `ids`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[CompanyId]) -> Result<Vec<Company>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let raw_ids: Vec<i32> = ids.iter().map(CompanyId::as_i32).collect();
        let sql = format!("SELECT {COMPANY_COLUMNS} FROM inventory.company WHERE id = ANY($1)");

        let rows = sqlx::query_as::<_, CompanyRow>(&sql)
            .bind(&raw_ids)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List all companies ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Company>, RepositoryError> {
        let sql = format!("SELECT {COMPANY_COLUMNS} FROM inventory.company ORDER BY name ASC, id ASC");

        let rows = sqlx::query_as::<_, CompanyRow>(&sql)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        id: CompanyId,
        changes: &CompanyChanges,
    ) -> Result<Option<Company>, RepositoryError> {
        let sql = format!(
            r"
            UPDATE inventory.company
            SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = now()
            WHERE id = $1
            RETURNING {COMPANY_COLUMNS}
            "
        );

        let row = sqlx::query_as::<_, CompanyRow>(&sql)
            .bind(id)
            .bind(changes.name.as_deref())
            .bind(changes.description.as_deref())
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Delete a company.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if products still reference the company.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, id: CompanyId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM inventory.company WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| match map_constraint_error(e) {
                // RESTRICT on inventory.product.company_id
                RepositoryError::InvalidReference(constraint) => {
                    RepositoryError::Conflict(constraint)
                }
                other => other,
            })?;

        Ok(result.rows_affected() > 0)
    }

    /// Append a product ID to the back-reference list.
    ///
    /// # Returns
    ///
    /// Returns `false` if the company doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn push_product(
        &self,
        id: CompanyId,
        product: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE inventory.company
            SET product_ids = array_append(product_ids, $2), updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(product)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove every occurrence of a product ID from the back-reference list.
    ///
    /// # Returns
    ///
    /// Returns `false` if the company doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn pull_product(
        &self,
        id: CompanyId,
        product: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE inventory.company
            SET product_ids = array_remove(product_ids, $2), updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(product)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
