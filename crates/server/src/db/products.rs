//! Product repository for database operations.
//!
//! Queries are bound at runtime (`sqlx::query_as`), so the crate builds
//! without a live database.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use stockpile_core::{CompanyId, ProductId};

use super::{RepositoryError, map_constraint_error};
use crate::models::{NewProduct, Product, ProductChanges, ProductFilter};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    category: String,
    quantity: f64,
    unit: String,
    img: String,
    company_id: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            category: row.category,
            quantity: row.quantity,
            unit: row.unit,
            img: row.img,
            company: CompanyId::new(row.company_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const PRODUCT_COLUMNS: &str =
    "id, name, category, quantity, unit, img, company_id, created_at, updated_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidReference` if the company does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, input: &NewProduct) -> Result<Product, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO inventory.product (name, category, quantity, unit, img, company_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRODUCT_COLUMNS}
            "
        );

        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(&input.name)
            .bind(&input.category)
            .bind(input.quantity)
            .bind(&input.unit)
            .bind(&input.img)
            .bind(input.company)
            .fetch_one(self.pool)
            .await
            .map_err(map_constraint_error)?;

        Ok(row.into())
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM inventory.product WHERE id = $1");

        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// List products matching a filter, newest first.
    ///
    /// A `NULL` limit is `LIMIT ALL` in `PostgreSQL`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM inventory.product
            WHERE
                ($1::text IS NULL OR name ILIKE '%' || $1 || '%' ESCAPE '\')
                AND ($2::int IS NULL OR company_id = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "
        );

        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(filter.search.as_deref().map(escape_like))
            .bind(filter.company)
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Count all products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory.product")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Count the products owned by one company.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_company(&self, company: CompanyId) -> Result<i64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM inventory.product WHERE company_id = $1")
                .bind(company)
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }

    /// Apply a partial update, leaving `None` fields untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidReference` if the new company does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Option<Product>, RepositoryError> {
        let sql = format!(
            r"
            UPDATE inventory.product
            SET
                name = COALESCE($2, name),
                category = COALESCE($3, category),
                quantity = COALESCE($4, quantity),
                unit = COALESCE($5, unit),
                img = COALESCE($6, img),
                company_id = COALESCE($7, company_id),
                updated_at = now()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        );

        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .bind(changes.name.as_deref())
            .bind(changes.category.as_deref())
            .bind(changes.quantity)
            .bind(changes.unit.as_deref())
            .bind(changes.img.as_deref())
            .bind(changes.company)
            .fetch_optional(self.pool)
            .await
            .map_err(map_constraint_error)?;

        Ok(row.map(Into::into))
    }

    /// Delete a product.
    ///
    /// # Returns
    ///
    /// Returns `true` if the product was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM inventory.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Escape `LIKE` metacharacters so the search term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
