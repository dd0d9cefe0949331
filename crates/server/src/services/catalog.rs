//! Product queries.
//!
//! Query parameters arrive as raw strings and are interpreted leniently:
//! numbers are read from their leading digits the way browser clients build
//! them, and unusable values fall back to "no constraint" where that is
//! unambiguous.

use std::collections::{BTreeSet, HashMap};

use serde::Deserialize;
use tracing::instrument;

use stockpile_core::{CompanyId, ProductId};

use super::InventoryError;
use crate::db::RecordStore;
use crate::models::{Company, Product, ProductFilter, ProductWithCompany, ValidationError};

/// Raw query string for `GET /products`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProductsParams {
    pub skip: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    /// Accepted and ignored. Results are always newest first.
    pub sort: Option<String>,
    pub company_id: Option<String>,
}

impl ListProductsParams {
    /// Interpret the raw parameters as a store filter.
    ///
    /// - `skip`: leading integer, `0` if there is none, negative rejected
    /// - `limit`: leading integer; missing, `0` and `-1` mean unlimited and
    ///   any other negative value is taken by magnitude
    /// - `search`: empty means no search; otherwise matched as given
    /// - `companyId`: blank means no filter, otherwise must be an integer
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::Invalid` for a negative `skip` or a
    /// non-integer `companyId`.
    pub fn into_filter(self) -> Result<ProductFilter, ValidationError> {
        let skip = self.skip.as_deref().and_then(parse_int_prefix).unwrap_or(0);
        if skip < 0 {
            return Err(ValidationError::Invalid {
                field: "skip",
                reason: "must not be negative".to_owned(),
            });
        }

        let limit = match self.limit.as_deref().and_then(parse_int_prefix) {
            None | Some(0 | -1) => None,
            Some(n) => Some(n.checked_abs().unwrap_or(i64::MAX)),
        };

        // Matched verbatim; surrounding spaces are part of the pattern.
        let search = self.search.filter(|s| !s.is_empty());

        let company = self
            .company_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<CompanyId>().map_err(|e| ValidationError::Invalid {
                    field: "companyId",
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        Ok(ProductFilter {
            search,
            company,
            skip,
            limit,
        })
    }
}

/// Read the leading integer of a string.
///
/// Leading whitespace and a single sign are allowed; parsing stops at the
/// first non-digit. Returns `None` if no digit follows. Values beyond the
/// `i64` range saturate.
#[must_use]
pub fn parse_int_prefix(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let mut value: i64 = 0;
    let mut seen = false;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        seen = true;
        let digit = i64::from(b - b'0');
        value = value
            .saturating_mul(10)
            .saturating_add(if negative { -digit } else { digit });
    }

    seen.then_some(value)
}

/// Read-only product queries with company expansion.
pub struct Catalog<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> Catalog<'a> {
    /// Create a catalog over a record store.
    #[must_use]
    pub const fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// List products matching `params`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Validation` for unusable parameters.
    /// Returns `InventoryError::Store` if the store fails.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        params: ListProductsParams,
    ) -> Result<Vec<ProductWithCompany>, InventoryError> {
        let filter = params.into_filter()?;
        let products = self.store.list_products(&filter).await?;
        self.expand(products).await
    }

    /// Total number of products, ignoring any filter.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Store` if the store fails.
    pub async fn count(&self) -> Result<i64, InventoryError> {
        Ok(self.store.count_products().await?)
    }

    /// Get one product with its company expanded.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::ProductNotFound` if the product does not exist.
    /// Returns `InventoryError::Store` if the store fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: ProductId) -> Result<ProductWithCompany, InventoryError> {
        let product = self
            .store
            .get_product(id)
            .await?
            .ok_or(InventoryError::ProductNotFound(id))?;
        let company = self.store.get_company(product.company).await?;
        Ok(ProductWithCompany::new(product, company))
    }

    /// Join products with their companies using one batch lookup.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Store` if the store fails.
    pub async fn expand(
        &self,
        products: Vec<Product>,
    ) -> Result<Vec<ProductWithCompany>, InventoryError> {
        let ids: Vec<CompanyId> = products
            .iter()
            .map(|p| p.company)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let companies: HashMap<CompanyId, Company> = self
            .store
            .get_companies(&ids)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        Ok(products
            .into_iter()
            .map(|p| {
                let company = companies.get(&p.company).cloned();
                ProductWithCompany::new(p, company)
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{DEFAULT_PRODUCT_IMAGE, NewCompany, NewProduct};
    use crate::services::IntegrityMaintainer;

    fn params(pairs: &[(&str, &str)]) -> ListProductsParams {
        let mut params = ListProductsParams::default();
        for (key, value) in pairs {
            let value = Some((*value).to_owned());
            match *key {
                "skip" => params.skip = value,
                "limit" => params.limit = value,
                "search" => params.search = value,
                "sort" => params.sort = value,
                "companyId" => params.company_id = value,
                _ => {}
            }
        }
        params
    }

    #[test]
    fn test_parse_int_prefix() {
        assert_eq!(parse_int_prefix("12"), Some(12));
        assert_eq!(parse_int_prefix("  7abc"), Some(7));
        assert_eq!(parse_int_prefix("-1"), Some(-1));
        assert_eq!(parse_int_prefix("+3"), Some(3));
        assert_eq!(parse_int_prefix("abc"), None);
        assert_eq!(parse_int_prefix(""), None);
        assert_eq!(parse_int_prefix("-"), None);
        assert_eq!(parse_int_prefix("99999999999999999999"), Some(i64::MAX));
    }

    #[test]
    fn test_filter_defaults() {
        let filter = ListProductsParams::default().into_filter().unwrap();
        assert_eq!(filter, ProductFilter::default());
    }

    #[test]
    fn test_filter_limit_sentinels() {
        for raw in ["-1", "0", "all"] {
            let filter = params(&[("limit", raw)]).into_filter().unwrap();
            assert_eq!(filter.limit, None, "limit={raw}");
        }
        assert_eq!(params(&[("limit", "5")]).into_filter().unwrap().limit, Some(5));
        assert_eq!(params(&[("limit", "-4")]).into_filter().unwrap().limit, Some(4));
    }

    #[test]
    fn test_filter_skip() {
        assert_eq!(params(&[("skip", "x")]).into_filter().unwrap().skip, 0);
        assert_eq!(params(&[("skip", "10px")]).into_filter().unwrap().skip, 10);
        assert!(params(&[("skip", "-2")]).into_filter().is_err());
    }

    #[test]
    fn test_filter_company_and_search() {
        let filter = params(&[("companyId", " 3 "), ("search", " "), ("sort", "name")])
            .into_filter()
            .unwrap();
        assert_eq!(filter.company, Some(CompanyId::new(3)));
        assert_eq!(filter.search.as_deref(), Some(" "));

        let filter = params(&[("search", "")]).into_filter().unwrap();
        assert_eq!(filter.search, None);

        let err = params(&[("companyId", "acme")]).into_filter().unwrap_err();
        assert!(matches!(err, ValidationError::Invalid { field: "companyId", .. }));
    }

    async fn seeded() -> (MemoryStore, CompanyId) {
        let store = MemoryStore::new();
        let acme = store
            .insert_company(&NewCompany {
                name: "Acme".to_owned(),
                description: None,
            })
            .await
            .unwrap();

        let maintainer = IntegrityMaintainer::new(&store);
        for name in ["Widget", "Sprocket", "Mini WIDGET", "Gear"] {
            maintainer
                .on_create(NewProduct {
                    name: name.to_owned(),
                    category: "Parts".to_owned(),
                    quantity: 1.0,
                    unit: "pcs".to_owned(),
                    img: DEFAULT_PRODUCT_IMAGE.to_owned(),
                    company: acme.id,
                })
                .await
                .unwrap();
        }
        (store, acme.id)
    }

    #[tokio::test]
    async fn test_list_search_is_case_insensitive() {
        let (store, acme) = seeded().await;
        let catalog = Catalog::new(&store);

        let found = catalog.list(params(&[("search", "wid")])).await.unwrap();
        let names: Vec<_> = found.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Mini WIDGET", "Widget"]);
        assert!(found.iter().all(|p| p.company.as_ref().map(|c| c.id) == Some(acme)));
    }

    #[tokio::test]
    async fn test_list_search_keeps_spaces() {
        let (store, _) = seeded().await;
        let catalog = Catalog::new(&store);

        let found = catalog.list(params(&[("search", " ")])).await.unwrap();
        let names: Vec<_> = found.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Mini WIDGET"]);
    }

    #[tokio::test]
    async fn test_list_unlimited_and_count_ignores_filters() {
        let (store, _) = seeded().await;
        let catalog = Catalog::new(&store);

        let all = catalog.list(params(&[("limit", "-1")])).await.unwrap();
        assert_eq!(all.len(), 4);

        let page = catalog
            .list(params(&[("skip", "1"), ("limit", "2")]))
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].name, "Mini WIDGET");

        assert_eq!(catalog.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_get_expands_company() {
        let (store, acme) = seeded().await;
        let catalog = Catalog::new(&store);

        let first = catalog.list(ListProductsParams::default()).await.unwrap();
        let product = catalog.get(first[0].id).await.unwrap();
        let company = product.company.unwrap();
        assert_eq!(company.id, acme);
        assert_eq!(company.products.len(), 4);

        let err = catalog.get(ProductId::new(999)).await.unwrap_err();
        assert!(matches!(err, InventoryError::ProductNotFound(_)));
    }
}
