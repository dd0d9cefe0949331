//! Product domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockpile_core::{CompanyId, ProductId};

use super::{Company, Loose, ValidationError, non_empty_text, required_text};

/// Image reference assigned to products created without one.
pub const DEFAULT_PRODUCT_IMAGE: &str = "https://via.placeholder.com/150";

/// A stored product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Free-form category label.
    pub category: String,
    /// Amount on hand, measured in `unit`.
    pub quantity: f64,
    /// Unit of measure (e.g. "kg", "pcs").
    pub unit: String,
    /// Image reference.
    pub img: String,
    /// Owning company.
    pub company: CompanyId,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A product with its owning company expanded in place of the bare ID.
///
/// `company` is `None` only when the reference dangles, which the write path
/// prevents but a read must still tolerate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductWithCompany {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub quantity: f64,
    pub unit: String,
    pub img: String,
    pub company: Option<Company>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductWithCompany {
    /// Join a product with its (possibly missing) company.
    #[must_use]
    pub fn new(product: Product, company: Option<Company>) -> Self {
        Self {
            id: product.id,
            name: product.name,
            category: product.category,
            quantity: product.quantity,
            unit: product.unit,
            img: product.img,
            company,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// Validated input for inserting a product.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub quantity: f64,
    pub unit: String,
    pub img: String,
    pub company: CompanyId,
}

/// Validated partial update for a product.
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub img: Option<String>,
    pub company: Option<CompanyId>,
}

impl ProductChanges {
    /// Apply these changes to a product in memory.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name.clone_from(name);
        }
        if let Some(category) = &self.category {
            product.category.clone_from(category);
        }
        if let Some(quantity) = self.quantity {
            product.quantity = quantity;
        }
        if let Some(unit) = &self.unit {
            product.unit.clone_from(unit);
        }
        if let Some(img) = &self.img {
            product.img.clone_from(img);
        }
        if let Some(company) = self.company {
            product.company = company;
        }
    }
}

/// JSON body for `POST /products` and `PATCH /products/{id}`.
///
/// Every field is optional at this layer. Explicit `null` is treated the same
/// as an absent field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    pub name: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<Loose<f64>>,
    pub unit: Option<String>,
    pub img: Option<String>,
    pub company: Option<Loose<i32>>,
}

impl ProductPayload {
    /// Validate a create request.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if a required field is missing, empty or
    /// malformed.
    pub fn into_new_product(self) -> Result<NewProduct, ValidationError> {
        let name = required_text(self.name, "name")?;
        let category = required_text(self.category, "category")?;
        let quantity = resolve_quantity(self.quantity.ok_or(ValidationError::Missing("quantity"))?)?;
        let unit = required_text(self.unit, "unit")?;
        let company = resolve_company(self.company.ok_or(ValidationError::Missing("company"))?)?;
        let img = match self.img {
            Some(img) => non_empty_text(img, "img")?,
            None => DEFAULT_PRODUCT_IMAGE.to_owned(),
        };

        Ok(NewProduct {
            name,
            category,
            quantity,
            unit,
            img,
            company,
        })
    }

    /// Validate an update request.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if a present field is empty or malformed.
    pub fn into_changes(self) -> Result<ProductChanges, ValidationError> {
        Ok(ProductChanges {
            name: self.name.map(|v| non_empty_text(v, "name")).transpose()?,
            category: self
                .category
                .map(|v| non_empty_text(v, "category"))
                .transpose()?,
            quantity: self.quantity.map(resolve_quantity).transpose()?,
            unit: self.unit.map(|v| non_empty_text(v, "unit")).transpose()?,
            img: self.img.map(|v| non_empty_text(v, "img")).transpose()?,
            company: self.company.map(resolve_company).transpose()?,
        })
    }
}

fn resolve_quantity(value: Loose<f64>) -> Result<f64, ValidationError> {
    let quantity = value.resolve("quantity")?;
    if !quantity.is_finite() {
        return Err(ValidationError::Invalid {
            field: "quantity",
            reason: "must be a finite number".to_owned(),
        });
    }
    Ok(quantity)
}

fn resolve_company(value: Loose<i32>) -> Result<CompanyId, ValidationError> {
    value.resolve("company").map(CompanyId::new)
}

/// Store-level product scan parameters.
///
/// Built by the catalog service from raw query parameters; see
/// `services::catalog::ListProductsParams`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Case-insensitive substring to match against the name.
    pub search: Option<String>,
    /// Only products owned by this company.
    pub company: Option<CompanyId>,
    /// Number of rows to skip (never negative).
    pub skip: i64,
    /// Maximum number of rows, `None` for all.
    pub limit: Option<i64>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn payload(json: &str) -> ProductPayload {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_new_product_defaults_image() {
        let new = payload(
            r#"{"name":"Widget","category":"Parts","quantity":4,"unit":"pcs","company":1}"#,
        )
        .into_new_product()
        .unwrap();

        assert_eq!(new.name, "Widget");
        assert_eq!(new.img, DEFAULT_PRODUCT_IMAGE);
        assert_eq!(new.company, CompanyId::new(1));
        assert!((new.quantity - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_new_product_accepts_string_numbers() {
        let new = payload(
            r#"{"name":"Flour","category":"Food","quantity":"2.5","unit":"kg","company":"9"}"#,
        )
        .into_new_product()
        .unwrap();

        assert_eq!(new.company, CompanyId::new(9));
        assert!((new.quantity - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_new_product_missing_fields() {
        let err = payload(r#"{"category":"Parts","quantity":1,"unit":"pcs","company":1}"#)
            .into_new_product()
            .unwrap_err();
        assert_eq!(err, ValidationError::Missing("name"));

        let err = payload(r#"{"name":"Widget","category":"Parts","quantity":1,"unit":"pcs"}"#)
            .into_new_product()
            .unwrap_err();
        assert_eq!(err, ValidationError::Missing("company"));

        let err = payload(
            r#"{"name":"Widget","category":"Parts","quantity":null,"unit":"pcs","company":1}"#,
        )
        .into_new_product()
        .unwrap_err();
        assert_eq!(err, ValidationError::Missing("quantity"));
    }

    #[test]
    fn test_new_product_rejects_non_finite_quantity() {
        let err = payload(
            r#"{"name":"Widget","category":"Parts","quantity":"NaN","unit":"pcs","company":1}"#,
        )
        .into_new_product()
        .unwrap_err();
        assert!(matches!(err, ValidationError::Invalid { field: "quantity", .. }));
    }

    #[test]
    fn test_changes_skip_null_and_absent() {
        let changes = payload(r#"{"name":null,"quantity":3}"#).into_changes().unwrap();
        assert_eq!(changes.name, None);
        assert_eq!(changes.quantity, Some(3.0));
        assert_eq!(changes.company, None);

        assert_eq!(
            payload("{}").into_changes().unwrap(),
            ProductChanges::default()
        );
    }

    #[test]
    fn test_changes_reject_empty_strings() {
        let err = payload(r#"{"unit":"  "}"#).into_changes().unwrap_err();
        assert_eq!(err, ValidationError::Empty("unit"));
    }

    #[test]
    fn test_apply_changes() {
        let now = Utc::now();
        let mut product = Product {
            id: ProductId::new(1),
            name: "Widget".to_owned(),
            category: "Parts".to_owned(),
            quantity: 1.0,
            unit: "pcs".to_owned(),
            img: DEFAULT_PRODUCT_IMAGE.to_owned(),
            company: CompanyId::new(1),
            created_at: now,
            updated_at: now,
        };

        ProductChanges {
            name: Some("Gadget".to_owned()),
            company: Some(CompanyId::new(2)),
            ..ProductChanges::default()
        }
        .apply_to(&mut product);

        assert_eq!(product.name, "Gadget");
        assert_eq!(product.company, CompanyId::new(2));
        assert_eq!(product.category, "Parts");
    }
}
