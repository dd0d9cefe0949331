//! Seed the database with sample companies and products.
//!
//! Products are created through the integrity maintainer, so every seeded
//! company's back-reference list matches its products.
//!
//! # Usage
//!
//! ```bash
//! sp-cli seed --companies 3 --products-per-company 10
//! ```

use tracing::info;

use stockpile_server::db::PgStore;
use stockpile_server::models::{DEFAULT_PRODUCT_IMAGE, NewCompany, NewProduct};
use stockpile_server::services::{CompanyService, IntegrityMaintainer};

use super::{CommandError, connect};

/// (name, category, unit) samples, cycled per company.
const SAMPLE_PRODUCTS: &[(&str, &str, &str)] = &[
    ("Flour", "Baking", "kg"),
    ("Sugar", "Baking", "kg"),
    ("Olive oil", "Pantry", "l"),
    ("Hex bolt", "Hardware", "pcs"),
    ("Wood screw", "Hardware", "pcs"),
    ("Widget", "Parts", "pcs"),
    ("Copper wire", "Electrical", "m"),
    ("Packing tape", "Shipping", "rolls"),
];

/// Totals reported after seeding.
#[derive(Debug, Default)]
pub struct SeedSummary {
    pub companies: u32,
    pub products: u32,
}

/// Insert `companies` companies with `per_company` products each.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or an insert fails.
pub async fn run(companies: u32, per_company: u32) -> Result<SeedSummary, CommandError> {
    let pool = connect().await?;
    let store = PgStore::new(pool);
    let company_service = CompanyService::new(&store);
    let maintainer = IntegrityMaintainer::new(&store);

    let mut summary = SeedSummary::default();

    for c in 1..=companies {
        let company = company_service
            .create(NewCompany {
                name: format!("Supplier {c}"),
                description: Some(format!("Seeded supplier #{c}")),
            })
            .await?;
        summary.companies += 1;

        for p in 0..per_company {
            maintainer.on_create(sample_product(company.id, p)).await?;
            summary.products += 1;
        }

        info!(company = %company.id, products = per_company, "Seeded company");
    }

    info!(
        companies = summary.companies,
        products = summary.products,
        "Seeding complete!"
    );
    Ok(summary)
}

fn sample_product(company: stockpile_core::CompanyId, index: u32) -> NewProduct {
    let slot = usize::try_from(index).unwrap_or(0) % SAMPLE_PRODUCTS.len();
    let (name, category, unit) = SAMPLE_PRODUCTS
        .get(slot)
        .copied()
        .unwrap_or(("Item", "General", "pcs"));

    NewProduct {
        name: format!("{name} {}", index + 1),
        category: category.to_owned(),
        quantity: f64::from(index % 50 + 1),
        unit: unit.to_owned(),
        img: DEFAULT_PRODUCT_IMAGE.to_owned(),
        company,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockpile_core::CompanyId;

    #[test]
    fn test_sample_product_cycles() {
        let first = sample_product(CompanyId::new(1), 0);
        let wrapped = sample_product(CompanyId::new(1), 8);

        assert_eq!(first.name, "Flour 1");
        assert_eq!(wrapped.name, "Flour 9");
        assert_eq!(wrapped.category, "Baking");
        assert!((wrapped.quantity - 9.0).abs() < f64::EPSILON);
    }
}
