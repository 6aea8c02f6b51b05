use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, ProductId, SupplierId};

/// Reorder threshold applied when a product is created without one.
pub const DEFAULT_REORDER_LEVEL: i64 = 10;

/// Catalog product.
///
/// Prices are stored in the smallest currency unit (cents).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub sku: String,
    pub barcode: Option<String>,
    pub description: Option<String>,
    pub unit_price: u64,
    pub cost_price: Option<u64>,
    pub supplier_id: Option<SupplierId>,
    pub reorder_level: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

/// Command: create a catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub sku: String,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub unit_price: u64,
    #[serde(default)]
    pub cost_price: Option<u64>,
    #[serde(default)]
    pub supplier_id: Option<SupplierId>,
    #[serde(default)]
    pub reorder_level: Option<i64>,
}

impl NewProduct {
    pub fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name)?;
        require_text("sku", &self.sku)?;
        require_text("category", &self.category)?;
        if self.unit_price == 0 {
            return Err(DomainError::validation("unit_price must be greater than zero"));
        }
        if let Some(level) = self.reorder_level {
            ensure_reorder_level(level)?;
        }
        Ok(())
    }

    /// Validate and materialize the product.
    pub fn into_product(self, id: ProductId, now: DateTime<Utc>) -> DomainResult<Product> {
        self.validate()?;
        Ok(Product {
            id,
            name: self.name.trim().to_string(),
            category: self.category.trim().to_string(),
            sku: self.sku.trim().to_string(),
            barcode: non_empty(self.barcode),
            description: non_empty(self.description),
            unit_price: self.unit_price,
            cost_price: self.cost_price,
            supplier_id: self.supplier_id,
            reorder_level: self.reorder_level.unwrap_or(DEFAULT_REORDER_LEVEL),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Command: partial product update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub description: Option<String>,
    pub unit_price: Option<u64>,
    pub cost_price: Option<u64>,
    pub supplier_id: Option<SupplierId>,
    pub reorder_level: Option<i64>,
}

impl ProductPatch {
    /// SKU the patch would assign, if it changes it.
    pub fn new_sku<'a>(&'a self, current: &Product) -> Option<&'a str> {
        self.sku
            .as_deref()
            .map(str::trim)
            .filter(|sku| *sku != current.sku)
    }

    pub fn apply(self, product: &mut Product, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(category) = &self.category {
            require_text("category", category)?;
        }
        if let Some(sku) = &self.sku {
            require_text("sku", sku)?;
        }
        if self.unit_price == Some(0) {
            return Err(DomainError::validation("unit_price must be greater than zero"));
        }
        if let Some(level) = self.reorder_level {
            ensure_reorder_level(level)?;
        }

        if let Some(name) = self.name {
            product.name = name.trim().to_string();
        }
        if let Some(category) = self.category {
            product.category = category.trim().to_string();
        }
        if let Some(sku) = self.sku {
            product.sku = sku.trim().to_string();
        }
        if self.barcode.is_some() {
            product.barcode = non_empty(self.barcode);
        }
        if self.description.is_some() {
            product.description = non_empty(self.description);
        }
        if let Some(price) = self.unit_price {
            product.unit_price = price;
        }
        if self.cost_price.is_some() {
            product.cost_price = self.cost_price;
        }
        if self.supplier_id.is_some() {
            product.supplier_id = self.supplier_id;
        }
        if let Some(level) = self.reorder_level {
            product.reorder_level = level;
        }
        product.updated_at = now;
        Ok(())
    }
}

impl Product {
    /// A product may only leave the catalog once no warehouse holds any of it.
    pub fn ensure_deletable(&self, total_stock: i64) -> DomainResult<()> {
        if total_stock > 0 {
            return Err(DomainError::validation(format!(
                "Cannot delete product '{}' with {} units still in stock",
                self.name, total_stock
            )));
        }
        Ok(())
    }
}

fn require_text(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(())
}

fn ensure_reorder_level(level: i64) -> DomainResult<()> {
    if level < 0 {
        return Err(DomainError::validation("reorder_level cannot be negative"));
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> NewProduct {
        NewProduct {
            name: "Widget".into(),
            category: "Hardware".into(),
            sku: " WID-001 ".into(),
            barcode: Some("".into()),
            description: None,
            unit_price: 1299,
            cost_price: Some(800),
            supplier_id: None,
            reorder_level: None,
        }
    }

    #[test]
    fn create_trims_and_defaults_reorder_level() {
        let p = widget().into_product(ProductId::new(), Utc::now()).unwrap();
        assert_eq!(p.sku, "WID-001");
        assert_eq!(p.barcode, None);
        assert_eq!(p.reorder_level, DEFAULT_REORDER_LEVEL);
        assert_eq!(p.display_name(), "Widget");
    }

    #[test]
    fn create_requires_name_sku_and_category() {
        for field in ["name", "sku", "category"] {
            let mut cmd = widget();
            match field {
                "name" => cmd.name = "  ".into(),
                "sku" => cmd.sku = String::new(),
                _ => cmd.category = String::new(),
            }
            let err = cmd.validate().unwrap_err();
            assert_eq!(err, DomainError::validation(format!("{field} is required")));
        }
    }

    #[test]
    fn create_rejects_zero_price() {
        let mut cmd = widget();
        cmd.unit_price = 0;
        assert!(matches!(cmd.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn patch_updates_only_given_fields() {
        let mut p = widget().into_product(ProductId::new(), Utc::now()).unwrap();
        let patch = ProductPatch {
            unit_price: Some(1500),
            reorder_level: Some(25),
            ..ProductPatch::default()
        };
        patch.apply(&mut p, Utc::now()).unwrap();
        assert_eq!(p.unit_price, 1500);
        assert_eq!(p.reorder_level, 25);
        assert_eq!(p.name, "Widget");
    }

    #[test]
    fn patch_is_all_or_nothing_on_validation_failure() {
        let mut p = widget().into_product(ProductId::new(), Utc::now()).unwrap();
        let before = p.clone();
        let patch = ProductPatch {
            name: Some("Renamed".into()),
            unit_price: Some(0),
            ..ProductPatch::default()
        };
        assert!(patch.apply(&mut p, Utc::now()).is_err());
        assert_eq!(p, before);
    }

    #[test]
    fn new_sku_ignores_unchanged_value() {
        let p = widget().into_product(ProductId::new(), Utc::now()).unwrap();
        let same = ProductPatch {
            sku: Some("WID-001".into()),
            ..ProductPatch::default()
        };
        assert_eq!(same.new_sku(&p), None);
        let other = ProductPatch {
            sku: Some("WID-002".into()),
            ..ProductPatch::default()
        };
        assert_eq!(other.new_sku(&p), Some("WID-002"));
    }

    #[test]
    fn delete_is_refused_while_stock_remains() {
        let p = widget().into_product(ProductId::new(), Utc::now()).unwrap();
        assert!(p.ensure_deletable(0).is_ok());
        assert!(matches!(p.ensure_deletable(3), Err(DomainError::Validation(_))));
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Any non-blank name/sku/category with a positive price is accepted.
            #[test]
            fn well_formed_products_validate(
                sku in "[A-Z0-9-]{1,20}",
                name in "[A-Za-z][A-Za-z0-9 ]{0,60}",
                price in 1u64..10_000_000,
            ) {
                let cmd = NewProduct {
                    name,
                    category: "General".into(),
                    sku: sku.clone(),
                    barcode: None,
                    description: None,
                    unit_price: price,
                    cost_price: None,
                    supplier_id: None,
                    reorder_level: None,
                };
                let p = cmd.into_product(ProductId::new(), Utc::now()).unwrap();
                prop_assert_eq!(p.sku, sku);
                prop_assert_eq!(p.unit_price, price);
            }
        }
    }
}
