use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::association::{Relation, StandaloneCollection};
use crate::currency::Currency;
use crate::uom::{UnitOfMeasure, UnitTable};

/// A sellable variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub template_id: Uuid,
    pub name: String,
    pub default_code: Option<String>,
    pub barcode: Option<String>,
    pub uom_id: Uuid,
    /// Price of one base unit.
    pub list_price: f64,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl Product {
    pub fn display_name(&self) -> String {
        match &self.default_code {
            Some(code) if !code.is_empty() => format!("[{}] {}", code, self.name),
            _ => self.name.clone(),
        }
    }

    /// True when `code` equals the barcode or the internal reference.
    pub fn matches_code(&self, code: &str) -> bool {
        self.barcode.as_deref() == Some(code) || self.default_code.as_deref() == Some(code)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductTemplate {
    pub id: Uuid,
    pub name: String,
    pub default_code: Option<String>,
    pub barcode: Option<String>,
    pub uom_id: Uuid,
    pub list_price: f64,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl ProductTemplate {
    pub fn matches_code(&self, code: &str) -> bool {
        self.barcode.as_deref() == Some(code) || self.default_code.as_deref() == Some(code)
    }
}

/// A packaging record. Only used to recognise a product from its barcode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Packaging {
    pub id: Uuid,
    pub name: String,
    pub barcode: Option<String>,
    pub product_id: Option<Uuid>,
    pub template_id: Option<Uuid>,
    #[serde(default)]
    pub qty: f64,
}

/// Everything the resolver reads about one item, taken from a single
/// consistent view of the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub product: Product,
    pub template: ProductTemplate,
    pub units: UnitTable,
    #[serde(default)]
    pub standalone: Vec<StandaloneCollection>,
    pub currency: Currency,
}

impl ItemSnapshot {
    pub fn base_unit(&self) -> Option<&UnitOfMeasure> {
        self.units.get(&self.product.uom_id)
    }

    pub fn standalone_collection(&self, model: &str) -> Option<&StandaloneCollection> {
        self.standalone.iter().find(|c| c.shape.model == model)
    }
}
