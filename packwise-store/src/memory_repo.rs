use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use packwise_catalog::{
    Currency, ItemSnapshot, Packaging, Product, ProductTemplate, StandaloneCollection,
    UnitTable,
};
use packwise_core::repository::{CatalogRepository, RepoResult};

/// A whole catalog as one JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFixture {
    #[serde(default)]
    pub currency: Currency,
    pub units: UnitTable,
    #[serde(default)]
    pub templates: Vec<ProductTemplate>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub packagings: Vec<Packaging>,
    #[serde(default)]
    pub standalone: Vec<StandaloneCollection>,
}

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("Cannot read catalog fixture {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid catalog fixture: {0}")]
    Json(#[from] serde_json::Error),
}

impl CatalogFixture {
    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }
}

/// Catalog repository backed by a fixture held in memory. Variants keep the
/// fixture's order, which stands in for creation order.
pub struct MemoryCatalogRepository {
    fixture: CatalogFixture,
}

impl MemoryCatalogRepository {
    pub fn new(fixture: CatalogFixture) -> Self {
        tracing::info!(
            products = fixture.products.len(),
            templates = fixture.templates.len(),
            units = fixture.units.len(),
            "memory catalog loaded"
        );
        Self { fixture }
    }

    fn template(&self, id: Uuid) -> Option<&ProductTemplate> {
        self.fixture.templates.iter().find(|t| t.id == id)
    }

    /// Only the standalone records that point at this product or template.
    fn standalone_for(&self, product: &Product) -> Vec<StandaloneCollection> {
        let product_id = product.id.to_string();
        let template_id = product.template_id.to_string();

        self.fixture
            .standalone
            .iter()
            .map(|collection| StandaloneCollection {
                shape: collection.shape.clone(),
                records: collection
                    .records
                    .iter()
                    .filter(|r| {
                        r.get("product_id").and_then(|v| v.as_str()) == Some(product_id.as_str())
                            || r.get("product_tmpl_id").and_then(|v| v.as_str()) == Some(template_id.as_str())
                    })
                    .cloned()
                    .collect(),
            })
            .collect()
    }
}

#[async_trait]
impl CatalogRepository for MemoryCatalogRepository {
    async fn get_product(&self, id: Uuid) -> RepoResult<Option<Product>> {
        Ok(self.fixture.products.iter().find(|p| p.id == id).cloned())
    }

    async fn first_variant_of_template(&self, template_id: Uuid) -> RepoResult<Option<Product>> {
        Ok(self
            .fixture
            .products
            .iter()
            .find(|p| p.template_id == template_id)
            .cloned())
    }

    async fn find_product_by_code(&self, code: &str) -> RepoResult<Option<Product>> {
        Ok(self.fixture.products.iter().find(|p| p.matches_code(code)).cloned())
    }

    async fn find_template_by_code(&self, code: &str) -> RepoResult<Option<ProductTemplate>> {
        Ok(self.fixture.templates.iter().find(|t| t.matches_code(code)).cloned())
    }

    async fn find_packaging_by_barcode(&self, barcode: &str) -> RepoResult<Option<Packaging>> {
        Ok(self
            .fixture
            .packagings
            .iter()
            .find(|p| p.barcode.as_deref() == Some(barcode))
            .cloned())
    }

    async fn load_snapshot(&self, product: &Product) -> RepoResult<Option<ItemSnapshot>> {
        let Some(template) = self.template(product.template_id) else {
            return Ok(None);
        };

        Ok(Some(ItemSnapshot {
            product: product.clone(),
            template: template.clone(),
            units: self.fixture.units.clone(),
            standalone: self.standalone_for(product),
            currency: self.fixture.currency.clone(),
        }))
    }
}
