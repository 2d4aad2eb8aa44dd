use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use packwise_catalog::{ItemSnapshot, Product};

use crate::repository::CatalogRepository;
use crate::CoreResult;

/// How a scanned code was matched.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScannedAs {
    Variant,
    Template,
    Packaging,
}

/// Trim a scan and map Arabic-Indic digits to ASCII.
pub fn normalize_scan(text: &str) -> String {
    text.trim()
        .chars()
        .map(|c| match c {
            '\u{0660}'..='\u{0669}' => char::from(b'0' + (c as u32 - 0x0660) as u8),
            _ => c,
        })
        .collect()
}

/// What the find-product screen shows for a scan: the unit card, the pack
/// card and the currency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    pub product_id: Uuid,
    pub template_id: Uuid,
    pub display_name: String,
    pub barcode: Option<String>,
    pub scanned_term: String,
    pub scanned_as: ScannedAs,

    pub price: f64,
    pub uom_id: Uuid,
    pub uom_name: String,
    pub uom_category_id: Uuid,

    pub package_qty: f64,
    pub package_price: f64,
    pub package_name: Option<String>,
    pub package_barcode: Option<String>,

    pub currency_code: String,
    pub currency_symbol: String,
}

impl ProductDetails {
    pub fn has_pack(&self) -> bool {
        self.package_qty > 0.0 && self.package_price > 0.0
    }

    fn from_snapshot(snapshot: &ItemSnapshot, scanned_term: String, scanned_as: ScannedAs) -> Option<Self> {
        let base = snapshot.base_unit()?;
        let product = &snapshot.product;
        Some(Self {
            product_id: product.id,
            template_id: product.template_id,
            display_name: product.display_name(),
            barcode: product.barcode.clone(),
            scanned_term,
            scanned_as,
            price: product.list_price,
            uom_id: base.id,
            uom_name: base.display_name().to_string(),
            uom_category_id: base.category_id,
            package_qty: 0.0,
            package_price: 0.0,
            package_name: None,
            package_barcode: None,
            currency_code: snapshot.currency.code.clone(),
            currency_symbol: snapshot.currency.symbol.clone(),
        })
    }
}

/// Looks a scanned code up in the catalog.
#[derive(Clone)]
pub struct ProductDetailSearch {
    repo: Arc<dyn CatalogRepository>,
}

impl ProductDetailSearch {
    pub fn new(repo: Arc<dyn CatalogRepository>) -> Self {
        Self { repo }
    }

    /// Match order: variant barcode or reference, template barcode or
    /// reference, packaging barcode.
    pub async fn find_product(&self, scan: &str) -> CoreResult<Option<(Product, ScannedAs)>> {
        if scan.is_empty() {
            return Ok(None);
        }

        if let Some(product) = self.repo.find_product_by_code(scan).await? {
            return Ok(Some((product, ScannedAs::Variant)));
        }

        if let Some(template) = self.repo.find_template_by_code(scan).await? {
            if let Some(product) = self.repo.first_variant_of_template(template.id).await? {
                return Ok(Some((product, ScannedAs::Template)));
            }
        }

        if let Some(packaging) = self.repo.find_packaging_by_barcode(scan).await? {
            if let Some(product_id) = packaging.product_id {
                if let Some(product) = self.repo.get_product(product_id).await? {
                    return Ok(Some((product, ScannedAs::Packaging)));
                }
            }
            if let Some(template_id) = packaging.template_id {
                if let Some(product) = self.repo.first_variant_of_template(template_id).await? {
                    return Ok(Some((product, ScannedAs::Packaging)));
                }
            }
        }

        Ok(None)
    }

    /// Details for a scan with an empty pack card, plus the snapshot they
    /// were read from; `None` when nothing matches.
    pub async fn lookup(&self, scan: &str) -> CoreResult<Option<(ProductDetails, ItemSnapshot)>> {
        let term = normalize_scan(scan);
        let Some((product, scanned_as)) = self.find_product(&term).await? else {
            tracing::info!(scan = %term, "scan matched no product");
            return Ok(None);
        };

        let Some(snapshot) = self.repo.load_snapshot(&product).await? else {
            tracing::warn!(product_id = %product.id, "catalog snapshot unavailable");
            return Ok(None);
        };

        let Some(details) = ProductDetails::from_snapshot(&snapshot, term, scanned_as) else {
            tracing::warn!(product_id = %product.id, uom_id = %product.uom_id, "base unit missing from catalog");
            return Ok(None);
        };
        Ok(Some((details, snapshot)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeCatalog;

    #[test]
    fn test_normalize_scan() {
        assert_eq!(normalize_scan("  ٦٢٨١٠٠٠  "), "6281000");
        assert_eq!(normalize_scan("EGG-1"), "EGG-1");
        assert_eq!(normalize_scan("   "), "");
    }

    #[tokio::test]
    async fn test_lookup_by_variant_barcode() {
        let catalog = Arc::new(FakeCatalog::eggs());
        let (details, _) = ProductDetailSearch::new(catalog.clone())
            .lookup(" ٦٢٨١٠٠٠٠٠٠٠١٧ ")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(details.product_id, catalog.product().id);
        assert_eq!(details.scanned_as, ScannedAs::Variant);
        assert_eq!(details.scanned_term, "6281000000017");
        assert_eq!(details.display_name, "[EGG-1] Eggs");
        assert_eq!(details.uom_name, "Units");
        assert_eq!(details.price, 6.0);
        assert_eq!(details.currency_code, "SAR");
        assert!(!details.has_pack());
    }

    #[tokio::test]
    async fn test_lookup_by_template_reference() {
        let catalog = Arc::new(FakeCatalog::eggs());
        let (details, _) = ProductDetailSearch::new(catalog.clone())
            .lookup("EGG")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(details.scanned_as, ScannedAs::Template);
        assert_eq!(details.product_id, catalog.product().id);
    }

    #[tokio::test]
    async fn test_lookup_by_packaging_barcode() {
        let catalog = Arc::new(FakeCatalog::eggs());
        let (details, _) = ProductDetailSearch::new(catalog)
            .lookup("PK-EGG-30")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(details.scanned_as, ScannedAs::Packaging);
    }

    #[tokio::test]
    async fn test_lookup_returns_matching_snapshot() {
        let catalog = Arc::new(FakeCatalog::eggs());
        let (details, snapshot) = ProductDetailSearch::new(catalog.clone())
            .lookup("EGG-1")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(snapshot.product.id, details.product_id);
        assert_eq!(snapshot.base_unit().unwrap().id, details.uom_id);
    }

    #[tokio::test]
    async fn test_blank_or_unknown_scan() {
        let catalog = Arc::new(FakeCatalog::eggs());
        let search = ProductDetailSearch::new(catalog.clone());

        assert!(search.lookup("   ").await.unwrap().is_none());
        assert_eq!(catalog.calls(), 0);
        assert!(search.lookup("nothing").await.unwrap().is_none());
    }
}
