use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;
use packwise_catalog::{
    Currency, FieldRecord, ItemSnapshot, Packaging, Product, ProductTemplate, RecordShape,
    Relation, RelationKind, UnitOfMeasure, UnitTable, UomType,
};

use crate::repository::{CatalogRepository, RepoResult};

/// Single-product catalog that counts every repository call.
pub struct FakeCatalog {
    product: Product,
    template: ProductTemplate,
    packaging: Packaging,
    units: UnitTable,
    currency: Currency,
    fail: bool,
    calls: AtomicUsize,
}

impl FakeCatalog {
    /// Eggs sold by the unit at 6.00, with a Dozens price line at 70.00.
    pub fn eggs() -> Self {
        let count = Uuid::new_v4();
        let units = UnitOfMeasure {
            id: Uuid::new_v4(),
            name: "Units".to_string(),
            category_id: count,
            uom_type: UomType::Reference,
            factor: 1.0,
            rounding: 0.01,
        };
        let dozens = UnitOfMeasure {
            id: Uuid::new_v4(),
            name: "Dozens".to_string(),
            category_id: count,
            uom_type: UomType::Bigger,
            factor: 1.0 / 12.0,
            rounding: 0.01,
        };

        let line = match json!({"uom_id": dozens.id.to_string(), "price": 70.0}) {
            serde_json::Value::Object(map) => FieldRecord(map),
            _ => FieldRecord::default(),
        };

        let template_id = Uuid::new_v4();
        let product = Product {
            id: Uuid::new_v4(),
            template_id,
            name: "Eggs".to_string(),
            default_code: Some("EGG-1".to_string()),
            barcode: Some("6281000000017".to_string()),
            uom_id: units.id,
            list_price: 6.0,
            relations: vec![Relation {
                field: "multi_uom_price_id".to_string(),
                kind: RelationKind::OneToMany,
                target: RecordShape::new("product.multi.uom.price", &["uom_id", "price", "barcode"]),
                records: vec![line],
            }],
        };
        let template = ProductTemplate {
            id: template_id,
            name: "Eggs".to_string(),
            default_code: Some("EGG".to_string()),
            barcode: Some("6281000000000".to_string()),
            uom_id: units.id,
            list_price: 6.0,
            relations: vec![],
        };
        let packaging = Packaging {
            id: Uuid::new_v4(),
            name: "Tray of 30".to_string(),
            barcode: Some("PK-EGG-30".to_string()),
            product_id: None,
            template_id: Some(template_id),
            qty: 30.0,
        };

        Self {
            product,
            template,
            packaging,
            units: vec![units, dozens].into(),
            currency: Currency::new("SAR", "ر.س", 0.01),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::eggs()
        }
    }

    pub fn product(&self) -> &Product {
        &self.product
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) -> RepoResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err("catalog unavailable".into());
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for FakeCatalog {
    async fn get_product(&self, id: Uuid) -> RepoResult<Option<Product>> {
        self.hit()?;
        Ok((self.product.id == id).then(|| self.product.clone()))
    }

    async fn first_variant_of_template(&self, template_id: Uuid) -> RepoResult<Option<Product>> {
        self.hit()?;
        Ok((self.product.template_id == template_id).then(|| self.product.clone()))
    }

    async fn find_product_by_code(&self, code: &str) -> RepoResult<Option<Product>> {
        self.hit()?;
        Ok(self.product.matches_code(code).then(|| self.product.clone()))
    }

    async fn find_template_by_code(&self, code: &str) -> RepoResult<Option<ProductTemplate>> {
        self.hit()?;
        Ok(self.template.matches_code(code).then(|| self.template.clone()))
    }

    async fn find_packaging_by_barcode(&self, barcode: &str) -> RepoResult<Option<Packaging>> {
        self.hit()?;
        Ok((self.packaging.barcode.as_deref() == Some(barcode)).then(|| self.packaging.clone()))
    }

    async fn load_snapshot(&self, product: &Product) -> RepoResult<Option<ItemSnapshot>> {
        self.hit()?;
        if product.id != self.product.id {
            return Ok(None);
        }
        Ok(Some(ItemSnapshot {
            product: self.product.clone(),
            template: self.template.clone(),
            units: self.units.clone(),
            standalone: vec![],
            currency: self.currency.clone(),
        }))
    }
}
