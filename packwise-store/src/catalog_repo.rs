use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use packwise_catalog::{
    Currency, FieldRecord, ItemSnapshot, Packaging, Product, ProductTemplate, RecordShape,
    Relation, RelationKind, StandaloneCollection, UnitOfMeasure, UnitTable, UomType,
};
use packwise_core::repository::{CatalogRepository, RepoResult};

pub struct PostgresCatalogRepository {
    pool: PgPool,
}

impl PostgresCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal row structs for type-safe querying
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    template_id: Uuid,
    name: String,
    default_code: Option<String>,
    barcode: Option<String>,
    uom_id: Uuid,
    list_price: f64,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            template_id: row.template_id,
            name: row.name,
            default_code: row.default_code,
            barcode: row.barcode,
            uom_id: row.uom_id,
            list_price: row.list_price,
            relations: Vec::new(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct TemplateRow {
    id: Uuid,
    name: String,
    default_code: Option<String>,
    barcode: Option<String>,
    uom_id: Uuid,
    list_price: f64,
}

impl From<TemplateRow> for ProductTemplate {
    fn from(row: TemplateRow) -> Self {
        ProductTemplate {
            id: row.id,
            name: row.name,
            default_code: row.default_code,
            barcode: row.barcode,
            uom_id: row.uom_id,
            list_price: row.list_price,
            relations: Vec::new(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct UomRow {
    id: Uuid,
    name: String,
    category_id: Uuid,
    uom_type: String,
    factor: f64,
    rounding: f64,
}

#[derive(sqlx::FromRow)]
struct CurrencyRow {
    id: Uuid,
    code: String,
    symbol: String,
    rounding: f64,
}

#[derive(sqlx::FromRow)]
struct PackagingRow {
    id: Uuid,
    name: String,
    barcode: Option<String>,
    product_id: Option<Uuid>,
    template_id: Option<Uuid>,
    qty: f64,
}

#[derive(sqlx::FromRow)]
struct RelationRow {
    id: Uuid,
    field: String,
    kind: String,
    target_model: String,
    target_fields: Json<Vec<String>>,
}

#[derive(sqlx::FromRow)]
struct RecordRow {
    owner: String,
    fields: Json<FieldRecord>,
}

const PRODUCT_COLUMNS: &str = "id, template_id, name, default_code, barcode, uom_id, list_price";
const TEMPLATE_COLUMNS: &str = "id, name, default_code, barcode, uom_id, list_price";

fn uom_type(raw: &str) -> Option<UomType> {
    match raw {
        "bigger" => Some(UomType::Bigger),
        "reference" => Some(UomType::Reference),
        "smaller" => Some(UomType::Smaller),
        _ => None,
    }
}

fn relation_kind(raw: &str) -> Option<RelationKind> {
    match raw {
        "one2many" | "one_to_many" => Some(RelationKind::OneToMany),
        "many2one" | "many_to_one" => Some(RelationKind::ManyToOne),
        "many2many" | "many_to_many" => Some(RelationKind::ManyToMany),
        _ => None,
    }
}

impl PostgresCatalogRepository {
    async fn load_units(tx: &mut Transaction<'_, Postgres>) -> RepoResult<UnitTable> {
        let rows: Vec<UomRow> = sqlx::query_as(
            "SELECT id, name, category_id, uom_type, factor, rounding FROM uoms",
        )
        .fetch_all(&mut **tx)
        .await?;

        let mut units = UnitTable::new();
        for row in rows {
            let Some(kind) = uom_type(&row.uom_type) else {
                tracing::warn!(uom_id = %row.id, uom_type = %row.uom_type, "skipping unit with unknown type");
                continue;
            };
            units.insert(UnitOfMeasure {
                id: row.id,
                name: row.name,
                category_id: row.category_id,
                uom_type: kind,
                factor: row.factor,
                rounding: row.rounding,
            });
        }
        Ok(units)
    }

    async fn load_currency(tx: &mut Transaction<'_, Postgres>) -> RepoResult<Currency> {
        let row: Option<CurrencyRow> = sqlx::query_as(
            "SELECT id, code, symbol, rounding FROM currencies WHERE is_company ORDER BY code LIMIT 1",
        )
        .fetch_optional(&mut **tx)
        .await?;

        Ok(match row {
            Some(row) => Currency {
                id: row.id,
                code: row.code,
                symbol: row.symbol,
                rounding: row.rounding,
            },
            None => {
                tracing::debug!("no company currency configured, using default");
                Currency::default()
            }
        })
    }

    /// Relations declared on one owner, each with its records in order.
    async fn load_relations(
        tx: &mut Transaction<'_, Postgres>,
        owner_kind: &str,
        owner_id: Uuid,
    ) -> RepoResult<Vec<Relation>> {
        let rows: Vec<RelationRow> = sqlx::query_as(
            "SELECT id, field, kind, target_model, target_fields FROM product_relations \
             WHERE owner_kind = $1 AND owner_id = $2 ORDER BY position, field",
        )
        .bind(owner_kind)
        .bind(owner_id)
        .fetch_all(&mut **tx)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let records: Vec<RecordRow> = sqlx::query_as(
            "SELECT relation_id::TEXT AS owner, fields FROM relation_records \
             WHERE relation_id = ANY($1) ORDER BY relation_id, seq",
        )
        .bind(ids)
        .fetch_all(&mut **tx)
        .await?;

        let mut relations = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(kind) = relation_kind(&row.kind) else {
                tracing::debug!(field = %row.field, kind = %row.kind, "skipping relation of unknown kind");
                continue;
            };
            let owner = row.id.to_string();
            relations.push(Relation {
                field: row.field,
                kind,
                target: RecordShape {
                    model: row.target_model,
                    fields: row.target_fields.0,
                },
                records: records
                    .iter()
                    .filter(|r| r.owner == owner)
                    .map(|r| r.fields.0.clone())
                    .collect(),
            });
        }
        Ok(relations)
    }

    async fn load_standalone(
        tx: &mut Transaction<'_, Postgres>,
        product: &Product,
    ) -> RepoResult<Vec<StandaloneCollection>> {
        let shapes: Vec<(String, Json<Vec<String>>)> =
            sqlx::query_as("SELECT model, fields FROM standalone_collections ORDER BY model")
                .fetch_all(&mut **tx)
                .await?;

        let records: Vec<RecordRow> = sqlx::query_as(
            "SELECT model AS owner, fields FROM standalone_records \
             WHERE fields->>'product_id' = $1 OR fields->>'product_tmpl_id' = $2 \
             ORDER BY model, seq",
        )
        .bind(product.id.to_string())
        .bind(product.template_id.to_string())
        .fetch_all(&mut **tx)
        .await?;

        Ok(shapes
            .into_iter()
            .map(|(model, fields)| StandaloneCollection {
                records: records
                    .iter()
                    .filter(|r| r.owner == model)
                    .map(|r| r.fields.0.clone())
                    .collect(),
                shape: RecordShape { model, fields: fields.0 },
            })
            .collect())
    }
}

#[async_trait]
impl CatalogRepository for PostgresCatalogRepository {
    async fn get_product(&self, id: Uuid) -> RepoResult<Option<Product>> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Product::from))
    }

    async fn first_variant_of_template(&self, template_id: Uuid) -> RepoResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE template_id = $1 \
             ORDER BY created_at, id LIMIT 1"
        ))
        .bind(template_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    async fn find_product_by_code(&self, code: &str) -> RepoResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = $1 OR default_code = $1 \
             ORDER BY created_at, id LIMIT 1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    async fn find_template_by_code(&self, code: &str) -> RepoResult<Option<ProductTemplate>> {
        let row: Option<TemplateRow> = sqlx::query_as(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM product_templates WHERE barcode = $1 OR default_code = $1 \
             ORDER BY name, id LIMIT 1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ProductTemplate::from))
    }

    async fn find_packaging_by_barcode(&self, barcode: &str) -> RepoResult<Option<Packaging>> {
        let row: Option<PackagingRow> = sqlx::query_as(
            "SELECT id, name, barcode, product_id, template_id, qty FROM product_packagings \
             WHERE barcode = $1 ORDER BY id LIMIT 1",
        )
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Packaging {
            id: row.id,
            name: row.name,
            barcode: row.barcode,
            product_id: row.product_id,
            template_id: row.template_id,
            qty: row.qty,
        }))
    }

    async fn load_snapshot(&self, product: &Product) -> RepoResult<Option<ItemSnapshot>> {
        let mut tx = self.pool.begin().await?;
        // Every read below sees the same catalog state
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let template: Option<TemplateRow> = sqlx::query_as(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM product_templates WHERE id = $1"
        ))
        .bind(product.template_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(template) = template else {
            tx.commit().await?;
            return Ok(None);
        };

        let mut template = ProductTemplate::from(template);
        template.relations = Self::load_relations(&mut tx, "template", template.id).await?;

        let mut product = product.clone();
        product.relations = Self::load_relations(&mut tx, "product", product.id).await?;

        let units = Self::load_units(&mut tx).await?;
        let standalone = Self::load_standalone(&mut tx, &product).await?;
        let currency = Self::load_currency(&mut tx).await?;

        tx.commit().await?;

        Ok(Some(ItemSnapshot {
            product,
            template,
            units,
            standalone,
            currency,
        }))
    }
}
