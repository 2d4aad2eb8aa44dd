//! Discovery of "unit of measure + price" associations attached to an item.
//!
//! Price lines come from add-ons that each pick their own record layout, so
//! a record is read through allow-lists of field names rather than a fixed
//! schema. Each place lines can live in is a [`PriceAssociationSource`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::product::ItemSnapshot;
use crate::uom::UnitOfMeasure;

/// Field names that may reference the line's unit, in priority order.
pub const UNIT_FIELDS: &[&str] = &["uom_id", "uom"];

/// Field names that may hold the line's price, in priority order.
pub const PRICE_FIELDS: &[&str] = &["price", "uom_price", "amount", "list_price", "fixed_price"];

/// Field names that may hold a barcode printed on the pack.
pub const BARCODE_FIELDS: &[&str] = &["barcode", "pack_barcode", "uom_barcode"];

/// Standalone price-line collections searched after the item's own relations.
pub const STANDALONE_MODELS: &[&str] = &[
    "product.multi.uom.price",
    "product.tmpl.multi.uom.price",
    "product.uom.price",
    "product.uom.price.line",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    OneToMany,
    ManyToOne,
    ManyToMany,
}

/// Declared layout of the records behind a relation or collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordShape {
    pub model: String,
    pub fields: Vec<String>,
}

impl RecordShape {
    pub fn new(model: &str, fields: &[&str]) -> Self {
        Self {
            model: model.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }

    /// First allow-listed name the shape declares.
    pub fn first_field(&self, allow_list: &[&'static str]) -> Option<&'static str> {
        allow_list.iter().copied().find(|name| self.has_field(name))
    }

    /// A shape can carry price lines when it declares both a unit and a
    /// price field.
    pub fn is_price_line(&self) -> bool {
        self.first_field(UNIT_FIELDS).is_some() && self.first_field(PRICE_FIELDS).is_some()
    }
}

/// One loosely-typed record: field name to JSON value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct FieldRecord(pub Map<String, Value>);

impl FieldRecord {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    pub fn uuid(&self, field: &str) -> Option<Uuid> {
        self.get(field)
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str).filter(|s| !s.is_empty())
    }
}

impl From<Map<String, Value>> for FieldRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A relation declared on a variant or a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    pub field: String,
    pub kind: RelationKind,
    pub target: RecordShape,
    #[serde(default)]
    pub records: Vec<FieldRecord>,
}

impl Relation {
    pub fn carries_price_lines(&self) -> bool {
        self.kind == RelationKind::OneToMany && self.target.is_price_line()
    }
}

/// A collection of price lines living outside the product, bound to it by
/// `product_id` or `product_tmpl_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandaloneCollection {
    pub shape: RecordShape,
    #[serde(default)]
    pub records: Vec<FieldRecord>,
}

/// A usable (unit, price) pair found for an item.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceAssociation {
    unit: UnitOfMeasure,
    price: f64,
    barcode: Option<String>,
    origin: String,
}

impl PriceAssociation {
    pub fn new(unit: UnitOfMeasure, price: f64) -> Self {
        Self {
            unit,
            price,
            barcode: None,
            origin: String::new(),
        }
    }

    pub fn with_barcode(mut self, barcode: Option<String>) -> Self {
        self.barcode = barcode;
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn unit(&self) -> &UnitOfMeasure {
        &self.unit
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn barcode(&self) -> Option<&str> {
        self.barcode.as_deref()
    }

    /// Where the line was found, e.g. `variant.multi_uom_price_id`.
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

/// A place price lines can be read from.
pub trait PriceAssociationSource<'a> {
    fn label(&self) -> String;

    /// Lines from this source that fit the item's base unit category.
    fn associations(&self) -> Box<dyn Iterator<Item = PriceAssociation> + 'a>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationOwner {
    Variant,
    Template,
}

impl RelationOwner {
    fn as_str(&self) -> &'static str {
        match self {
            RelationOwner::Variant => "variant",
            RelationOwner::Template => "template",
        }
    }
}

/// Lines reached through a one-to-many relation of the variant or template.
pub struct RelationSource<'a> {
    pub item: &'a ItemSnapshot,
    pub base: &'a UnitOfMeasure,
    pub owner: RelationOwner,
    pub relation: &'a Relation,
}

impl<'a> PriceAssociationSource<'a> for RelationSource<'a> {
    fn label(&self) -> String {
        format!("{}.{}", self.owner.as_str(), self.relation.field)
    }

    fn associations(&self) -> Box<dyn Iterator<Item = PriceAssociation> + 'a> {
        let (item, base, relation) = (self.item, self.base, self.relation);
        let label = self.label();
        Box::new(
            relation
                .records
                .iter()
                .filter_map(move |record| extract(&relation.target, record, item, base))
                .map(move |assoc| assoc.with_origin(label.clone())),
        )
    }
}

/// Lines held in a well-known standalone collection.
pub struct StandaloneSource<'a> {
    pub item: &'a ItemSnapshot,
    pub base: &'a UnitOfMeasure,
    pub collection: &'a StandaloneCollection,
    binding: Binding,
}

#[derive(Debug, Clone, Copy)]
enum Binding {
    Product(Uuid),
    Template(Uuid),
}

impl Binding {
    fn matches(&self, record: &FieldRecord) -> bool {
        match self {
            Binding::Product(id) => record.uuid("product_id") == Some(*id),
            Binding::Template(id) => record.uuid("product_tmpl_id") == Some(*id),
        }
    }
}

impl<'a> StandaloneSource<'a> {
    /// `None` when the collection has no way to point at a product.
    pub fn bind(
        item: &'a ItemSnapshot,
        base: &'a UnitOfMeasure,
        collection: &'a StandaloneCollection,
    ) -> Option<Self> {
        let binding = if collection.shape.has_field("product_id") {
            Binding::Product(item.product.id)
        } else if collection.shape.has_field("product_tmpl_id") {
            Binding::Template(item.template.id)
        } else {
            return None;
        };

        Some(Self {
            item,
            base,
            collection,
            binding,
        })
    }
}

impl<'a> PriceAssociationSource<'a> for StandaloneSource<'a> {
    fn label(&self) -> String {
        self.collection.shape.model.clone()
    }

    fn associations(&self) -> Box<dyn Iterator<Item = PriceAssociation> + 'a> {
        let (item, base, collection, binding) = (self.item, self.base, self.collection, self.binding);
        let label = self.label();
        Box::new(
            collection
                .records
                .iter()
                .filter(move |record| binding.matches(record))
                .filter_map(move |record| extract(&collection.shape, record, item, base))
                .map(move |assoc| assoc.with_origin(label.clone())),
        )
    }
}

/// Read one record through the allow-lists. The first field the shape
/// declares is authoritative; an empty value does not fall through to the
/// next name.
fn extract(
    shape: &RecordShape,
    record: &FieldRecord,
    item: &ItemSnapshot,
    base: &UnitOfMeasure,
) -> Option<PriceAssociation> {
    let unit_field = shape.first_field(UNIT_FIELDS)?;
    let unit = record.uuid(unit_field).and_then(|id| item.units.get(&id))?;
    if !unit.same_category(base) {
        tracing::trace!(model = %shape.model, unit = %unit.name, "skipping line outside base unit category");
        return None;
    }

    let price_field = shape.first_field(PRICE_FIELDS)?;
    let price = record.number(price_field)?;

    let barcode = shape
        .first_field(BARCODE_FIELDS)
        .and_then(|f| record.text(f))
        .map(str::to_string);

    Some(PriceAssociation::new(unit.clone(), price).with_barcode(barcode))
}

/// Every source that may hold price lines for `item`: variant relations,
/// then template relations, then the standalone collections in
/// [`STANDALONE_MODELS`] order.
pub fn price_sources<'a>(
    item: &'a ItemSnapshot,
    base: &'a UnitOfMeasure,
) -> Vec<Box<dyn PriceAssociationSource<'a> + 'a>> {
    let mut sources: Vec<Box<dyn PriceAssociationSource<'a> + 'a>> = Vec::new();

    let owned = [
        (RelationOwner::Variant, &item.product.relations),
        (RelationOwner::Template, &item.template.relations),
    ];
    for (owner, relations) in owned {
        for relation in relations.iter().filter(|r| r.carries_price_lines()) {
            sources.push(Box::new(RelationSource {
                item,
                base,
                owner,
                relation,
            }));
        }
    }

    for model in STANDALONE_MODELS {
        if let Some(source) = item
            .standalone_collection(model)
            .and_then(|collection| StandaloneSource::bind(item, base, collection))
        {
            sources.push(Box::new(source));
        }
    }

    sources
}

/// Lazily walk every source and yield the (unit, price) pairs that apply to
/// `item`, in discovery order. Empty when the base unit is unknown or
/// nothing qualifies.
pub fn discover_price_associations<'a>(
    item: &'a ItemSnapshot,
) -> impl Iterator<Item = PriceAssociation> + 'a {
    item.base_unit().into_iter().flat_map(move |base| {
        price_sources(item, base)
            .into_iter()
            .flat_map(|source| source.associations())
    })
}
