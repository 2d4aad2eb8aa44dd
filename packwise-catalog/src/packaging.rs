use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::association::{discover_price_associations, PriceAssociation};
use crate::product::ItemSnapshot;
use crate::uom::UnitOfMeasure;

/// Where a packaging answer came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PackagingSource {
    PriceLine,
    BiggerUnit,
}

impl PackagingSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackagingSource::PriceLine => "price_line",
            PackagingSource::BiggerUnit => "bigger_unit",
        }
    }
}

/// Normalized packaging answer for one item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PackagingDescriptor {
    pub has_packaging: bool,
    /// Base units contained in one packaging unit.
    pub packaging_quantity_in_base_units: f64,
    pub packaging_price: f64,
    pub packaging_unit_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packaging_barcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PackagingSource>,
}

impl PackagingDescriptor {
    pub fn none() -> Self {
        Self {
            has_packaging: false,
            packaging_quantity_in_base_units: 0.0,
            packaging_price: 0.0,
            packaging_unit_name: String::new(),
            packaging_barcode: None,
            source: None,
        }
    }
}

impl Default for PackagingDescriptor {
    fn default() -> Self {
        Self::none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackagingConfig {
    /// Derive a pack from the category's "bigger" unit when no price line
    /// exists.
    pub fallback_to_bigger_unit: bool,
}

impl Default for PackagingConfig {
    fn default() -> Self {
        Self {
            fallback_to_bigger_unit: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Base unit {uom_id} of product {product_id} is not in the catalog snapshot")]
    MissingBaseUnit {
        product_id: uuid::Uuid,
        uom_id: uuid::Uuid,
    },
}

fn preference(unit: &UnitOfMeasure) -> (u8, f64) {
    let rank = if unit.is_bigger() { 0 } else { 1 };
    let factor = if unit.factor == 0.0 { 1.0 } else { unit.factor };
    (rank, factor)
}

fn compare(a: &PriceAssociation, b: &PriceAssociation) -> Ordering {
    let (rank_a, factor_a) = preference(a.unit());
    let (rank_b, factor_b) = preference(b.unit());
    rank_a.cmp(&rank_b).then_with(|| factor_a.total_cmp(&factor_b))
}

/// Pick the preferred candidate: "bigger" units first, then ascending
/// factor. Equal keys keep discovery order.
pub fn pick_best<I>(candidates: I) -> Option<PriceAssociation>
where
    I: IntoIterator<Item = PriceAssociation>,
{
    // min_by returns the first of several equal minima.
    candidates.into_iter().min_by(compare)
}

/// Turns an item snapshot into its packaging descriptor.
pub struct PackagingResolver {
    config: PackagingConfig,
}

impl PackagingResolver {
    pub fn new(config: PackagingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PackagingConfig {
        &self.config
    }

    pub fn resolve(&self, item: &ItemSnapshot) -> Result<PackagingDescriptor, ResolveError> {
        let base = item.base_unit().ok_or(ResolveError::MissingBaseUnit {
            product_id: item.product.id,
            uom_id: item.product.uom_id,
        })?;

        // A line whose unit cannot be converted does not qualify
        let qualifying = discover_price_associations(item).filter(|assoc| {
            match assoc.unit().ratio_to(base) {
                Ok(_) => true,
                Err(e) => {
                    tracing::warn!(product_id = %item.product.id, "ignoring price line: {}", e);
                    false
                }
            }
        });

        if let Some(best) = pick_best(qualifying) {
            match best.unit().ratio_to(base) {
                Ok(quantity) => {
                    tracing::debug!(
                        product_id = %item.product.id,
                        unit = %best.unit().name,
                        origin = best.origin(),
                        "packaging taken from price line"
                    );
                    return Ok(PackagingDescriptor {
                        has_packaging: true,
                        packaging_quantity_in_base_units: quantity,
                        packaging_price: item.currency.round(best.price()),
                        packaging_unit_name: best.unit().display_name().to_string(),
                        packaging_barcode: best.barcode().map(str::to_string),
                        source: Some(PackagingSource::PriceLine),
                    });
                }
                Err(e) => {
                    tracing::warn!(product_id = %item.product.id, "ignoring price line: {}", e);
                }
            }
        }

        if !self.config.fallback_to_bigger_unit {
            return Ok(PackagingDescriptor::none());
        }

        Ok(self.bigger_unit_fallback(item, base))
    }

    fn bigger_unit_fallback(&self, item: &ItemSnapshot, base: &UnitOfMeasure) -> PackagingDescriptor {
        let Some(bigger) = item.units.preferred_bigger(base.category_id) else {
            return PackagingDescriptor::none();
        };

        match bigger.ratio_to(base) {
            Ok(quantity) => PackagingDescriptor {
                has_packaging: true,
                packaging_quantity_in_base_units: quantity,
                packaging_price: item.currency.round(item.product.list_price * quantity),
                packaging_unit_name: bigger.display_name().to_string(),
                packaging_barcode: None,
                source: Some(PackagingSource::BiggerUnit),
            },
            Err(e) => {
                tracing::warn!(product_id = %item.product.id, "bigger unit fallback failed: {}", e);
                PackagingDescriptor::none()
            }
        }
    }
}

impl Default for PackagingResolver {
    fn default() -> Self {
        Self::new(PackagingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::association::{FieldRecord, RecordShape, Relation, RelationKind};
    use crate::currency::Currency;
    use crate::product::{Product, ProductTemplate};
    use crate::uom::{UnitTable, UomType};
    use serde_json::json;
    use uuid::Uuid;

    fn unit(name: &str, category_id: Uuid, uom_type: UomType, factor: f64) -> UnitOfMeasure {
        UnitOfMeasure {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category_id,
            uom_type,
            factor,
            rounding: 0.01,
        }
    }

    fn item(base: &UnitOfMeasure, others: &[UnitOfMeasure], list_price: f64) -> ItemSnapshot {
        let template_id = Uuid::new_v4();
        let mut units: UnitTable = others.iter().cloned().collect();
        units.insert(base.clone());
        ItemSnapshot {
            product: Product {
                id: Uuid::new_v4(),
                template_id,
                name: "Water 500ml".to_string(),
                default_code: None,
                barcode: None,
                uom_id: base.id,
                list_price,
                relations: vec![],
            },
            template: ProductTemplate {
                id: template_id,
                name: "Water 500ml".to_string(),
                default_code: None,
                barcode: None,
                uom_id: base.id,
                list_price,
                relations: vec![],
            },
            units,
            standalone: vec![],
            currency: Currency::default(),
        }
    }

    fn with_lines(mut item: ItemSnapshot, lines: &[(&UnitOfMeasure, f64)]) -> ItemSnapshot {
        item.product.relations.push(Relation {
            field: "multi_uom_price_id".to_string(),
            kind: RelationKind::OneToMany,
            target: RecordShape::new("product.multi.uom.price", &["uom_id", "price"]),
            records: lines
                .iter()
                .map(|(u, price)| {
                    let mut map = serde_json::Map::new();
                    map.insert("uom_id".to_string(), json!(u.id.to_string()));
                    map.insert("price".to_string(), json!(price));
                    FieldRecord(map)
                })
                .collect(),
        });
        item
    }

    #[test]
    fn test_price_line_price_is_used_verbatim() {
        let count = Uuid::new_v4();
        let units = unit("Units", count, UomType::Reference, 1.0);
        let dozens = unit("Dozens", count, UomType::Bigger, 1.0 / 12.0);
        let snapshot = with_lines(item(&units, &[dozens.clone()], 6.0), &[(&dozens, 65.0)]);

        let packaging = PackagingResolver::default().resolve(&snapshot).unwrap();
        assert!(packaging.has_packaging);
        assert_eq!(packaging.packaging_unit_name, "Dozens");
        assert_eq!(packaging.packaging_price, 65.0);
        assert_eq!(packaging.packaging_quantity_in_base_units, 12.0);
        assert_eq!(packaging.source, Some(PackagingSource::PriceLine));
    }

    #[test]
    fn test_cross_category_lines_fall_through_to_fallback() {
        let count = Uuid::new_v4();
        let units = unit("Units", count, UomType::Reference, 1.0);
        let kg = unit("kg", Uuid::new_v4(), UomType::Bigger, 0.001);
        let snapshot = with_lines(item(&units, &[kg.clone()], 6.0), &[(&kg, 10.0)]);

        let packaging = PackagingResolver::default().resolve(&snapshot).unwrap();
        assert!(!packaging.has_packaging);
        assert_eq!(packaging.packaging_quantity_in_base_units, 0.0);
        assert_eq!(packaging.packaging_unit_name, "");
    }

    #[test]
    fn test_pick_best_is_order_independent_for_bigger_units() {
        let count = Uuid::new_v4();
        let dozens = unit("Dozens", count, UomType::Bigger, 1.0 / 12.0);
        let half_dozen = unit("Half dozen", count, UomType::Bigger, 1.0 / 6.0);
        let pack = unit("Pack", count, UomType::Smaller, 0.01);

        let forward = vec![
            PriceAssociation::new(half_dozen.clone(), 36.0),
            PriceAssociation::new(pack.clone(), 1.0),
            PriceAssociation::new(dozens.clone(), 72.0),
        ];
        let mut backward = forward.clone();
        backward.reverse();

        assert_eq!(pick_best(forward.clone()).unwrap().unit().name, "Dozens");
        assert_eq!(pick_best(backward).unwrap().unit().name, "Dozens");
        assert_eq!(pick_best(forward.clone()), pick_best(forward));
        assert!(pick_best(Vec::new()).is_none());
    }

    #[test]
    fn test_pick_best_ties_keep_discovery_order() {
        let count = Uuid::new_v4();
        let dozens = unit("Dozens", count, UomType::Bigger, 1.0 / 12.0);

        let first = PriceAssociation::new(dozens.clone(), 70.0).with_origin("variant.lines");
        let second = PriceAssociation::new(dozens, 72.0).with_origin("template.lines");
        assert_eq!(pick_best(vec![first, second]).unwrap().origin(), "variant.lines");
    }

    #[test]
    fn test_zero_factor_sorts_as_one() {
        let count = Uuid::new_v4();
        let zero = unit("Odd", count, UomType::Smaller, 0.0);
        let two = unit("Two", count, UomType::Smaller, 2.0);

        let best = pick_best(vec![
            PriceAssociation::new(two, 1.0),
            PriceAssociation::new(zero, 1.0),
        ])
        .unwrap();
        assert_eq!(best.unit().name, "Odd");
    }

    #[test]
    fn test_unconvertible_line_yields_to_next_candidate() {
        let count = Uuid::new_v4();
        let units = unit("Units", count, UomType::Reference, 1.0);
        let broken = unit("Broken", count, UomType::Bigger, 0.0);
        let pair = unit("Pair", count, UomType::Smaller, 0.5);
        let snapshot = with_lines(
            item(&units, &[broken.clone(), pair.clone()], 6.0),
            &[(&broken, 1.0), (&pair, 3.0)],
        );

        let packaging = PackagingResolver::default().resolve(&snapshot).unwrap();
        assert!(packaging.has_packaging);
        assert_eq!(packaging.packaging_unit_name, "Pair");
        assert_eq!(packaging.packaging_quantity_in_base_units, 0.5);
        assert_eq!(packaging.packaging_price, 3.0);
        assert_eq!(packaging.source, Some(PackagingSource::PriceLine));
    }

    #[test]
    fn test_fallback_skips_bigger_unit_with_bad_factor() {
        let count = Uuid::new_v4();
        let units = unit("Units", count, UomType::Reference, 1.0);
        let broken = unit("Broken", count, UomType::Bigger, 0.0);
        let negative = unit("Negative", count, UomType::Bigger, -2.0);
        let dozens = unit("Dozens", count, UomType::Bigger, 1.0 / 12.0);
        let snapshot = item(&units, &[broken, negative, dozens], 6.0);

        let packaging = PackagingResolver::default().resolve(&snapshot).unwrap();
        assert!(packaging.has_packaging);
        assert_eq!(packaging.packaging_unit_name, "Dozens");
        assert_eq!(packaging.packaging_quantity_in_base_units, 12.0);
        assert_eq!(packaging.packaging_price, 72.0);
        assert_eq!(packaging.source, Some(PackagingSource::BiggerUnit));
    }

    #[test]
    fn test_bigger_unit_fallback() {
        let count = Uuid::new_v4();
        let units = unit("Units", count, UomType::Reference, 1.0);
        let dozens = unit("Dozens", count, UomType::Bigger, 1.0 / 12.0);
        let snapshot = item(&units, &[dozens], 6.0);

        let packaging = PackagingResolver::default().resolve(&snapshot).unwrap();
        assert!(packaging.has_packaging);
        assert_eq!(packaging.packaging_quantity_in_base_units, 12.0);
        assert_eq!(packaging.packaging_price, 72.0);
        assert_eq!(packaging.packaging_unit_name, "Dozens");
        assert_eq!(packaging.source, Some(PackagingSource::BiggerUnit));
    }

    #[test]
    fn test_fallback_can_be_disabled() {
        let count = Uuid::new_v4();
        let units = unit("Units", count, UomType::Reference, 1.0);
        let dozens = unit("Dozens", count, UomType::Bigger, 1.0 / 12.0);
        let snapshot = item(&units, &[dozens], 6.0);

        let resolver = PackagingResolver::new(PackagingConfig {
            fallback_to_bigger_unit: false,
        });
        assert_eq!(resolver.resolve(&snapshot).unwrap(), PackagingDescriptor::none());
    }

    #[test]
    fn test_no_lines_and_no_bigger_unit() {
        let count = Uuid::new_v4();
        let units = unit("Units", count, UomType::Reference, 1.0);
        let snapshot = item(&units, &[unit("Pair", count, UomType::Smaller, 0.5)], 6.0);

        let packaging = PackagingResolver::default().resolve(&snapshot).unwrap();
        assert!(!packaging.has_packaging);
        assert_eq!(packaging.packaging_quantity_in_base_units, 0.0);
        assert_eq!(packaging.packaging_price, 0.0);
    }

    #[test]
    fn test_quantity_matches_conversion_for_several_ratios() {
        let count = Uuid::new_v4();
        let units = unit("Units", count, UomType::Reference, 1.0);
        for (name, ratio) in [("Dozens", 12.0), ("Half dozen", 6.0)] {
            let pack = unit(name, count, UomType::Bigger, 1.0 / ratio);
            let snapshot = with_lines(item(&units, &[pack.clone()], 1.0), &[(&pack, 10.0)]);

            let packaging = PackagingResolver::default().resolve(&snapshot).unwrap();
            assert_eq!(
                packaging.packaging_quantity_in_base_units,
                pack.to(&units, 1.0).unwrap()
            );
            assert_eq!(packaging.packaging_quantity_in_base_units, ratio);
        }
    }

    #[test]
    fn test_missing_base_unit_is_an_error() {
        let count = Uuid::new_v4();
        let units = unit("Units", count, UomType::Reference, 1.0);
        let mut snapshot = item(&units, &[], 6.0);
        snapshot.product.uom_id = Uuid::new_v4();

        assert!(matches!(
            PackagingResolver::default().resolve(&snapshot),
            Err(ResolveError::MissingBaseUnit { .. })
        ));
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let value = serde_json::to_value(PackagingDescriptor::none()).unwrap();
        assert_eq!(
            value,
            json!({
                "hasPackaging": false,
                "packagingQuantityInBaseUnits": 0.0,
                "packagingPrice": 0.0,
                "packagingUnitName": ""
            })
        );
    }
}
