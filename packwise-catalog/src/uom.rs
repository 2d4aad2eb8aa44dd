use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rounding::{float_round, RoundingMethod};

/// Where a unit sits relative to its category's reference unit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UomType {
    Bigger,
    Reference,
    Smaller,
}

/// A unit of measure.
///
/// `factor` is how many of this unit make one reference unit of the
/// category: a dozen has factor `1/12`, a gram has factor `1000` when the
/// kilogram is the reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnitOfMeasure {
    pub id: Uuid,
    pub name: String,
    pub category_id: Uuid,
    pub uom_type: UomType,
    pub factor: f64,
    #[serde(default = "default_rounding")]
    pub rounding: f64,
}

fn default_rounding() -> f64 {
    0.01
}

impl UnitOfMeasure {
    pub fn display_name(&self) -> &str {
        &self.name
    }

    pub fn is_bigger(&self) -> bool {
        self.uom_type == UomType::Bigger
    }

    pub fn same_category(&self, other: &UnitOfMeasure) -> bool {
        self.category_id == other.category_id
    }

    /// Convert `quantity` expressed in this unit into `target`, rounded up to
    /// the target's precision.
    pub fn to(&self, target: &UnitOfMeasure, quantity: f64) -> Result<f64, UomError> {
        if !self.same_category(target) {
            return Err(UomError::CategoryMismatch {
                from: self.name.clone(),
                to: target.name.clone(),
            });
        }
        for unit in [self, target] {
            if !(unit.factor.is_finite() && unit.factor > 0.0) {
                return Err(UomError::InvalidFactor {
                    unit: unit.name.clone(),
                    factor: unit.factor,
                });
            }
        }

        let amount = quantity / self.factor * target.factor;
        Ok(float_round(amount, target.rounding, RoundingMethod::Up))
    }

    /// How many `base` units are contained in one of this unit.
    pub fn ratio_to(&self, base: &UnitOfMeasure) -> Result<f64, UomError> {
        self.to(base, 1.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UomError {
    #[error("Cannot convert {from} to {to}: units belong to different categories")]
    CategoryMismatch { from: String, to: String },

    #[error("Unit {unit} has an unusable factor {factor}")]
    InvalidFactor { unit: String, factor: f64 },
}

/// Every unit known to a catalog snapshot, keyed by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<UnitOfMeasure>", into = "Vec<UnitOfMeasure>")]
pub struct UnitTable {
    units: HashMap<Uuid, UnitOfMeasure>,
}

impl UnitTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, unit: UnitOfMeasure) {
        self.units.insert(unit.id, unit);
    }

    pub fn get(&self, id: &Uuid) -> Option<&UnitOfMeasure> {
        self.units.get(id)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn in_category<'a>(&'a self, category_id: Uuid) -> impl Iterator<Item = &'a UnitOfMeasure> + 'a {
        self.units.values().filter(move |u| u.category_id == category_id)
    }

    /// The "bigger" unit of a category with the smallest usable factor.
    /// Ties fall back to name, then id.
    pub fn preferred_bigger(&self, category_id: Uuid) -> Option<&UnitOfMeasure> {
        self.in_category(category_id)
            .filter(|u| u.is_bigger() && u.factor.is_finite() && u.factor > 0.0)
            .min_by(|a, b| {
                a.factor
                    .total_cmp(&b.factor)
                    .then_with(|| a.name.cmp(&b.name))
                    .then_with(|| a.id.cmp(&b.id))
            })
    }
}

impl From<Vec<UnitOfMeasure>> for UnitTable {
    fn from(units: Vec<UnitOfMeasure>) -> Self {
        let mut table = UnitTable::new();
        for unit in units {
            table.insert(unit);
        }
        table
    }
}

impl From<UnitTable> for Vec<UnitOfMeasure> {
    fn from(table: UnitTable) -> Self {
        let mut units: Vec<UnitOfMeasure> = table.units.into_values().collect();
        units.sort_by(|a, b| a.name.cmp(&b.name));
        units
    }
}

impl FromIterator<UnitOfMeasure> for UnitTable {
    fn from_iter<I: IntoIterator<Item = UnitOfMeasure>>(iter: I) -> Self {
        iter.into_iter().collect::<Vec<_>>().into()
    }
}
