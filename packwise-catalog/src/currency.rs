use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rounding::{float_round, RoundingMethod};

/// The company currency used to round packaging prices.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Currency {
    pub id: Uuid,
    pub code: String,
    pub symbol: String,
    /// Smallest representable step, e.g. `0.01` for cents.
    #[serde(default = "default_rounding")]
    pub rounding: f64,
}

fn default_rounding() -> f64 {
    0.01
}

impl Currency {
    pub fn new(code: &str, symbol: &str, rounding: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: code.to_string(),
            symbol: symbol.to_string(),
            rounding,
        }
    }

    /// Round an amount to the currency's minor unit, half-up.
    pub fn round(&self, amount: f64) -> f64 {
        float_round(amount, self.rounding, RoundingMethod::HalfUp)
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::new("USD", "$", 0.01)
    }
}
