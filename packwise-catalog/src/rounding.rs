use serde::{Deserialize, Serialize};

/// How a value is brought onto a rounding grid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundingMethod {
    HalfUp,
    Up,
}

/// Round `value` to a multiple of `precision`.
///
/// The normalized value is nudged by one unit of its own magnitude at the
/// 52nd bit before rounding, so `1.0 / (1.0 / 12.0)` lands on 12 instead of
/// creeping up to the next step when rounding `Up`.
pub fn float_round(value: f64, precision: f64, method: RoundingMethod) -> f64 {
    if !value.is_finite() || value == 0.0 || !(precision > 0.0) {
        return value;
    }

    let normalized = value / precision;
    let sign = normalized.signum();
    let epsilon = 2f64.powf(normalized.abs().log2() - 52.0);

    let rounded = match method {
        RoundingMethod::HalfUp => (normalized + sign * epsilon).round(),
        RoundingMethod::Up => (normalized - sign * epsilon).abs().ceil() * sign,
    };

    snap(rounded * precision, precision)
}

/// Number of decimal digits a rounding precision carries (0.01 -> 2).
pub fn precision_digits(precision: f64) -> i32 {
    if !(precision > 0.0) || precision >= 1.0 {
        return 0;
    }
    (-precision.log10()).ceil() as i32
}

fn snap(value: f64, precision: f64) -> f64 {
    let scale = 10f64.powi(precision_digits(precision));
    (value * scale).round() / scale
}
