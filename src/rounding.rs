use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundingMode {
    /// Round half away from zero (2.5 -> 3, -2.5 -> -3).
    #[default]
    HalfUp,
    /// Round half to even (2.5 -> 2, 3.5 -> 4). Keeps sums of many small
    /// allocations from drifting upward.
    Bankers,
}

impl RoundingMode {
    fn strategy(self) -> RoundingStrategy {
        match self {
            RoundingMode::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            RoundingMode::Bankers => RoundingStrategy::MidpointNearestEven,
        }
    }
}

/// The shortest decimal that reads back as `value`, so `1.005` is the decimal 1.005
/// rather than the binary value just below it. `None` for NaN, infinities and
/// magnitudes outside `Decimal`'s range.
pub fn to_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    value
        .to_string()
        .parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_f64(value))
}

/// The `f64` nearest to `value`, with negative zero folded into zero.
pub fn from_decimal(value: Decimal) -> f64 {
    let converted = value
        .to_string()
        .parse::<f64>()
        .ok()
        .or_else(|| value.to_f64())
        .unwrap_or_default();

    if converted == 0.0 {
        0.0
    } else {
        converted
    }
}

pub fn round_decimal(value: Decimal, precision: u32, mode: RoundingMode) -> Decimal {
    value.round_dp_with_strategy(precision, mode.strategy())
}

/// Rounds `value` to `precision` decimal places using `mode`. Values that have no
/// decimal form are returned unchanged.
pub fn round_number(value: f64, precision: u32, mode: RoundingMode) -> f64 {
    match to_decimal(value) {
        Some(decimal) => from_decimal(round_decimal(decimal, precision, mode)),
        None => value,
    }
}

/// Two decimal places, half-up.
pub fn round_currency(value: f64) -> f64 {
    round_number(value, 2, RoundingMode::HalfUp)
}
