use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{CoreError, CoreResult};

pub const DEFAULT_CURRENCY: &str = "usd";

/// ISO 4217 currency code, stored lowercase as the processor expects it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    pub fn parse(code: &str) -> CoreResult<Self> {
        let code = code.trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CoreError::ValidationError(format!(
                "Invalid currency code: '{}'",
                code
            )));
        }
        Ok(Self(code.to_ascii_lowercase()))
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self(DEFAULT_CURRENCY.to_string())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Currency {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.0
    }
}

/// Convert a decimal order total into integer minor units (cents).
///
/// The total is scaled by 100 and rounded half away from zero, so
/// `19.995` becomes `2000` and `10.004` becomes `1000`. Negative totals are
/// rejected.
pub fn to_minor_units(total: Decimal) -> CoreResult<i64> {
    if total < Decimal::ZERO {
        return Err(CoreError::ValidationError(format!(
            "Order total cannot be negative: {}",
            total
        )));
    }

    total
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|scaled| scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|cents| cents.to_i64())
        .ok_or_else(|| CoreError::InternalError(format!("Order total out of range: {}", total)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_whole_and_fractional_totals() {
        assert_eq!(to_minor_units(dec!(10)).unwrap(), 1000);
        assert_eq!(to_minor_units(dec!(19.99)).unwrap(), 1999);
        assert_eq!(to_minor_units(dec!(0)).unwrap(), 0);
    }

    #[test]
    fn test_sub_cent_totals_round_half_away_from_zero() {
        assert_eq!(to_minor_units(dec!(19.995)).unwrap(), 2000);
        assert_eq!(to_minor_units(dec!(10.004)).unwrap(), 1000);
        assert_eq!(to_minor_units(dec!(0.125)).unwrap(), 13);
    }

    #[test]
    fn test_negative_total_rejected() {
        let result = to_minor_units(dec!(-1.00));
        assert!(matches!(result, Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn test_currency_normalized() {
        assert_eq!(Currency::parse("EUR").unwrap().code(), "eur");
        assert_eq!(Currency::parse(" usd ").unwrap().code(), "usd");
        assert_eq!(Currency::default().code(), DEFAULT_CURRENCY);
    }

    #[test]
    fn test_invalid_currency() {
        assert!(Currency::parse("").is_err());
        assert!(Currency::parse("dollars").is_err());
        assert!(Currency::parse("us1").is_err());
    }

    #[test]
    fn test_currency_deserializes_through_validation() {
        let currency: Currency = serde_json::from_str("\"GBP\"").unwrap();
        assert_eq!(currency.code(), "gbp");
        assert!(serde_json::from_str::<Currency>("\"pounds\"").is_err());
    }
}
