use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use super::calendar::{serde_date, serde_timestamp};
use crate::{Symbol, ValidationError};

/// One generated trading day for one symbol.
///
/// Field order matches the destination table's column order, which is also
/// the column order of the CSV backup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPriceRecord {
    #[serde(with = "serde_date")]
    pub date: Date,
    pub symbol: Symbol,
    pub open_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub close_price: f64,
    pub volume: i64,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub sector: Option<String>,
    #[serde(with = "serde_timestamp")]
    pub created_at: OffsetDateTime,
}

impl DailyPriceRecord {
    /// Check price ordering, sign and volume invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_non_negative("open_price", self.open_price)?;
        validate_non_negative("high_price", self.high_price)?;
        validate_non_negative("low_price", self.low_price)?;
        validate_non_negative("close_price", self.close_price)?;
        validate_optional_non_negative("market_cap", self.market_cap)?;
        validate_optional_non_negative("pe_ratio", self.pe_ratio)?;
        validate_optional_non_negative("dividend_yield", self.dividend_yield)?;

        if self.volume <= 0 {
            return Err(ValidationError::NonPositiveVolume {
                volume: self.volume,
            });
        }

        if self.high_price < self.low_price {
            return Err(ValidationError::InvalidPriceRange);
        }

        let body_low = self.open_price.min(self.close_price);
        let body_high = self.open_price.max(self.close_price);
        if body_low < self.low_price || body_high > self.high_price {
            return Err(ValidationError::InvalidPriceBounds);
        }

        Ok(())
    }
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

fn validate_optional_non_negative(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    match value {
        Some(value) => validate_non_negative(field, value),
        None => Ok(()),
    }
}
