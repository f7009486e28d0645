//! # Domain Models
//!
//! Canonical types for generated market series.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated ticker symbol |
//! | [`DailyPriceRecord`] | One OHLCV + fundamentals row per symbol and date |
//! | [`DateRange`] | Inclusive calendar range the series is spread over |
//!
//! Records are checked with [`DailyPriceRecord::validate`], which enforces
//! `low <= min(open, close) <= max(open, close) <= high`, non-negative
//! prices and a positive volume.

mod calendar;
mod record;
mod symbol;

pub use calendar::{format_date, parse_date, parse_timestamp, DateRange};
pub use record::DailyPriceRecord;
pub use symbol::Symbol;
