//! # Tickforge Core
//!
//! Domain types and the synthetic series generator for tickforge.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`backup`] | CSV backup written before a load and read back for retries |
//! | [`config`] | Environment-derived pipeline configuration and destinations |
//! | [`domain`] | Symbols, daily price records and date ranges |
//! | [`error`] | Validation, configuration and backup errors |
//! | [`generator`] | Random-walk OHLCV and fundamentals generator |
//! | [`summary`] | Headline statistics for a generated series |
//! | [`universe`] | Symbol universe with base prices, volumes and sectors |
//!
//! ## Pipeline
//!
//! ```text
//! PipelineConfig ──▶ MarketSeriesGenerator ──▶ Vec<DailyPriceRecord>
//!                                                  │
//!                          ┌───────────────────────┼─────────────────────┐
//!                          ▼                       ▼                     ▼
//!                   SeriesSummary           backup::write_csv     Warehouse::replace_all
//! ```
//!
//! Generation is a pure function of its inputs and the random source, so a
//! fixed seed and run timestamp reproduce the same series.

pub mod backup;
pub mod config;
pub mod domain;
pub mod error;
pub mod generator;
pub mod summary;
pub mod universe;

pub use config::{Destination, PipelineConfig};
pub use domain::{format_date, parse_date, parse_timestamp, DailyPriceRecord, DateRange, Symbol};
pub use error::{BackupError, ConfigurationError, ValidationError};
pub use generator::{
    allocate_rows, FundamentalsConfig, GeneratorConfig, MarketSeriesGenerator, RandomWalk,
    ValueRange,
};
pub use summary::SeriesSummary;
pub use universe::Universe;
