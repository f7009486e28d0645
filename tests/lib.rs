//! Shared fixtures for tickforge behaviour tests.

use std::path::Path;

pub use tickforge_core::{
    allocate_rows, backup, DailyPriceRecord, DateRange, Destination, GeneratorConfig,
    MarketSeriesGenerator, PipelineConfig, SeriesSummary, Symbol, Universe,
};
pub use tickforge_warehouse::{QueryGuardrails, Warehouse, WarehouseConfig, WarehouseError};

use time::macros::{date, datetime};
use time::OffsetDateTime;

pub const PROJECT: &str = "behaviour-project";

/// The run timestamp every fixture series is stamped with.
pub fn run_timestamp() -> OffsetDateTime {
    datetime!(2025-03-14 12:00:00 UTC)
}

/// One year ending on the run date.
pub fn one_year() -> DateRange {
    DateRange::trailing(date!(2025 - 03 - 14), 365).expect("valid range")
}

/// The default universe restricted to `names`, in that order.
pub fn universe_of(names: &[&str]) -> Universe {
    Universe {
        symbols: names
            .iter()
            .map(|name| Symbol::parse(name).expect("valid symbol"))
            .collect(),
        ..Universe::default()
    }
}

pub fn seeded_generator(num_rows: usize, seed: u64) -> MarketSeriesGenerator {
    MarketSeriesGenerator::new(GeneratorConfig {
        num_rows,
        seed: Some(seed),
        ..GeneratorConfig::default()
    })
    .expect("valid generator config")
}

pub fn destination(table: &str) -> Destination {
    Destination::new(PROJECT, "hist_stock_market", table).expect("valid destination")
}

/// A warehouse for [`PROJECT`] under `home`.
pub fn scratch_warehouse(home: &Path) -> Warehouse {
    Warehouse::open(WarehouseConfig::for_project(home, PROJECT)).expect("warehouse opens")
}

pub fn single_value(warehouse: &Warehouse, sql: &str) -> serde_json::Value {
    let result = warehouse
        .execute_query(sql, QueryGuardrails::default(), false)
        .expect("query succeeds");
    result.rows[0][0].clone()
}
