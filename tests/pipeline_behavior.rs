//! End-to-end behaviour of the generate, back up and load pipeline.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::json;
use tempfile::tempdir;
use tickforge_core::ConfigurationError;
use tickforge_tests::*;
use tickforge_warehouse::sample_queries;

fn config_from(pairs: &[(&str, String)]) -> PipelineConfig {
    let pairs: Vec<(String, String)> = pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), value.clone()))
        .collect();
    PipelineConfig::from_lookup(move |key| {
        pairs
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.clone())
    })
    .expect("config parses")
}

#[test]
fn thirty_rows_over_three_symbols_land_in_the_warehouse() {
    // Given: an environment asking for 30 rows into a scratch home
    let temp = tempdir().expect("tempdir");
    let config = config_from(&[
        ("TICKFORGE_PROJECT", PROJECT.to_owned()),
        ("TICKFORGE_NUM_ROWS", String::from("30")),
        ("TICKFORGE_SEED", String::from("30")),
        ("TICKFORGE_HOME", temp.path().join("home").display().to_string()),
        ("TICKFORGE_BACKUP_DIR", temp.path().join("backups").display().to_string()),
    ]);
    let destination = config.destination().expect("destination resolves");
    let universe = universe_of(&["TSLA", "NFLX", "SNAP"]);
    let range = one_year();

    // When: the series is generated, backed up and loaded
    let records = seeded_generator(config.num_rows, config.seed.expect("seeded"))
        .generate(&universe, &range, run_timestamp())
        .expect("generation succeeds");
    backup::write_csv(&config.backup_path(), &records).expect("backup written");

    let warehouse = Warehouse::open(WarehouseConfig::for_project(&config.home, PROJECT))
        .expect("warehouse opens");
    let table = warehouse.ensure_schema(&destination).expect("schema ensured");
    let loaded = warehouse.replace_all(&table, &records).expect("rows loaded");

    // Then: each symbol has ten distinct dates within the range
    assert_eq!(loaded, 30);
    let mut dates: BTreeMap<&str, BTreeSet<_>> = BTreeMap::new();
    for record in &records {
        assert!(range.contains(record.date));
        dates.entry(record.symbol.as_str()).or_default().insert(record.date);
    }
    assert!(dates.values().all(|per_symbol| per_symbol.len() == 10));

    // And: sectors come from the mapping or fall back to Technology
    let sectors: BTreeMap<&str, Option<&str>> = records
        .iter()
        .map(|r| (r.symbol.as_str(), r.sector.as_deref()))
        .collect();
    assert_eq!(sectors["TSLA"], Some("Automotive"));
    assert_eq!(sectors["NFLX"], Some("Entertainment"));
    assert_eq!(sectors["SNAP"], Some("Technology"));

    // And: the warehouse agrees with the summary
    let summary = SeriesSummary::from_records(&records);
    assert_eq!(summary.row_count, 30);
    assert_eq!(
        single_value(
            &warehouse,
            "SELECT MIN(close_price) FROM hist_stock_market.daily_prices"
        ),
        json!(summary.min_close.expect("min close"))
    );
    assert_eq!(
        single_value(
            &warehouse,
            "SELECT CAST(MAX(\"date\") AS VARCHAR) FROM hist_stock_market.daily_prices"
        ),
        json!(summary.last_date.expect("last date"))
    );

    // And: the backup sits where the run said it would
    assert!(config
        .backup_path()
        .ends_with("backups/stock_market_data_30_rows.csv"));
    assert!(config.backup_path().exists());
}

#[test]
fn a_backup_can_be_reloaded_after_a_lost_warehouse() {
    // Given: a run whose backup was written but whose warehouse is gone
    let temp = tempdir().expect("tempdir");
    let records = seeded_generator(60, 99)
        .generate(&universe_of(&["AAPL", "AMD"]), &one_year(), run_timestamp())
        .expect("generation succeeds");
    let backup_path = temp.path().join("stock_market_data_60_rows.csv");
    backup::write_csv(&backup_path, &records).expect("backup written");

    // When: the backup is read back and loaded into a fresh warehouse
    let restored = backup::read_csv(&backup_path).expect("backup reads");
    let warehouse = scratch_warehouse(&temp.path().join("fresh-home"));
    let table = warehouse.ensure_schema(&destination("daily_prices")).expect("schema");
    warehouse.replace_all(&table, &restored).expect("reload");

    // Then: the restored series is identical and fully loaded
    assert_eq!(restored, records);
    assert_eq!(warehouse.row_count(&table).expect("count"), 60);
}

#[test]
fn sample_queries_run_against_a_fresh_load() {
    // Given: a loaded table containing AAPL
    let temp = tempdir().expect("tempdir");
    let warehouse = scratch_warehouse(temp.path());
    let destination = destination("daily_prices");
    let table = warehouse.ensure_schema(&destination).expect("schema");
    let records = seeded_generator(120, 4)
        .generate(&universe_of(&["AAPL", "MSFT"]), &one_year(), run_timestamp())
        .expect("generation succeeds");
    warehouse.replace_all(&table, &records).expect("load");

    // When / Then: every suggested query runs and returns rows
    for sample in sample_queries(&destination) {
        let result = warehouse
            .execute_query(&sample.sql, QueryGuardrails::default(), false)
            .unwrap_or_else(|error| panic!("{}: {error}", sample.title));
        assert!(result.row_count > 0, "{} returned nothing", sample.title);
    }

    // And: the per-symbol averages come highest first
    let by_symbol = warehouse
        .execute_query(&sample_queries(&destination)[1].sql, QueryGuardrails::default(), false)
        .expect("average close by symbol");
    let averages: Vec<f64> = by_symbol
        .rows
        .iter()
        .map(|row| row[1].as_f64().expect("numeric average"))
        .collect();
    assert_eq!(averages.len(), 2);
    assert!(averages[0] >= averages[1]);

    // And: the analysis views agree with the raw table
    assert_eq!(
        single_value(
            &warehouse,
            "SELECT SUM(trading_days) FROM hist_stock_market.vw_daily_prices_avg_close_by_symbol"
        ),
        json!(120)
    );
}

#[test]
fn a_destination_cannot_be_resolved_without_a_project() {
    // Given: no project in the environment
    let config = config_from(&[("TICKFORGE_NUM_ROWS", String::from("30"))]);

    // When / Then: resolving the destination is a configuration error
    assert!(matches!(
        config.destination(),
        Err(ConfigurationError::MissingProject)
    ));
}

#[test]
fn project_falls_back_to_cloud_environment_variables() {
    let config = config_from(&[("GCP_PROJECT", String::from("legacy-project"))]);
    assert_eq!(config.project.as_deref(), Some("legacy-project"));

    let config = config_from(&[
        ("GOOGLE_CLOUD_PROJECT", String::from("cloud-project")),
        ("GCP_PROJECT", String::from("legacy-project")),
    ]);
    assert_eq!(config.project.as_deref(), Some("cloud-project"));
}
