//! # Tickforge Warehouse
//!
//! `DuckDB` storage for generated daily price series.
//!
//! ## Layout
//!
//! Each project is one database file at `<home>/warehouse/<project>.duckdb`.
//! A dataset is a schema inside that file and holds the destination table
//! plus its analysis views, so a destination keeps its
//! `project.dataset.table` shape.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tickforge_core::Destination;
//! use tickforge_warehouse::{Warehouse, WarehouseConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let destination = Destination::new("demo-project", "hist_stock_market", "daily_prices")?;
//!     let warehouse = Warehouse::open(WarehouseConfig::for_project(".tickforge", "demo-project"))?;
//!
//!     let table = warehouse.ensure_schema(&destination)?;
//!     let loaded = warehouse.replace_all(&table, &[])?;
//!     println!("{} now holds {loaded} rows", table.destination());
//!     Ok(())
//! }
//! ```
//!
//! ## Loading
//!
//! [`Warehouse::replace_all`] deletes every existing row and inserts the new
//! series in one transaction. Values travel as statement parameters; only
//! validated identifiers are spliced into SQL.

pub mod duckdb;
pub mod query;
pub mod schema;
pub mod views;

use std::fs;
use std::path::{Path, PathBuf};

use ::duckdb::{Connection, ToSql};
use serde::Serialize;
use thiserror::Error;
use tickforge_core::{format_date, DailyPriceRecord, Destination};
use time::macros::format_description;
use time::UtcOffset;
use tracing::{debug, info, warn};

pub use duckdb::{AccessMode, ConnectionPool, PooledConnection};
pub use query::{QueryGuardrails, QueryResult, SqlColumn};
pub use schema::{ColumnSpec, SchemaStatus, COLUMNS};
pub use views::{sample_queries, SampleQuery};

#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("query rejected: {0}")]
    QueryRejected(String),

    #[error("query timed out after {timeout_ms}ms")]
    QueryTimeout { timeout_ms: u64 },

    /// The destination names a different project than the open database.
    #[error("destination project `{requested}` does not match warehouse project `{opened}`")]
    ProjectMismatch { requested: String, opened: String },

    #[error("a created_at timestamp could not be formatted: {0}")]
    Timestamp(#[from] time::error::Format),
}

#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Project this database file belongs to.
    pub project: String,
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
    /// Idle connections kept per access mode.
    pub max_pool_size: usize,
}

impl WarehouseConfig {
    /// Database for `project` under the tickforge home directory.
    pub fn for_project(home: impl AsRef<Path>, project: &str) -> Self {
        Self {
            project: project.to_owned(),
            db_path: home
                .as_ref()
                .join("warehouse")
                .join(format!("{project}.duckdb")),
            max_pool_size: 4,
        }
    }
}

/// A destination table that [`Warehouse::ensure_schema`] has verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableHandle {
    destination: Destination,
    status: SchemaStatus,
}

impl TableHandle {
    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    /// What `ensure_schema` created on the call that produced this handle.
    pub fn status(&self) -> SchemaStatus {
        self.status
    }

    fn sql_name(&self) -> String {
        schema::qualified_table(&self.destination)
    }
}

/// A column as reported by the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

pub struct Warehouse {
    config: WarehouseConfig,
    pool: ConnectionPool,
}

impl Warehouse {
    /// Open (or create) the database file.
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let pool = ConnectionPool::new(config.db_path.clone(), config.max_pool_size);
        // fail early on a corrupt or locked file
        drop(pool.acquire(AccessMode::ReadWrite)?);
        Ok(Self { config, pool })
    }

    pub fn project(&self) -> &str {
        &self.config.project
    }

    pub fn db_path(&self) -> &Path {
        self.pool.db_path()
    }

    /// Create the dataset, table, table comment and views if absent.
    ///
    /// Safe to call repeatedly. An existing table is used as-is even if its
    /// columns differ; such a table gets no analysis views.
    pub fn ensure_schema(&self, destination: &Destination) -> Result<TableHandle, WarehouseError> {
        if destination.project() != self.config.project {
            return Err(WarehouseError::ProjectMismatch {
                requested: destination.project().to_owned(),
                opened: self.config.project.clone(),
            });
        }

        let connection = self.pool.acquire(AccessMode::ReadWrite)?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result: Result<_, WarehouseError> = (|| {
            let status = schema::ensure(&connection, destination)?;
            // views bind at creation, so foreign layouts get none
            if schema::has_standard_layout(&connection, destination)? {
                views::create_views(&connection, destination)?;
            } else {
                warn!(table = %destination, "table layout differs; analysis views skipped");
            }
            Ok(status)
        })();
        let status = finalize_transaction(&connection, result)?;

        if status.dataset_created {
            info!(dataset = destination.dataset(), "created dataset");
        } else {
            info!(dataset = destination.dataset(), "dataset already exists");
        }
        if status.table_created {
            info!(table = %destination, "created table");
        } else {
            info!(table = %destination, "table already exists");
        }

        Ok(TableHandle {
            destination: destination.clone(),
            status,
        })
    }

    /// Replace the table contents with `records` in a single transaction.
    ///
    /// Returns the number of rows written. On any failure the transaction is
    /// rolled back and the previous contents remain.
    pub fn replace_all(
        &self,
        table: &TableHandle,
        records: &[DailyPriceRecord],
    ) -> Result<usize, WarehouseError> {
        let target = table.sql_name();
        let connection = self.pool.acquire(AccessMode::ReadWrite)?;
        connection.execute_batch("BEGIN TRANSACTION")?;

        let result: Result<_, WarehouseError> = (|| {
            let removed = connection.execute(&format!("DELETE FROM {target}"), [])?;
            debug!(table = %table.destination, removed, "cleared existing rows");

            let placeholders = schema::COLUMNS
                .iter()
                .map(|column| match column.sql_type {
                    "DATE" => "CAST(? AS DATE)",
                    "TIMESTAMP" => "CAST(? AS TIMESTAMP)",
                    _ => "?",
                })
                .collect::<Vec<_>>()
                .join(", ");
            let mut insert = connection.prepare(&format!(
                "INSERT INTO {target} ({}) VALUES ({placeholders})",
                schema::column_list()
            ))?;

            for record in records {
                let date = format_date(record.date);
                let created_at = timestamp_literal(record)?;
                let params: [&dyn ToSql; 12] = [
                    &date,
                    &record.symbol.as_str(),
                    &record.open_price,
                    &record.high_price,
                    &record.low_price,
                    &record.close_price,
                    &record.volume,
                    &record.market_cap,
                    &record.pe_ratio,
                    &record.dividend_yield,
                    &record.sector,
                    &created_at,
                ];
                insert.execute(params.as_slice())?;
            }
            Ok(records.len())
        })();

        let written = finalize_transaction(&connection, result)?;
        info!(table = %table.destination, rows = written, "loaded rows");
        Ok(written)
    }

    /// Columns of the table in ordinal order.
    pub fn table_columns(&self, table: &TableHandle) -> Result<Vec<ColumnInfo>, WarehouseError> {
        let connection = self.pool.acquire(AccessMode::ReadOnly)?;
        let params: [&dyn ToSql; 2] = [&table.destination.dataset(), &table.destination.table()];
        let mut statement = connection.prepare(
            "SELECT column_name, data_type, is_nullable FROM information_schema.columns \
             WHERE table_catalog = current_database() AND table_schema = ? AND table_name = ? \
             ORDER BY ordinal_position",
        )?;
        let columns = statement
            .query_map(params.as_slice(), |row| {
                let nullable: String = row.get(2)?;
                Ok(ColumnInfo {
                    name: row.get(0)?,
                    data_type: row.get(1)?,
                    nullable: nullable.eq_ignore_ascii_case("YES"),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }

    pub fn row_count(&self, table: &TableHandle) -> Result<u64, WarehouseError> {
        let connection = self.pool.acquire(AccessMode::ReadOnly)?;
        let count: i64 = connection.query_row(
            &format!("SELECT COUNT(*) FROM {}", table.sql_name()),
            [],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Run ad-hoc SQL against the project database.
    ///
    /// Only a single `SELECT`-like statement is accepted unless
    /// `allow_write` is set.
    pub fn execute_query(
        &self,
        sql: &str,
        guardrails: QueryGuardrails,
        allow_write: bool,
    ) -> Result<QueryResult, WarehouseError> {
        guardrails.validate()?;
        let (statement, kind) = query::classify(sql, allow_write)?;
        if allow_write {
            let connection = self.pool.acquire(AccessMode::ReadWrite)?;
            return query::run(&connection, statement, kind, guardrails);
        }

        // a data-modifying CTE still classifies as a read, so nothing here commits
        let connection = self.pool.acquire(AccessMode::ReadOnly)?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = query::run(&connection, statement, kind, guardrails);
        discard_transaction(&connection, result)
    }
}

fn timestamp_literal(record: &DailyPriceRecord) -> Result<String, time::error::Format> {
    record.created_at.to_offset(UtcOffset::UTC).format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]"
    ))
}

fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

fn discard_transaction<T>(
    connection: &Connection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    let rolled_back = connection.execute_batch("ROLLBACK");
    let value = result?;
    rolled_back?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tickforge_core::Symbol;
    use time::macros::{date, datetime};

    fn open(home: &Path) -> Warehouse {
        Warehouse::open(WarehouseConfig::for_project(home, "demo-project")).expect("warehouse open")
    }

    fn destination() -> Destination {
        Destination::new("demo-project", "hist_stock_market", "daily_prices").expect("destination")
    }

    fn record(symbol: &str, close: f64) -> DailyPriceRecord {
        DailyPriceRecord {
            date: date!(2024 - 06 - 03),
            symbol: Symbol::parse(symbol).expect("symbol"),
            open_price: close - 1.0,
            high_price: close + 2.0,
            low_price: close - 2.0,
            close_price: close,
            volume: 250_000,
            market_cap: Some(2.5e9),
            pe_ratio: None,
            dividend_yield: Some(0.0),
            sector: Some(String::from("Technology")),
            created_at: datetime!(2024-06-04 09:15:30 UTC),
        }
    }

    #[test]
    fn database_file_lives_under_project_name() {
        let config = WarehouseConfig::for_project("/data/tf", "demo-project");
        assert_eq!(
            config.db_path,
            PathBuf::from("/data/tf/warehouse/demo-project.duckdb")
        );
    }

    #[test]
    fn ensure_schema_creates_table_with_expected_columns() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open(temp.path());

        let table = warehouse.ensure_schema(&destination()).expect("ensure");
        assert!(table.status().table_created);

        let columns = warehouse.table_columns(&table).expect("columns");
        let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
        let expected: Vec<_> = COLUMNS.iter().map(|c| c.name).collect();
        assert_eq!(names, expected);
        let volume = columns.iter().find(|c| c.name == "volume").expect("volume");
        assert_eq!(volume.data_type, "BIGINT");
        assert!(!volume.nullable);
        assert!(columns.iter().find(|c| c.name == "pe_ratio").expect("pe").nullable);
    }

    #[test]
    fn ensure_schema_rejects_other_project() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open(temp.path());
        let other = Destination::new("other-project", "ds", "t").expect("destination");

        let error = warehouse.ensure_schema(&other).expect_err("mismatch");
        assert!(matches!(error, WarehouseError::ProjectMismatch { .. }));
    }

    #[test]
    fn replace_all_replaces_prior_rows() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open(temp.path());
        let table = warehouse.ensure_schema(&destination()).expect("ensure");

        let written = warehouse
            .replace_all(&table, &[record("AAPL", 150.0), record("MSFT", 300.0)])
            .expect("first load");
        assert_eq!(written, 2);
        assert_eq!(warehouse.row_count(&table).expect("count"), 2);

        let written = warehouse
            .replace_all(&table, &[record("TSLA", 210.0)])
            .expect("second load");
        assert_eq!(written, 1);
        assert_eq!(warehouse.row_count(&table).expect("count"), 1);
    }

    #[test]
    fn replace_all_with_no_records_empties_the_table() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open(temp.path());
        let table = warehouse.ensure_schema(&destination()).expect("ensure");
        warehouse
            .replace_all(&table, &[record("AAPL", 150.0)])
            .expect("load");

        assert_eq!(warehouse.replace_all(&table, &[]).expect("clear"), 0);
        assert_eq!(warehouse.row_count(&table).expect("count"), 0);
    }

    #[test]
    fn replace_all_round_trips_column_values() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open(temp.path());
        let table = warehouse.ensure_schema(&destination()).expect("ensure");
        warehouse
            .replace_all(&table, &[record("NVDA", 120.5)])
            .expect("load");

        let result = warehouse
            .execute_query(
                "SELECT \"date\", symbol, close_price, volume, pe_ratio, sector, created_at \
                 FROM hist_stock_market.daily_prices",
                QueryGuardrails::default(),
                false,
            )
            .expect("select");
        assert_eq!(result.row_count, 1);
        assert_eq!(result.value(0, "date"), Some(&serde_json::json!("2024-06-03")));
        assert_eq!(result.value(0, "symbol"), Some(&serde_json::json!("NVDA")));
        assert_eq!(result.value(0, "close_price"), Some(&serde_json::json!(120.5)));
        assert_eq!(result.value(0, "volume"), Some(&serde_json::json!(250_000)));
        assert_eq!(result.value(0, "pe_ratio"), Some(&serde_json::Value::Null));
        assert_eq!(
            result.value(0, "created_at"),
            Some(&serde_json::json!("2024-06-04T09:15:30Z"))
        );
    }

    #[test]
    fn read_only_mode_rejects_write_query() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open(temp.path());

        let error = warehouse
            .execute_query("DROP SCHEMA main", QueryGuardrails::default(), false)
            .expect_err("should reject");
        assert!(matches!(error, WarehouseError::QueryRejected(_)));
    }
}
