//! Destination table layout and idempotent creation.

use ::duckdb::{Connection, ToSql};
use tickforge_core::Destination;

/// One column of the daily price table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub nullable: bool,
}

const fn required(name: &'static str, sql_type: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        sql_type,
        nullable: false,
    }
}

const fn optional(name: &'static str, sql_type: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        sql_type,
        nullable: true,
    }
}

/// Columns in storage order, matching the CSV backup header.
pub const COLUMNS: [ColumnSpec; 12] = [
    required("date", "DATE"),
    required("symbol", "VARCHAR"),
    required("open_price", "DOUBLE"),
    required("high_price", "DOUBLE"),
    required("low_price", "DOUBLE"),
    required("close_price", "DOUBLE"),
    required("volume", "BIGINT"),
    optional("market_cap", "DOUBLE"),
    optional("pe_ratio", "DOUBLE"),
    optional("dividend_yield", "DOUBLE"),
    optional("sector", "VARCHAR"),
    required("created_at", "TIMESTAMP"),
];

pub const TABLE_COMMENT: &str =
    "Synthetic daily OHLCV prices with fundamentals, one row per symbol and trading date";

/// Whether `ensure` had to create anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct SchemaStatus {
    pub dataset_created: bool,
    pub table_created: bool,
}

/// Quote a validated identifier for interpolation into DDL.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub(crate) fn qualified_table(destination: &Destination) -> String {
    format!(
        "{}.{}",
        quote_ident(destination.dataset()),
        quote_ident(destination.table())
    )
}

pub(crate) fn column_list() -> String {
    COLUMNS
        .iter()
        .map(|column| quote_ident(column.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn create_table_sql(destination: &Destination) -> String {
    let columns = COLUMNS
        .iter()
        .map(|column| {
            let constraint = if column.nullable { "" } else { " NOT NULL" };
            format!("    {} {}{constraint}", quote_ident(column.name), column.sql_type)
        })
        .collect::<Vec<_>>()
        .join(",\n");
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{columns}\n)",
        qualified_table(destination)
    )
}

fn schema_exists(connection: &Connection, dataset: &str) -> Result<bool, ::duckdb::Error> {
    let params: [&dyn ToSql; 1] = [&dataset];
    let count: i64 = connection.query_row(
        "SELECT COUNT(*) FROM information_schema.schemata \
         WHERE catalog_name = current_database() AND schema_name = ?",
        params.as_slice(),
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub(crate) fn table_exists(
    connection: &Connection,
    destination: &Destination,
) -> Result<bool, ::duckdb::Error> {
    let params: [&dyn ToSql; 2] = [&destination.dataset(), &destination.table()];
    let count: i64 = connection.query_row(
        "SELECT COUNT(*) FROM information_schema.tables \
         WHERE table_catalog = current_database() AND table_schema = ? AND table_name = ?",
        params.as_slice(),
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Whether the existing table's column names match [`COLUMNS`] in order.
pub(crate) fn has_standard_layout(
    connection: &Connection,
    destination: &Destination,
) -> Result<bool, ::duckdb::Error> {
    let params: [&dyn ToSql; 2] = [&destination.dataset(), &destination.table()];
    let mut statement = connection.prepare(
        "SELECT column_name FROM information_schema.columns \
         WHERE table_catalog = current_database() AND table_schema = ? AND table_name = ? \
         ORDER BY ordinal_position",
    )?;
    let names = statement
        .query_map(params.as_slice(), |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names.iter().map(String::as_str).eq(COLUMNS.iter().map(|c| c.name)))
}

/// Create the dataset schema and table if absent. Existing tables are left as they are.
pub(crate) fn ensure(
    connection: &Connection,
    destination: &Destination,
) -> Result<SchemaStatus, ::duckdb::Error> {
    let dataset_created = !schema_exists(connection, destination.dataset())?;
    let table_created = dataset_created || !table_exists(connection, destination)?;

    connection.execute_batch(&format!(
        "CREATE SCHEMA IF NOT EXISTS {}",
        quote_ident(destination.dataset())
    ))?;
    connection.execute_batch(&create_table_sql(destination))?;

    if table_created {
        connection.execute_batch(&format!(
            "COMMENT ON TABLE {} IS '{}'",
            qualified_table(destination),
            TABLE_COMMENT.replace('\'', "''")
        ))?;
    }

    Ok(SchemaStatus {
        dataset_created,
        table_created,
    })
}
