//! Ad-hoc SQL with row and time limits.

use std::time::{Duration, Instant};

use ::duckdb::types::{TimeUnit, Value as DuckValue};
use ::duckdb::Connection;
use serde::Serialize;
use serde_json::{Number, Value};
use time::{Date, OffsetDateTime};

use crate::WarehouseError;

/// Limits applied to ad-hoc queries.
#[derive(Debug, Clone, Copy)]
pub struct QueryGuardrails {
    /// Rows returned before the result is marked truncated.
    pub max_rows: usize,
    /// Wall-clock budget, checked between rows.
    pub query_timeout_ms: u64,
}

impl Default for QueryGuardrails {
    fn default() -> Self {
        Self {
            max_rows: 10_000,
            query_timeout_ms: 5_000,
        }
    }
}

impl QueryGuardrails {
    pub(crate) fn validate(self) -> Result<(), WarehouseError> {
        if self.max_rows == 0 {
            return Err(WarehouseError::QueryRejected(String::from(
                "--max-rows must be greater than zero",
            )));
        }
        if self.query_timeout_ms == 0 {
            return Err(WarehouseError::QueryRejected(String::from(
                "--query-timeout-ms must be greater than zero",
            )));
        }
        Ok(())
    }

    fn deadline(self, started: Instant) -> Deadline {
        Deadline {
            started,
            budget: Duration::from_millis(self.query_timeout_ms),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Deadline {
    started: Instant,
    budget: Duration,
}

impl Deadline {
    fn check(self) -> Result<(), WarehouseError> {
        if self.started.elapsed() > self.budget {
            return Err(WarehouseError::QueryTimeout {
                timeout_ms: u64::try_from(self.budget.as_millis()).unwrap_or(u64::MAX),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SqlColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub r#type: String,
}

/// Rows of an ad-hoc query, values rendered as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub columns: Vec<SqlColumn>,
    pub rows: Vec<Vec<Value>>,
    pub row_count: usize,
    pub truncated: bool,
}

impl QueryResult {
    fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            row_count: 0,
            truncated: false,
        }
    }

    /// Value of `column` in row `row`, if both exist.
    #[must_use]
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.columns.iter().position(|c| c.name == column)?;
        self.rows.get(row)?.get(index)
    }
}

/// How a statement is allowed to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatementKind {
    Read,
    Write,
}

/// Trim the statement, drop trailing semicolons and classify it.
///
/// Reads must be a single `SELECT`-like statement. Anything else needs
/// `allow_write`.
pub(crate) fn classify(sql: &str, allow_write: bool) -> Result<(&str, StatementKind), WarehouseError> {
    let statement = sql.trim().trim_end_matches(';').trim_end();
    if statement.is_empty() {
        return Err(WarehouseError::QueryRejected(String::from(
            "query must not be empty",
        )));
    }

    let leading = statement
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    let read_like = matches!(
        leading.as_str(),
        "SELECT" | "WITH" | "EXPLAIN" | "SHOW" | "DESCRIBE" | "SUMMARIZE" | "FROM"
    );
    let single = !statement.contains(';');

    match (read_like && single, allow_write) {
        (true, _) => Ok((statement, StatementKind::Read)),
        (false, true) => Ok((statement, StatementKind::Write)),
        (false, false) if !single => Err(WarehouseError::QueryRejected(String::from(
            "multiple SQL statements are not allowed in read-only mode",
        ))),
        (false, false) => Err(WarehouseError::QueryRejected(String::from(
            "read-only mode accepts only SELECT/CTE queries; use --write for write statements",
        ))),
    }
}

pub(crate) fn run(
    connection: &Connection,
    statement: &str,
    kind: StatementKind,
    guardrails: QueryGuardrails,
) -> Result<QueryResult, WarehouseError> {
    let deadline = guardrails.deadline(Instant::now());
    if kind == StatementKind::Write {
        connection.execute_batch(statement)?;
        deadline.check()?;
        return Ok(QueryResult::empty());
    }

    let mut prepared = connection.prepare(statement)?;
    // column metadata is only available once the statement has run
    drop(prepared.query([])?);
    let columns = (0..prepared.column_count())
        .map(|index| SqlColumn {
            name: prepared
                .column_name(index)
                .map_or_else(|_| format!("column{index}"), ToString::to_string),
            r#type: prepared.column_type(index).to_string(),
        })
        .collect::<Vec<_>>();

    let mut cursor = prepared.query([])?;
    let mut rows = Vec::new();
    let mut truncated = false;
    while let Some(row) = cursor.next()? {
        deadline.check()?;
        if rows.len() == guardrails.max_rows {
            truncated = true;
            break;
        }
        let mut values = Vec::with_capacity(columns.len());
        for index in 0..columns.len() {
            values.push(to_json(row.get::<_, DuckValue>(index)?));
        }
        rows.push(values);
    }
    deadline.check()?;

    Ok(QueryResult {
        columns,
        row_count: rows.len(),
        rows,
        truncated,
    })
}

const UNIX_EPOCH_JULIAN_DAY: i32 = 2_440_588;

fn to_json(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(value) => Value::Bool(value),
        DuckValue::TinyInt(value) => Value::Number(Number::from(value)),
        DuckValue::SmallInt(value) => Value::Number(Number::from(value)),
        DuckValue::Int(value) => Value::Number(Number::from(value)),
        DuckValue::BigInt(value) => Value::Number(Number::from(value)),
        DuckValue::HugeInt(value) => i64::try_from(value)
            .map(|v| Value::Number(Number::from(v)))
            .unwrap_or_else(|_| Value::String(value.to_string())),
        DuckValue::UTinyInt(value) => Value::Number(Number::from(value)),
        DuckValue::USmallInt(value) => Value::Number(Number::from(value)),
        DuckValue::UInt(value) => Value::Number(Number::from(value)),
        DuckValue::UBigInt(value) => Value::Number(Number::from(value)),
        DuckValue::Float(value) => finite_number(f64::from(value)),
        DuckValue::Double(value) => finite_number(value),
        DuckValue::Text(value) => Value::String(value),
        DuckValue::Blob(value) => Value::String(hex::encode(value)),
        DuckValue::Date32(days) => Date::from_julian_day(UNIX_EPOCH_JULIAN_DAY + days)
            .map(|date| Value::String(tickforge_core::format_date(date)))
            .unwrap_or(Value::Null),
        DuckValue::Timestamp(unit, amount) => timestamp_json(unit, amount),
        other => Value::String(format!("{other:?}")),
    }
}

fn timestamp_json(unit: TimeUnit, amount: i64) -> Value {
    let nanos = i128::from(amount)
        * match unit {
            TimeUnit::Second => 1_000_000_000,
            TimeUnit::Millisecond => 1_000_000,
            TimeUnit::Microsecond => 1_000,
            TimeUnit::Nanosecond => 1,
        };
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|ts| ts.format(&time::format_description::well_known::Rfc3339).ok())
        .map_or(Value::Null, Value::String)
}

fn finite_number(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_reads_and_strips_semicolons() {
        let (statement, kind) = classify("  SELECT 1;;  ", false).expect("read");
        assert_eq!(statement, "SELECT 1");
        assert_eq!(kind, StatementKind::Read);

        let (_, kind) = classify("with t as (select 1) select * from t", false).expect("cte");
        assert_eq!(kind, StatementKind::Read);
    }

    #[test]
    fn read_only_mode_rejects_writes_and_batches() {
        assert!(matches!(
            classify("DELETE FROM t", false),
            Err(WarehouseError::QueryRejected(_))
        ));
        assert!(matches!(
            classify("SELECT 1; DROP TABLE t", false),
            Err(WarehouseError::QueryRejected(message)) if message.contains("multiple")
        ));
        assert!(matches!(
            classify("   ", true),
            Err(WarehouseError::QueryRejected(_))
        ));
    }

    #[test]
    fn write_mode_accepts_batches() {
        let (_, kind) = classify("CREATE TABLE t (id INT); INSERT INTO t VALUES (1)", true)
            .expect("write");
        assert_eq!(kind, StatementKind::Write);
    }

    #[test]
    fn guardrails_reject_zero_limits() {
        let zero_rows = QueryGuardrails {
            max_rows: 0,
            ..QueryGuardrails::default()
        };
        assert!(zero_rows.validate().is_err());
        let zero_timeout = QueryGuardrails {
            query_timeout_ms: 0,
            ..QueryGuardrails::default()
        };
        assert!(zero_timeout.validate().is_err());
    }

    #[test]
    fn dates_and_timestamps_render_as_iso_strings() {
        let connection = Connection::open_in_memory().expect("memory db");
        let result = run(
            &connection,
            "SELECT DATE '2024-02-29' AS d, TIMESTAMP '2024-02-29 13:45:00' AS ts, 1.5 AS x, NULL AS n",
            StatementKind::Read,
            QueryGuardrails::default(),
        )
        .expect("query");
        assert_eq!(result.value(0, "d"), Some(&Value::from("2024-02-29")));
        assert_eq!(result.value(0, "ts"), Some(&Value::from("2024-02-29T13:45:00Z")));
        assert_eq!(result.value(0, "n"), Some(&Value::Null));
    }

    #[test]
    fn truncates_at_max_rows() {
        let connection = Connection::open_in_memory().expect("memory db");
        let result = run(
            &connection,
            "SELECT * FROM range(10)",
            StatementKind::Read,
            QueryGuardrails {
                max_rows: 3,
                query_timeout_ms: 5_000,
            },
        )
        .expect("query");
        assert_eq!(result.row_count, 3);
        assert!(result.truncated);
    }
}
