//! Analysis views created next to each daily price table, and the sample
//! queries suggested after a load.

use ::duckdb::Connection;
use tickforge_core::Destination;

use crate::schema::{qualified_table, quote_ident};

/// View names for a table, in creation order.
#[must_use]
pub fn view_names(table: &str) -> [String; 2] {
    [
        format!("vw_{table}_avg_close_by_symbol"),
        format!("vw_{table}_monthly_avg_close"),
    ]
}

/// Create the average-close views for `destination` if they do not exist.
///
/// - `vw_<table>_avg_close_by_symbol`: mean close and row count per symbol
/// - `vw_<table>_monthly_avg_close`: mean close per symbol and calendar month
///
/// # Errors
/// Returns an error if the view creation SQL fails to execute.
pub fn create_views(connection: &Connection, destination: &Destination) -> Result<(), ::duckdb::Error> {
    let dataset = quote_ident(destination.dataset());
    let source = qualified_table(destination);
    let [by_symbol, monthly] = view_names(destination.table());

    connection.execute_batch(&format!(
        r#"
CREATE VIEW IF NOT EXISTS {dataset}.{by_symbol} AS
SELECT
    symbol,
    AVG(close_price)::DOUBLE AS avg_close,
    COUNT(*) AS trading_days
FROM {source}
GROUP BY symbol;

CREATE VIEW IF NOT EXISTS {dataset}.{monthly} AS
SELECT
    symbol,
    CAST(DATE_TRUNC('month', "date") AS DATE) AS month,
    AVG(close_price)::DOUBLE AS avg_close
FROM {source}
GROUP BY symbol, month;
"#,
        by_symbol = quote_ident(&by_symbol),
        monthly = quote_ident(&monthly),
    ))
}

/// A ready-to-run query shown after a load.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SampleQuery {
    pub title: &'static str,
    pub sql: String,
}

/// Queries a user can paste into `tickforge sql` to inspect a fresh load.
#[must_use]
pub fn sample_queries(destination: &Destination) -> Vec<SampleQuery> {
    let source = qualified_table(destination);
    vec![
        SampleQuery {
            title: "first ten rows",
            sql: format!("SELECT * FROM {source} ORDER BY \"date\", symbol LIMIT 10"),
        },
        SampleQuery {
            title: "average close by symbol",
            sql: format!(
                "SELECT symbol, AVG(close_price) AS avg_close FROM {source} \
                 GROUP BY symbol ORDER BY avg_close DESC"
            ),
        },
        SampleQuery {
            title: "monthly average close for AAPL",
            sql: format!(
                "SELECT CAST(DATE_TRUNC('month', \"date\") AS DATE) AS month, \
                 AVG(close_price) AS avg_close FROM {source} \
                 WHERE symbol = 'AAPL' GROUP BY month ORDER BY month"
            ),
        },
    ]
}
