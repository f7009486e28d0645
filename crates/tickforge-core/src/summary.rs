use std::collections::BTreeSet;

use serde::Serialize;
use time::Date;

use crate::domain::format_date;
use crate::{DailyPriceRecord, Symbol};

/// Headline statistics for a generated series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub row_count: usize,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
    pub symbols: Vec<Symbol>,
    pub average_volume: Option<f64>,
    pub min_close: Option<f64>,
    pub max_close: Option<f64>,
}

impl SeriesSummary {
    pub fn from_records(records: &[DailyPriceRecord]) -> Self {
        let mut first: Option<Date> = None;
        let mut last: Option<Date> = None;
        let mut min_close: Option<f64> = None;
        let mut max_close: Option<f64> = None;
        let mut volume_total = 0f64;
        let mut symbols = BTreeSet::new();

        for record in records {
            first = Some(first.map_or(record.date, |date| date.min(record.date)));
            last = Some(last.map_or(record.date, |date| date.max(record.date)));
            min_close = Some(min_close.map_or(record.close_price, |close| close.min(record.close_price)));
            max_close = Some(max_close.map_or(record.close_price, |close| close.max(record.close_price)));
            volume_total += record.volume as f64;
            symbols.insert(record.symbol.clone());
        }

        let average_volume = if records.is_empty() {
            None
        } else {
            Some(volume_total / records.len() as f64)
        };

        Self {
            row_count: records.len(),
            first_date: first.map(format_date),
            last_date: last.map(format_date),
            symbols: symbols.into_iter().collect(),
            average_volume,
            min_close,
            max_close,
        }
    }
}
