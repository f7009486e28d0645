use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, UtcOffset};

use crate::{ConfigurationError, ValidationError};

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: Date,
    end: Date,
}

impl DateRange {
    pub fn new(start: Date, end: Date) -> Result<Self, ConfigurationError> {
        if start > end {
            return Err(ConfigurationError::InvertedDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// The `days` days leading up to and including `end`.
    pub fn trailing(end: Date, days: i64) -> Result<Self, ConfigurationError> {
        if days < 1 {
            return Err(ConfigurationError::InvalidHistory { days });
        }
        let start = days
            .checked_mul(86_400)
            .map(Duration::seconds)
            .and_then(|span| end.checked_sub(span))
            .ok_or(ConfigurationError::InvalidHistory { days })?;
        Self::new(start, end)
    }

    pub fn start(&self) -> Date {
        self.start
    }

    pub fn end(&self) -> Date {
        self.end
    }

    /// Whole days between start and end.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).whole_days()
    }

    /// Number of distinct dates in the range, endpoints included.
    pub fn day_count(&self) -> usize {
        usize::try_from(self.span_days()).unwrap_or(usize::MAX - 1) + 1
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }

    /// `count` strictly increasing dates spread across the range.
    ///
    /// The first date is `start` and, when `count > 1`, the last is `end`.
    /// Asking for more dates than the range holds is rejected so that no
    /// date repeats.
    pub fn evenly_spaced(&self, count: usize) -> Result<Vec<Date>, ConfigurationError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let available = self.day_count();
        if count > available {
            return Err(ConfigurationError::DateRangeTooShort {
                requested: count,
                available,
            });
        }
        if count == 1 {
            return Ok(vec![self.start]);
        }

        let span = self.span_days();
        let steps = (count - 1) as i64;
        Ok((0..count as i64)
            .map(|index| self.start + Duration::days(index * span / steps))
            .collect())
    }
}

/// Format a date as `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
    date.to_string()
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Result<Date, ValidationError> {
    Date::parse(input.trim(), format_description!("[year]-[month]-[day]")).map_err(|_| {
        ValidationError::InvalidDate {
            value: input.to_owned(),
        }
    })
}

/// Parse an RFC3339 timestamp and normalize it to UTC.
pub fn parse_timestamp(input: &str) -> Result<OffsetDateTime, ValidationError> {
    OffsetDateTime::parse(input.trim(), &Rfc3339)
        .map(|value| value.to_offset(UtcOffset::UTC))
        .map_err(|_| ValidationError::InvalidTimestamp {
            value: input.to_owned(),
        })
}

pub(crate) mod serde_date {
    use serde::de::Error as DeError;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_date(*date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        super::parse_date(&value).map_err(D::Error::custom)
    }
}

pub(crate) mod serde_timestamp {
    use serde::de::Error as DeError;
    use serde::ser::Error as SerError;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::format_description::well_known::Rfc3339;
    use time::OffsetDateTime;

    pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = value.format(&Rfc3339).map_err(S::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        super::parse_timestamp(&value).map_err(D::Error::custom)
    }
}
