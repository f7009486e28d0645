use thiserror::Error;

/// Validation errors for domain values exposed by `tickforge-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("date must be formatted YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },
    #[error("timestamp must be RFC3339: '{value}'")]
    InvalidTimestamp { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
    #[error("volume must be positive, got {volume}")]
    NonPositiveVolume { volume: i64 },

    #[error("high_price must be >= low_price")]
    InvalidPriceRange,
    #[error("open_price/close_price must be within low_price/high_price")]
    InvalidPriceBounds,
}

/// Invalid or missing configuration, raised before any generation work starts.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("no project configured; set TICKFORGE_PROJECT, GOOGLE_CLOUD_PROJECT or GCP_PROJECT, or pass --project")]
    MissingProject,
    #[error("invalid project identifier '{value}': {reason}")]
    InvalidProject { value: String, reason: &'static str },
    #[error("invalid {kind} identifier '{value}': {reason}")]
    InvalidIdentifier {
        kind: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("environment variable {name} has invalid value '{value}'")]
    InvalidEnvValue { name: &'static str, value: String },
    #[error("num_rows must be greater than zero")]
    ZeroRows,
    #[error("history must span between one day and the earliest representable date, got {days}")]
    InvalidHistory { days: i64 },

    #[error("date range start {start} is after end {end}")]
    InvertedDateRange { start: String, end: String },
    #[error("date range holds {available} distinct dates but {requested} rows were requested for one symbol")]
    DateRangeTooShort { requested: usize, available: usize },

    #[error("parameter '{name}' is invalid: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: String,
    },

    #[error("universe must contain at least one symbol")]
    EmptyUniverse,
    #[error("universe lists symbol '{symbol}' more than once")]
    DuplicateSymbol { symbol: String },
    #[error("universe file error: {0}")]
    UniverseFile(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Errors raised while writing or reading the CSV backup artifact.
#[derive(Debug, Error)]
pub enum BackupError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("backup line {line}: {source}")]
    InvalidRecord {
        line: u64,
        #[source]
        source: ValidationError,
    },
}
