//! Process configuration.
//!
//! Everything environment-derived is read once into a [`PipelineConfig`]
//! through an injectable lookup, then handed to the generator and loader.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `TICKFORGE_PROJECT` / `GOOGLE_CLOUD_PROJECT` / `GCP_PROJECT` | none |
//! | `TICKFORGE_DATASET` | `hist_stock_market` |
//! | `TICKFORGE_TABLE` | `daily_prices` |
//! | `TICKFORGE_NUM_ROWS` | `10000` |
//! | `TICKFORGE_HISTORY_DAYS` | `730` |
//! | `TICKFORGE_SEED` | unset |
//! | `TICKFORGE_HOME` | `$HOME/.tickforge` |
//! | `TICKFORGE_BACKUP_DIR` | `.` |

use std::env;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::ConfigurationError;

pub const DEFAULT_DATASET: &str = "hist_stock_market";
pub const DEFAULT_TABLE: &str = "daily_prices";
pub const DEFAULT_NUM_ROWS: usize = 10_000;
pub const DEFAULT_HISTORY_DAYS: i64 = 730;

const PROJECT_VARS: [&str; 3] = ["TICKFORGE_PROJECT", "GOOGLE_CLOUD_PROJECT", "GCP_PROJECT"];
const MAX_PROJECT_LEN: usize = 63;
const MAX_IDENTIFIER_LEN: usize = 128;

/// Fully-qualified destination table: `project.dataset.table`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Destination {
    project: String,
    dataset: String,
    table: String,
}

impl Destination {
    /// Validate all three identifiers.
    pub fn new(
        project: impl Into<String>,
        dataset: impl Into<String>,
        table: impl Into<String>,
    ) -> Result<Self, ConfigurationError> {
        let project = project.into();
        let dataset = dataset.into();
        let table = table.into();
        validate_project(&project)?;
        validate_identifier("dataset", &dataset)?;
        validate_identifier("table", &table)?;
        Ok(Self {
            project,
            dataset,
            table,
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}.{}", self.project, self.dataset, self.table)
    }
}

impl Display for Destination {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

/// Settings for one generate-and-load run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Project identifier; required only when loading.
    pub project: Option<String>,
    pub dataset: String,
    pub table: String,
    pub num_rows: usize,
    pub history_days: i64,
    pub seed: Option<u64>,
    /// Root directory holding one warehouse file per project.
    pub home: PathBuf,
    pub backup_dir: PathBuf,
}

impl PipelineConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let project = PROJECT_VARS.iter().find_map(|key| get(*key));
        if let Some(project) = &project {
            validate_project(project)?;
        }

        let dataset = get("TICKFORGE_DATASET").unwrap_or_else(|| DEFAULT_DATASET.to_string());
        validate_identifier("dataset", &dataset)?;
        let table = get("TICKFORGE_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string());
        validate_identifier("table", &table)?;

        let num_rows = parse_var("TICKFORGE_NUM_ROWS", get("TICKFORGE_NUM_ROWS"))?
            .unwrap_or(DEFAULT_NUM_ROWS);
        if num_rows == 0 {
            return Err(ConfigurationError::ZeroRows);
        }

        let history_days = parse_var("TICKFORGE_HISTORY_DAYS", get("TICKFORGE_HISTORY_DAYS"))?
            .unwrap_or(DEFAULT_HISTORY_DAYS);
        if history_days < 1 {
            return Err(ConfigurationError::InvalidHistory { days: history_days });
        }

        let seed = parse_var("TICKFORGE_SEED", get("TICKFORGE_SEED"))?;

        Ok(Self {
            project,
            dataset,
            table,
            num_rows,
            history_days,
            seed,
            home: default_home(&get),
            backup_dir: get("TICKFORGE_BACKUP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
        })
    }

    /// The load destination; fails when no project is configured.
    pub fn destination(&self) -> Result<Destination, ConfigurationError> {
        let project = self
            .project
            .as_deref()
            .ok_or(ConfigurationError::MissingProject)?;
        Destination::new(project, self.dataset.as_str(), self.table.as_str())
    }

    /// Path of the CSV backup for this run.
    pub fn backup_path(&self) -> PathBuf {
        self.backup_dir
            .join(format!("stock_market_data_{}_rows.csv", self.num_rows))
    }
}

fn default_home<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup("TICKFORGE_HOME").filter(|path| !path.is_empty()) {
        return PathBuf::from(path);
    }
    if let Some(home) = lookup("HOME").filter(|home| !home.is_empty()) {
        return PathBuf::from(home).join(".tickforge");
    }
    PathBuf::from(".tickforge")
}

fn parse_var<T: FromStr>(
    name: &'static str,
    value: Option<String>,
) -> Result<Option<T>, ConfigurationError> {
    value
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| ConfigurationError::InvalidEnvValue { name, value: raw })
        })
        .transpose()
}

fn validate_project(value: &str) -> Result<(), ConfigurationError> {
    let reject = |reason| ConfigurationError::InvalidProject {
        value: value.to_owned(),
        reason,
    };

    if value.is_empty() {
        return Err(reject("must not be empty"));
    }
    if value.len() > MAX_PROJECT_LEN {
        return Err(reject("must be at most 63 characters"));
    }
    if !value.starts_with(|ch: char| ch.is_ascii_alphabetic()) {
        return Err(reject("must start with an ASCII letter"));
    }
    if !value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return Err(reject("may only contain ASCII letters, digits, '-' and '_'"));
    }
    Ok(())
}

fn validate_identifier(kind: &'static str, value: &str) -> Result<(), ConfigurationError> {
    let reject = |reason| ConfigurationError::InvalidIdentifier {
        kind,
        value: value.to_owned(),
        reason,
    };

    if value.is_empty() {
        return Err(reject("must not be empty"));
    }
    if value.len() > MAX_IDENTIFIER_LEN {
        return Err(reject("must be at most 128 characters"));
    }
    if !value.starts_with(|ch: char| ch.is_ascii_alphabetic() || ch == '_') {
        return Err(reject("must start with an ASCII letter or '_'"));
    }
    if !value.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return Err(reject("may only contain ASCII letters, digits and '_'"));
    }
    Ok(())
}
