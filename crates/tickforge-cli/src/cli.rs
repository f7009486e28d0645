//! CLI argument definitions for tickforge.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `generate` | Generate a synthetic series, back it up and load it |
//! | `load` | Load a CSV backup into the warehouse |
//! | `sql` | Query a project's `DuckDB` warehouse |
//! | `schema` | Ensure and describe the destination table |
//!
//! Settings not given as flags come from `TICKFORGE_*` environment variables.
//!
//! # Examples
//!
//! ```bash
//! tickforge generate --project demo --rows 3000 --seed 7 --pretty
//! tickforge generate --no-load --rows 500 --backup-dir /tmp
//! tickforge load --from stock_market_data_3000_rows.csv --project demo
//! tickforge sql "SELECT COUNT(*) FROM hist_stock_market.daily_prices" --project demo
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Synthetic daily stock price generator and warehouse loader.
#[derive(Debug, Parser)]
#[command(
    name = "tickforge",
    author,
    version,
    about = "Synthetic daily stock price generator and warehouse loader"
)]
pub struct Cli {
    /// Output format for the command report.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned text for terminals.
    Table,
    /// Single JSON object.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a series, print its summary, back it up and load it.
    ///
    /// The destination is resolved before anything is generated, so a
    /// missing project fails fast. With --no-load only the backup is written.
    ///
    /// # Examples
    ///
    ///   tickforge generate --project demo
    ///   tickforge generate --rows 30 --seed 42 --universe universe.json --no-load
    Generate(GenerateArgs),

    /// Load a CSV backup, replacing the destination table's contents.
    Load(LoadArgs),

    /// Run SQL against a project's warehouse.
    ///
    /// Read-only unless --write is given. Results are capped by --max-rows
    /// and --query-timeout-ms.
    Sql(SqlArgs),

    /// Create the destination table if needed and list its columns.
    Schema(SchemaArgs),
}

/// Overrides for the destination table.
#[derive(Debug, Clone, Default, Args)]
pub struct DestinationArgs {
    /// Project identifier (env: TICKFORGE_PROJECT, GOOGLE_CLOUD_PROJECT, GCP_PROJECT).
    #[arg(long)]
    pub project: Option<String>,

    /// Dataset name (env: TICKFORGE_DATASET).
    #[arg(long)]
    pub dataset: Option<String>,

    /// Table name (env: TICKFORGE_TABLE).
    #[arg(long)]
    pub table: Option<String>,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Total number of rows across all symbols (env: TICKFORGE_NUM_ROWS).
    #[arg(long)]
    pub rows: Option<usize>,

    /// Seed for reproducible output (env: TICKFORGE_SEED).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Length of the trailing date range in days (env: TICKFORGE_HISTORY_DAYS).
    #[arg(long)]
    pub days: Option<i64>,

    /// JSON file describing symbols, base prices, volumes and sectors.
    #[arg(long)]
    pub universe: Option<PathBuf>,

    /// Directory for the CSV backup (env: TICKFORGE_BACKUP_DIR).
    #[arg(long)]
    pub backup_dir: Option<PathBuf>,

    /// Stop after writing the backup.
    #[arg(long, default_value_t = false)]
    pub no_load: bool,

    #[command(flatten)]
    pub destination: DestinationArgs,
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// CSV backup written by `generate`.
    #[arg(long)]
    pub from: PathBuf,

    #[command(flatten)]
    pub destination: DestinationArgs,
}

#[derive(Debug, Args)]
pub struct SqlArgs {
    /// SQL query to execute.
    pub query: String,

    /// Allow write statements.
    #[arg(long, default_value_t = false)]
    pub write: bool,

    /// Maximum number of rows to return.
    #[arg(long, default_value_t = 10_000)]
    pub max_rows: usize,

    /// Query timeout in milliseconds.
    #[arg(long, default_value_t = 5_000)]
    pub query_timeout_ms: u64,

    /// Project whose warehouse to query.
    #[arg(long)]
    pub project: Option<String>,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    #[command(flatten)]
    pub destination: DestinationArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_generate_overrides() {
        let cli = Cli::try_parse_from([
            "tickforge",
            "--format",
            "table",
            "generate",
            "--rows",
            "30",
            "--seed",
            "9",
            "--no-load",
            "--dataset",
            "scratch",
        ])
        .expect("parse");

        assert_eq!(cli.format, OutputFormat::Table);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.rows, Some(30));
        assert_eq!(args.seed, Some(9));
        assert!(args.no_load);
        assert_eq!(args.destination.dataset.as_deref(), Some("scratch"));
        assert!(args.destination.project.is_none());
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from(["tickforge", "sql", "SELECT 1", "--pretty"]).expect("parse");
        assert!(cli.pretty);
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn load_requires_a_file() {
        assert!(Cli::try_parse_from(["tickforge", "load"]).is_err());
    }
}
