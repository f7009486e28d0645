mod generate;
mod load;
mod schema;
mod sql;

use serde::Serialize;
use serde_json::Value;
use tickforge_core::{DailyPriceRecord, Destination, PipelineConfig};
use tickforge_warehouse::{sample_queries, SampleQuery, SchemaStatus, Warehouse, WarehouseConfig};

use crate::cli::{Cli, Command, DestinationArgs};
use crate::error::CliError;

#[derive(Debug)]
pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// Run the selected command. Returns its name and result.
pub fn run(cli: &Cli) -> Result<(&'static str, CommandResult), CliError> {
    match &cli.command {
        Command::Generate(args) => Ok(("generate", generate::run(args)?)),
        Command::Load(args) => Ok(("load", load::run(args)?)),
        Command::Sql(args) => Ok(("sql", sql::run(args)?)),
        Command::Schema(args) => Ok(("schema", schema::run(args)?)),
    }
}

/// Environment settings with destination flags applied on top.
pub(crate) fn resolve_config(overrides: &DestinationArgs) -> Result<PipelineConfig, CliError> {
    let mut config = PipelineConfig::from_env()?;
    apply_destination(&mut config, overrides);
    Ok(config)
}

fn apply_destination(config: &mut PipelineConfig, overrides: &DestinationArgs) {
    if let Some(project) = &overrides.project {
        config.project = Some(project.clone());
    }
    if let Some(dataset) = &overrides.dataset {
        config.dataset.clone_from(dataset);
    }
    if let Some(table) = &overrides.table {
        config.table.clone_from(table);
    }
}

pub(crate) fn open_warehouse(config: &PipelineConfig, project: &str) -> Result<Warehouse, CliError> {
    Ok(Warehouse::open(WarehouseConfig::for_project(
        &config.home,
        project,
    ))?)
}

/// Outcome of loading records into the destination.
#[derive(Debug, Serialize)]
pub(crate) struct LoadReport {
    pub destination: String,
    pub database: String,
    pub schema_status: SchemaStatus,
    pub rows_loaded: usize,
    pub sample_queries: Vec<SampleQuery>,
}

/// Ensure the destination exists and replace its contents with `records`.
pub(crate) fn load_records(
    config: &PipelineConfig,
    destination: &Destination,
    records: &[DailyPriceRecord],
) -> Result<LoadReport, CliError> {
    let warehouse = open_warehouse(config, destination.project())?;
    let table = warehouse.ensure_schema(destination)?;
    let rows_loaded = warehouse.replace_all(&table, records)?;

    Ok(LoadReport {
        destination: destination.qualified_name(),
        database: warehouse.db_path().display().to_string(),
        schema_status: table.status(),
        rows_loaded,
        sample_queries: sample_queries(destination),
    })
}
