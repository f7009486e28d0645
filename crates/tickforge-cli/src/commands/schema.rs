use serde_json::json;

use crate::cli::SchemaArgs;
use crate::error::CliError;

use super::{open_warehouse, resolve_config, CommandResult};

pub fn run(args: &SchemaArgs) -> Result<CommandResult, CliError> {
    let config = resolve_config(&args.destination)?;
    let destination = config.destination()?;
    let warehouse = open_warehouse(&config, destination.project())?;

    let table = warehouse.ensure_schema(&destination)?;
    let columns = warehouse.table_columns(&table)?;
    let row_count = warehouse.row_count(&table)?;

    Ok(CommandResult::ok(json!({
        "destination": destination.qualified_name(),
        "database": warehouse.db_path().display().to_string(),
        "schema_status": table.status(),
        "row_count": row_count,
        "columns": columns,
    })))
}
