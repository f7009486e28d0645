use tickforge_warehouse::QueryGuardrails;

use crate::cli::{DestinationArgs, SqlArgs};
use crate::error::CliError;

use super::{open_warehouse, resolve_config, CommandResult};

pub fn run(args: &SqlArgs) -> Result<CommandResult, CliError> {
    let config = resolve_config(&DestinationArgs {
        project: args.project.clone(),
        ..DestinationArgs::default()
    })?;
    let destination = config.destination()?;
    let warehouse = open_warehouse(&config, destination.project())?;

    let guardrails = QueryGuardrails {
        max_rows: args.max_rows,
        query_timeout_ms: args.query_timeout_ms,
    };
    let result = warehouse.execute_query(&args.query, guardrails, args.write)?;

    let truncated = result.truncated.then_some(result.row_count);
    let command_result = CommandResult::ok(serde_json::to_value(&result)?);
    Ok(match truncated {
        Some(rows) => command_result.with_warning(format!(
            "result truncated at {rows} rows (use --max-rows to increase limit)"
        )),
        None => command_result,
    })
}
