use serde_json::json;
use tickforge_core::{backup, SeriesSummary};

use crate::cli::LoadArgs;
use crate::error::CliError;

use super::{load_records, resolve_config, CommandResult};

/// Retry the load step from a backup written by `generate`.
pub fn run(args: &LoadArgs) -> Result<CommandResult, CliError> {
    let config = resolve_config(&args.destination)?;
    let destination = config.destination()?;

    let records = backup::read_csv(&args.from)?;
    let summary = SeriesSummary::from_records(&records);
    let report = load_records(&config, &destination, &records)?;

    let result = CommandResult::ok(json!({
        "source": args.from.display().to_string(),
        "summary": summary,
        "load": report,
    }));
    if records.is_empty() {
        return Ok(result.with_warning("backup contained no rows; destination table is now empty"));
    }
    Ok(result)
}
