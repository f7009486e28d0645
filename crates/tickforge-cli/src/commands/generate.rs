use serde_json::json;
use tickforge_core::{
    backup, DateRange, GeneratorConfig, MarketSeriesGenerator, PipelineConfig, SeriesSummary,
    Universe,
};
use time::OffsetDateTime;
use tracing::info;

use crate::cli::GenerateArgs;
use crate::error::CliError;

use super::{load_records, resolve_config, CommandResult};

pub fn run(args: &GenerateArgs) -> Result<CommandResult, CliError> {
    execute(resolve_config(&args.destination)?, args)
}

/// Generate, back up and load using an already resolved `config`.
pub(crate) fn execute(
    mut config: PipelineConfig,
    args: &GenerateArgs,
) -> Result<CommandResult, CliError> {
    apply_generation_overrides(&mut config, args);

    // resolve before generating so a missing project costs nothing
    let destination = if args.no_load {
        None
    } else {
        Some(config.destination()?)
    };

    let universe = match &args.universe {
        Some(path) => Universe::from_path(path)?,
        None => Universe::default(),
    };

    let created_at = OffsetDateTime::now_utc();
    let range = DateRange::trailing(created_at.date(), config.history_days)?;
    let generator = MarketSeriesGenerator::new(GeneratorConfig {
        num_rows: config.num_rows,
        seed: config.seed,
        ..GeneratorConfig::default()
    })?;
    let records = generator.generate(&universe, &range, created_at)?;

    let summary = SeriesSummary::from_records(&records);
    info!(
        rows = summary.row_count,
        symbols = summary.symbols.len(),
        first_date = summary.first_date.as_deref().unwrap_or("-"),
        last_date = summary.last_date.as_deref().unwrap_or("-"),
        "generated series"
    );

    let backup_path = config.backup_path();
    backup::write_csv(&backup_path, &records)?;

    let mut data = json!({
        "rows_generated": records.len(),
        "seed": config.seed,
        "date_range": {
            "start": tickforge_core::format_date(range.start()),
            "end": tickforge_core::format_date(range.end()),
        },
        "summary": summary,
        "backup_path": backup_path.display().to_string(),
    });

    let Some(destination) = destination else {
        return Ok(CommandResult::ok(data).with_warning("--no-load given; warehouse not touched"));
    };

    let report = load_records(&config, &destination, &records)?;
    data["load"] = serde_json::to_value(report)?;
    Ok(CommandResult::ok(data))
}

fn apply_generation_overrides(config: &mut PipelineConfig, args: &GenerateArgs) {
    if let Some(rows) = args.rows {
        config.num_rows = rows;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(days) = args.days {
        config.history_days = days;
    }
    if let Some(dir) = &args.backup_dir {
        config.backup_dir.clone_from(dir);
    }
}
