//! Train command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{apply_overrides, load_config, train_from_spec, validate_config, TrainArgs};
use crate::train::History;

/// Render the per-epoch history as a table, one row per epoch
pub fn format_history(history: &History) -> String {
    let records = history.records();
    if records.is_empty() {
        return "  (no epochs recorded)".to_string();
    }
    let mut lines = vec![std::iter::once(format!("{:>6}", "epoch"))
        .chain(records.keys().map(|k| format!("{k:>12}")))
        .collect::<Vec<_>>()
        .join(" ")];
    let epochs = records.values().map(Vec::len).max().unwrap_or(0);
    for epoch in 0..epochs {
        let cells = records.values().map(|values| match values.get(epoch) {
            Some(v) => format!("{v:>12.4}"),
            None => format!("{:>12}", "-"),
        });
        lines.push(
            std::iter::once(format!("{:>6}", epoch + 1))
                .chain(cells)
                .collect::<Vec<_>>()
                .join(" "),
        );
    }
    lines.join("\n")
}

pub fn run_train(args: TrainArgs, level: LogLevel) -> Result<(), String> {
    log(
        level,
        LogLevel::Normal,
        &format!("widedeep: training from {}", args.config.display()),
    );

    let mut spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;

    apply_overrides(&mut spec, &args);
    validate_config(&spec).map_err(|e| format!("Invalid override: {e}"))?;

    if args.dry_run {
        log(level, LogLevel::Normal, "Dry run - config validated successfully");
        log(level, LogLevel::Verbose, &format!("  Data: {}", spec.data.csv.display()));
        log(
            level,
            LogLevel::Verbose,
            &format!("  Objective: {:?}", spec.training.objective),
        );
        log(level, LogLevel::Verbose, &format!("  Epochs: {}", spec.training.epochs));
        log(
            level,
            LogLevel::Verbose,
            &format!("  Batch size: {}", spec.training.batch_size),
        );
        return Ok(());
    }

    let experiment = train_from_spec(&spec, level == LogLevel::Verbose)
        .map_err(|e| format!("Training error: {e}"))?;
    let result = &experiment.result;

    log(level, LogLevel::Normal, &format_history(experiment.trainer.history()));
    let summary = if result.stopped_early {
        format!("Stopped early after {} epochs", result.epochs_run)
    } else {
        format!("Training complete: {} epochs", result.epochs_run)
    };
    log(
        level,
        LogLevel::Normal,
        &format!("{summary} (final loss {:.4}, {:.1}s)", result.final_loss, result.elapsed_secs),
    );
    if let Some(output) = &spec.training.output {
        log(level, LogLevel::Normal, &format!("Weights written to {}", output.display()));
    }
    Ok(())
}
