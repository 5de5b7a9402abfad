//! Validate command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{configured_components, load_config, ExperimentSpec, ValidateArgs};

/// Format data configuration as a string
pub fn format_data_info(spec: &ExperimentSpec) -> String {
    let data = &spec.data;
    let mut lines = vec![
        format!("  Data: {}", data.csv.display()),
        format!("  Target: {}", data.target),
    ];
    if !data.wide_cols.is_empty() {
        lines.push(format!("  Wide columns: {:?}", data.wide_cols));
    }
    if !data.crossed_cols.is_empty() {
        let crossed: Vec<String> =
            data.crossed_cols.iter().map(|(a, b)| format!("{a}-{b}")).collect();
        lines.push(format!("  Crossed columns: {crossed:?}"));
    }
    if !data.embed_cols.is_empty() {
        let embed: Vec<String> =
            data.embed_cols.iter().map(|c| format!("{}({})", c.name(), c.dim())).collect();
        lines.push(format!("  Embedded columns: {embed:?}"));
    }
    if !data.continuous_cols.is_empty() {
        lines.push(format!("  Continuous columns: {:?}", data.continuous_cols));
    }
    if let Some(text) = &data.text_col {
        lines.push(format!("  Text column: {text} (maxlen {})", data.text.maxlen));
    }
    lines.join("\n")
}

/// Format model configuration as a string
pub fn format_model_info(spec: &ExperimentSpec) -> String {
    let mut lines = vec![format!("  Components: {:?}", configured_components(spec))];
    lines.push(format!("  Hidden layers: {:?}", spec.model.hidden_layers));
    if !spec.model.deephead.is_empty() {
        lines.push(format!("  Deep head: {:?}", spec.model.deephead));
    }
    lines.join("\n")
}

/// Format optimizer and scheduler configuration as a string
pub fn format_optimizer_info(spec: &ExperimentSpec) -> String {
    if spec.optimizers.is_empty() {
        return "  Optimizers: adam (lr=0.001) for every component".to_string();
    }
    let mut lines = vec!["  Optimizers:".to_string()];
    for (group, optim) in &spec.optimizers {
        let mut line = format!("    {group}: {} (lr={})", optim.name, optim.lr);
        if let Some(scheduler) = spec.schedulers.get(group) {
            line.push_str(&format!(", scheduler {}", scheduler.name));
        }
        lines.push(line);
    }
    for (group, scheduler) in &spec.schedulers {
        if !spec.optimizers.contains_key(group) {
            lines.push(format!("    {group}: adam (lr=0.001), scheduler {}", scheduler.name));
        }
    }
    lines.join("\n")
}

/// Format training configuration as a string
pub fn format_training_info(spec: &ExperimentSpec) -> String {
    let training = &spec.training;
    let mut lines = vec![
        format!("  Objective: {:?}", training.objective),
        format!("  Epochs: {}", training.epochs),
        format!("  Batch size: {}", training.batch_size),
    ];
    if training.val_split > 0.0 {
        lines.push(format!("  Validation split: {}", training.val_split));
    }
    if let Some(clip) = training.grad_clip {
        lines.push(format!("  Gradient clipping: {clip}"));
    }
    if !training.metrics.is_empty() {
        lines.push(format!("  Metrics: {:?}", training.metrics));
    }
    lines.join("\n")
}

/// Print detailed configuration summary
pub fn print_detailed_summary(spec: &ExperimentSpec) {
    println!();
    println!("Configuration Summary:");
    println!("{}", format_data_info(spec));
    println!();
    println!("{}", format_model_info(spec));
    println!();
    println!("{}", format_optimizer_info(spec));
    println!();
    println!("{}", format_training_info(spec));
}

pub fn run_validate(args: ValidateArgs, level: LogLevel) -> Result<(), String> {
    log(
        level,
        LogLevel::Normal,
        &format!("Validating config: {}", args.config.display()),
    );

    let spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;

    log(level, LogLevel::Normal, "Configuration is valid");

    if args.detailed && level != LogLevel::Quiet {
        print_detailed_summary(&spec);
    }

    Ok(())
}
