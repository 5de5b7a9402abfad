//! Command-line interface types

use super::schema::ExperimentSpec;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// widedeep: wide & deep models for tabular, text and image data
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "widedeep")]
#[command(version)]
#[command(about = "Train wide & deep models from YAML experiment files")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Train a model from a YAML experiment file
    Train(TrainArgs),

    /// Validate an experiment file without training
    Validate(ValidateArgs),
}

/// Arguments for the train command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct TrainArgs {
    /// Path to YAML experiment file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Override number of epochs
    #[arg(short, long)]
    pub epochs: Option<usize>,

    /// Override batch size
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Override where the final weights are written
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Random seed for splitting and shuffling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Dry run (validate config but don't train)
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to YAML experiment file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Show detailed validation report
    #[arg(short, long)]
    pub detailed: bool,
}

/// Parse CLI arguments from a string slice (for testing)
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Apply command-line overrides to an experiment
pub fn apply_overrides(spec: &mut ExperimentSpec, args: &TrainArgs) {
    if let Some(epochs) = args.epochs {
        spec.training.epochs = epochs;
    }
    if let Some(batch_size) = args.batch_size {
        spec.training.batch_size = batch_size;
    }
    if let Some(output) = &args.output {
        spec.training.output = Some(output.clone());
    }
    if let Some(seed) = args.seed {
        spec.training.seed = seed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_train_command() {
        let cli = parse_args(["widedeep", "train", "config.yaml"]).unwrap();
        match cli.command {
            Command::Train(args) => {
                assert_eq!(args.config, PathBuf::from("config.yaml"));
                assert_eq!(args.epochs, None);
                assert!(!args.dry_run);
            }
            Command::Validate(_) => panic!("Expected Train command"),
        }
        assert!(!cli.verbose);
    }

    #[test]
    fn test_parse_train_with_overrides() {
        let cli = parse_args([
            "widedeep",
            "train",
            "config.yaml",
            "--epochs",
            "10",
            "--batch-size",
            "64",
            "--output",
            "model.safetensors",
        ])
        .unwrap();

        match cli.command {
            Command::Train(args) => {
                assert_eq!(args.epochs, Some(10));
                assert_eq!(args.batch_size, Some(64));
                assert_eq!(args.output, Some(PathBuf::from("model.safetensors")));
            }
            Command::Validate(_) => panic!("Expected Train command"),
        }
    }

    #[test]
    fn test_parse_validate_command() {
        let cli = parse_args(["widedeep", "validate", "config.yaml", "--detailed", "-v"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Validate(args) => assert!(args.detailed),
            Command::Train(_) => panic!("Expected Validate command"),
        }
    }

    #[test]
    fn test_parse_requires_config() {
        assert!(parse_args(["widedeep", "train"]).is_err());
        assert!(parse_args(["widedeep", "predict", "x.yaml"]).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let yaml = "data:\n  csv: a.csv\n  target: y\n  wide_cols: [a]\n";
        let mut spec: ExperimentSpec = serde_yaml::from_str(yaml).unwrap();
        let cli = parse_args(["widedeep", "train", "c.yaml", "-e", "3", "-b", "8", "--seed", "9"])
            .unwrap();
        let Command::Train(args) = cli.command else {
            panic!("Expected Train command");
        };
        apply_overrides(&mut spec, &args);
        assert_eq!(spec.training.epochs, 3);
        assert_eq!(spec.training.batch_size, 8);
        assert_eq!(spec.training.seed, 9);
        assert_eq!(spec.training.output, None);
    }
}
