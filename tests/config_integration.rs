//! YAML experiments driven through the config layer and the CLI entry point

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use widedeep::cli::run_command;
use widedeep::config::{load_config, parse_args, train_from_spec, ExperimentSpec, ObjectiveKind};
use widedeep::train::MODEL_GROUP;

fn write_csv(dir: &Path) {
    let mut csv = String::from("age,education,relationship,hours_per_week,income_label\n");
    let education = ["Bachelors", "HS-grad", "Masters", "Doctorate"];
    let relationship = ["Husband", "Wife", "Own-child"];
    for i in 0..40 {
        csv.push_str(&format!(
            "{},{},{},{},{}\n",
            18 + i * 7 % 50,
            education[i % 4],
            relationship[i % 3],
            20 + i * 3 % 40,
            if i % 2 == 0 { "<=50K" } else { ">50K" }
        ));
    }
    fs::write(dir.join("adult.csv"), csv).unwrap();
}

fn write_config(dir: &Path, body: &str) -> PathBuf {
    write_csv(dir);
    let path = dir.join("experiment.yaml");
    fs::write(&path, body).unwrap();
    path
}

const EXPERIMENT: &str = "\
data:
  csv: adult.csv
  target: income_label
  wide_cols: [education, relationship]
  crossed_cols: [[education, relationship]]
  embed_cols: [[education, 8], relationship]
  continuous_cols: [age, hours_per_week]
model:
  hidden_layers: [16, 8]
  dropout: [0.2, 0.2]
  seed: 1
training:
  epochs: 4
  batch_size: 10
  val_split: 0.25
  metrics: [acc, f1]
optimizers:
  wide: { name: sgd, lr: 0.01, momentum: 0.9 }
  deepdense: { name: adam, lr: 0.001 }
schedulers:
  wide: { name: cyclic, base_lr: 0.001, max_lr: 0.01, step_size_up: 3 }
  deepdense: { name: step, step_size: 2, gamma: 0.5 }
callbacks:
  early_stopping: { monitor: val_loss, patience: 10 }
  lr_history: true
";

#[test]
fn test_experiment_file_trains() {
    let dir = TempDir::new().unwrap();
    let spec = load_config(write_config(dir.path(), EXPERIMENT)).unwrap();
    assert_eq!(spec.training.objective, ObjectiveKind::Binary);

    let experiment = train_from_spec(&spec, false).unwrap();
    assert_eq!(experiment.result.epochs_run, 4);
    assert!(!experiment.result.stopped_early);

    let history = experiment.trainer.history();
    for key in ["train_loss", "val_loss", "train_acc", "val_acc", "train_f1", "val_f1"] {
        assert_eq!(history.get(key).map(<[f32]>::len), Some(4), "{key}");
    }

    // 30 training rows at batch size 10
    let lr = experiment.trainer.lr_history().unwrap();
    assert_eq!(lr.get("wide").map(<[f32]>::len), Some(1 + 3 * 4));
    assert_eq!(lr.get("deepdense").map(<[f32]>::len), Some(1 + 4));
    let deepdense = lr.get("deepdense").unwrap();
    assert!((deepdense[4] - 0.00025).abs() < 1e-9);
}

#[test]
fn test_single_model_group() {
    let dir = TempDir::new().unwrap();
    let body = "\
data:
  csv: adult.csv
  target: income_label
  wide_cols: [education]
  continuous_cols: [age]
model:
  deephead: [4]
training:
  epochs: 2
  batch_size: 8
optimizers:
  model: { name: rmsprop, lr: 0.01 }
";
    let spec = load_config(write_config(dir.path(), body)).unwrap();
    let experiment = train_from_spec(&spec, false).unwrap();
    assert_eq!(experiment.trainer.lrs().keys().collect::<Vec<_>>(), vec![MODEL_GROUP]);
    assert_eq!(
        experiment.trainer.model().component_names(),
        vec!["wide", "deepdense", "deephead"]
    );
}

#[test]
fn test_invalid_experiment_rejected() {
    let dir = TempDir::new().unwrap();
    let body = "\
data:
  csv: adult.csv
  target: income_label
  wide_cols: [education]
optimizers:
  deepdense: { name: adam, lr: 0.001 }
";
    let err = load_config(write_config(dir.path(), body)).err().unwrap();
    assert!(err.to_string().contains("deepdense"));
}

#[test]
fn test_missing_csv_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("experiment.yaml");
    fs::write(&path, "data:\n  csv: nowhere.csv\n  target: y\n  wide_cols: [a]\n").unwrap();
    let err = load_config(&path).err().unwrap();
    assert!(err.to_string().contains("nowhere.csv"));
}

#[test]
fn test_spec_yaml_round_trip() {
    let dir = TempDir::new().unwrap();
    let spec = load_config(write_config(dir.path(), EXPERIMENT)).unwrap();
    let yaml = serde_yaml::to_string(&spec).unwrap();
    let back: ExperimentSpec = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(back.data.embed_cols, spec.data.embed_cols);
    assert_eq!(back.optimizers["wide"].params, spec.optimizers["wide"].params);
    assert_eq!(back.schedulers.len(), 2);
}

#[test]
fn test_cli_train_and_validate() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), EXPERIMENT);
    let output = dir.path().join("weights.safetensors");
    let config_arg = config.to_string_lossy().into_owned();
    let output_arg = output.to_string_lossy().into_owned();

    let cli = parse_args(["widedeep", "--quiet", "validate", config_arg.as_str()]).unwrap();
    run_command(cli).unwrap();

    let cli = parse_args([
        "widedeep",
        "train",
        config_arg.as_str(),
        "--epochs",
        "1",
        "--batch-size",
        "16",
        "--output",
        output_arg.as_str(),
        "-q",
    ])
    .unwrap();
    run_command(cli).unwrap();
    assert!(output.exists());
}
