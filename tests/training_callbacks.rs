//! End-to-end training through the public API: frame, preprocessors, model, callbacks

use ndarray::Array1;
use std::fs;
use tempfile::TempDir;
use widedeep::data::{Column, Frame, ModelInput, WideDeepDataset};
use widedeep::models::{DeepDense, Wide, WideDeep};
use widedeep::optim::{CyclicLR, StepLR, SGD};
use widedeep::preprocessing::{DensePreprocessor, WidePreprocessor};
use widedeep::train::{
    Accuracy, EarlyStopping, FitOptions, LRHistory, ModelCheckpoint, Objective, Trainer,
};

const ROWS: usize = 100;
const EDUCATION: [&str; 4] = ["Bachelors", "HS-grad", "Masters", "Doctorate"];
const RELATIONSHIP: [&str; 3] = ["Husband", "Wife", "Own-child"];

fn frame() -> Frame {
    let education = (0..ROWS).map(|i| EDUCATION[i % 4].to_string()).collect();
    let relationship = (0..ROWS).map(|i| RELATIONSHIP[i % 3].to_string()).collect();
    let age = (0..ROWS).map(|i| 18.0 + (i * 7 % 50) as f64).collect();
    let hours = (0..ROWS).map(|i| 20.0 + (i * 3 % 40) as f64).collect();
    let label = (0..ROWS).map(|i| (i % 2) as f64).collect();
    Frame::new()
        .with_column("education", Column::Text(education))
        .and_then(|f| f.with_column("relationship", Column::Text(relationship)))
        .and_then(|f| f.with_column("age", Column::Number(age)))
        .and_then(|f| f.with_column("hours_per_week", Column::Number(hours)))
        .and_then(|f| f.with_column("income_label", Column::Number(label)))
        .unwrap()
}

/// Wide over two columns plus their cross, deepdense over embeddings and continuous columns
fn setup() -> (WideDeep, WideDeepDataset) {
    let frame = frame();
    let mut wide_prep = WidePreprocessor::new(
        vec!["education".into(), "relationship".into()],
        vec![("education".into(), "relationship".into())],
    );
    let wide = wide_prep.fit_transform(&frame).unwrap();

    let mut dense_prep = DensePreprocessor::new(
        vec![("education".into(), 8), ("relationship".into(), 4)],
        vec!["age".into(), "hours_per_week".into()],
    );
    let deep = dense_prep.fit_transform(&frame).unwrap();

    let deepdense = DeepDense::builder()
        .column_idx(dense_prep.column_idx())
        .embed_input(dense_prep.embed_input().unwrap())
        .continuous_cols(dense_prep.continuous_cols().to_vec())
        .hidden_layers(vec![16, 8])
        .dropout(vec![0.5, 0.5])
        .seed(11)
        .build()
        .unwrap();
    let model = WideDeep::builder()
        .wide(Wide::with_seed(wide_prep.wide_dim().unwrap(), 1, 5))
        .deepdense(deepdense)
        .seed(3)
        .build()
        .unwrap();

    let target: Array1<f32> = match frame.column("income_label") {
        Some(Column::Number(v)) => v.iter().map(|&x| x as f32).collect(),
        _ => panic!("numeric target expected"),
    };
    let dataset =
        WideDeepDataset::new(ModelInput::new().with_wide(wide).with_deep(deep), target).unwrap();
    (model, dataset)
}

fn options(epochs: usize) -> FitOptions {
    FitOptions::default().with_epochs(epochs).with_batch_size(32)
}

#[test]
fn test_history_tracks_every_epoch() {
    let (model, dataset) = setup();
    let mut trainer = Trainer::new(model, Objective::Binary);
    trainer.add_metric(Accuracy::default());
    let result = trainer.fit(&dataset, &options(5)).unwrap();

    assert_eq!(result.epochs_run, 5);
    assert_eq!(trainer.history().len(), 5);
    assert_eq!(trainer.history().get("train_acc").map(<[f32]>::len), Some(5));
}

#[test]
fn test_cyclic_lr_history_per_batch() {
    let (model, dataset) = setup();
    let mut trainer = Trainer::new(model, Objective::Binary)
        .with_component_optimizer("wide", SGD::new(0.01, 0.9))
        .with_component_optimizer("deepdense", SGD::new(0.01, 0.9))
        .with_lr_scheduler("wide", CyclicLR::new(0.001, 0.01, 5))
        .with_lr_scheduler("deepdense", StepLR::new(0.01, 2, 0.5));
    trainer.add_callback(LRHistory::new());
    trainer.fit(&dataset, &options(5)).unwrap();

    // 100 rows at batch size 32 is 4 batches per epoch
    let lr = trainer.lr_history().unwrap();
    assert_eq!(lr.get("wide").map(<[f32]>::len), Some(21));
    assert_eq!(lr.get("deepdense").map(<[f32]>::len), Some(6));

    let wide = lr.get("wide").unwrap();
    assert!((wide[0] - 0.001).abs() < 1e-9);
    assert!((wide[5] - 0.01).abs() < 1e-6);
}

#[test]
fn test_early_stopping_after_patience() {
    let (model, dataset) = setup();
    let mut trainer = Trainer::new(model, Objective::Binary);
    trainer.add_callback(EarlyStopping::new("val_loss").with_patience(3).with_min_delta(10.0));
    let result = trainer.fit(&dataset, &options(10).with_val_split(0.2)).unwrap();

    assert!(result.stopped_early);
    assert_eq!(trainer.history().len(), 4);
    assert_eq!(trainer.history().get("val_loss").map(<[f32]>::len), Some(4));
}

#[test]
fn test_checkpoints_rotate() {
    let dir = TempDir::new().unwrap();
    let (model, dataset) = setup();
    let mut trainer = Trainer::new(model, Objective::Binary);
    trainer.add_callback(
        ModelCheckpoint::new(dir.path().join("wd_out"))
            .with_monitor("val_loss")
            .with_max_save(2),
    );
    trainer.fit(&dataset, &options(5).with_val_split(0.2)).unwrap();

    let mut names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["wd_out_4.safetensors", "wd_out_5.safetensors"]);
}

#[test]
fn test_checkpoint_reloads_into_fresh_model() {
    let dir = TempDir::new().unwrap();
    let (model, dataset) = setup();
    let mut trainer = Trainer::new(model, Objective::Binary);
    trainer.add_callback(ModelCheckpoint::new(dir.path().join("wd")));
    trainer.fit(&dataset, &options(2)).unwrap();
    let expected = trainer.predict_proba(dataset.input()).unwrap();

    let (fresh, _) = setup();
    let fresh = Trainer::new(fresh, Objective::Binary);
    fresh.load_weights(dir.path().join("wd_2.safetensors")).unwrap();
    let got = fresh.predict_proba(dataset.input()).unwrap();
    for (a, b) in expected.iter().zip(got.iter()) {
        assert!((a - b).abs() < 1e-5);
    }
}
