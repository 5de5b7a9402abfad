//! Property-based tests for configuration validation

use super::error::ValidationError;
use super::validator::validate_config;
use crate::config::schema::*;
use proptest::prelude::*;
use std::collections::HashMap;
use std::path::PathBuf;

fn arb_valid_spec() -> impl Strategy<Value = ExperimentSpec> {
    (
        1usize..256,                        // batch_size
        1e-6f32..1.0,                       // lr
        1usize..100,                        // epochs
        0.0f32..0.9,                        // val_split
        proptest::option::of(0.1f32..10.0), // grad_clip
    )
        .prop_map(|(batch_size, lr, epochs, val_split, grad_clip)| {
            let optimizers = [(
                "wide".to_string(),
                OptimSpec { name: "adam".to_string(), lr, params: HashMap::new() },
            )]
            .into_iter()
            .collect();
            ExperimentSpec {
                data: DataSpec {
                    csv: PathBuf::from("adult.csv"),
                    target: "label".into(),
                    wide_cols: vec!["education".into()],
                    crossed_cols: Vec::new(),
                    embed_cols: vec![EmbedColSpec::Name("workclass".into())],
                    continuous_cols: vec!["age".into()],
                    scale: true,
                    text_col: None,
                    text: TextSpec::default(),
                },
                model: ModelSpec::default(),
                training: TrainingSpec {
                    batch_size,
                    epochs,
                    val_split,
                    grad_clip,
                    ..Default::default()
                },
                optimizers,
                schedulers: Default::default(),
                callbacks: CallbacksSpec::default(),
            }
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_valid_spec_passes(spec in arb_valid_spec()) {
        prop_assert!(validate_config(&spec).is_ok());
    }

    #[test]
    fn prop_zero_batch_size_fails(spec in arb_valid_spec()) {
        let mut spec = spec;
        spec.training.batch_size = 0;
        prop_assert!(matches!(
            validate_config(&spec),
            Err(ValidationError::InvalidBatchSize(0))
        ));
    }

    #[test]
    fn prop_negative_lr_fails(spec in arb_valid_spec(), neg_lr in -1.0f32..=0.0) {
        let mut spec = spec;
        if let Some(optim) = spec.optimizers.get_mut("wide") {
            optim.lr = neg_lr;
        }
        prop_assert!(matches!(
            validate_config(&spec),
            Err(ValidationError::InvalidLearningRate { .. })
        ), "expected InvalidLearningRate");
    }

    #[test]
    fn prop_val_split_out_of_range_fails(spec in arb_valid_spec(), split in 1.0f32..5.0) {
        let mut spec = spec;
        spec.training.val_split = split;
        prop_assert!(matches!(
            validate_config(&spec),
            Err(ValidationError::InvalidValSplit(_))
        ));
    }

    #[test]
    fn prop_dropout_out_of_range_fails(spec in arb_valid_spec(), p in 1.0f32..2.0) {
        let mut spec = spec;
        spec.model.dropout = vec![p];
        prop_assert!(matches!(
            validate_config(&spec),
            Err(ValidationError::InvalidDropout(_))
        ));
    }
}
