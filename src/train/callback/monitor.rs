//! Direction in which a monitored quantity improves

use serde::{Deserialize, Serialize};

/// Direction in which a monitored quantity improves
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorMode {
    /// Lower is better (losses)
    Min,
    /// Higher is better (accuracy, f1, r2, ...)
    Max,
    /// Inferred from the monitored name
    #[default]
    Auto,
}

const HIGHER_IS_BETTER: [&str; 9] =
    ["acc", "accuracy", "prec", "precision", "rec", "recall", "f1", "r2", "r2_score"];

fn is_higher_better(monitor: &str) -> bool {
    let metric = monitor
        .strip_prefix("train_")
        .or_else(|| monitor.strip_prefix("val_"))
        .unwrap_or(monitor);
    HIGHER_IS_BETTER.contains(&metric)
}

impl MonitorMode {
    /// Concrete mode for `monitor`; `Auto` becomes `Max` for metric names and `Min` otherwise
    pub fn resolve(self, monitor: &str) -> Self {
        match self {
            Self::Auto if is_higher_better(monitor) => Self::Max,
            Self::Auto => Self::Min,
            other => other,
        }
    }

    /// Value every real observation beats
    pub fn worst(self) -> f32 {
        match self {
            Self::Max => f32::NEG_INFINITY,
            _ => f32::INFINITY,
        }
    }

    /// Whether `current` beats `best` by more than `min_delta`
    pub fn improved(self, current: f32, best: f32, min_delta: f32) -> bool {
        match self {
            Self::Max => current - min_delta > best,
            _ => current + min_delta < best,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_resolves_by_name() {
        assert_eq!(MonitorMode::Auto.resolve("val_loss"), MonitorMode::Min);
        assert_eq!(MonitorMode::Auto.resolve("val_acc"), MonitorMode::Max);
        assert_eq!(MonitorMode::Auto.resolve("train_f1"), MonitorMode::Max);
        assert_eq!(MonitorMode::Auto.resolve("val_r2"), MonitorMode::Max);
        assert_eq!(MonitorMode::Min.resolve("val_acc"), MonitorMode::Min);
    }

    #[test]
    fn test_auto_matches_whole_metric_name() {
        assert_eq!(MonitorMode::Auto.resolve("val_correction_loss"), MonitorMode::Min);
        assert_eq!(MonitorMode::Auto.resolve("train_accumulated_loss"), MonitorMode::Min);
        assert_eq!(MonitorMode::Auto.resolve("val_recall"), MonitorMode::Max);
        assert_eq!(MonitorMode::Auto.resolve("prec"), MonitorMode::Max);
    }

    #[test]
    fn test_improved_respects_delta() {
        assert!(MonitorMode::Min.improved(0.5, 1.0, 0.1));
        assert!(!MonitorMode::Min.improved(0.95, 1.0, 0.1));
        assert!(MonitorMode::Max.improved(0.9, 0.5, 0.1));
        assert!(!MonitorMode::Max.improved(0.55, 0.5, 0.1));
    }

    #[test]
    fn test_any_value_beats_worst() {
        for mode in [MonitorMode::Min, MonitorMode::Max] {
            assert!(mode.improved(123.0, mode.worst(), 0.0));
            assert!(mode.improved(-123.0, mode.worst(), 0.0));
        }
    }

    #[test]
    fn test_mode_deserializes_lowercase() {
        let mode: MonitorMode = serde_yaml::from_str("max").unwrap();
        assert_eq!(mode, MonitorMode::Max);
    }
}
