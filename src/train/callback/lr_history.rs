//! Learning-rate trace of every scheduled parameter group

use super::traits::{CallbackAction, CallbackContext, TrainerCallback};
use crate::optim::StepMode;
use crate::Result;
use std::collections::BTreeMap;

/// Records the learning rate of each scheduled group under `lr_<group>`
///
/// The starting rate is recorded at train begin. Groups driven by a
/// [`StepMode::PerBatch`] scheduler then get one entry per batch and the rest
/// one entry per epoch, so a cyclic schedule over `n` batches and `e` epochs
/// yields `1 + n * e` values and an epoch schedule `1 + e`. Groups without a
/// scheduler are not tracked.
#[derive(Clone, Debug, Default)]
pub struct LRHistory {
    records: BTreeMap<String, Vec<f32>>,
}

impl LRHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trace of `group`, looked up either as `lr_<group>` or by its bare name
    pub fn get(&self, group: &str) -> Option<&[f32]> {
        self.records
            .get(group)
            .or_else(|| self.records.get(&format!("lr_{group}")))
            .map(Vec::as_slice)
    }

    pub fn records(&self) -> &BTreeMap<String, Vec<f32>> {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn record(&mut self, ctx: &CallbackContext, mode: Option<StepMode>) {
        for (group, step_mode) in &ctx.schedules {
            if mode.is_some_and(|m| m != *step_mode) {
                continue;
            }
            if let Some(lr) = ctx.lrs.get(group) {
                self.records.entry(format!("lr_{group}")).or_default().push(*lr);
            }
        }
    }
}

impl TrainerCallback for LRHistory {
    fn on_train_begin(&mut self, ctx: &CallbackContext) -> Result<CallbackAction> {
        self.records.clear();
        self.record(ctx, None);
        Ok(CallbackAction::Continue)
    }

    fn on_batch_end(&mut self, ctx: &CallbackContext) -> Result<CallbackAction> {
        self.record(ctx, Some(StepMode::PerBatch));
        Ok(CallbackAction::Continue)
    }

    fn on_epoch_end(&mut self, ctx: &CallbackContext) -> Result<CallbackAction> {
        self.record(ctx, Some(StepMode::PerEpoch));
        Ok(CallbackAction::Continue)
    }

    fn name(&self) -> &'static str {
        "LRHistory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(lrs: &[(&str, f32)], schedules: &[(&str, StepMode)]) -> CallbackContext<'static> {
        CallbackContext {
            lrs: lrs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            schedules: schedules.iter().map(|(k, m)| (k.to_string(), *m)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_per_batch_group_tracks_batches() {
        let mut lr = LRHistory::new();
        let schedules = [("wide", StepMode::PerBatch)];
        lr.on_train_begin(&ctx(&[("wide", 0.1)], &schedules)).unwrap();
        for _ in 0..3 {
            lr.on_batch_end(&ctx(&[("wide", 0.2)], &schedules)).unwrap();
        }
        lr.on_epoch_end(&ctx(&[("wide", 0.2)], &schedules)).unwrap();

        assert_eq!(lr.get("lr_wide").map(<[f32]>::len), Some(4));
        assert_eq!(lr.get("wide").unwrap()[0], 0.1);
    }

    #[test]
    fn test_per_epoch_group_tracks_epochs() {
        let mut lr = LRHistory::new();
        let schedules = [("deepdense", StepMode::PerEpoch)];
        lr.on_train_begin(&ctx(&[("deepdense", 0.1)], &schedules)).unwrap();
        for epoch in 0..2 {
            lr.on_batch_end(&ctx(&[("deepdense", 0.1)], &schedules)).unwrap();
            let next = 0.1 * 0.5f32.powi(epoch + 1);
            lr.on_epoch_end(&ctx(&[("deepdense", next)], &schedules)).unwrap();
        }
        assert_eq!(lr.get("deepdense"), Some(&[0.1, 0.05, 0.025][..]));
    }

    #[test]
    fn test_unscheduled_groups_ignored() {
        let mut lr = LRHistory::new();
        let c = ctx(&[("wide", 0.1), ("deepdense", 0.01)], &[("wide", StepMode::PerEpoch)]);
        lr.on_train_begin(&c).unwrap();
        lr.on_epoch_end(&c).unwrap();
        assert!(lr.get("deepdense").is_none());
        assert_eq!(lr.records().len(), 1);
    }
}
