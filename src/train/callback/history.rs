//! Per-epoch record of every logged value

use super::traits::{CallbackAction, CallbackContext, TrainerCallback};
use crate::Result;
use std::collections::BTreeMap;

/// Records every epoch log (`train_loss`, `val_loss`, `train_acc`, ...)
///
/// The trainer installs one ahead of any user callback. Keys appear the first
/// epoch they are logged; a key absent from an epoch's logs simply gets no
/// entry for that epoch.
#[derive(Clone, Debug, Default)]
pub struct History {
    records: BTreeMap<String, Vec<f32>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values of `key`, one per epoch it was logged
    pub fn get(&self, key: &str) -> Option<&[f32]> {
        self.records.get(key).map(Vec::as_slice)
    }

    /// All recorded series
    pub fn records(&self) -> &BTreeMap<String, Vec<f32>> {
        &self.records
    }

    /// Number of epochs recorded for `train_loss`
    pub fn len(&self) -> usize {
        self.get("train_loss").map_or(0, <[f32]>::len)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl TrainerCallback for History {
    fn on_train_begin(&mut self, _ctx: &CallbackContext) -> Result<CallbackAction> {
        self.records.clear();
        Ok(CallbackAction::Continue)
    }

    fn on_epoch_end(&mut self, ctx: &CallbackContext) -> Result<CallbackAction> {
        for (key, value) in &ctx.logs {
            self.records.entry(key.clone()).or_default().push(*value);
        }
        Ok(CallbackAction::Continue)
    }

    fn name(&self) -> &'static str {
        "History"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn epoch_ctx(epoch: usize, logs: &[(&str, f32)]) -> CallbackContext<'static> {
        CallbackContext {
            epoch,
            logs: logs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_history_records_each_epoch() {
        let mut history = History::new();
        history.on_train_begin(&CallbackContext::default()).unwrap();
        for epoch in 0..3 {
            let loss = 1.0 / (epoch + 1) as f32;
            history.on_epoch_end(&epoch_ctx(epoch, &[("train_loss", loss)])).unwrap();
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.get("train_loss").unwrap()[2], 1.0 / 3.0);
    }

    #[test]
    fn test_validation_keys_only_when_logged() {
        let mut history = History::new();
        history.on_epoch_end(&epoch_ctx(0, &[("train_loss", 1.0)])).unwrap();
        history
            .on_epoch_end(&epoch_ctx(1, &[("train_loss", 0.8), ("val_loss", 0.9)]))
            .unwrap();

        assert_eq!(history.get("train_loss").map(<[f32]>::len), Some(2));
        assert_eq!(history.get("val_loss"), Some(&[0.9][..]));
        assert!(history.get("val_acc").is_none());
    }

    #[test]
    fn test_train_begin_clears() {
        let mut history = History::new();
        history.on_epoch_end(&epoch_ctx(0, &[("train_loss", 1.0)])).unwrap();
        history.on_train_begin(&CallbackContext::default()).unwrap();
        assert!(history.is_empty());
        assert_eq!(history.len(), 0);
    }
}
