//! Multi-epoch training loop

use super::core::Trainer;
use super::options::FitOptions;
use super::result::TrainResult;
use crate::data::{Batch, WideDeepDataset};
use crate::models::WideDeep;
use crate::nn::Module;
use crate::optim::{clip_grad_norm, StepMode};
use crate::train::callback::{CallbackAction, CallbackContext, TrainerCallback};
use crate::{Error, Result, Tensor};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info};

/// Loss and activated outputs gathered over one pass
#[derive(Default)]
struct PassStats {
    loss_sum: f32,
    rows: usize,
    outputs: Vec<f32>,
    targets: Vec<f32>,
}

impl PassStats {
    fn record(&mut self, loss: f32, outputs: Vec<f32>, target: &[f32]) {
        self.loss_sum += loss * target.len() as f32;
        self.rows += target.len();
        self.outputs.extend(outputs);
        self.targets.extend_from_slice(target);
    }

    fn mean_loss(&self) -> f32 {
        if self.rows == 0 {
            0.0
        } else {
            self.loss_sum / self.rows as f32
        }
    }
}

/// Optimizer-side state copied into every callback context
struct Snapshot {
    lrs: BTreeMap<String, f32>,
    schedules: BTreeMap<String, StepMode>,
    global_step: usize,
}

fn context<'a>(
    model: &'a WideDeep,
    cursor: Cursor,
    logs: BTreeMap<String, f32>,
    snapshot: Snapshot,
    start: Instant,
) -> CallbackContext<'a> {
    CallbackContext {
        epoch: cursor.epoch,
        max_epochs: cursor.max_epochs,
        batch: cursor.batch,
        batches_per_epoch: cursor.batches_per_epoch,
        global_step: snapshot.global_step,
        loss: cursor.loss,
        logs,
        lrs: snapshot.lrs,
        schedules: snapshot.schedules,
        elapsed_secs: start.elapsed().as_secs_f64(),
        model: Some(model),
    }
}

/// Position of the loop, copied into every callback context
#[derive(Clone, Copy, Default)]
struct Cursor {
    epoch: usize,
    max_epochs: usize,
    batch: usize,
    batches_per_epoch: usize,
    loss: f32,
}

impl Trainer {
    /// Train on `dataset`, holding out `options.val_split` of it for validation
    pub fn fit(&mut self, dataset: &WideDeepDataset, options: &FitOptions) -> Result<TrainResult> {
        options.validate()?;
        if options.val_split > 0.0 {
            let (train, val) = dataset.split(options.val_split, options.seed)?;
            self.run(&train, Some(&val), options)
        } else {
            self.run(dataset, None, options)
        }
    }

    /// Train on `train`, validating on `val`; `options.val_split` is ignored
    pub fn fit_with_validation(
        &mut self,
        train: &WideDeepDataset,
        val: &WideDeepDataset,
        options: &FitOptions,
    ) -> Result<TrainResult> {
        options.validate()?;
        self.run(train, Some(val), options)
    }

    fn check_data(&self, train: &WideDeepDataset, val: Option<&WideDeepDataset>) -> Result<()> {
        if self.model.pred_dim() != self.objective.pred_dim() {
            return Err(Error::InvalidConfig(format!(
                "model pred_dim is {} but a {:?} objective needs {}",
                self.model.pred_dim(),
                self.objective,
                self.objective.pred_dim()
            )));
        }
        if train.is_empty() {
            return Err(Error::InvalidConfig("training set is empty".into()));
        }
        self.objective.validate_targets(train.target())?;
        if let Some(val) = val {
            self.objective.validate_targets(val.target())?;
        }
        Ok(())
    }

    /// Learning rates, schedules and step count for the next context
    fn snapshot(&self) -> Snapshot {
        Snapshot { lrs: self.lrs(), schedules: self.schedules(), global_step: self.global_step }
    }

    fn run(
        &mut self,
        train: &WideDeepDataset,
        val: Option<&WideDeepDataset>,
        options: &FitOptions,
    ) -> Result<TrainResult> {
        self.check_data(train, val)?;
        let groups = self.param_groups()?;
        self.install_progress();
        for (name, scheduler) in &self.schedulers {
            if let Some(opt) = self.optimizers.get_mut(name) {
                scheduler.apply(opt.as_mut());
            }
        }

        let start = Instant::now();
        let mut rng = StdRng::seed_from_u64(options.seed);
        let mut cursor = Cursor {
            max_epochs: options.n_epochs,
            batches_per_epoch: train.num_batches(options.batch_size),
            ..Default::default()
        };
        info!(
            rows = train.len(),
            val_rows = val.map_or(0, WideDeepDataset::len),
            epochs = options.n_epochs,
            groups = ?groups.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>(),
            "training started"
        );

        let mut stopped_early = false;
        let mut epochs_run = 0;
        let mut final_loss = 0.0;
        let mut best_loss = f32::INFINITY;

        let ctx = context(&self.model, cursor, BTreeMap::new(), self.snapshot(), start);
        self.history.on_train_begin(&ctx)?;
        if self.callbacks.on_train_begin(&ctx)? == CallbackAction::Stop {
            stopped_early = true;
        }

        while !stopped_early && cursor.epoch < options.n_epochs {
            self.model.train();
            cursor.batch = 0;
            let ctx = context(&self.model, cursor, BTreeMap::new(), self.snapshot(), start);
            if self.callbacks.on_epoch_begin(&ctx)? == CallbackAction::Stop {
                stopped_early = true;
                break;
            }

            let mut stop = false;
            let mut stats = PassStats::default();
            for (index, batch) in
                train.batches(options.batch_size, options.shuffle, &mut rng).iter().enumerate()
            {
                if stop {
                    break;
                }
                cursor.batch = index;
                let ctx = context(&self.model, cursor, BTreeMap::new(), self.snapshot(), start);
                stop |= self.callbacks.on_batch_begin(&ctx)? == CallbackAction::Stop;

                let (loss, outputs) = self.train_step(batch, &groups)?;
                stats.record(loss, outputs, batch.target.as_slice().expect("contiguous"));
                self.step_schedulers(StepMode::PerBatch, None);

                cursor.loss = loss;
                let ctx = context(&self.model, cursor, BTreeMap::new(), self.snapshot(), start);
                stop |= self.callbacks.on_batch_end(&ctx)? == CallbackAction::Stop;
            }

            let mut logs = BTreeMap::new();
            let train_loss = stats.mean_loss();
            logs.insert("train_loss".to_string(), train_loss);
            self.log_metrics("train", &stats, &mut logs);

            if let Some(val) = val.filter(|_| (cursor.epoch + 1) % options.validation_freq == 0) {
                let val_stats = self.evaluate(val, options.batch_size)?;
                logs.insert("val_loss".to_string(), val_stats.mean_loss());
                self.log_metrics("val", &val_stats, &mut logs);
            }

            let monitored = logs.get("val_loss").copied().unwrap_or(train_loss);
            self.step_schedulers(StepMode::PerEpoch, Some(monitored));
            best_loss = best_loss.min(monitored);
            final_loss = train_loss;
            epochs_run += 1;
            debug!(epoch = cursor.epoch + 1, ?logs, "epoch finished");

            cursor.loss = train_loss;
            cursor.batch = cursor.batches_per_epoch;
            let ctx = context(&self.model, cursor, logs, self.snapshot(), start);
            self.history.on_epoch_end(&ctx)?;
            stop |= self.callbacks.on_epoch_end(&ctx)? == CallbackAction::Stop;

            stopped_early = stop && cursor.epoch + 1 < options.n_epochs;
            cursor.epoch += 1;
        }

        self.model.eval();
        let ctx = context(&self.model, cursor, BTreeMap::new(), self.snapshot(), start);
        self.callbacks.on_train_end(&ctx)?;
        info!(epochs_run, final_loss, stopped_early, "training finished");

        Ok(TrainResult {
            epochs_run,
            final_loss,
            best_loss,
            stopped_early,
            steps: self.global_step,
            elapsed_secs: start.elapsed().as_secs_f64(),
        })
    }

    /// Forward, backward and one step of every optimizer
    fn train_step(&mut self, batch: &Batch, groups: &[(String, Vec<Tensor>)]) -> Result<(f32, Vec<f32>)> {
        for (name, params) in groups {
            if let Some(opt) = self.optimizers.get_mut(name) {
                opt.zero_grad(params);
            }
        }

        let outputs = self.model.forward(&batch.input)?;
        let target = Tensor::from_vec(batch.target.to_vec(), false);
        let loss = self.loss_fn.forward(&outputs, &target);
        loss.backward();

        if let Some(max_norm) = self.max_grad_norm {
            let all: Vec<Tensor> = groups.iter().flat_map(|(_, p)| p.iter().cloned()).collect();
            clip_grad_norm(&all, max_norm);
        }
        for (name, params) in groups {
            if let Some(opt) = self.optimizers.get_mut(name) {
                opt.step(params);
            }
        }
        self.global_step += 1;

        let activated = self.objective.activate(outputs.data().as_slice().expect("contiguous"));
        Ok((loss.item(), activated))
    }

    /// Advance the schedulers of `mode` and push their rates into the optimizers
    fn step_schedulers(&mut self, mode: StepMode, metric: Option<f32>) {
        for (name, scheduler) in &mut self.schedulers {
            if scheduler.step_mode() != mode {
                continue;
            }
            match metric {
                Some(value) if scheduler.needs_metric() => scheduler.step_with_metric(value),
                _ => scheduler.step(),
            }
            if let Some(opt) = self.optimizers.get_mut(name) {
                scheduler.apply(opt.as_mut());
            }
        }
    }

    /// Loss and outputs over `dataset` in evaluation mode
    fn evaluate(&self, dataset: &WideDeepDataset, batch_size: usize) -> Result<PassStats> {
        self.model.eval();
        let mut stats = PassStats::default();
        let mut rng = StdRng::seed_from_u64(0);
        for batch in dataset.batches(batch_size, false, &mut rng) {
            let outputs = self.model.forward(&batch.input)?;
            let target = Tensor::from_vec(batch.target.to_vec(), false);
            let loss = self.loss_fn.forward(&outputs, &target).item();
            let activated = self.objective.activate(outputs.data().as_slice().expect("contiguous"));
            stats.record(loss, activated, batch.target.as_slice().expect("contiguous"));
        }
        self.model.train();
        Ok(stats)
    }

    fn log_metrics(&self, prefix: &str, stats: &PassStats, logs: &mut BTreeMap<String, f32>) {
        if self.metrics.is_empty() || stats.rows == 0 {
            return;
        }
        let predictions = Tensor::from_vec(stats.outputs.clone(), false);
        let targets = Tensor::from_vec(stats.targets.clone(), false);
        for metric in &self.metrics {
            logs.insert(format!("{prefix}_{}", metric.name()), metric.compute(&predictions, &targets));
        }
    }
}
