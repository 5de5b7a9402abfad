//! Core Trainer struct and basic methods

use crate::io::{load_state_dict, save_state_dict};
use crate::models::WideDeep;
use crate::nn::Module;
use crate::optim::{Adam, LRScheduler, Optimizer, StepMode};
use crate::train::callback::{
    CallbackManager, History, LRHistory, ProgressCallback, TrainerCallback,
};
use crate::train::{LossFn, Metric, Objective};
use crate::{Error, Result, Tensor};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Name of the parameter group used when one optimizer drives the whole model
pub const MODEL_GROUP: &str = "model";

/// Learning rate of the optimizer given to components without one
pub const DEFAULT_LR: f32 = 1e-3;

/// Orchestrates training of a [`WideDeep`] model
///
/// Parameters are split into groups, one per component (`wide`,
/// `deepdense`, `deeptext`, `deepimage`, `deephead`) each with its own
/// optimizer and optional scheduler, or a single `model` group when
/// [`Trainer::with_optimizer`] is used.
///
/// # Example
///
/// ```no_run
/// use widedeep::models::{Wide, WideDeep};
/// use widedeep::optim::{CyclicLR, SGD};
/// use widedeep::train::{Objective, Trainer};
///
/// let model = WideDeep::builder().wide(Wide::new(20, 1)).build().unwrap();
/// let trainer = Trainer::new(model, Objective::Binary)
///     .with_component_optimizer("wide", SGD::new(0.01, 0.9))
///     .with_lr_scheduler("wide", CyclicLR::new(0.001, 0.01, 10));
/// ```
pub struct Trainer {
    pub(crate) model: WideDeep,
    pub(crate) objective: Objective,
    pub(crate) loss_fn: Box<dyn LossFn>,
    pub(crate) optimizers: BTreeMap<String, Box<dyn Optimizer>>,
    pub(crate) schedulers: BTreeMap<String, Box<dyn LRScheduler>>,
    pub(crate) metrics: Vec<Box<dyn Metric>>,
    pub(crate) history: History,
    pub(crate) callbacks: CallbackManager,
    pub(crate) max_grad_norm: Option<f32>,
    pub(crate) verbose: bool,
    pub(crate) global_step: usize,
}

impl Trainer {
    /// Create a trainer; the loss follows from `objective`
    pub fn new(model: WideDeep, objective: Objective) -> Self {
        Self {
            model,
            objective,
            loss_fn: objective.loss(),
            optimizers: BTreeMap::new(),
            schedulers: BTreeMap::new(),
            metrics: Vec::new(),
            history: History::new(),
            callbacks: CallbackManager::new(),
            max_grad_norm: None,
            verbose: false,
            global_step: 0,
        }
    }

    /// Drive every parameter with one optimizer (group `model`)
    ///
    /// Replaces any per-component optimizers.
    pub fn with_optimizer(mut self, optimizer: impl Optimizer + 'static) -> Self {
        self.set_optimizer(MODEL_GROUP, Box::new(optimizer));
        self
    }

    /// Optimizer for one component; components left without one get `Adam(lr = 1e-3)`
    pub fn with_component_optimizer(
        mut self,
        component: impl Into<String>,
        optimizer: impl Optimizer + 'static,
    ) -> Self {
        self.set_optimizer(component, Box::new(optimizer));
        self
    }

    /// Scheduler for the parameter group `group`
    pub fn with_lr_scheduler(
        mut self,
        group: impl Into<String>,
        scheduler: impl LRScheduler + 'static,
    ) -> Self {
        self.schedulers.insert(group.into(), Box::new(scheduler));
        self
    }

    /// Install a boxed optimizer for `group`; the `model` group replaces all others
    pub fn set_optimizer(&mut self, group: impl Into<String>, optimizer: Box<dyn Optimizer>) {
        let group = group.into();
        if group == MODEL_GROUP {
            self.optimizers.clear();
        } else {
            self.optimizers.remove(MODEL_GROUP);
        }
        self.optimizers.insert(group, optimizer);
    }

    /// Install a boxed scheduler for `group`
    pub fn set_lr_scheduler(&mut self, group: impl Into<String>, scheduler: Box<dyn LRScheduler>) {
        self.schedulers.insert(group.into(), scheduler);
    }

    /// Clip the global gradient norm before every optimizer step
    pub fn with_max_grad_norm(mut self, max_norm: f32) -> Self {
        self.max_grad_norm = Some(max_norm);
        self
    }

    /// Log per-epoch progress through a [`ProgressCallback`]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Replace the objective's default loss
    pub fn with_loss(mut self, loss_fn: impl LossFn + 'static) -> Self {
        self.loss_fn = Box::new(loss_fn);
        self
    }

    /// Add a callback to the trainer
    pub fn add_callback<C: TrainerCallback>(&mut self, callback: C) {
        self.callbacks.add(callback);
    }

    /// Add a metric, logged as `train_<name>` and `val_<name>`
    pub fn add_metric<M: Metric + 'static>(&mut self, metric: M) {
        self.metrics.push(Box::new(metric));
    }

    pub fn model(&self) -> &WideDeep {
        &self.model
    }

    pub fn into_model(self) -> WideDeep {
        self.model
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// Per-epoch logs of the last `fit`
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Learning-rate trace, when an [`LRHistory`] callback was added
    pub fn lr_history(&self) -> Option<&LRHistory> {
        self.callbacks.find::<LRHistory>()
    }

    /// Get reference to callback manager
    pub fn callbacks(&self) -> &CallbackManager {
        &self.callbacks
    }

    /// Get mutable reference to callback manager
    pub fn callbacks_mut(&mut self) -> &mut CallbackManager {
        &mut self.callbacks
    }

    /// Current learning rate of every parameter group
    pub fn lrs(&self) -> BTreeMap<String, f32> {
        self.optimizers.iter().map(|(name, opt)| (name.clone(), opt.lr())).collect()
    }

    pub(crate) fn schedules(&self) -> BTreeMap<String, StepMode> {
        self.schedulers.iter().map(|(name, s)| (name.clone(), s.step_mode())).collect()
    }

    /// Optimizer steps taken over every `fit`
    pub fn global_step(&self) -> usize {
        self.global_step
    }

    /// Write the model weights to a safetensors file
    pub fn save_weights(&self, path: impl AsRef<Path>) -> Result<()> {
        let metadata = HashMap::from([
            ("objective".to_string(), format!("{:?}", self.objective)),
            ("components".to_string(), self.model.component_names().join(",")),
        ]);
        save_state_dict(path, &self.model.state_dict(), metadata)
    }

    /// Load model weights written by [`Trainer::save_weights`]
    pub fn load_weights(&self, path: impl AsRef<Path>) -> Result<()> {
        self.model.load_state_dict(&load_state_dict(path)?)
    }

    /// Parameter groups with an optimizer each, created on first use
    ///
    /// Fails on optimizers or schedulers naming a group the model lacks.
    pub(crate) fn param_groups(&mut self) -> Result<Vec<(String, Vec<Tensor>)>> {
        let components = self.model.component_names();
        let groups: Vec<(String, Vec<Tensor>)> = if self.optimizers.contains_key(MODEL_GROUP) {
            vec![(MODEL_GROUP.to_string(), self.model.parameters())]
        } else {
            if let Some(unknown) =
                self.optimizers.keys().find(|k| !components.contains(&k.as_str()))
            {
                return Err(Error::InvalidConfig(format!(
                    "optimizer given for '{unknown}' but the model components are {components:?}"
                )));
            }
            components
                .iter()
                .filter_map(|name| {
                    self.model.component_parameters(name).map(|p| (name.to_string(), p))
                })
                .collect()
        };

        for (name, _) in &groups {
            self.optimizers
                .entry(name.clone())
                .or_insert_with(|| Box::new(Adam::default_params(DEFAULT_LR)));
        }
        if let Some(unknown) = self.schedulers.keys().find(|k| !self.optimizers.contains_key(*k)) {
            return Err(Error::InvalidConfig(format!(
                "scheduler given for '{unknown}' which has no optimizer; groups are {:?}",
                self.optimizers.keys().collect::<Vec<_>>()
            )));
        }
        Ok(groups)
    }

    /// Install the progress logger once when verbose
    pub(crate) fn install_progress(&mut self) {
        if self.verbose && self.callbacks.find::<ProgressCallback>().is_none() {
            self.callbacks.add(ProgressCallback::default());
        }
    }
}
