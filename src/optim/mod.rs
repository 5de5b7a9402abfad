//! Optimizers and learning rate schedulers for training neural networks

mod adam;
mod adamw;
mod clip;
mod optimizer;
mod radam;
mod rmsprop;
mod scheduler;
mod sgd;

pub use adam::Adam;
pub use adamw::AdamW;
pub use clip::clip_grad_norm;
pub use optimizer::Optimizer;
pub use radam::RAdam;
pub use rmsprop::RMSprop;
pub use scheduler::{
    AnnealStrategy, CyclicLR, CyclicMode, ExponentialLR, LRScheduler, MultiStepLR, OneCycleLR,
    PlateauMode, ReduceLROnPlateau, StepLR, StepMode, ThresholdMode,
};
pub use sgd::SGD;
