//! Callback manager for dispatching events to multiple callbacks

use super::traits::{CallbackAction, CallbackContext, TrainerCallback};
use crate::Result;
use std::any::Any;

/// Manages multiple callbacks and dispatches events
///
/// Every callback sees every event, in registration order, even after an
/// earlier one asked to stop; the combined action is `Stop` if any callback
/// returned it.
pub struct CallbackManager {
    callbacks: Vec<Box<dyn TrainerCallback>>,
}

impl CallbackManager {
    /// Create new callback manager
    pub fn new() -> Self {
        Self { callbacks: Vec::new() }
    }

    /// Add a callback
    pub fn add<C: TrainerCallback>(&mut self, callback: C) {
        self.callbacks.push(Box::new(callback));
    }

    /// Add an already boxed callback
    pub fn add_boxed(&mut self, callback: Box<dyn TrainerCallback>) {
        self.callbacks.push(callback);
    }

    /// Check if no callbacks are registered
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Get number of callbacks
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Names of the registered callbacks, in dispatch order
    pub fn names(&self) -> Vec<&'static str> {
        self.callbacks.iter().map(|cb| cb.name()).collect()
    }

    /// First registered callback of type `T`
    pub fn find<T: TrainerCallback>(&self) -> Option<&T> {
        self.callbacks.iter().find_map(|cb| (cb.as_ref() as &dyn Any).downcast_ref::<T>())
    }

    /// Mutable access to the first registered callback of type `T`
    pub fn find_mut<T: TrainerCallback>(&mut self) -> Option<&mut T> {
        self.callbacks
            .iter_mut()
            .find_map(|cb| (cb.as_mut() as &mut dyn Any).downcast_mut::<T>())
    }

    fn dispatch<F>(&mut self, mut event: F) -> Result<CallbackAction>
    where
        F: FnMut(&mut dyn TrainerCallback) -> Result<CallbackAction>,
    {
        let mut action = CallbackAction::Continue;
        for cb in &mut self.callbacks {
            if event(cb.as_mut())? == CallbackAction::Stop {
                action = CallbackAction::Stop;
            }
        }
        Ok(action)
    }

    /// Fire train begin event
    pub fn on_train_begin(&mut self, ctx: &CallbackContext) -> Result<CallbackAction> {
        self.dispatch(|cb| cb.on_train_begin(ctx))
    }

    /// Fire train end event
    pub fn on_train_end(&mut self, ctx: &CallbackContext) -> Result<()> {
        for cb in &mut self.callbacks {
            cb.on_train_end(ctx)?;
        }
        Ok(())
    }

    /// Fire epoch begin event
    pub fn on_epoch_begin(&mut self, ctx: &CallbackContext) -> Result<CallbackAction> {
        self.dispatch(|cb| cb.on_epoch_begin(ctx))
    }

    /// Fire epoch end event
    pub fn on_epoch_end(&mut self, ctx: &CallbackContext) -> Result<CallbackAction> {
        self.dispatch(|cb| cb.on_epoch_end(ctx))
    }

    /// Fire batch begin event
    pub fn on_batch_begin(&mut self, ctx: &CallbackContext) -> Result<CallbackAction> {
        self.dispatch(|cb| cb.on_batch_begin(ctx))
    }

    /// Fire batch end event
    pub fn on_batch_end(&mut self, ctx: &CallbackContext) -> Result<CallbackAction> {
        self.dispatch(|cb| cb.on_batch_end(ctx))
    }
}

impl Default for CallbackManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::train::callback::{EarlyStopping, History, ProgressCallback};
    use crate::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StopCallback;
    impl TrainerCallback for StopCallback {
        fn on_epoch_end(&mut self, _: &CallbackContext) -> Result<CallbackAction> {
            Ok(CallbackAction::Stop)
        }
        fn name(&self) -> &'static str {
            "StopCallback"
        }
    }

    struct CountCallback {
        calls: Arc<AtomicUsize>,
    }
    impl TrainerCallback for CountCallback {
        fn on_epoch_end(&mut self, _: &CallbackContext) -> Result<CallbackAction> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CallbackAction::Continue)
        }
    }

    #[test]
    fn test_callback_manager_dispatch() {
        let mut manager = CallbackManager::new();
        manager.add(EarlyStopping::new("train_loss").with_patience(1));

        let mut ctx = CallbackContext::default();
        ctx.logs.insert("train_loss".into(), 1.0);
        assert_eq!(manager.on_epoch_end(&ctx).unwrap(), CallbackAction::Continue);

        ctx.epoch = 1;
        assert_eq!(manager.on_epoch_end(&ctx).unwrap(), CallbackAction::Stop);
    }

    #[test]
    fn test_stop_still_reaches_later_callbacks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut manager = CallbackManager::new();
        manager.add(StopCallback);
        manager.add(CountCallback { calls: calls.clone() });

        let action = manager.on_epoch_end(&CallbackContext::default()).unwrap();
        assert_eq!(action, CallbackAction::Stop);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_error_aborts_dispatch() {
        struct FailCallback;
        impl TrainerCallback for FailCallback {
            fn on_epoch_end(&mut self, _: &CallbackContext) -> Result<CallbackAction> {
                Err(Error::InvalidConfig("boom".into()))
            }
        }

        let calls = Arc::new(AtomicUsize::new(0));
        let mut manager = CallbackManager::new();
        manager.add(FailCallback);
        manager.add(CountCallback { calls: calls.clone() });

        assert!(manager.on_epoch_end(&CallbackContext::default()).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_callback_manager_len_and_find() {
        let mut manager = CallbackManager::new();
        assert!(manager.is_empty());

        manager.add(History::new());
        manager.add(ProgressCallback::new(10));
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.names(), vec!["History", "ProgressCallback"]);

        assert!(manager.find::<History>().is_some());
        assert!(manager.find::<EarlyStopping>().is_none());
        assert!(manager.find_mut::<ProgressCallback>().is_some());
    }
}
