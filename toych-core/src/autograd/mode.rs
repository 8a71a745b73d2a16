//! Training-mode flag.
//!
//! While training mode is on (the default), operations record graph nodes, layers
//! cache their forward state and dropout is active. The flag is per thread and is
//! only changed through [`TrainingModeGuard`], which restores the previous state when
//! dropped, including during unwinding.

use std::cell::Cell;
use std::marker::PhantomData;

thread_local! {
    static TRAINING: Cell<bool> = Cell::new(true);
}

/// Whether operations on this thread currently record gradients.
pub fn is_training() -> bool {
    TRAINING.with(Cell::get)
}

/// Scoped override of the training-mode flag.
#[must_use = "the previous training mode is restored when the guard is dropped"]
#[derive(Debug)]
pub struct TrainingModeGuard {
    previous: bool,
    // Bound to the thread whose flag it changed.
    _not_send: PhantomData<*const ()>,
}

impl TrainingModeGuard {
    pub fn new(enabled: bool) -> Self {
        let previous = TRAINING.with(|flag| flag.replace(enabled));
        TrainingModeGuard {
            previous,
            _not_send: PhantomData,
        }
    }
}

impl Drop for TrainingModeGuard {
    fn drop(&mut self) {
        let previous = self.previous;
        TRAINING.with(|flag| flag.set(previous));
    }
}

/// Turns training mode off until the returned guard is dropped.
pub fn not_training() -> TrainingModeGuard {
    TrainingModeGuard::new(false)
}

/// Runs `f` with training mode set to `enabled`.
pub fn with_training_mode<R, F: FnOnce() -> R>(enabled: bool, f: F) -> R {
    let _guard = TrainingModeGuard::new(enabled);
    f()
}

#[cfg(test)]
#[path = "mode_test.rs"]
mod tests;
