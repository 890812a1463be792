//! Per-run registry of dependent values

use std::collections::HashMap;

use netsuite_domain::{AssertionError, Parsable, ValueKey, ValueStatus};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, error};

use super::error::{CoordinatorError, ValueError};
use super::handle::{Translate, ValueHandle};

/// Registry of dependent values for one run.
///
/// Handles are created lazily by whichever side references a key first,
/// producer or consumer. A fresh coordinator is built for every run, so no
/// state leaks between independent runs.
#[derive(Debug, Default)]
pub struct DependencyCoordinator {
    values: Mutex<HashMap<String, ValueHandle>>,
    fatal: Mutex<Option<CoordinatorError>>,
}

impl DependencyCoordinator {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle for `key`, creating it on first use.
    #[must_use]
    pub fn get_or_create(&self, key: &str) -> ValueHandle {
        self.values
            .lock()
            .entry(key.to_string())
            .or_insert_with(|| ValueHandle::new(key))
            .clone()
    }

    /// Like `get_or_create`, installing `translate` if the handle has none.
    #[must_use]
    pub fn get_or_create_with(&self, key: &str, translate: Option<Translate>) -> ValueHandle {
        let handle = self.get_or_create(key);
        if let Some(translate) = translate {
            handle.set_translate(translate);
        }
        handle
    }

    /// Resolves a handle with its raw value and notifies observers.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError::DuplicateResolution` if the handle was
    /// already resolved. The error is also kept as the run's fatal error.
    pub fn resolve(&self, handle: &ValueHandle, raw: Value) -> Result<(), CoordinatorError> {
        debug!(key = handle.key(), value = %raw, "value parsed");
        self.record(handle.transition(ValueStatus::Parsed(raw)))
    }

    /// Marks a handle failed and notifies observers.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError::DuplicateResolution` if the handle was
    /// already resolved.
    pub fn mark_failed(&self, handle: &ValueHandle) -> Result<(), CoordinatorError> {
        debug!(key = handle.key(), "value failed");
        self.record(handle.transition(ValueStatus::Failed))
    }

    /// Registers a callback for the final status of a handle.
    pub fn observe<F>(&self, handle: &ValueHandle, on_resolved: F)
    where
        F: FnOnce(&ValueStatus) + Send + 'static,
    {
        handle.observe(on_resolved);
    }

    /// Reads a resolved handle as a string.
    ///
    /// # Errors
    ///
    /// See [`ValueHandle::string`].
    pub fn string(&self, handle: &ValueHandle) -> Result<String, ValueError> {
        handle.string()
    }

    /// Type-checks a raw value against the key's native type and resolves
    /// the key with it, or marks the key failed on a mismatch.
    ///
    /// # Errors
    ///
    /// Returns `ParseMismatch` on a type mismatch and `DuplicateResolution`
    /// if the key was already resolved.
    pub fn parse<T: Parsable>(&self, key: ValueKey<T>, raw: Value) -> Result<(), AssertionError> {
        let handle = self.get_or_create(key.name());
        let duplicate = |_| AssertionError::DuplicateResolution {
            key: key.name().to_string(),
        };
        if T::accepts(&raw) {
            self.resolve(&handle, raw).map_err(duplicate)
        } else {
            self.mark_failed(&handle).map_err(duplicate)?;
            Err(AssertionError::ParseMismatch {
                key: key.name().to_string(),
                expected: T::KIND,
            })
        }
    }

    /// Fails `key` if it is still waiting. Returns true if it was.
    pub fn fail_pending(&self, key: &str) -> bool {
        self.get_or_create(key).fail_if_waiting()
    }

    /// The first fatal error recorded during the run.
    #[must_use]
    pub fn fatal(&self) -> Option<CoordinatorError> {
        self.fatal.lock().clone()
    }

    fn record(&self, result: Result<(), CoordinatorError>) -> Result<(), CoordinatorError> {
        if let Err(err) = &result {
            error!(error = %err, "dependent value resolved twice");
            self.fatal.lock().get_or_insert_with(|| err.clone());
        }
        result
    }
}
