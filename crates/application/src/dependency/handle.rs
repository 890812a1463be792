//! Single-assignment value cells

use std::fmt;
use std::sync::{Arc, OnceLock};

use netsuite_domain::ValueStatus;
use netsuite_domain::value::render_value;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

use super::error::{CoordinatorError, ValueError};

/// Converts a parsed value into the string used in a URL, header or query.
pub type Translate = Arc<dyn Fn(&Value) -> String + Send + Sync>;

type Observer = Box<dyn FnOnce(&ValueStatus) + Send>;

struct CellState {
    status: ValueStatus,
    observers: Vec<Observer>,
}

struct Cell {
    key: String,
    translate: OnceLock<Translate>,
    state: Mutex<CellState>,
}

/// A shared handle to one dependent value.
///
/// The value moves from `Waiting` to `Parsed` or `Failed` exactly once.
/// Observers registered before that transition are notified in
/// registration order when it happens; observers registered afterwards
/// fire immediately on the caller's stack. Either way each observer runs
/// exactly once with the final status.
#[derive(Clone)]
pub struct ValueHandle {
    cell: Arc<Cell>,
}

impl ValueHandle {
    pub(crate) fn new(key: impl Into<String>) -> Self {
        Self {
            cell: Arc::new(Cell {
                key: key.into(),
                translate: OnceLock::new(),
                state: Mutex::new(CellState {
                    status: ValueStatus::Waiting,
                    observers: Vec::new(),
                }),
            }),
        }
    }

    /// The logical key of this value.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.cell.key
    }

    /// A snapshot of the current status.
    #[must_use]
    pub fn status(&self) -> ValueStatus {
        self.cell.state.lock().status.clone()
    }

    /// Registers a callback for the final status.
    pub fn observe<F>(&self, on_resolved: F)
    where
        F: FnOnce(&ValueStatus) + Send + 'static,
    {
        let status = {
            let mut state = self.cell.state.lock();
            if state.status.is_waiting() {
                state.observers.push(Box::new(on_resolved));
                return;
            }
            state.status.clone()
        };
        on_resolved(&status);
    }

    /// Waits until the value leaves `Waiting` and returns the final status.
    ///
    /// Returns immediately if the value is already resolved.
    pub async fn resolved(&self) -> ValueStatus {
        let (sender, receiver) = oneshot::channel();
        self.observe(move |status| {
            let _ = sender.send(status.clone());
        });
        receiver.await.unwrap_or(ValueStatus::Failed)
    }

    /// Installs the translate function unless one is already set.
    pub(crate) fn set_translate(&self, translate: Translate) {
        let _ = self.cell.translate.set(translate);
    }

    /// Moves out of `Waiting` and notifies every queued observer.
    pub(crate) fn transition(&self, status: ValueStatus) -> Result<(), CoordinatorError> {
        if self.try_transition(status) {
            Ok(())
        } else {
            Err(CoordinatorError::DuplicateResolution {
                key: self.cell.key.clone(),
            })
        }
    }

    /// Marks the value failed if nobody resolved it. Returns true if it did.
    pub(crate) fn fail_if_waiting(&self) -> bool {
        self.try_transition(ValueStatus::Failed)
    }

    fn try_transition(&self, status: ValueStatus) -> bool {
        let observers = {
            let mut state = self.cell.state.lock();
            if !state.status.is_waiting() {
                return false;
            }
            state.status = status.clone();
            std::mem::take(&mut state.observers)
        };
        for observer in observers {
            observer(&status);
        }
        true
    }

    /// The value as a string, once resolved.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::NotReady` while waiting and
    /// `ValueError::Unavailable` if the value failed.
    pub fn string(&self) -> Result<String, ValueError> {
        match self.status() {
            ValueStatus::Waiting => Err(ValueError::NotReady {
                key: self.cell.key.clone(),
            }),
            ValueStatus::Failed => Err(ValueError::Unavailable {
                key: self.cell.key.clone(),
            }),
            ValueStatus::Parsed(value) => Ok(self
                .cell
                .translate
                .get()
                .map_or_else(|| render_value(&value), |translate| translate(&value))),
        }
    }
}

impl fmt::Debug for ValueHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueHandle")
            .field("key", &self.cell.key)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn recorder() -> (Arc<Mutex<Vec<ValueStatus>>>, impl Fn() -> Observer) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let make = move || -> Observer {
            let sink = Arc::clone(&sink);
            Box::new(move |status: &ValueStatus| sink.lock().push(status.clone()))
        };
        (seen, make)
    }

    #[test]
    fn test_observers_before_and_after_resolution_fire_once() {
        let handle = ValueHandle::new("UserId");
        let (seen, make) = recorder();

        handle.observe(make());
        handle.observe(make());
        assert!(seen.lock().is_empty());

        handle.transition(ValueStatus::Parsed(json!(42))).ok();
        assert_eq!(seen.lock().len(), 2);

        handle.observe(make());
        assert_eq!(
            *seen.lock(),
            vec![ValueStatus::Parsed(json!(42)); 3]
        );
    }

    #[test]
    fn test_transition_happens_once() {
        let handle = ValueHandle::new("UserId");
        assert_eq!(handle.transition(ValueStatus::Failed), Ok(()));
        assert_eq!(
            handle.transition(ValueStatus::Parsed(json!(1))),
            Err(CoordinatorError::DuplicateResolution {
                key: "UserId".to_string()
            })
        );
        assert!(!handle.fail_if_waiting());
        assert_eq!(handle.status(), ValueStatus::Failed);
    }

    #[test]
    fn test_string_by_status() {
        let handle = ValueHandle::new("Token");
        assert_eq!(
            handle.string(),
            Err(ValueError::NotReady {
                key: "Token".to_string()
            })
        );

        handle.transition(ValueStatus::Parsed(json!("abc"))).ok();
        assert_eq!(handle.string(), Ok("abc".to_string()));

        let failed = ValueHandle::new("Other");
        failed.fail_if_waiting();
        assert_eq!(
            failed.string(),
            Err(ValueError::Unavailable {
                key: "Other".to_string()
            })
        );
    }

    #[test]
    fn test_first_translate_wins() {
        let handle = ValueHandle::new("Token");
        handle.set_translate(Arc::new(|value: &Value| format!("Bearer {}", render_value(value))));
        handle.set_translate(Arc::new(|_: &Value| "ignored".to_string()));
        handle.transition(ValueStatus::Parsed(json!("abc"))).ok();
        assert_eq!(handle.string(), Ok("Bearer abc".to_string()));
    }

    #[tokio::test]
    async fn test_resolved_waits_for_transition() {
        let handle = ValueHandle::new("UserId");
        let producer = handle.clone();
        let waiter = tokio::spawn(async move { handle.resolved().await });

        tokio::task::yield_now().await;
        producer.transition(ValueStatus::Parsed(json!(7))).ok();

        let status = waiter.await.ok();
        assert_eq!(status, Some(ValueStatus::Parsed(json!(7))));
        assert_eq!(producer.resolved().await, ValueStatus::Parsed(json!(7)));
    }
}
