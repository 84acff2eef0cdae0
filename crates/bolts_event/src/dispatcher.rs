//! The event: persistent and runtime listeners behind one invoke call
//!
//! Invocation order is fixed:
//! 1. persistent listeners, in stored order
//! 2. (typed invocations only) multi-argument runtime listeners, in
//!    registration order
//! 3. (typed invocations only) the whole no-argument invocation, once
//! 4. (no-argument invocation) zero-argument runtime listeners, in
//!    registration order
//!
//! Runtime lists are snapshotted at the start of each pass and the lock is
//! released before any listener runs. A listener may add or remove listeners,
//! or invoke the same event again; changes show up in the next pass.

use std::borrow::Cow;
use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::DispatchConfig;
use crate::error::{DispatchError, ListenerError, ListenerIdentity, ListenerResult, ResolveError};
use crate::listener::PersistentListener;
use crate::recovery::catch_panic;
use crate::resolve::MethodResolver;
use crate::runtime::{Action, DynamicListener, RuntimeListener};
use crate::value::Value;

/// Listener counts by kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListenerCount {
    pub persistent: usize,
    pub runtime: usize,
    pub total: usize,
}

/// What happened during one invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    /// Listener attempts, counting each pass separately
    pub attempted: usize,
    /// Failed attempts, in the order they happened
    pub failures: Vec<DispatchError>,
}

impl DispatchReport {
    /// Check if every attempt succeeded
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of attempts that succeeded
    pub fn succeeded(&self) -> usize {
        self.attempted.saturating_sub(self.failures.len())
    }

    /// Append another report's attempts and failures
    pub fn merge(&mut self, other: DispatchReport) {
        self.attempted += other.attempted;
        self.failures.extend(other.failures);
    }
}

/// A multicast event
///
/// Embed it by value in whatever owns it. Only the persistent listeners are
/// serialized; runtime listeners and the config live for the process.
#[derive(Default, Serialize, Deserialize)]
pub struct BoltsEvent {
    /// Authored listeners, in serialization order
    #[serde(default)]
    persistent_listeners: Vec<PersistentListener>,
    /// Zero-argument runtime listeners
    #[serde(skip)]
    actions: Mutex<Vec<Action>>,
    /// Multi-argument runtime listeners
    #[serde(skip)]
    dynamic_listeners: Mutex<Vec<DynamicListener>>,
    #[serde(skip)]
    config: DispatchConfig,
}

impl BoltsEvent {
    /// Create an event with no listeners
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dispatch config
    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the dispatch config
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Replace the dispatch config
    pub fn set_config(&mut self, config: DispatchConfig) {
        self.config = config;
    }

    // ========== Runtime Listeners ==========

    /// Register a runtime listener
    ///
    /// Null listeners are rejected with a warning. The same handle may be
    /// registered more than once and is then called once per registration.
    pub fn add_listener(&self, listener: impl Into<RuntimeListener>) {
        let listener = listener.into();
        if listener.is_null() {
            log::warn!("Attempted to add a null listener to an event");
            return;
        }

        log::debug!("Adding runtime listener ({})", listener.label());
        match listener {
            RuntimeListener::Action(action) => self.actions.lock().push(action),
            RuntimeListener::Dynamic(dynamic) => self.dynamic_listeners.lock().push(dynamic),
        }
    }

    /// Remove the first registration of this listener handle
    ///
    /// Returns `false` if it was not registered.
    pub fn remove_listener(&self, listener: impl Into<RuntimeListener>) -> bool {
        let listener = listener.into();
        if listener.is_null() {
            return false;
        }

        let removed = match &listener {
            RuntimeListener::Action(action) => remove_first(&mut self.actions.lock(), action),
            RuntimeListener::Dynamic(dynamic) => {
                remove_first(&mut self.dynamic_listeners.lock(), dynamic)
            }
        };
        if removed {
            log::debug!("Removed runtime listener ({})", listener.label());
        }
        removed
    }

    /// Remove every runtime listener. Persistent listeners are kept.
    pub fn clear_runtime_listeners(&self) {
        self.actions.lock().clear();
        self.dynamic_listeners.lock().clear();
        log::debug!("Cleared runtime listeners");
    }

    // ========== Persistent Listeners ==========

    /// Append a persistent listener
    pub fn add_persistent_listener(&mut self, listener: PersistentListener) {
        self.persistent_listeners.push(listener);
    }

    /// Insert a persistent listener at `index`, clamped to the list length
    pub fn insert_persistent_listener(&mut self, index: usize, listener: PersistentListener) {
        let index = index.min(self.persistent_listeners.len());
        self.persistent_listeners.insert(index, listener);
    }

    /// Remove the persistent listener at `index`
    pub fn remove_persistent_listener(&mut self, index: usize) -> Option<PersistentListener> {
        if index < self.persistent_listeners.len() {
            Some(self.persistent_listeners.remove(index))
        } else {
            None
        }
    }

    /// Persistent listeners in invocation order
    pub fn persistent_listeners(&self) -> &[PersistentListener] {
        &self.persistent_listeners
    }

    /// Edit a persistent listener in place
    pub fn persistent_listener_mut(&mut self, index: usize) -> Option<&mut PersistentListener> {
        self.persistent_listeners.get_mut(index)
    }

    /// Remove every persistent listener
    pub fn clear_persistent_listeners(&mut self) {
        self.persistent_listeners.clear();
    }

    // ========== Introspection ==========

    /// Listener counts
    pub fn listener_count(&self) -> ListenerCount {
        let persistent = self.persistent_count();
        let runtime = self.runtime_count();
        ListenerCount {
            persistent,
            runtime,
            total: persistent + runtime,
        }
    }

    /// Number of persistent listeners
    pub fn persistent_count(&self) -> usize {
        self.persistent_listeners.len()
    }

    /// Number of runtime listeners of both kinds
    pub fn runtime_count(&self) -> usize {
        self.actions.lock().len() + self.dynamic_listeners.lock().len()
    }

    /// Check if there are no listeners at all
    pub fn is_empty(&self) -> bool {
        self.listener_count().total == 0
    }

    // ========== Invocation ==========

    /// Invoke without arguments
    ///
    /// Persistent listeners get their stored arguments, then zero-argument
    /// runtime listeners run. Never fails; see the returned report.
    pub fn invoke<R>(&self, resolver: &R) -> DispatchReport
    where
        R: MethodResolver + ?Sized,
    {
        let mut report = DispatchReport::default();
        self.invoke_persistent(resolver, &[], &mut report);

        let actions: Vec<Action> = self.actions.lock().clone();
        for (index, action) in actions.iter().enumerate() {
            report.attempted += 1;
            if let Err(source) = self.guarded(|| action.call()) {
                self.fail(
                    &mut report,
                    DispatchError::HandlerFault {
                        listener: ListenerIdentity::Action {
                            index,
                            label: Cow::Owned(action.label().to_string()),
                        },
                        source,
                    },
                );
            }
        }

        report
    }

    /// Invoke with arguments
    ///
    /// Non-empty `args` replace every persistent listener's stored arguments.
    /// Multi-argument runtime listeners then receive `args`, and finally the
    /// no-argument invocation runs once. Never fails; see the returned report.
    pub fn invoke_with<R>(&self, resolver: &R, args: &[Value]) -> DispatchReport
    where
        R: MethodResolver + ?Sized,
    {
        let mut report = DispatchReport::default();
        self.invoke_persistent(resolver, args, &mut report);

        let listeners: Vec<DynamicListener> = self.dynamic_listeners.lock().clone();
        for (index, listener) in listeners.iter().enumerate() {
            report.attempted += 1;
            if let Err(source) = self.guarded(|| listener.call(args)) {
                self.fail(
                    &mut report,
                    DispatchError::HandlerFault {
                        listener: ListenerIdentity::Dynamic {
                            index,
                            label: Cow::Owned(listener.label().to_string()),
                        },
                        source,
                    },
                );
            }
        }

        report.merge(self.invoke(resolver));
        report
    }

    fn invoke_persistent<R>(&self, resolver: &R, overrides: &[Value], report: &mut DispatchReport)
    where
        R: MethodResolver + ?Sized,
    {
        for (index, listener) in self.persistent_listeners.iter().enumerate() {
            report.attempted += 1;
            if let Err(error) = self.invoke_one(resolver, listener, overrides) {
                let identity = ListenerIdentity::persistent(index, listener);
                self.fail(report, error.into_dispatch_error(identity));
            }
        }
    }

    fn invoke_one<R>(
        &self,
        resolver: &R,
        listener: &PersistentListener,
        overrides: &[Value],
    ) -> Result<(), PersistentFailure>
    where
        R: MethodResolver + ?Sized,
    {
        let receiver = listener.receiver().map_err(PersistentFailure::Resolution)?;
        if listener.method.is_empty() {
            return Err(PersistentFailure::Resolution(ResolveError::EmptyMethodName));
        }
        let method = match resolver.resolve(receiver, &listener.method) {
            // A dead component falls back to a live target
            Err(err @ ResolveError::DeadReceiver { .. }) if receiver != listener.target => {
                match listener.target.non_null() {
                    Some(target) => resolver.resolve(target, &listener.method),
                    None => Err(err),
                }
            }
            resolved => resolved,
        }
        .map_err(PersistentFailure::Resolution)?;

        let mut args = listener.effective_arguments(overrides);
        if overrides.is_empty() {
            let stored = args.len();
            let take = self
                .config
                .arity
                .select(stored, method.arity())
                .ok_or(PersistentFailure::Configuration {
                    expected: method.arity(),
                    stored,
                })?;
            args.to_mut().truncate(take);
        } else if args.len() != method.arity() {
            return Err(PersistentFailure::Handler(ListenerError::ArityMismatch {
                expected: method.arity(),
                found: args.len(),
            }));
        }

        self.guarded(|| method.call(&args))
            .map_err(PersistentFailure::Handler)
    }

    /// Run a listener, catching panics when configured to
    fn guarded(&self, f: impl FnOnce() -> ListenerResult) -> ListenerResult {
        if !self.config.catch_panics {
            return f();
        }
        catch_panic(f).unwrap_or_else(|message| Err(ListenerError::Panicked(message)))
    }

    fn fail(&self, report: &mut DispatchReport, error: DispatchError) {
        if self.config.report_failures {
            match &error {
                DispatchError::HandlerFault { .. } => {
                    log::error!("Error invoking event listener {}", error)
                }
                _ => log::warn!("Skipped event listener {}", error),
            }
        }
        report.failures.push(error);
    }
}

/// A persistent listener failure before its identity is attached
enum PersistentFailure {
    Configuration { expected: usize, stored: usize },
    Resolution(ResolveError),
    Handler(ListenerError),
}

impl PersistentFailure {
    fn into_dispatch_error(self, listener: ListenerIdentity) -> DispatchError {
        match self {
            PersistentFailure::Configuration { expected, stored } => DispatchError::Configuration {
                listener,
                expected,
                stored,
            },
            PersistentFailure::Resolution(source) => DispatchError::Resolution { listener, source },
            PersistentFailure::Handler(source) => DispatchError::HandlerFault { listener, source },
        }
    }
}

fn remove_first<T: PartialEq>(list: &mut Vec<T>, item: &T) -> bool {
    match list.iter().position(|x| x == item) {
        Some(index) => {
            list.remove(index);
            true
        }
        None => false,
    }
}

impl fmt::Debug for BoltsEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoltsEvent")
            .field("persistent_listeners", &self.persistent_listeners)
            .field("actions", &self.actions.lock().len())
            .field("dynamic_listeners", &self.dynamic_listeners.lock().len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MethodRegistry;
    use bolts_core::ObjectHandle;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_fresh_event_counts() {
        let event = BoltsEvent::new();
        assert_eq!(
            event.listener_count(),
            ListenerCount {
                persistent: 0,
                runtime: 0,
                total: 0
            }
        );
        assert!(event.is_empty());
    }

    #[test]
    fn test_null_listener_rejected() {
        let event = BoltsEvent::new();
        event.add_listener(Action::default());
        event.add_listener(DynamicListener::default());
        assert_eq!(event.runtime_count(), 0);
        assert!(!event.remove_listener(Action::default()));
    }

    #[test]
    fn test_remove_first_match_only() {
        let event = BoltsEvent::new();
        let hits = Arc::new(AtomicU32::new(0));
        let hits_clone = hits.clone();
        let action = Action::new(move || {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        event.add_listener(action.clone());
        event.add_listener(action.clone());
        assert_eq!(event.runtime_count(), 2);

        assert!(event.remove_listener(action.clone()));
        assert_eq!(event.runtime_count(), 1);

        let report = event.invoke(&MethodRegistry::new());
        assert!(report.is_clean());
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert!(event.remove_listener(action.clone()));
        assert!(!event.remove_listener(action));
    }

    #[test]
    fn test_clear_keeps_persistent() {
        let mut event = BoltsEvent::new();
        event.add_persistent_listener(PersistentListener::new(ObjectHandle::new(0, 0), "open"));
        event.add_listener(Action::new(|| ()));
        event.add_listener(DynamicListener::new(1, |_args: &[Value]| ()));

        event.clear_runtime_listeners();
        assert_eq!(
            event.listener_count(),
            ListenerCount {
                persistent: 1,
                runtime: 0,
                total: 1
            }
        );
    }

    #[test]
    fn test_persistent_authoring() {
        let mut event = BoltsEvent::new();
        let target = ObjectHandle::new(0, 0);
        event.add_persistent_listener(PersistentListener::new(target, "a"));
        event.add_persistent_listener(PersistentListener::new(target, "c"));
        event.insert_persistent_listener(1, PersistentListener::new(target, "b"));
        event.insert_persistent_listener(99, PersistentListener::new(target, "d"));

        let methods: Vec<&str> = event
            .persistent_listeners()
            .iter()
            .map(|l| l.method.as_str())
            .collect();
        assert_eq!(methods, ["a", "b", "c", "d"]);

        event.persistent_listener_mut(0).unwrap().method = "z".to_string();
        assert_eq!(event.remove_persistent_listener(0).unwrap().method, "z");
        assert!(event.remove_persistent_listener(10).is_none());
        assert_eq!(event.persistent_count(), 3);

        event.clear_persistent_listeners();
        assert!(event.is_empty());
    }

    #[test]
    fn test_panics_caught() {
        let event = BoltsEvent::new();
        let after = Arc::new(AtomicU32::new(0));
        let after_clone = after.clone();

        event.add_listener(Action::new(|| -> ListenerResult { panic!("listener blew up") }).named("bomb"));
        event.add_listener(Action::new(move || {
            after_clone.fetch_add(1, Ordering::SeqCst);
        }));

        let report = event.invoke(&MethodRegistry::new());
        assert_eq!(report.attempted, 2);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(
            report.failures,
            vec![DispatchError::HandlerFault {
                listener: ListenerIdentity::Action {
                    index: 0,
                    label: "bomb".into(),
                },
                source: ListenerError::Panicked("listener blew up".to_string()),
            }]
        );
        assert_eq!(after.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_report_merge() {
        let mut a = DispatchReport {
            attempted: 2,
            failures: Vec::new(),
        };
        a.merge(DispatchReport {
            attempted: 3,
            failures: Vec::new(),
        });
        assert_eq!(a.attempted, 5);
        assert!(a.is_clean());
    }

    #[test]
    fn test_succeeded_never_underflows() {
        let report = DispatchReport {
            attempted: 0,
            failures: vec![DispatchError::Resolution {
                listener: ListenerIdentity::Action {
                    index: 0,
                    label: "edited".into(),
                },
                source: ResolveError::NoReceiver,
            }],
        };
        assert_eq!(report.succeeded(), 0);
    }
}
