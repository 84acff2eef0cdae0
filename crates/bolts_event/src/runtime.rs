//! Runtime (in-memory) listeners
//!
//! Runtime listeners are cheap handles around shared callbacks. The event
//! stores clones of the handles it is given; removing a listener means
//! passing back a clone of the same handle. Two handles are equal only if
//! they wrap the same callback allocation.

use std::any::type_name;
use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::{ListenerError, ListenerResult};
use crate::value::{ArgList, Value};

/// Something a listener closure may return
pub trait ListenerOutput {
    fn into_result(self) -> ListenerResult;
}

impl ListenerOutput for () {
    fn into_result(self) -> ListenerResult {
        Ok(())
    }
}

impl ListenerOutput for ListenerResult {
    fn into_result(self) -> ListenerResult {
        self
    }
}

type ActionFn = dyn Fn() -> ListenerResult + Send + Sync;
type DynamicFn = dyn Fn(&[Value]) -> ListenerResult + Send + Sync;

fn same_callback<T: ?Sized>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const (),
        (None, None) => true,
        _ => false,
    }
}

/// A zero-argument runtime listener
///
/// The default value is a null action, the equivalent of an unassigned
/// delegate; events refuse to register it.
#[derive(Clone, Default)]
pub struct Action {
    callback: Option<Arc<ActionFn>>,
    label: Cow<'static, str>,
}

impl Action {
    /// Wrap a closure
    pub fn new<F, R>(f: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: ListenerOutput,
    {
        Self {
            callback: Some(Arc::new(move || f().into_result())),
            label: Cow::Borrowed(type_name::<F>()),
        }
    }

    /// Wrap a closure over a weakly held target
    ///
    /// Once the target is dropped the action fails with
    /// [`ListenerError::Dangling`] instead of touching freed state.
    pub fn weak<T, F, R>(target: &Arc<T>, f: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: ListenerOutput,
    {
        let target: Weak<T> = Arc::downgrade(target);
        Self {
            callback: Some(Arc::new(move || match target.upgrade() {
                Some(target) => f(&target).into_result(),
                None => Err(ListenerError::Dangling),
            })),
            label: Cow::Borrowed(type_name::<T>()),
        }
    }

    /// Replace the label used in failure reports
    pub fn named(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = label.into();
        self
    }

    /// Label used in failure reports
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Check if this action has no callback
    pub fn is_null(&self) -> bool {
        self.callback.is_none()
    }

    /// Run the callback. A null action does nothing.
    pub fn call(&self) -> ListenerResult {
        match &self.callback {
            Some(callback) => callback(),
            None => Ok(()),
        }
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        same_callback(&self.callback, &other.callback)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("label", &self.label)
            .field("null", &self.is_null())
            .finish()
    }
}

/// A runtime listener taking a declared number of arguments
#[derive(Clone, Default)]
pub struct DynamicListener {
    callback: Option<Arc<DynamicFn>>,
    arity: usize,
    label: Cow<'static, str>,
}

impl DynamicListener {
    /// Wrap a closure over the raw argument slice
    ///
    /// `arity` is checked before every call; the closure only ever sees slices
    /// of that length.
    pub fn new<F, R>(arity: usize, f: F) -> Self
    where
        F: Fn(&[Value]) -> R + Send + Sync + 'static,
        R: ListenerOutput,
    {
        Self {
            callback: Some(Arc::new(move |args: &[Value]| f(args).into_result())),
            arity,
            label: Cow::Borrowed(type_name::<F>()),
        }
    }

    /// Wrap a closure over decoded parameters
    ///
    /// ```ignore
    /// let listener = DynamicListener::typed(|(score, name): (i32, String)| {
    ///     println!("{} scored {}", name, score);
    /// });
    /// ```
    pub fn typed<A, F, R>(f: F) -> Self
    where
        A: ArgList,
        F: Fn(A) -> R + Send + Sync + 'static,
        R: ListenerOutput,
    {
        Self {
            callback: Some(Arc::new(move |args: &[Value]| {
                f(A::from_values(args)?).into_result()
            })),
            arity: A::ARITY,
            label: Cow::Borrowed(type_name::<F>()),
        }
    }

    /// Wrap a typed closure over a weakly held target
    pub fn weak<T, A, F, R>(target: &Arc<T>, f: F) -> Self
    where
        T: Send + Sync + 'static,
        A: ArgList,
        F: Fn(&T, A) -> R + Send + Sync + 'static,
        R: ListenerOutput,
    {
        let target: Weak<T> = Arc::downgrade(target);
        Self {
            callback: Some(Arc::new(move |args: &[Value]| {
                let target = target.upgrade().ok_or(ListenerError::Dangling)?;
                f(&target, A::from_values(args)?).into_result()
            })),
            arity: A::ARITY,
            label: Cow::Borrowed(type_name::<T>()),
        }
    }

    /// Replace the label used in failure reports
    pub fn named(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = label.into();
        self
    }

    /// Label used in failure reports
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Declared number of arguments
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Check if this listener has no callback
    pub fn is_null(&self) -> bool {
        self.callback.is_none()
    }

    /// Run the callback after checking the argument count
    pub fn call(&self, args: &[Value]) -> ListenerResult {
        let Some(callback) = &self.callback else {
            return Ok(());
        };
        if args.len() != self.arity {
            return Err(ListenerError::ArityMismatch {
                expected: self.arity,
                found: args.len(),
            });
        }
        callback(args)
    }
}

impl PartialEq for DynamicListener {
    fn eq(&self, other: &Self) -> bool {
        same_callback(&self.callback, &other.callback)
    }
}

impl fmt::Debug for DynamicListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicListener")
            .field("label", &self.label)
            .field("arity", &self.arity)
            .field("null", &self.is_null())
            .finish()
    }
}

/// Either kind of runtime listener
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeListener {
    /// Zero-argument listener, called by the no-argument pass
    Action(Action),
    /// Multi-argument listener, called by the typed pass
    Dynamic(DynamicListener),
}

impl RuntimeListener {
    /// Check if the wrapped listener has no callback
    pub fn is_null(&self) -> bool {
        match self {
            RuntimeListener::Action(a) => a.is_null(),
            RuntimeListener::Dynamic(d) => d.is_null(),
        }
    }

    /// Label used in failure reports
    pub fn label(&self) -> &str {
        match self {
            RuntimeListener::Action(a) => a.label(),
            RuntimeListener::Dynamic(d) => d.label(),
        }
    }
}

impl From<Action> for RuntimeListener {
    fn from(action: Action) -> Self {
        RuntimeListener::Action(action)
    }
}

impl From<DynamicListener> for RuntimeListener {
    fn from(listener: DynamicListener) -> Self {
        RuntimeListener::Dynamic(listener)
    }
}
