//! Error types for event dispatch
//!
//! None of these ever escape [`BoltsEvent::invoke`](crate::BoltsEvent::invoke):
//! a failing listener is logged, recorded in the
//! [`DispatchReport`](crate::DispatchReport) and skipped.

use std::borrow::Cow;
use std::fmt;

use bolts_core::{HandleError, ObjectHandle};
use thiserror::Error;

use crate::listener::PersistentListener;

/// Result type returned by listeners and resolved methods
pub type ListenerResult = std::result::Result<(), ListenerError>;

/// A fault raised by a listener or a resolved method while it runs
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ListenerError {
    /// Called with the wrong number of arguments
    #[error("expected {expected} argument(s), got {found}")]
    ArityMismatch { expected: usize, found: usize },

    /// An argument had a different kind than the parameter declares
    #[error("argument {index}: expected {expected}, got {found}")]
    TypeMismatch {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// The object a weak listener points at was dropped while still registered
    #[error("listener target was dropped without being removed")]
    Dangling,

    /// The listener panicked
    #[error("listener panicked: {0}")]
    Panicked(String),

    /// The listener reported its own failure
    #[error("{0}")]
    Failed(String),
}

impl ListenerError {
    /// Create a listener-reported failure
    pub fn failed(message: impl Into<String>) -> Self {
        ListenerError::Failed(message.into())
    }
}

/// Failure to turn a persistent listener into something callable
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    /// Neither the component nor the target handle is set
    #[error("listener has no receiver")]
    NoReceiver,

    /// The receiver handle no longer refers to a live object
    #[error("receiver {receiver} is not live: {reason}")]
    DeadReceiver {
        receiver: ObjectHandle,
        reason: HandleError,
    },

    /// The listener does not name a method
    #[error("listener has no method name")]
    EmptyMethodName,

    /// The receiver has no method with that name
    #[error("method '{method}' not found on {type_name} ({receiver})")]
    MethodNotFound {
        receiver: ObjectHandle,
        type_name: String,
        method: String,
    },
}

/// Identifies the listener a failure belongs to
#[derive(Debug, Clone, PartialEq)]
pub enum ListenerIdentity {
    /// A persistent listener, by position in the serialized list
    Persistent {
        index: usize,
        receiver: ObjectHandle,
        method: String,
    },
    /// A zero-argument runtime listener, by position in the invocation snapshot
    Action {
        index: usize,
        label: Cow<'static, str>,
    },
    /// A multi-argument runtime listener, by position in the invocation snapshot
    Dynamic {
        index: usize,
        label: Cow<'static, str>,
    },
}

impl ListenerIdentity {
    pub(crate) fn persistent(index: usize, listener: &PersistentListener) -> Self {
        ListenerIdentity::Persistent {
            index,
            receiver: listener.receiver().unwrap_or_default(),
            method: listener.method.clone(),
        }
    }
}

impl fmt::Display for ListenerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerIdentity::Persistent {
                index,
                receiver,
                method,
            } => write!(f, "persistent #{} '{}' on {}", index, method, receiver),
            ListenerIdentity::Action { index, label } => write!(f, "action #{} ({})", index, label),
            ListenerIdentity::Dynamic { index, label } => {
                write!(f, "dynamic #{} ({})", index, label)
            }
        }
    }
}

/// A single listener's failed attempt during an invocation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    /// Stored arguments do not fit the resolved method's declared arity
    #[error("{listener}: {stored} stored argument(s) but the method declares {expected}")]
    Configuration {
        listener: ListenerIdentity,
        expected: usize,
        stored: usize,
    },

    /// The receiver or method could not be resolved
    #[error("{listener}: {source}")]
    Resolution {
        listener: ListenerIdentity,
        source: ResolveError,
    },

    /// The listener ran and failed
    #[error("{listener}: {source}")]
    HandlerFault {
        listener: ListenerIdentity,
        source: ListenerError,
    },
}

impl DispatchError {
    /// The listener this failure belongs to
    pub fn listener(&self) -> &ListenerIdentity {
        match self {
            DispatchError::Configuration { listener, .. }
            | DispatchError::Resolution { listener, .. }
            | DispatchError::HandlerFault { listener, .. } => listener,
        }
    }

    /// Check if this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, DispatchError::Configuration { .. })
    }

    /// Check if this is a resolution error
    pub fn is_resolution(&self) -> bool {
        matches!(self, DispatchError::Resolution { .. })
    }

    /// Check if this is a handler fault
    pub fn is_handler_fault(&self) -> bool {
        matches!(self, DispatchError::HandlerFault { .. })
    }

    /// The listener's own error, for handler faults
    pub fn handler_error(&self) -> Option<&ListenerError> {
        match self {
            DispatchError::HandlerFault { source, .. } => Some(source),
            _ => None,
        }
    }
}
