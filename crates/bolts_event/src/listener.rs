//! Persistent (serialized, name-resolved) listeners

use std::borrow::Cow;

use bolts_core::ObjectHandle;
use serde::{Deserialize, Serialize};

use crate::argument::ArgumentCell;
use crate::error::ResolveError;
use crate::value::Value;

/// A listener authored ahead of time and stored with its event
///
/// The method is looked up by name on every invocation; nothing resolved is
/// kept between invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistentListener {
    /// The object that receives the call
    pub target: ObjectHandle,
    /// A more specific receiver on the target; wins over `target` when set
    #[serde(default)]
    pub component: Option<ObjectHandle>,
    /// Name of the method to call
    pub method: String,
    /// Arguments used when the invocation supplies none
    #[serde(default)]
    pub parameters: Vec<ArgumentCell>,
}

impl PersistentListener {
    /// Create a listener calling `method` on `target`
    pub fn new(target: ObjectHandle, method: impl Into<String>) -> Self {
        Self {
            target,
            component: None,
            method: method.into(),
            parameters: Vec::new(),
        }
    }

    /// Route the call to a component instead of the target itself
    pub fn on_component(mut self, component: ObjectHandle) -> Self {
        self.component = Some(component);
        self
    }

    /// Append a stored argument
    pub fn with_parameter(mut self, cell: impl Into<ArgumentCell>) -> Self {
        self.parameters.push(cell.into());
        self
    }

    /// The handle the call is made on: the component if set, else the target
    ///
    /// This only looks at null handles. When the component has been despawned
    /// the event retries on the target at resolution time, and reports
    /// a failure only if neither handle is live.
    pub fn receiver(&self) -> Result<ObjectHandle, ResolveError> {
        self.component
            .and_then(ObjectHandle::non_null)
            .or_else(|| self.target.non_null())
            .ok_or(ResolveError::NoReceiver)
    }

    /// The stored parameters, materialized in order
    pub fn stored_arguments(&self) -> Vec<Value> {
        self.parameters.iter().map(ArgumentCell::value).collect()
    }

    /// `overrides` verbatim when non-empty, otherwise the stored parameters
    ///
    /// Invocation arguments replace the stored ones wholesale; they are never
    /// merged.
    pub fn effective_arguments<'a>(&self, overrides: &'a [Value]) -> Cow<'a, [Value]> {
        if overrides.is_empty() {
            Cow::Owned(self.stored_arguments())
        } else {
            Cow::Borrowed(overrides)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_takes_precedence() {
        let target = ObjectHandle::new(1, 0);
        let component = ObjectHandle::new(2, 0);

        let listener = PersistentListener::new(target, "open");
        assert_eq!(listener.receiver(), Ok(target));

        let listener = listener.on_component(component);
        assert_eq!(listener.receiver(), Ok(component));
    }

    #[test]
    fn test_null_component_falls_back() {
        let target = ObjectHandle::new(1, 0);
        let listener = PersistentListener::new(target, "open").on_component(ObjectHandle::null());
        assert_eq!(listener.receiver(), Ok(target));
    }

    #[test]
    fn test_no_receiver() {
        let listener = PersistentListener::new(ObjectHandle::null(), "open");
        assert_eq!(listener.receiver(), Err(ResolveError::NoReceiver));
    }

    #[test]
    fn test_effective_arguments() {
        let listener = PersistentListener::new(ObjectHandle::new(0, 0), "log").with_parameter(5);

        assert_eq!(listener.effective_arguments(&[]).as_ref(), &[Value::Int(5)]);
        assert_eq!(
            listener.effective_arguments(&[Value::Int(42)]).as_ref(),
            &[Value::Int(42)]
        );
        assert_eq!(
            listener
                .effective_arguments(&[Value::from("a"), Value::from("b")])
                .len(),
            2
        );
    }
}
