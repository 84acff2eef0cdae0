//! # bolts_event - Multicast Events
//!
//! Decouples a trigger site from whoever observes it:
//! - **Persistent listeners**: authored ahead of time, serialized with the
//!   event, resolved by receiver handle and method name on every invocation
//! - **Runtime listeners**: in-memory zero-argument [`Action`]s and
//!   multi-argument [`DynamicListener`]s, added and removed while running
//! - **Failure isolation**: one failing listener never stops the others;
//!   every failure is logged and returned in a [`DispatchReport`]
//!
//! ## Example
//!
//! ```ignore
//! use bolts_event::prelude::*;
//!
//! let registry = MethodRegistry::new();
//! registry.register_typed::<Door, (bool,), _, _>("set_open", |door, (open,)| door.set_open(open));
//! let door = registry.spawn("door", Door::default());
//!
//! let mut on_trigger = BoltsEvent::new();
//! on_trigger.add_persistent_listener(PersistentListener::new(door, "set_open").with_parameter(true));
//! on_trigger.add_listener(Action::new(|| log::info!("triggered")));
//!
//! let report = on_trigger.invoke(&registry);
//! assert!(report.is_clean());
//! ```

pub mod argument;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod listener;
pub mod persist;
pub mod recovery;
pub mod registry;
pub mod resolve;
pub mod runtime;
pub mod value;

pub use argument::{ArgumentCell, ArgumentKind};
pub use config::{ArityPolicy, DispatchConfig};
pub use dispatcher::{BoltsEvent, DispatchReport, ListenerCount};
pub use error::{DispatchError, ListenerError, ListenerIdentity, ListenerResult, ResolveError};
pub use listener::PersistentListener;
pub use persist::{PersistError, PersistFormat};
pub use registry::MethodRegistry;
pub use resolve::{MethodFn, MethodResolver, MethodSignature, ResolvedMethod};
pub use runtime::{Action, DynamicListener, ListenerOutput, RuntimeListener};
pub use value::{ArgList, FromValue, Value};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::argument::{ArgumentCell, ArgumentKind};
    pub use crate::config::{ArityPolicy, DispatchConfig};
    pub use crate::dispatcher::{BoltsEvent, DispatchReport, ListenerCount};
    pub use crate::error::{DispatchError, ListenerError, ListenerResult, ResolveError};
    pub use crate::listener::PersistentListener;
    pub use crate::registry::MethodRegistry;
    pub use crate::resolve::MethodResolver;
    pub use crate::runtime::{Action, DynamicListener};
    pub use crate::value::Value;
    pub use bolts_core::ObjectHandle;
}
