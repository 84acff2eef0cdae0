//! Name-based method resolution
//!
//! Persistent listeners only store a receiver handle and a method name. The
//! host environment decides what those mean by implementing
//! [`MethodResolver`]; [`MethodRegistry`](crate::MethodRegistry) is the
//! default, registry-backed implementation.

use std::fmt;
use std::sync::Arc;

use bolts_core::ObjectHandle;

use crate::error::{ListenerResult, ResolveError};
use crate::value::Value;

/// A resolved method, already bound to its receiver
pub type MethodFn = Arc<dyn Fn(&[Value]) -> ListenerResult + Send + Sync>;

/// A callable produced by a [`MethodResolver`] for a single invocation
#[derive(Clone)]
pub struct ResolvedMethod {
    name: String,
    arity: usize,
    call: MethodFn,
}

impl ResolvedMethod {
    /// Create a resolved method
    pub fn new(name: impl Into<String>, arity: usize, call: MethodFn) -> Self {
        Self {
            name: name.into(),
            arity,
            call,
        }
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared number of parameters
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Call the method. The caller is responsible for the arity check.
    pub fn call(&self, args: &[Value]) -> ListenerResult {
        (self.call)(args)
    }
}

impl fmt::Debug for ResolvedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedMethod")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Name and arity of a method a receiver exposes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    pub name: String,
    pub arity: usize,
}

/// Maps `(receiver, method name)` to something callable
pub trait MethodResolver {
    /// Resolve `method` on `receiver`
    ///
    /// Called once per persistent listener per invocation; implementations
    /// must not assume the answer stays the same between invocations.
    fn resolve(&self, receiver: ObjectHandle, method: &str) -> Result<ResolvedMethod, ResolveError>;

    /// Methods available on `receiver`, in lookup order
    ///
    /// Authoring tools use this to offer method names. Defaults to nothing.
    fn methods(&self, _receiver: ObjectHandle) -> Vec<MethodSignature> {
        Vec::new()
    }
}

impl<R: MethodResolver + ?Sized> MethodResolver for &R {
    fn resolve(&self, receiver: ObjectHandle, method: &str) -> Result<ResolvedMethod, ResolveError> {
        (**self).resolve(receiver, method)
    }

    fn methods(&self, receiver: ObjectHandle) -> Vec<MethodSignature> {
        (**self).methods(receiver)
    }
}

impl<R: MethodResolver + ?Sized> MethodResolver for Arc<R> {
    fn resolve(&self, receiver: ObjectHandle, method: &str) -> Result<ResolvedMethod, ResolveError> {
        (**self).resolve(receiver, method)
    }

    fn methods(&self, receiver: ObjectHandle) -> Vec<MethodSignature> {
        (**self).methods(receiver)
    }
}
