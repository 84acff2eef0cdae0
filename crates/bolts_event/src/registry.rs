//! Registry-backed method resolution
//!
//! Objects are spawned into a handle arena; methods are registered per
//! concrete type under a name and a declared arity. Resolving a persistent
//! listener looks the receiver up by handle, then the method by name on the
//! receiver's type. Both tables sit behind `RwLock`s that are released before
//! the resolved method runs, so a method may spawn, despawn or register
//! while it executes.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use bolts_core::{ObjectArena, ObjectHandle};
use parking_lot::RwLock;

use crate::error::{ListenerError, ListenerResult, ResolveError};
use crate::resolve::{MethodResolver, MethodSignature, ResolvedMethod};
use crate::runtime::ListenerOutput;
use crate::value::{ArgList, Value};

type Instance = Arc<dyn Any + Send + Sync>;
type ErasedMethod = Arc<dyn Fn(&(dyn Any + Send + Sync), &[Value]) -> ListenerResult + Send + Sync>;

struct ObjectEntry {
    name: String,
    type_id: TypeId,
    type_name: &'static str,
    instance: Instance,
}

struct MethodEntry {
    name: String,
    arity: usize,
    call: ErasedMethod,
}

/// Objects and their callable methods
pub struct MethodRegistry {
    /// Live objects by handle
    objects: RwLock<ObjectArena<ObjectEntry>>,
    /// Methods per concrete type, in registration order
    methods: RwLock<HashMap<TypeId, Vec<MethodEntry>>>,
}

impl MethodRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(ObjectArena::new()),
            methods: RwLock::new(HashMap::new()),
        }
    }

    // ========== Objects ==========

    /// Spawn an object and get a handle to it
    pub fn spawn<T: Any + Send + Sync>(&self, name: impl Into<String>, value: T) -> ObjectHandle {
        self.spawn_shared(name, Arc::new(value))
    }

    /// Spawn an object the caller keeps a reference to
    pub fn spawn_shared<T: Any + Send + Sync>(&self, name: impl Into<String>, instance: Arc<T>) -> ObjectHandle {
        let name = name.into();
        let handle = self.objects.write().insert(ObjectEntry {
            name: name.clone(),
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            instance,
        });
        log::debug!("Spawned '{}' ({}) as {}", name, type_name::<T>(), handle);
        handle
    }

    /// Despawn an object. Handles to it become stale.
    pub fn despawn(&self, handle: ObjectHandle) -> bool {
        match self.objects.write().remove(handle) {
            Some(entry) => {
                log::debug!("Despawned '{}' ({})", entry.name, handle);
                true
            }
            None => false,
        }
    }

    /// Check if a handle refers to a live object
    pub fn is_alive(&self, handle: ObjectHandle) -> bool {
        self.objects.read().contains(handle)
    }

    /// Get a live object as its concrete type
    pub fn get<T: Any + Send + Sync>(&self, handle: ObjectHandle) -> Option<Arc<T>> {
        let instance = Arc::clone(&self.objects.read().get(handle)?.instance);
        instance.downcast::<T>().ok()
    }

    /// Name an object was spawned with
    pub fn name_of(&self, handle: ObjectHandle) -> Option<String> {
        self.objects.read().get(handle).map(|entry| entry.name.clone())
    }

    /// Find the first live object spawned with `name`
    pub fn find(&self, name: &str) -> Option<ObjectHandle> {
        self.objects
            .read()
            .iter()
            .find(|(_, entry)| entry.name == name)
            .map(|(handle, _)| handle)
    }

    /// Number of live objects
    pub fn object_count(&self) -> usize {
        self.objects.read().len()
    }

    // ========== Methods ==========

    /// Register a method taking the raw argument slice
    ///
    /// If `T` already has a method with this name the earlier one keeps
    /// winning lookups.
    pub fn register_method<T, F, R>(&self, name: impl Into<String>, arity: usize, f: F) -> &Self
    where
        T: Any + Send + Sync,
        F: Fn(&T, &[Value]) -> R + Send + Sync + 'static,
        R: ListenerOutput,
    {
        let call: ErasedMethod = Arc::new(move |instance: &(dyn Any + Send + Sync), args: &[Value]| {
            match instance.downcast_ref::<T>() {
                Some(receiver) => f(receiver, args).into_result(),
                None => Err(ListenerError::failed(format!(
                    "receiver is not a {}",
                    type_name::<T>()
                ))),
            }
        });

        let name = name.into();
        let mut methods = self.methods.write();
        let entries = methods.entry(TypeId::of::<T>()).or_default();
        if entries.iter().any(|m| m.name == name) {
            log::warn!(
                "Method '{}' already registered on {}; the first registration wins",
                name,
                type_name::<T>()
            );
        }
        entries.push(MethodEntry { name, arity, call });
        self
    }

    /// Register a method over decoded parameters; the arity comes from `A`
    pub fn register_typed<T, A, F, R>(&self, name: impl Into<String>, f: F) -> &Self
    where
        T: Any + Send + Sync,
        A: ArgList,
        F: Fn(&T, A) -> R + Send + Sync + 'static,
        R: ListenerOutput,
    {
        self.register_method::<T, _, ListenerResult>(name, A::ARITY, move |receiver: &T, args: &[Value]| {
            f(receiver, A::from_values(args)?).into_result()
        })
    }

    /// Check if `T` has a method with this name
    pub fn has_method<T: Any>(&self, name: &str) -> bool {
        self.methods
            .read()
            .get(&TypeId::of::<T>())
            .is_some_and(|entries| entries.iter().any(|m| m.name == name))
    }
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("objects", &self.objects.read().len())
            .field("types", &self.methods.read().len())
            .finish()
    }
}

impl MethodResolver for MethodRegistry {
    fn resolve(&self, receiver: ObjectHandle, method: &str) -> Result<ResolvedMethod, ResolveError> {
        if method.is_empty() {
            return Err(ResolveError::EmptyMethodName);
        }

        let objects = self.objects.read();
        let entry = objects
            .try_get(receiver)
            .map_err(|reason| ResolveError::DeadReceiver { receiver, reason })?;

        let methods = self.methods.read();
        let found = methods
            .get(&entry.type_id)
            .and_then(|entries| entries.iter().find(|m| m.name == method))
            .ok_or_else(|| ResolveError::MethodNotFound {
                receiver,
                type_name: entry.type_name.to_string(),
                method: method.to_string(),
            })?;

        let instance = Arc::clone(&entry.instance);
        let call = Arc::clone(&found.call);
        Ok(ResolvedMethod::new(
            found.name.clone(),
            found.arity,
            Arc::new(move |args: &[Value]| call(instance.as_ref(), args)),
        ))
    }

    fn methods(&self, receiver: ObjectHandle) -> Vec<MethodSignature> {
        let objects = self.objects.read();
        let Some(entry) = objects.get(receiver) else {
            return Vec::new();
        };

        self.methods
            .read()
            .get(&entry.type_id)
            .map(|entries| {
                entries
                    .iter()
                    .map(|m| MethodSignature {
                        name: m.name.clone(),
                        arity: m.arity,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bolts_core::HandleError;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[derive(Default)]
    struct Counter {
        value: AtomicI32,
    }

    fn counter_registry() -> (MethodRegistry, ObjectHandle) {
        let registry = MethodRegistry::new();
        registry
            .register_typed::<Counter, (i32,), _, _>("add", |c: &Counter, (n,): (i32,)| {
                c.value.fetch_add(n, Ordering::SeqCst);
            })
            .register_typed::<Counter, (), _, _>("reset", |c: &Counter, ()| {
                c.value.store(0, Ordering::SeqCst);
            });
        let handle = registry.spawn("counter", Counter::default());
        (registry, handle)
    }

    #[test]
    fn test_resolve_and_call() {
        let (registry, handle) = counter_registry();

        let add = registry.resolve(handle, "add").unwrap();
        assert_eq!(add.name(), "add");
        assert_eq!(add.arity(), 1);
        add.call(&[Value::Int(4)]).unwrap();

        let counter = registry.get::<Counter>(handle).unwrap();
        assert_eq!(counter.value.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_method_not_found() {
        let (registry, handle) = counter_registry();

        let err = registry.resolve(handle, "explode").unwrap_err();
        assert!(matches!(err, ResolveError::MethodNotFound { ref method, .. } if method == "explode"));
        assert_eq!(registry.resolve(handle, "").unwrap_err(), ResolveError::EmptyMethodName);
    }

    #[test]
    fn test_despawned_receiver() {
        let (registry, handle) = counter_registry();
        assert!(registry.despawn(handle));
        assert!(!registry.is_alive(handle));

        let err = registry.resolve(handle, "add").unwrap_err();
        assert_eq!(
            err,
            ResolveError::DeadReceiver {
                receiver: handle,
                reason: HandleError::Stale,
            }
        );
    }

    #[test]
    fn test_method_catalog_in_registration_order() {
        let (registry, handle) = counter_registry();
        let names: Vec<_> = registry
            .methods(handle)
            .into_iter()
            .map(|m| (m.name, m.arity))
            .collect();
        assert_eq!(names, [("add".to_string(), 1), ("reset".to_string(), 0)]);

        assert!(registry.methods(ObjectHandle::null()).is_empty());
    }

    #[test]
    fn test_first_registration_wins() {
        let (registry, handle) = counter_registry();
        registry.register_method::<Counter, _, _>("add", 0, |c: &Counter, _args: &[Value]| {
            c.value.store(-1, Ordering::SeqCst);
        });

        assert_eq!(registry.resolve(handle, "add").unwrap().arity(), 1);
    }

    #[test]
    fn test_lookup_helpers() {
        let (registry, handle) = counter_registry();
        assert_eq!(registry.name_of(handle).as_deref(), Some("counter"));
        assert_eq!(registry.find("counter"), Some(handle));
        assert_eq!(registry.find("missing"), None);
        assert!(registry.get::<String>(handle).is_none());
        assert!(registry.has_method::<Counter>("reset"));
        assert_eq!(registry.object_count(), 1);
    }
}
