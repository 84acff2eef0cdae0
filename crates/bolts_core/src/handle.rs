//! Generational object handles
//!
//! Handles let listeners and argument cells name an object without owning it.
//! Each slot carries a generation counter, so a handle that outlives its
//! object is detected as stale instead of silently addressing whatever was
//! stored in the slot afterwards.

use core::fmt;
use core::hash::{Hash, Hasher};
use alloc::vec::Vec;

use crate::error::HandleError;

/// A non-owning reference to an object living in an [`ObjectArena`]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ObjectHandle {
    /// Lower 32 bits: index, Upper 32 bits: generation
    bits: u64,
}

impl ObjectHandle {
    /// Create a handle from index and generation
    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self {
            bits: (generation as u64) << 32 | index as u64,
        }
    }

    /// Create a null handle
    #[inline]
    pub const fn null() -> Self {
        Self { bits: u64::MAX }
    }

    /// Check if this handle is null
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.bits == u64::MAX
    }

    /// Get the index portion
    #[inline]
    pub const fn index(&self) -> u32 {
        self.bits as u32
    }

    /// Get the generation portion
    #[inline]
    pub const fn generation(&self) -> u32 {
        (self.bits >> 32) as u32
    }

    /// Convert to raw bits for serialization
    #[inline]
    pub const fn to_bits(&self) -> u64 {
        self.bits
    }

    /// Create from raw bits
    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Self { bits }
    }

    /// `None` for the null handle, `Some(self)` otherwise
    #[inline]
    pub fn non_null(self) -> Option<Self> {
        if self.is_null() {
            None
        } else {
            Some(self)
        }
    }
}

impl Hash for ObjectHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits.hash(state);
    }
}

impl Default for ObjectHandle {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "ObjectHandle(null)")
        } else {
            write!(f, "ObjectHandle({}v{})", self.index(), self.generation())
        }
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "null")
        } else {
            write!(f, "{}v{}", self.index(), self.generation())
        }
    }
}

/// Allocates handles with generation tracking
#[derive(Debug, Default)]
pub struct HandleAllocator {
    /// Current generation of each slot
    generations: Vec<u32>,
    /// Indices available for reuse
    free_list: Vec<u32>,
}

impl HandleAllocator {
    /// Create an empty allocator
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new handle, reusing a freed slot when one is available
    pub fn allocate(&mut self) -> ObjectHandle {
        if let Some(index) = self.free_list.pop() {
            return ObjectHandle::new(index, self.generations[index as usize]);
        }

        let index = self.generations.len();
        if index >= u32::MAX as usize {
            panic!("Handle allocator exhausted");
        }
        self.generations.push(0);
        ObjectHandle::new(index as u32, 0)
    }

    /// Free a handle. Returns `false` if it was already stale.
    pub fn free(&mut self, handle: ObjectHandle) -> bool {
        if self.check(handle).is_err() {
            return false;
        }

        let generation = &mut self.generations[handle.index() as usize];
        *generation = generation.wrapping_add(1);
        self.free_list.push(handle.index());
        true
    }

    /// Explain why a handle is not live, or `Ok(())` if it is
    pub fn check(&self, handle: ObjectHandle) -> Result<(), HandleError> {
        if handle.is_null() {
            return Err(HandleError::Null);
        }
        match self.generations.get(handle.index() as usize) {
            None => Err(HandleError::OutOfBounds),
            Some(&current) if current != handle.generation() => Err(HandleError::Stale),
            Some(_) => Ok(()),
        }
    }

    /// Check if a handle is still live
    pub fn is_valid(&self, handle: ObjectHandle) -> bool {
        self.check(handle).is_ok()
    }

    /// Number of live handles
    pub fn len(&self) -> usize {
        self.generations.len() - self.free_list.len()
    }

    /// Check if no handles are live
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle-keyed storage for objects
pub struct ObjectArena<T> {
    allocator: HandleAllocator,
    values: Vec<Option<T>>,
}

impl<T> ObjectArena<T> {
    /// Create an empty arena
    pub fn new() -> Self {
        Self {
            allocator: HandleAllocator::new(),
            values: Vec::new(),
        }
    }

    /// Insert a value and get a handle to it
    pub fn insert(&mut self, value: T) -> ObjectHandle {
        let handle = self.allocator.allocate();
        let index = handle.index() as usize;

        if index >= self.values.len() {
            self.values.resize_with(index + 1, || None);
        }
        self.values[index] = Some(value);
        handle
    }

    /// Remove a value by its handle
    pub fn remove(&mut self, handle: ObjectHandle) -> Option<T> {
        if !self.allocator.free(handle) {
            return None;
        }
        self.values[handle.index() as usize].take()
    }

    /// Get a value, explaining why the handle is unusable on failure
    pub fn try_get(&self, handle: ObjectHandle) -> Result<&T, HandleError> {
        self.allocator.check(handle)?;
        self.values
            .get(handle.index() as usize)
            .and_then(Option::as_ref)
            .ok_or(HandleError::Stale)
    }

    /// Get a value by its handle
    pub fn get(&self, handle: ObjectHandle) -> Option<&T> {
        self.try_get(handle).ok()
    }

    /// Get a mutable value by its handle
    pub fn get_mut(&mut self, handle: ObjectHandle) -> Option<&mut T> {
        if !self.allocator.is_valid(handle) {
            return None;
        }
        self.values.get_mut(handle.index() as usize)?.as_mut()
    }

    /// Check if a handle refers to a live value
    pub fn contains(&self, handle: ObjectHandle) -> bool {
        self.allocator.is_valid(handle)
    }

    /// Number of live values
    pub fn len(&self) -> usize {
        self.allocator.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.allocator.is_empty()
    }

    /// Iterate over live handles and values in slot order
    pub fn iter(&self) -> impl Iterator<Item = (ObjectHandle, &T)> {
        let gens = &self.allocator.generations;
        self.values
            .iter()
            .enumerate()
            .filter_map(move |(i, opt)| {
                opt.as_ref().map(|v| (ObjectHandle::new(i as u32, gens[i]), v))
            })
    }
}

impl<T> Default for ObjectArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ObjectArena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectArena")
            .field("live", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_bits() {
        let handle = ObjectHandle::new(42, 7);
        assert_eq!(handle.index(), 42);
        assert_eq!(handle.generation(), 7);
        assert_eq!(ObjectHandle::from_bits(handle.to_bits()), handle);
        assert!(ObjectHandle::null().is_null());
        assert_eq!(ObjectHandle::default(), ObjectHandle::null());
        assert_eq!(ObjectHandle::null().non_null(), None);
    }

    #[test]
    fn test_handle_allocation() {
        let mut alloc = HandleAllocator::new();
        let h1 = alloc.allocate();
        let h2 = alloc.allocate();

        assert!(alloc.is_valid(h1));
        assert!(alloc.is_valid(h2));
        assert_ne!(h1, h2);

        assert!(alloc.free(h1));
        assert!(!alloc.free(h1));
        assert_eq!(alloc.check(h1), Err(HandleError::Stale));

        let h3 = alloc.allocate();
        assert_eq!(h3.index(), h1.index());
        assert_ne!(h3.generation(), h1.generation());
        assert_eq!(alloc.len(), 2);
    }

    #[test]
    fn test_check_reasons() {
        let alloc = HandleAllocator::new();
        assert_eq!(alloc.check(ObjectHandle::null()), Err(HandleError::Null));
        assert_eq!(alloc.check(ObjectHandle::new(3, 0)), Err(HandleError::OutOfBounds));
    }

    #[test]
    fn test_arena() {
        let mut arena: ObjectArena<String> = ObjectArena::new();
        let h1 = arena.insert("door".to_string());
        let h2 = arena.insert("lamp".to_string());

        assert_eq!(arena.get(h1).map(String::as_str), Some("door"));
        assert_eq!(arena.get(h2).map(String::as_str), Some("lamp"));

        assert_eq!(arena.remove(h1).as_deref(), Some("door"));
        assert_eq!(arena.get(h1), None);
        assert_eq!(arena.try_get(h1), Err(HandleError::Stale));

        let h3 = arena.insert("console".to_string());
        assert_eq!(h3.index(), h1.index());
        assert_eq!(arena.get(h1), None);

        let names: Vec<&str> = arena.iter().map(|(_, v)| v.as_str()).collect();
        assert_eq!(names, ["console", "lamp"]);
    }
}
