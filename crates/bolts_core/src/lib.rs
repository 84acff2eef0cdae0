//! # bolts_core - Bolts Core Primitives
//!
//! Small, dependency-free building blocks shared by the Bolts crates:
//! - **Handles**: generational object handles that detect use-after-despawn
//! - **Arenas**: handle-keyed storage with liveness checks
//!
//! The `serde` feature makes [`ObjectHandle`] serializable so that handles can
//! be persisted inside listener sheets.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

pub mod error;
pub mod handle;

pub use error::*;
pub use handle::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::HandleError;
    pub use crate::handle::{HandleAllocator, ObjectArena, ObjectHandle};
}
