//! Talus Fixed-Arena Block Allocator
//!
//! A segregated-fit block allocator over a single contiguous arena reserved
//! at build time, for embedded and other memory-constrained environments
//! where deterministic layout and a small code footprint matter more than
//! peak throughput.
//!
//! # Features
//!
//! - **Segregated block classes**: one free list per power-of-two block
//!   size, served best-fit
//! - **Buddy-style splitting**: a missing class is synthesized by splitting
//!   the rightmost free block of the nearest larger class, cascading as far
//!   up as needed
//! - **Static bookkeeping**: descriptor tables are reserved for the
//!   worst-case partition; the allocator never allocates for itself
//! - **Explicit outcomes**: every fallible operation returns a tagged
//!   result, never a sentinel
//!
//! # Optional Features
//!
//! - `stats`: allocation statistics collection
//! - `viz`: layout-reporting capability for external visualization tooling
//! - `defrag`: defragmentation capability (free-buddy coalescing)
//!
//! # Usage
//!
//! ```ignore
//! talus::init().expect("arena already initialised");
//!
//! let offset = talus::alloc(100)?;
//! talus::with(|arena| arena.block_mut(offset).unwrap()[0] = 42);
//! talus::free(offset)?;
//! ```
//!
//! The arena core is single-threaded and non-suspending; the global surface
//! below serializes itself with a spinlock, but hosts running operations
//! from interrupt context must provide their own mutual exclusion. Multiple
//! independent arenas can be had by owning [`ArenaAllocator`] values
//! directly.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod allocator;
pub mod block;
pub mod config;
pub mod error;
pub mod lock;
pub mod size_class;

#[cfg(feature = "defrag")]
pub mod defrag;

#[cfg(feature = "stats")]
pub mod stats;

#[cfg(feature = "viz")]
pub mod viz;

pub use allocator::{ArenaAllocator, ArenaConfig, Realloc};
pub use error::{ArenaError, ConfigError};

use lock::ArenaLock;

/// The process-wide arena instance
static ARENA: ArenaLock = ArenaLock::new(ArenaAllocator::new());

/// Initialise the global arena with the default partition
///
/// Must be called exactly once before any other global operation.
pub fn init() -> Result<(), ArenaError> {
    ARENA.lock().init()
}

/// Initialise the global arena with a caller-supplied partition
pub fn init_with(config: ArenaConfig) -> Result<(), ArenaError> {
    ARENA.lock().init_with(config)
}

/// Check if the global arena is initialised
pub fn is_initialised() -> bool {
    ARENA.lock().is_initialised()
}

/// Allocate a block of at least `req_bytes` from the global arena
pub fn alloc(req_bytes: usize) -> Result<usize, ArenaError> {
    ARENA.lock().alloc(req_bytes)
}

/// Resize the global-arena allocation starting at `offset`
pub fn realloc(offset: usize, req_bytes: usize) -> Result<Realloc, ArenaError> {
    ARENA.lock().realloc(offset, req_bytes)
}

/// Free the global-arena block starting at `offset`
pub fn free(offset: usize) -> Result<(), ArenaError> {
    ARENA.lock().free(offset)
}

/// Whether an allocated block starts exactly at `offset` in the global arena
pub fn is_allocated(offset: usize) -> bool {
    ARENA.lock().is_allocated(offset)
}

/// Bytes not currently claimed by an allocated block in the global arena
pub fn space_available() -> usize {
    ARENA.lock().space_available()
}

/// Run `f` with exclusive access to the global arena
///
/// This is how block contents and the capability surfaces are reached
/// through the global instance.
pub fn with<R>(f: impl FnOnce(&mut ArenaAllocator) -> R) -> R {
    f(&mut ARENA.lock())
}

#[cfg(test)]
mod tests {
    use super::*;

    // The global arena is shared state; everything it needs verified
    // happens in this single test so parallel test threads never interleave
    // on it.
    #[test]
    fn test_global_surface_lifecycle() {
        assert!(!is_initialised());
        assert_eq!(alloc(64), Err(ArenaError::NotInitialised));

        init().unwrap();
        assert!(is_initialised());
        assert_eq!(init(), Err(ArenaError::AlreadyInitialised));

        let offset = alloc(100).unwrap();
        assert!(is_allocated(offset));
        with(|arena| {
            arena.block_mut(offset).unwrap()[0] = 7;
            assert_eq!(arena.block(offset).unwrap()[0], 7);
        });

        let moved = match realloc(offset, 300).unwrap() {
            Realloc::Moved(new_offset) => new_offset,
            other => panic!("expected a move, got {:?}", other),
        };
        assert!(!is_allocated(offset));
        with(|arena| assert_eq!(arena.block(moved).unwrap()[0], 7));

        free(moved).unwrap();
        assert_eq!(space_available(), crate::config::USABLE_SIZE);
    }
}
