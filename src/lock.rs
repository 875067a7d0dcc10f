//! Serialization for the process-wide arena
//!
//! The allocator core is single-threaded; this lock exists only so the
//! global instance can live in a `static`. Every critical section is a
//! single allocator operation, a bounded walk over the descriptor tables
//! that never blocks, so a plain test-and-test-and-set spin suffices and no
//! queueing or backoff machinery is warranted. Hosts that call from
//! interrupt context still need their own discipline.

use core::cell::UnsafeCell;
use core::hint::spin_loop;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};

use crate::allocator::ArenaAllocator;

/// Spin-held exclusive access to one arena
pub struct ArenaLock {
    held: AtomicBool,
    arena: UnsafeCell<ArenaAllocator>,
}

// SAFETY: `held` admits exactly one live guard at a time, and the arena is
// plain owned data, so handing that guard a mutable reference is exclusive.
unsafe impl Sync for ArenaLock {}

impl ArenaLock {
    /// Wrap an arena for use from a `static`
    pub const fn new(arena: ArenaAllocator) -> Self {
        Self {
            held: AtomicBool::new(false),
            arena: UnsafeCell::new(arena),
        }
    }

    /// Spin until the arena is exclusively held
    pub fn lock(&self) -> ArenaGuard<'_> {
        // Contend on the cached load, not the swap, so waiting cores do not
        // bounce the line while the holder finishes its table walk.
        while self.held.swap(true, Ordering::Acquire) {
            while self.held.load(Ordering::Relaxed) {
                spin_loop();
            }
        }
        ArenaGuard { lock: self }
    }
}

/// Exclusive handle to the locked arena, released on drop
pub struct ArenaGuard<'a> {
    lock: &'a ArenaLock,
}

impl Deref for ArenaGuard<'_> {
    type Target = ArenaAllocator;

    fn deref(&self) -> &ArenaAllocator {
        // SAFETY: a live guard means `held` is set and no other guard exists
        unsafe { &*self.lock.arena.get() }
    }
}

impl DerefMut for ArenaGuard<'_> {
    fn deref_mut(&mut self) -> &mut ArenaAllocator {
        // SAFETY: a live guard means `held` is set and no other guard exists
        unsafe { &mut *self.lock.arena.get() }
    }
}

impl Drop for ArenaGuard<'_> {
    fn drop(&mut self) {
        self.lock.held.store(false, Ordering::Release);
    }
}
