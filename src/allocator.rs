//! Core allocator implementation
//!
//! The arena state and the allocation, reallocation, and free logic.

use crate::block::{BlockDescriptor, BlockList};
use crate::config::{
    default_partition, list_capacity, ARENA_SIZE, BLOCK_CLASSES, NUM_BLOCK_CLASSES,
};
use crate::error::{ArenaError, ConfigError};
use crate::size_class::{class_size, find_block_class};

#[cfg(feature = "stats")]
use crate::stats::ArenaStats;

/// Initial partition configuration
///
/// The default greedily partitions largest-class-first. Callers whose
/// request mix is known up front can supply their own per-class counts to
/// minimise runtime splitting.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArenaConfig {
    /// Initial block count per class, largest class first.
    /// `None` selects the default greedy partition.
    pub initial_lengths: Option<[usize; NUM_BLOCK_CLASSES]>,
}

/// Outcome of a successful reallocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Realloc {
    /// The existing block already best-fits the request
    Unchanged(usize),
    /// Contents were copied to a new block and the old block was freed
    Moved(usize),
    /// A zero-byte request released the block
    Released,
}

/// Arena allocator state
///
/// Owns the byte pool, the per-class descriptor tables, and the space
/// accounting. Addresses are byte offsets into the pool. Single-threaded by
/// design: the host supplies mutual exclusion if operations can interleave.
pub struct ArenaAllocator {
    /// The contiguous bytes blocks are carved from
    pool: [u8; ARENA_SIZE],

    /// Descriptor tables, one per class, largest class first
    pub(crate) lists: [BlockList; NUM_BLOCK_CLASSES],

    /// Bytes not currently claimed by an allocated block
    space_available: usize,

    /// Whether `init` has run
    initialised: bool,

    /// Statistics (feature-gated)
    #[cfg(feature = "stats")]
    pub(crate) stats: ArenaStats,
}

impl ArenaAllocator {
    /// Create an uninitialised arena
    pub const fn new() -> Self {
        Self {
            pool: [0; ARENA_SIZE],
            lists: Self::empty_lists(),
            space_available: 0,
            initialised: false,
            #[cfg(feature = "stats")]
            stats: ArenaStats::new(),
        }
    }

    const fn empty_lists() -> [BlockList; NUM_BLOCK_CLASSES] {
        let mut lists = [const { BlockList::new(0, 0) }; NUM_BLOCK_CLASSES];
        let mut i = 0;
        while i < NUM_BLOCK_CLASSES {
            lists[i] = BlockList::new(BLOCK_CLASSES[i], list_capacity(BLOCK_CLASSES[i]));
            i += 1;
        }
        lists
    }

    /// Initialise with the default partition
    pub fn init(&mut self) -> Result<(), ArenaError> {
        self.init_with(ArenaConfig::default())
    }

    /// Initialise with a caller-supplied partition
    ///
    /// Emplaces the configured number of blocks per class over consecutive
    /// offsets, largest class first. Bytes not claimed by any class stay
    /// outside the allocator's accounting.
    pub fn init_with(&mut self, config: ArenaConfig) -> Result<(), ArenaError> {
        if self.initialised {
            return Err(ArenaError::AlreadyInitialised);
        }

        let lengths = config.initial_lengths.unwrap_or_else(default_partition);
        validate_partition(&lengths)?;

        let mut offset = 0;
        for (class, &len) in lengths.iter().enumerate() {
            for _ in 0..len {
                let pushed = self.lists[class].push(BlockDescriptor::new(offset, true));
                debug_assert!(pushed);
                offset += BLOCK_CLASSES[class];
            }
        }

        self.space_available = offset;
        self.initialised = true;

        #[cfg(feature = "stats")]
        {
            self.stats.usable_bytes = offset;
        }

        log::debug!(
            "arena initialised: {} of {} bytes usable across {} classes",
            offset,
            ARENA_SIZE,
            NUM_BLOCK_CLASSES
        );

        #[cfg(debug_assertions)]
        self.check_invariants();

        Ok(())
    }

    /// Whether `init` has run
    pub const fn is_initialised(&self) -> bool {
        self.initialised
    }

    /// Bytes not currently claimed by an allocated block
    pub const fn space_available(&self) -> usize {
        self.space_available
    }

    /// Total arena bytes
    pub const fn arena_size(&self) -> usize {
        ARENA_SIZE
    }

    fn ensure_initialised(&self) -> Result<(), ArenaError> {
        if self.initialised {
            Ok(())
        } else {
            Err(ArenaError::NotInitialised)
        }
    }

    /// Allocate a block that accommodates `req_bytes`
    ///
    /// Serves the smallest class whose size covers the request. A free block
    /// of the selected class is taken front-first; failing that, the
    /// rightmost free block of the nearest larger class is split down,
    /// cascading through as many classes as needed.
    ///
    /// Returns the start offset of the block. The block size is the class
    /// size, so `space_available` drops by the class size, not `req_bytes`.
    pub fn alloc(&mut self, req_bytes: usize) -> Result<usize, ArenaError> {
        self.ensure_initialised()?;

        let class = match find_block_class(req_bytes) {
            Some(class) => class,
            None => {
                #[cfg(feature = "stats")]
                {
                    self.stats.failed_allocs += 1;
                }
                return Err(ArenaError::TooLarge);
            }
        };
        if req_bytes > self.space_available {
            #[cfg(feature = "stats")]
            {
                self.stats.failed_allocs += 1;
            }
            return Err(ArenaError::OutOfSpace);
        }

        let offset = if let Some(idx) = self.lists[class].first_free() {
            self.lists[class].desc_mut(idx).is_free = false;
            self.lists[class].desc(idx).offset()
        } else {
            self.split_into(class)?
        };

        self.space_available -= class_size(class);

        #[cfg(feature = "stats")]
        {
            self.stats.live_bytes += class_size(class);
            self.stats.total_allocs += 1;
            self.stats.update_peak();
        }

        #[cfg(debug_assertions)]
        self.check_invariants();

        Ok(offset)
    }

    /// Synthesize a block of `class` by splitting a larger one
    ///
    /// The lower half is handed out allocated; the upper half joins the
    /// class as a free block.
    fn split_into(&mut self, class: usize) -> Result<usize, ArenaError> {
        let taken = if class > 0 { self.take_free(class - 1) } else { None };
        let Some(lower) = taken else {
            #[cfg(feature = "stats")]
            {
                self.stats.failed_allocs += 1;
            }
            return Err(ArenaError::Fragmented);
        };

        let half = class_size(class);
        let a = self.lists[class].push(BlockDescriptor::new(lower, false));
        let b = self.lists[class].push(BlockDescriptor::new(lower + half, true));
        debug_assert!(a && b);

        #[cfg(feature = "stats")]
        {
            self.stats.total_splits += 1;
        }

        Ok(lower)
    }

    /// Remove and return a free block of `class`, splitting upward as needed
    ///
    /// Scans from the tail: the rightmost free block of a class is the one
    /// whose removal keeps the descending run of block sizes intact. When
    /// the class has no free block the search recurses into the next-larger
    /// class; each level keeps the upper half as its own free block and
    /// passes the lower half down.
    fn take_free(&mut self, class: usize) -> Option<usize> {
        if let Some(idx) = self.lists[class].last_free() {
            return Some(self.lists[class].remove(idx).offset());
        }
        if class == 0 {
            return None;
        }

        let lower = self.take_free(class - 1)?;
        let size = class_size(class);
        let pushed = self.lists[class].push(BlockDescriptor::new(lower + size, true));
        debug_assert!(pushed);

        #[cfg(feature = "stats")]
        {
            self.stats.total_splits += 1;
        }

        Some(lower)
    }

    /// Free the block starting exactly at `offset`
    ///
    /// Offsets interior to a block do not name it. State is unchanged on
    /// every error path.
    pub fn free(&mut self, offset: usize) -> Result<(), ArenaError> {
        self.ensure_initialised()?;

        let (class, idx) = self.find_block(offset).ok_or(ArenaError::NotABlock)?;
        if self.lists[class].desc(idx).is_free {
            return Err(ArenaError::AlreadyFree);
        }

        self.lists[class].desc_mut(idx).is_free = true;
        self.space_available += class_size(class);

        #[cfg(feature = "stats")]
        {
            self.stats.live_bytes = self.stats.live_bytes.saturating_sub(class_size(class));
            self.stats.total_frees += 1;
        }

        #[cfg(debug_assertions)]
        self.check_invariants();

        Ok(())
    }

    /// Resize the allocation starting at `offset` to `req_bytes`
    ///
    /// Keeps the block when it already best-fits the request, releases it on
    /// a zero-byte request, and otherwise allocates a new block, copies
    /// `min(old_class_size, req_bytes)` bytes, and frees the old one. On
    /// failure the old block is intact and remains the caller's valid
    /// reference.
    pub fn realloc(&mut self, offset: usize, req_bytes: usize) -> Result<Realloc, ArenaError> {
        self.ensure_initialised()?;

        let (class, idx) = self.find_block(offset).ok_or(ArenaError::NotABlock)?;
        if self.lists[class].desc(idx).is_free {
            return Err(ArenaError::AlreadyFree);
        }

        if req_bytes == 0 {
            self.free(offset)?;
            return Ok(Realloc::Released);
        }
        if find_block_class(req_bytes) == Some(class) {
            return Ok(Realloc::Unchanged(offset));
        }

        let new_offset = match self.alloc(req_bytes) {
            Ok(new_offset) => new_offset,
            Err(ArenaError::TooLarge) => return Err(ArenaError::TooLarge),
            Err(_) => return Err(ArenaError::ReallocNoSpace),
        };

        let copied = req_bytes.min(class_size(class));
        self.pool.copy_within(offset..offset + copied, new_offset);
        self.free(offset)?;

        Ok(Realloc::Moved(new_offset))
    }

    /// Whether an allocated block starts exactly at `offset`
    pub fn is_allocated(&self, offset: usize) -> bool {
        if !self.initialised {
            return false;
        }
        match self.find_block(offset) {
            Some((class, idx)) => !self.lists[class].desc(idx).is_free,
            None => false,
        }
    }

    /// Read access to the allocated block starting at `offset`
    ///
    /// The slice spans the whole class-sized block, not the requested byte
    /// count. Returns None for free blocks and unknown offsets.
    pub fn block(&self, offset: usize) -> Option<&[u8]> {
        let (class, idx) = self.find_block(offset)?;
        if self.lists[class].desc(idx).is_free {
            return None;
        }
        Some(&self.pool[offset..offset + class_size(class)])
    }

    /// Write access to the allocated block starting at `offset`
    pub fn block_mut(&mut self, offset: usize) -> Option<&mut [u8]> {
        let (class, idx) = self.find_block(offset)?;
        if self.lists[class].desc(idx).is_free {
            return None;
        }
        Some(&mut self.pool[offset..offset + class_size(class)])
    }

    /// Find the descriptor whose block starts exactly at `offset`
    ///
    /// Linear scan across every class. Debug builds keep scanning past a
    /// hit to assert that no second descriptor shares the offset; release
    /// builds return at the hit.
    fn find_block(&self, offset: usize) -> Option<(usize, usize)> {
        let mut found = None;
        for (class, list) in self.lists.iter().enumerate() {
            for (idx, desc) in list.iter().enumerate() {
                if desc.offset() == offset {
                    debug_assert!(found.is_none(), "duplicate descriptor at offset {offset}");
                    found = Some((class, idx));
                    #[cfg(not(debug_assertions))]
                    return found;
                }
            }
        }
        found
    }

    /// Get a snapshot of the statistics
    #[cfg(feature = "stats")]
    pub fn stats(&self) -> ArenaStats {
        self.stats.clone()
    }

    /// Integrity assertions: non-overlap, unique identity, accounting,
    /// capacity bounds.
    #[cfg(debug_assertions)]
    fn check_invariants(&self) {
        let mut covered = 0;
        let mut allocated = 0;
        for list in &self.lists {
            assert!(list.len() <= list.capacity());
            covered += list.len() * list.block_size();
            for desc in list.iter() {
                assert!(desc.offset() + list.block_size() <= ARENA_SIZE);
                if !desc.is_free {
                    allocated += list.block_size();
                }
            }
        }
        assert_eq!(self.space_available, covered - allocated);

        for (ci, li) in self.lists.iter().enumerate() {
            for (i, a) in li.iter().enumerate() {
                for (cj, lj) in self.lists.iter().enumerate() {
                    for (j, b) in lj.iter().enumerate() {
                        if ci == cj && i == j {
                            continue;
                        }
                        let a_end = a.offset() + li.block_size();
                        let b_end = b.offset() + lj.block_size();
                        assert!(
                            a_end <= b.offset() || b_end <= a.offset(),
                            "blocks overlap: {}..{} and {}..{}",
                            a.offset(),
                            a_end,
                            b.offset(),
                            b_end
                        );
                    }
                }
            }
        }
    }
}

impl Default for ArenaAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a partition against capacity and arena bounds
fn validate_partition(lengths: &[usize; NUM_BLOCK_CLASSES]) -> Result<(), ConfigError> {
    let mut claimed = 0usize;
    for (class, &len) in lengths.iter().enumerate() {
        if len > list_capacity(BLOCK_CLASSES[class]) {
            log::warn!(
                "rejecting partition: class {} over capacity",
                BLOCK_CLASSES[class]
            );
            return Err(ConfigError::CapacityExceeded);
        }
        claimed += len * BLOCK_CLASSES[class];
    }
    if claimed > ARENA_SIZE {
        log::warn!(
            "rejecting partition: {} bytes claimed of {}",
            claimed,
            ARENA_SIZE
        );
        return Err(ConfigError::ArenaOverflow);
    }
    Ok(())
}
