//! Defragmentation capability
//!
//! Splitting leaves the arena's free space scattered across small classes;
//! this module merges free buddy pairs back into larger classes. Two free
//! same-class blocks are buddies when the lower one starts at a multiple of
//! twice the class size and the upper one is adjacent. Merging never moves
//! an allocated block, so callers need no reference-update hooks.

use crate::allocator::ArenaAllocator;
use crate::block::BlockDescriptor;
use crate::config::NUM_BLOCK_CLASSES;
use crate::size_class::class_size;

/// Capability: report and repair fragmentation
pub trait Defragmentable {
    /// Whether at least one free buddy pair could be merged
    fn is_fragmented(&self) -> bool;

    /// Merge free buddy pairs until none remain
    ///
    /// Returns true when the pass completes with the arena unfragmented.
    fn defragment(&mut self) -> bool;
}

impl Defragmentable for ArenaAllocator {
    fn is_fragmented(&self) -> bool {
        (1..NUM_BLOCK_CLASSES).any(|class| find_buddy_pair(self, class).is_some())
    }

    fn defragment(&mut self) -> bool {
        // Smallest class first: merges feed the next-larger class, which is
        // visited afterwards, so one sweep cascades all the way up.
        for class in (1..NUM_BLOCK_CLASSES).rev() {
            while let Some((lower_idx, upper_idx)) = find_buddy_pair(self, class) {
                let lower = self.lists[class].desc(lower_idx).offset();

                // Remove the higher index first so the lower stays valid.
                let (first, second) = if lower_idx > upper_idx {
                    (lower_idx, upper_idx)
                } else {
                    (upper_idx, lower_idx)
                };
                self.lists[class].remove(first);
                self.lists[class].remove(second);

                if !self.lists[class - 1].push(BlockDescriptor::new(lower, true)) {
                    return false;
                }

                #[cfg(feature = "stats")]
                {
                    self.stats.total_merges += 1;
                }

                log::trace!(
                    "merged buddies at {} into class {}",
                    lower,
                    class_size(class - 1)
                );
            }
        }

        !self.is_fragmented()
    }
}

/// Find a mergeable free buddy pair in `class`
///
/// Returns descriptor indices of (lower half, upper half).
fn find_buddy_pair(arena: &ArenaAllocator, class: usize) -> Option<(usize, usize)> {
    let size = class_size(class);
    let list = &arena.lists[class];

    for (lower_idx, desc) in list.iter().enumerate() {
        if !desc.is_free || desc.offset() % (2 * size) != 0 {
            continue;
        }
        let upper_offset = desc.offset() + size;
        if let Some(upper_idx) = list
            .iter()
            .position(|d| d.is_free && d.offset() == upper_offset)
        {
            return Some((lower_idx, upper_idx));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LARGEST_BLOCK, USABLE_SIZE};

    #[test]
    fn test_fresh_arena_not_fragmented() {
        let mut arena = ArenaAllocator::new();
        arena.init().unwrap();
        assert!(!arena.is_fragmented());
        assert!(arena.defragment());
    }

    #[test]
    fn test_split_then_free_fragments() {
        let mut arena = ArenaAllocator::new();
        arena.init().unwrap();
        let offset = arena.alloc(32).unwrap();
        // The split residue alone is not mergeable; freeing the block
        // reunites it with its buddy.
        assert!(!arena.is_fragmented());
        arena.free(offset).unwrap();
        assert!(arena.is_fragmented());
    }

    #[test]
    fn test_defragment_restores_initial_partition() {
        let mut arena = ArenaAllocator::new();
        arena.init().unwrap();
        let offset = arena.alloc(32).unwrap();
        arena.free(offset).unwrap();
        let space = arena.space_available();

        assert!(arena.defragment());
        assert!(!arena.is_fragmented());
        assert_eq!(arena.space_available(), space);

        // Everything merged back into the largest class.
        assert_eq!(arena.lists[0].len(), USABLE_SIZE / LARGEST_BLOCK);
        for class in 1..NUM_BLOCK_CLASSES {
            assert_eq!(arena.lists[class].len(), 0);
        }
    }

    #[test]
    fn test_defragment_leaves_allocated_blocks_alone() {
        let mut arena = ArenaAllocator::new();
        arena.init().unwrap();
        let keep = arena.alloc(40).unwrap();
        let drop = arena.alloc(40).unwrap();
        arena.block_mut(keep).unwrap()[0] = 0x5A;
        arena.free(drop).unwrap();

        arena.defragment();

        assert!(arena.is_allocated(keep));
        assert_eq!(arena.block(keep).unwrap()[0], 0x5A);
        assert!(!arena.is_allocated(drop));
    }

    #[test]
    fn test_no_merge_when_buddy_allocated() {
        // Two adjacent 32 blocks where the upper is allocated: the free
        // lower half must stay in its class.
        let mut arena = ArenaAllocator::new();
        arena.init().unwrap();
        let a = arena.alloc(32).unwrap();
        let b = arena.alloc(32).unwrap();
        assert_eq!(b, a + 32);
        arena.free(a).unwrap();

        assert!(!arena.is_fragmented());
        assert!(arena.defragment());
        assert!(arena.is_allocated(b));
        assert!(!arena.is_allocated(a));
        assert_eq!(arena.lists[NUM_BLOCK_CLASSES - 1].len(), 2);
    }
}
