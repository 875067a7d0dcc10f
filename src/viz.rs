//! Layout-reporting capability
//!
//! Lets external diagnostic tooling inspect which parts of the arena are in
//! use. The crate only provides the reporting trait and the wire-ready entry
//! type; the transport (typically a socket endpoint streaming entries on
//! demand) lives with the host.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::allocator::ArenaAllocator;

/// One allocated block in a layout report
///
/// `#[repr(C)]` with fixed-width fields so a transport can stream the entry
/// array as raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, Immutable, IntoBytes, KnownLayout)]
#[repr(C)]
pub struct LayoutEntry {
    /// Start offset of the block within the arena
    pub offset: u32,
    /// Block length in bytes (the class size)
    pub length: u32,
}

/// Capability: report the arena's allocated-block layout
///
/// Implemented by poolable containers so collaborators can inspect them
/// uniformly.
pub trait LayoutReportable {
    /// Fill `entries` with the allocated blocks, in class order
    ///
    /// Truncates at the buffer length. Returns how many entries were
    /// written.
    fn arena_layout(&self, entries: &mut [LayoutEntry]) -> usize;

    /// Total bytes of the underlying arena
    fn arena_size(&self) -> usize;
}

impl LayoutReportable for ArenaAllocator {
    fn arena_layout(&self, entries: &mut [LayoutEntry]) -> usize {
        let mut count = 0;
        for list in &self.lists {
            for desc in list.iter() {
                if desc.is_free {
                    continue;
                }
                if count == entries.len() {
                    return count;
                }
                entries[count] = LayoutEntry {
                    offset: desc.offset,
                    length: list.block_size() as u32,
                };
                count += 1;
            }
        }
        count
    }

    fn arena_size(&self) -> usize {
        self.arena_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ARENA_SIZE;

    const EMPTY: LayoutEntry = LayoutEntry {
        offset: 0,
        length: 0,
    };

    #[test]
    fn test_layout_reports_allocated_blocks() {
        let mut arena = ArenaAllocator::new();
        arena.init().unwrap();
        let a = arena.alloc(1000).unwrap();
        let b = arena.alloc(100).unwrap();

        let mut entries = [EMPTY; 8];
        let count = arena.arena_layout(&mut entries);
        assert_eq!(count, 2);

        let reported = &entries[..count];
        assert!(reported.contains(&LayoutEntry {
            offset: a as u32,
            length: 1024,
        }));
        assert!(reported.contains(&LayoutEntry {
            offset: b as u32,
            length: 128,
        }));
    }

    #[test]
    fn test_layout_skips_freed_blocks() {
        let mut arena = ArenaAllocator::new();
        arena.init().unwrap();
        let a = arena.alloc(64).unwrap();
        arena.free(a).unwrap();

        let mut entries = [EMPTY; 8];
        assert_eq!(arena.arena_layout(&mut entries), 0);
    }

    #[test]
    fn test_layout_truncates_at_buffer_length() {
        let mut arena = ArenaAllocator::new();
        arena.init().unwrap();
        for _ in 0..4 {
            arena.alloc(32).unwrap();
        }

        let mut entries = [EMPTY; 2];
        assert_eq!(arena.arena_layout(&mut entries), 2);
    }

    #[test]
    fn test_arena_size() {
        let arena = ArenaAllocator::new();
        assert_eq!(LayoutReportable::arena_size(&arena), ARENA_SIZE);
    }

    #[test]
    fn test_entry_streams_as_bytes() {
        let entry = LayoutEntry {
            offset: 0x100,
            length: 64,
        };
        let bytes = entry.as_bytes();
        assert_eq!(bytes.len(), 8);
    }
}
