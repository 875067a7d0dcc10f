//! Arena configuration and block class definitions

/// Total bytes of the arena.
///
/// This is the build-time knob that sizes everything else: per-class table
/// capacities, the usable byte count, and the default partition all derive
/// from it.
pub const ARENA_SIZE: usize = 2048;

/// Block sizes in bytes, in strictly descending order.
///
/// The ordering is load-bearing: "larger class" means a smaller index, and
/// the split path walks toward index 0. Each class must be a power of two
/// and exactly twice the next.
pub const BLOCK_CLASSES: [usize; NUM_BLOCK_CLASSES] = [1024, 512, 256, 128, 64, 32];

/// Number of block classes.
pub const NUM_BLOCK_CLASSES: usize = 6;

/// Size of the largest block class.
pub const LARGEST_BLOCK: usize = BLOCK_CLASSES[0];

/// Size of the smallest block class.
pub const SMALLEST_BLOCK: usize = BLOCK_CLASSES[NUM_BLOCK_CLASSES - 1];

/// Bytes the allocator can actually hand out.
///
/// The tail `ARENA_SIZE % SMALLEST_BLOCK` bytes can never be covered by any
/// class and are unusable.
pub const USABLE_SIZE: usize = ARENA_SIZE - ARENA_SIZE % SMALLEST_BLOCK;

const _: () = {
    assert!(ARENA_SIZE >= LARGEST_BLOCK);
    let mut i = 0;
    while i < NUM_BLOCK_CLASSES {
        assert!(BLOCK_CLASSES[i].is_power_of_two());
        if i + 1 < NUM_BLOCK_CLASSES {
            assert!(BLOCK_CLASSES[i] == 2 * BLOCK_CLASSES[i + 1]);
        }
        i += 1;
    }
};

/// Worst-case descriptor count for one class.
///
/// Each table is reserved so that extreme fragmentation cannot exceed it:
/// repeated splitting may hand the entire arena to a single class, so every
/// class must be able to own `ARENA_SIZE / class_size` blocks.
pub const fn list_capacity(class_size: usize) -> usize {
    ARENA_SIZE / class_size + 1
}

/// Backing-array length shared by every descriptor table.
///
/// The smallest class has the largest worst case; using it uniformly keeps
/// the tables in one homogeneous array. The logical per-class bound is still
/// `list_capacity(class_size)` and is enforced at runtime.
pub const MAX_LIST_CAPACITY: usize = list_capacity(SMALLEST_BLOCK);

/// Default partition: greedy largest-class-first.
///
/// Each class claims as many whole blocks as fit in the bytes left over from
/// the classes above it; the residue cascades down. Ideally the initial
/// distribution matches the runtime request mix (fewer splits); callers that
/// know their mix can override it via `ArenaConfig`.
pub const fn default_partition() -> [usize; NUM_BLOCK_CLASSES] {
    let mut lengths = [0; NUM_BLOCK_CLASSES];
    let mut remaining = ARENA_SIZE;
    let mut i = 0;
    while i < NUM_BLOCK_CLASSES {
        lengths[i] = remaining / BLOCK_CLASSES[i];
        remaining %= BLOCK_CLASSES[i];
        i += 1;
    }
    lengths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_partition_covers_usable_bytes() {
        let lengths = default_partition();
        let mut covered = 0;
        for (i, &len) in lengths.iter().enumerate() {
            covered += len * BLOCK_CLASSES[i];
        }
        assert_eq!(covered, USABLE_SIZE);
    }

    #[test]
    fn test_default_partition_within_capacity() {
        let lengths = default_partition();
        for (i, &len) in lengths.iter().enumerate() {
            assert!(len <= list_capacity(BLOCK_CLASSES[i]));
        }
    }

    #[test]
    fn test_capacity_covers_full_arena_ownership() {
        // Any single class must be able to own every byte of the arena.
        for &size in &BLOCK_CLASSES {
            assert!(list_capacity(size) * size >= USABLE_SIZE);
            assert!(list_capacity(size) <= MAX_LIST_CAPACITY);
        }
    }
}
