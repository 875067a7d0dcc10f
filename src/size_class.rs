//! Block class selection
//!
//! Determines which block class to use for a given allocation request.

use crate::config::{BLOCK_CLASSES, LARGEST_BLOCK, NUM_BLOCK_CLASSES};

/// Find the best-fit block class for a given request size
///
/// Selects the smallest class whose size is at least `req_bytes`: the class
/// `c` with `c/2 < req_bytes <= c`. Requests at or below half the smallest
/// class are served by the smallest class. Internal fragmentation is thereby
/// bounded below half the returned class size for requests above
/// `SMALLEST_BLOCK / 2`.
///
/// # Returns
/// The index of the class to use (0 is the largest class), or None if the
/// request exceeds the largest class.
pub fn find_block_class(req_bytes: usize) -> Option<usize> {
    if req_bytes > LARGEST_BLOCK {
        return None;
    }

    // Classes are ordered largest to smallest; skip every class whose
    // lower half would still fit the request.
    BLOCK_CLASSES
        .iter()
        .position(|&size| req_bytes > size / 2)
        .or(Some(NUM_BLOCK_CLASSES - 1))
}

/// Get the block size for a class
pub fn class_size(class_idx: usize) -> usize {
    BLOCK_CLASSES[class_idx]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SMALLEST_BLOCK;

    #[test]
    fn test_exact_sizes() {
        // Exact class sizes map to their own class
        assert_eq!(find_block_class(1024), Some(0));
        assert_eq!(find_block_class(512), Some(1));
        assert_eq!(find_block_class(256), Some(2));
        assert_eq!(find_block_class(128), Some(3));
        assert_eq!(find_block_class(64), Some(4));
        assert_eq!(find_block_class(32), Some(5));
    }

    #[test]
    fn test_intermediate_sizes() {
        // Sizes between classes round up
        assert_eq!(find_block_class(1000), Some(0));
        assert_eq!(find_block_class(513), Some(0));
        assert_eq!(find_block_class(100), Some(3));
        assert_eq!(find_block_class(65), Some(3));
        assert_eq!(find_block_class(33), Some(4));
    }

    #[test]
    fn test_tiny_sizes() {
        // At or below half the smallest class, the smallest class serves
        assert_eq!(find_block_class(1), Some(NUM_BLOCK_CLASSES - 1));
        assert_eq!(find_block_class(16), Some(NUM_BLOCK_CLASSES - 1));
        assert_eq!(find_block_class(17), Some(NUM_BLOCK_CLASSES - 1));
    }

    #[test]
    fn test_too_large() {
        assert_eq!(find_block_class(LARGEST_BLOCK + 1), None);
        assert_eq!(find_block_class(4096), None);
    }

    #[test]
    fn test_best_fit_bound() {
        // For every request above SMALLEST_BLOCK / 2 the returned class
        // satisfies c/2 < req <= c.
        for req in (SMALLEST_BLOCK / 2 + 1)..=LARGEST_BLOCK {
            let class = find_block_class(req).unwrap();
            let size = class_size(class);
            assert!(size / 2 < req && req <= size, "req {} got class {}", req, size);
        }
    }
}
