//! Fragment plan
//!
//! A file is sent as a sequence of fixed-size fragments. Fragment `k`
//! covers `[min(k·F, size), min(start + F, size))` and is the last one
//! when its end reaches the declared size. An empty file still produces
//! exactly one empty fragment, which is immediately the last.

use serde::{Deserialize, Serialize};

/// Size of every fragment except possibly the last: 256 KiB
pub const FRAGMENT_SIZE: u64 = 262_144;

/// Number of fragment requests needed for a file of `size` bytes
///
/// `ceil(size / FRAGMENT_SIZE)`, except that `size == 0` still needs one.
pub fn fragment_count(size: u64) -> u64 {
    size.div_ceil(FRAGMENT_SIZE).max(1)
}

/// Byte range and flags for a single fragment request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentSpec {
    /// 0-based fragment number
    pub index: u64,
    /// First byte (inclusive)
    pub start: u64,
    /// Last byte (exclusive)
    pub end: u64,
    /// Whether this fragment completes the file
    pub is_last: bool,
}

impl FragmentSpec {
    /// Computes fragment `index` for a file of `size` bytes
    pub fn at(index: u64, size: u64) -> Self {
        let start = index.saturating_mul(FRAGMENT_SIZE).min(size);
        let end = start.saturating_add(FRAGMENT_SIZE).min(size);
        Self {
            index,
            start,
            end,
            is_last: end == size,
        }
    }

    /// Whether this fragment opens the file on the server
    pub fn is_init(&self) -> bool {
        self.index == 0
    }

    /// Number of bytes in the fragment
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Returns true for the degenerate `[0,0)` fragment of an empty file
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Fragment that follows this one, or `None` if this is the last
    pub fn next(&self, size: u64) -> Option<Self> {
        if self.is_last {
            None
        } else {
            Some(Self::at(self.index + 1, size))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_size_is_256kib() {
        assert_eq!(FRAGMENT_SIZE, 256 * 1024);
    }

    #[test]
    fn count_follows_ceiling_law() {
        assert_eq!(fragment_count(1), 1);
        assert_eq!(fragment_count(FRAGMENT_SIZE), 1);
        assert_eq!(fragment_count(FRAGMENT_SIZE + 1), 2);
        assert_eq!(fragment_count(600_000), 3);
    }

    #[test]
    fn empty_file_has_one_empty_last_fragment() {
        assert_eq!(fragment_count(0), 1);
        let first = FragmentSpec::at(0, 0);
        assert_eq!((first.start, first.end), (0, 0));
        assert!(first.is_last);
        assert!(first.is_init());
        assert!(first.is_empty());
        assert!(first.next(0).is_none());
    }

    #[test]
    fn six_hundred_thousand_bytes_split_into_three() {
        let size = 600_000;
        let f0 = FragmentSpec::at(0, size);
        let f1 = f0.next(size).unwrap();
        let f2 = f1.next(size).unwrap();

        assert_eq!((f0.start, f0.end, f0.is_last), (0, 262_144, false));
        assert_eq!((f1.start, f1.end, f1.is_last), (262_144, 524_288, false));
        assert_eq!((f2.start, f2.end, f2.is_last), (524_288, 600_000, true));
        assert_eq!(f2.len(), 75_712);
        assert!(f2.next(size).is_none());
        assert!(f0.is_init() && !f1.is_init());
    }

    #[test]
    fn exact_multiple_ends_on_boundary() {
        let size = 2 * FRAGMENT_SIZE;
        let f1 = FragmentSpec::at(1, size);
        assert!(f1.is_last);
        assert_eq!(f1.end, size);
        assert_eq!(fragment_count(size), 2);
    }

    #[test]
    fn walking_the_plan_matches_count() {
        for size in [0, 1, 1000, FRAGMENT_SIZE - 1, 3 * FRAGMENT_SIZE + 17] {
            let mut spec = FragmentSpec::at(0, size);
            let mut seen = 1;
            while let Some(next) = spec.next(size) {
                assert_eq!(next.start, spec.end);
                spec = next;
                seen += 1;
            }
            assert_eq!(seen, fragment_count(size), "size {size}");
        }
    }
}
