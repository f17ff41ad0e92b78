// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Circular mapping from unbounded virtual indices onto a finite backing collection.
//!
//! A virtual index is any `i64`; it resolves to the backing index
//! `virtual_index.rem_euclid(count)`. Negative virtual indices therefore wrap
//! to the end of the collection (`-1` is the last item), which is what keeps the
//! grid well-defined after the anchor has moved backward.
//!
//! Windows of virtual indices resolve to a [`BackingIndexSet`]: a compact set of
//! disjoint backing ranges. A window that wraps past the end of the collection
//! resolves to two ranges, `[start, count)` and `[0, end)`.

use core::ops::Range;

use smallvec::SmallVec;

use crate::util::len_to_i64;

/// Resolves `virtual_index` to a backing index in `0..count`.
///
/// Returns `None` when the backing collection is empty.
///
/// ```
/// use understory_infinite_grid::backing_index;
///
/// assert_eq!(backing_index(12, 10), Some(2));
/// assert_eq!(backing_index(-1, 10), Some(9));
/// assert_eq!(backing_index(5, 0), None);
/// ```
#[must_use]
pub fn backing_index(virtual_index: i64, count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }
    usize::try_from(virtual_index.rem_euclid(len_to_i64(count))).ok()
}

/// Resolves a half-open window of virtual indices to the set of backing indices it covers.
///
/// - An empty collection or an empty window yields an empty set.
/// - A window at least `count` long covers the whole collection.
/// - Otherwise the window covers the circular span between its resolved endpoints.
#[must_use]
pub fn backing_index_set(window: Range<i64>, count: usize) -> BackingIndexSet {
    if count == 0 || window.end <= window.start {
        return BackingIndexSet::new();
    }
    let window_len = window.end.abs_diff(window.start);
    if window_len >= count as u64 {
        return BackingIndexSet::from_range(0..count);
    }
    let (Some(start), Some(end)) = (
        backing_index(window.start, count),
        backing_index(window.end, count),
    ) else {
        return BackingIndexSet::new();
    };
    debug_assert_ne!(
        start, end,
        "a window shorter than the collection cannot resolve to equal endpoints"
    );
    if start < end {
        BackingIndexSet::from_range(start..end)
    } else {
        BackingIndexSet::from_ranges([start..count, 0..end])
    }
}

/// A set of backing indices stored as sorted, disjoint, non-adjacent ranges.
///
/// Sets produced by [`backing_index_set`] hold at most two ranges; set
/// differences may hold a few more.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BackingIndexSet {
    ranges: SmallVec<[Range<usize>; 2]>,
}

impl BackingIndexSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ranges: SmallVec::new(),
        }
    }

    /// Creates a set covering a single range. Empty ranges yield an empty set.
    #[must_use]
    pub fn from_range(range: Range<usize>) -> Self {
        let mut ranges = SmallVec::new();
        if range.start < range.end {
            ranges.push(range);
        }
        Self { ranges }
    }

    /// Creates a set covering the union of `ranges`, in any order.
    #[must_use]
    pub fn from_ranges<I>(ranges: I) -> Self
    where
        I: IntoIterator<Item = Range<usize>>,
    {
        let mut sorted: SmallVec<[Range<usize>; 4]> =
            ranges.into_iter().filter(|r| r.start < r.end).collect();
        sorted.sort_unstable_by_key(|r| r.start);

        let mut merged: SmallVec<[Range<usize>; 2]> = SmallVec::new();
        for range in sorted {
            match merged.last_mut() {
                Some(last) if range.start <= last.end => {
                    last.end = last.end.max(range.end);
                }
                _ => merged.push(range),
            }
        }
        Self { ranges: merged }
    }

    /// Number of backing indices in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.iter().map(|r| r.end - r.start).sum()
    }

    /// Returns `true` if the set holds no indices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Returns `true` if `index` is in the set.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.ranges.iter().any(|r| r.contains(&index))
    }

    /// The sorted, disjoint ranges making up this set.
    #[must_use]
    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }

    /// Iterates the indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.ranges.iter().flat_map(Clone::clone)
    }

    /// Indices in `self` that are not in `other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        let mut out: SmallVec<[Range<usize>; 2]> = SmallVec::new();
        for range in &self.ranges {
            let mut start = range.start;
            for cut in &other.ranges {
                if cut.end <= start {
                    continue;
                }
                if cut.start >= range.end {
                    break;
                }
                if cut.start > start {
                    out.push(start..cut.start);
                }
                start = start.max(cut.end);
                if start >= range.end {
                    break;
                }
            }
            if start < range.end {
                out.push(start..range.end);
            }
        }
        Self { ranges: out }
    }

    /// Indices in either `self` or `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self::from_ranges(self.ranges.iter().chain(other.ranges.iter()).cloned())
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::{BackingIndexSet, backing_index, backing_index_set};

    #[test]
    fn negative_virtual_indices_wrap_to_the_end() {
        assert_eq!(backing_index(-1, 10), Some(9));
        assert_eq!(backing_index(-10, 10), Some(0));
        assert_eq!(backing_index(-11, 10), Some(9));
        assert_eq!(backing_index(i64::MIN, 10), Some(2));
    }

    #[test]
    fn empty_collection_has_no_items() {
        assert_eq!(backing_index(0, 0), None);
        assert_eq!(backing_index(-3, 0), None);
        assert!(backing_index_set(0..300, 0).is_empty());
    }

    #[test]
    fn window_inside_collection_is_one_range() {
        let set = backing_index_set(50..350, 1000);
        assert_eq!(set.ranges(), &[50..350]);
        assert_eq!(set.len(), 300);
    }

    #[test]
    fn wrapping_window_splits_in_two() {
        let set = backing_index_set(8..13, 10);
        assert_eq!(set.ranges(), &[0..3, 8..10]);
        assert_eq!(set.iter().collect::<Vec<_>>(), [0, 1, 2, 8, 9]);

        let set = backing_index_set(-2..3, 10);
        assert_eq!(set.ranges(), &[0..3, 8..10]);
    }

    #[test]
    fn window_ending_on_a_multiple_of_count_does_not_wrap() {
        let set = backing_index_set(7..10, 10);
        assert_eq!(set.ranges(), &[7..10]);
    }

    #[test]
    fn window_longer_than_collection_covers_everything() {
        let set = backing_index_set(0..300, 10);
        assert_eq!(set.ranges(), &[0..10]);
        let set = backing_index_set(-295..5, 7);
        assert_eq!(set.len(), 7);
    }

    #[test]
    fn empty_and_inverted_windows_are_empty() {
        assert!(backing_index_set(5..5, 10).is_empty());
        assert!(backing_index_set(5..2, 10).is_empty());
    }

    #[test]
    fn difference_and_union() {
        let a = BackingIndexSet::from_range(0..300);
        let b = BackingIndexSet::from_range(50..350);
        assert_eq!(a.difference(&b).ranges(), &[0..50]);
        assert_eq!(b.difference(&a).ranges(), &[300..350]);
        assert_eq!(a.union(&b).ranges(), &[0..350]);

        let holes = BackingIndexSet::from_ranges([2..4, 6..8]);
        assert_eq!(a.difference(&holes).ranges(), &[0..2, 4..6, 8..300]);
        assert!(holes.difference(&a).is_empty());
    }

    #[test]
    fn from_ranges_merges_adjacent_and_overlapping() {
        let set = BackingIndexSet::from_ranges([5..7, 0..2, 2..3, 6..9, 4..4]);
        assert_eq!(set.ranges(), &[0..3, 5..9]);
        assert!(set.contains(8));
        assert!(!set.contains(3));
    }
}
