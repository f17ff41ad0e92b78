// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracking which backing items should be warm in an external thumbnail cache.
//!
//! The buffer covers a fixed-length [`CacheWindow`] of virtual indices starting
//! at the anchor. When the anchor moves, [`compute_cache_delta`] compares the
//! backing index sets of the old and new windows (not their raw bounds, since
//! a window may wrap a small collection) and reports what to start and stop
//! caching. [`CacheWindowManager`] remembers what it last warmed and drives a
//! [`ThumbnailCache`] with those deltas, issuing stops before starts.

use core::ops::Range;

use kurbo::Size;

use crate::util::len_to_i64;
use crate::{BackingIndexSet, ImageTicket, backing_index_set};

/// External thumbnail cache driven by the grid.
///
/// Calls are idempotent at the cache: starting an entry that is already warm or
/// stopping one that is absent does nothing. Entries are keyed by backing index
/// and target size.
pub trait ThumbnailCache {
    /// Begin warming thumbnails for `indices` at `target_size`.
    fn start_caching(&mut self, indices: &BackingIndexSet, target_size: Size);

    /// Stop warming thumbnails for `indices` at `target_size`.
    fn stop_caching(&mut self, indices: &BackingIndexSet, target_size: Size);

    /// Request one thumbnail. Fire and forget: the result is delivered later by
    /// the host, which must check it with
    /// [`InfiniteGrid::accept_image`](crate::InfiniteGrid::accept_image) using
    /// `ticket` before showing it.
    fn request_image(&mut self, backing_index: usize, target_size: Size, ticket: ImageTicket);
}

/// A fixed-length half-open range of virtual indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheWindow {
    /// First virtual index in the window.
    pub start: i64,
    /// Number of virtual indices in the window.
    pub len: usize,
}

impl CacheWindow {
    /// Creates a window of `len` indices starting at `start`.
    #[must_use]
    pub const fn new(start: i64, len: usize) -> Self {
        Self { start, len }
    }

    /// The window covered by a buffer of `buffer_length` slots at `anchor`.
    #[must_use]
    pub const fn at(anchor: i64, buffer_length: usize) -> Self {
        Self::new(anchor, buffer_length)
    }

    /// The virtual index range `[start, start + len)`.
    #[must_use]
    pub fn range(&self) -> Range<i64> {
        self.start..self.start.saturating_add(len_to_i64(self.len))
    }

    /// Backing indices covered by this window in a collection of `count` items.
    #[must_use]
    pub fn backing_indices(&self, count: usize) -> BackingIndexSet {
        backing_index_set(self.range(), count)
    }
}

/// What to start and stop caching when moving between two windows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheDelta {
    /// Backing indices newly covered.
    pub to_start: BackingIndexSet,
    /// Backing indices no longer covered.
    pub to_stop: BackingIndexSet,
}

impl CacheDelta {
    /// Returns `true` if nothing needs to change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_start.is_empty() && self.to_stop.is_empty()
    }

    fn between(old: &BackingIndexSet, new: &BackingIndexSet) -> Self {
        Self {
            to_start: new.difference(old),
            to_stop: old.difference(new),
        }
    }
}

/// Computes the cache changes needed to move from `old` to `new` over `count` items.
///
/// ```
/// use understory_infinite_grid::{CacheWindow, compute_cache_delta};
///
/// let delta = compute_cache_delta(CacheWindow::new(0, 300), CacheWindow::new(50, 300), 1000);
/// assert_eq!(delta.to_stop.ranges(), &[0..50]);
/// assert_eq!(delta.to_start.ranges(), &[300..350]);
/// ```
#[must_use]
pub fn compute_cache_delta(old: CacheWindow, new: CacheWindow, count: usize) -> CacheDelta {
    CacheDelta::between(&old.backing_indices(count), &new.backing_indices(count))
}

/// Remembers the last warmed window and keeps a [`ThumbnailCache`] in sync with it.
#[derive(Clone, Debug)]
pub struct CacheWindowManager {
    window: Option<CacheWindow>,
    warm: BackingIndexSet,
    target_size: Size,
}

impl CacheWindowManager {
    /// Creates a manager with nothing warm, caching at `target_size`.
    #[must_use]
    pub fn new(target_size: Size) -> Self {
        Self {
            window: None,
            warm: BackingIndexSet::new(),
            target_size,
        }
    }

    /// The window most recently reported through [`Self::update`].
    #[must_use]
    pub const fn window(&self) -> Option<CacheWindow> {
        self.window
    }

    /// Backing indices currently warm.
    #[must_use]
    pub fn warm(&self) -> &BackingIndexSet {
        &self.warm
    }

    /// Size thumbnails are cached at.
    #[must_use]
    pub const fn target_size(&self) -> Size {
        self.target_size
    }

    /// Moves the warm region to `window` over `count` items.
    ///
    /// Stops indices that left the window, then starts indices that entered it.
    /// Returns the delta that was applied.
    pub fn update<C>(&mut self, window: CacheWindow, count: usize, cache: &mut C) -> CacheDelta
    where
        C: ThumbnailCache + ?Sized,
    {
        let next = window.backing_indices(count);
        let delta = CacheDelta::between(&self.warm, &next);
        if !delta.to_stop.is_empty() {
            cache.stop_caching(&delta.to_stop, self.target_size);
        }
        if !delta.to_start.is_empty() {
            cache.start_caching(&delta.to_start, self.target_size);
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(
            window_start = window.start,
            window_len = window.len,
            count,
            started = delta.to_start.len(),
            stopped = delta.to_stop.len(),
            "cache window moved"
        );
        self.window = Some(window);
        self.warm = next;
        delta
    }

    /// Stops everything currently warm and forgets the last window.
    pub fn reset<C>(&mut self, cache: &mut C)
    where
        C: ThumbnailCache + ?Sized,
    {
        if !self.warm.is_empty() {
            cache.stop_caching(&self.warm, self.target_size);
        }
        self.warm = BackingIndexSet::new();
        self.window = None;
    }

    /// Changes the thumbnail size, re-warming the current set at the new size.
    pub fn set_target_size<C>(&mut self, target_size: Size, cache: &mut C)
    where
        C: ThumbnailCache + ?Sized,
    {
        if target_size == self.target_size {
            return;
        }
        if !self.warm.is_empty() {
            cache.stop_caching(&self.warm, self.target_size);
            cache.start_caching(&self.warm, target_size);
        }
        self.target_size = target_size;
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use kurbo::Size;

    use super::{CacheWindow, CacheWindowManager, ThumbnailCache, compute_cache_delta};
    use crate::{BackingIndexSet, ImageTicket};

    #[derive(Default)]
    struct Recorder {
        calls: Vec<(&'static str, BackingIndexSet, Size)>,
    }

    impl ThumbnailCache for Recorder {
        fn start_caching(&mut self, indices: &BackingIndexSet, target_size: Size) {
            self.calls.push(("start", indices.clone(), target_size));
        }

        fn stop_caching(&mut self, indices: &BackingIndexSet, target_size: Size) {
            self.calls.push(("stop", indices.clone(), target_size));
        }

        fn request_image(&mut self, _: usize, _: Size, _: ImageTicket) {}
    }

    #[test]
    fn sliding_window_without_wraparound() {
        let delta = compute_cache_delta(CacheWindow::new(0, 300), CacheWindow::new(50, 300), 1000);
        assert_eq!(delta.to_stop.ranges(), &[0..50]);
        assert_eq!(delta.to_start.ranges(), &[300..350]);
    }

    #[test]
    fn sliding_window_across_the_end_of_the_collection() {
        let delta = compute_cache_delta(CacheWindow::new(900, 300), CacheWindow::new(950, 300), 1000);
        assert_eq!(delta.to_stop.ranges(), &[900..950]);
        assert_eq!(delta.to_start.ranges(), &[200..250]);
    }

    #[test]
    fn windows_wider_than_the_collection_never_change() {
        let delta = compute_cache_delta(CacheWindow::new(0, 300), CacheWindow::new(137, 300), 10);
        assert!(delta.is_empty());
    }

    #[test]
    fn manager_stops_before_starting() {
        let size = Size::new(100.0, 100.0);
        let mut cache = Recorder::default();
        let mut manager = CacheWindowManager::new(size);

        let first = manager.update(CacheWindow::at(0, 300), 1000, &mut cache);
        assert!(first.to_stop.is_empty());
        assert_eq!(first.to_start.ranges(), &[0..300]);

        manager.update(CacheWindow::at(30, 300), 1000, &mut cache);
        let names: Vec<_> = cache.calls.iter().map(|(name, _, _)| *name).collect();
        assert_eq!(names, ["start", "stop", "start"]);
        assert_eq!(cache.calls[1].1.ranges(), &[0..30]);
        assert_eq!(cache.calls[2].1.ranges(), &[300..330]);
        assert_eq!(manager.window(), Some(CacheWindow::new(30, 300)));
    }

    #[test]
    fn moving_away_and_back_restores_the_warm_set() {
        let mut cache = Recorder::default();
        let mut manager = CacheWindowManager::new(Size::new(10.0, 10.0));
        let home = CacheWindow::at(-7, 12);
        manager.update(home, 20, &mut cache);
        let original = manager.warm().clone();
        manager.update(CacheWindow::at(31, 12), 20, &mut cache);
        let back = manager.update(home, 20, &mut cache);
        assert_eq!(manager.warm(), &original);
        assert_eq!(back.to_start.ranges(), &[3..5]);
        assert_eq!(back.to_stop.ranges(), &[11..13]);
    }

    #[test]
    fn unchanged_window_issues_no_calls() {
        let mut cache = Recorder::default();
        let mut manager = CacheWindowManager::new(Size::new(10.0, 10.0));
        manager.update(CacheWindow::at(0, 5), 10, &mut cache);
        cache.calls.clear();
        let delta = manager.update(CacheWindow::at(10, 5), 10, &mut cache);
        assert!(delta.is_empty());
        assert!(cache.calls.is_empty());
    }

    #[test]
    fn reset_and_resize() {
        let small = Size::new(50.0, 50.0);
        let large = Size::new(80.0, 80.0);
        let mut cache = Recorder::default();
        let mut manager = CacheWindowManager::new(small);
        manager.update(CacheWindow::at(0, 4), 10, &mut cache);
        cache.calls.clear();

        manager.set_target_size(large, &mut cache);
        assert_eq!(cache.calls.len(), 2);
        assert_eq!(cache.calls[0].0, "stop");
        assert_eq!(cache.calls[0].2, small);
        assert_eq!(cache.calls[1].0, "start");
        assert_eq!(cache.calls[1].2, large);

        cache.calls.clear();
        manager.reset(&mut cache);
        assert_eq!(cache.calls.len(), 1);
        assert_eq!(cache.calls[0].1.ranges(), &[0..4]);
        assert!(manager.warm().is_empty());
        assert_eq!(manager.window(), None);

        cache.calls.clear();
        manager.reset(&mut cache);
        assert!(cache.calls.is_empty());
    }
}
