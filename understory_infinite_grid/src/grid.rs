// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`InfiniteGrid`]: wires the anchor, geometry, cache window, and backing store together.
//!
//! The host owns a render surface (something that lays out and recycles
//! `slot_count()` square cells) and a thumbnail cache. It forwards scroll
//! positions to [`InfiniteGrid::on_scroll`], resolves cells with
//! [`InfiniteGrid::bind_slot`] or [`InfiniteGrid::request_thumbnail`], and
//! checks asynchronous results with [`InfiniteGrid::accept_image`].
//!
//! Every call that touches the surface returns the [`Invalidation`] it caused,
//! which makes the grid easy to drive from tests and from hosts that batch
//! their own redraws.

use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use core::cell::Cell;

use hashbrown::HashMap;
use kurbo::Size;

use crate::{
    AnchorController, BackingStore, CacheWindow, CacheWindowManager, GridConfig, GridLayout,
    ScrollEvent, SubscriptionId, ThumbnailCache, ThumbnailPreset, backing_index,
};

bitflags::bitflags! {
    /// Surface work requested by one grid call.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Invalidation: u8 {
        /// The scroll offset was rewritten to compensate a reanchor.
        const SCROLL_OFFSET = 1 << 0;
        /// Slot geometry or the slot to virtual index mapping changed.
        const LAYOUT = 1 << 1;
        /// Visible slots must be resolved again.
        const VISIBLE_SLOTS = 1 << 2;
        /// The warm cache window moved.
        const CACHE_WINDOW = 1 << 3;
    }
}

/// The rendering surface that presents the buffer slots.
pub trait RenderSurface {
    /// Moves the viewport to `offset_y` without animation.
    fn set_scroll_offset_y(&mut self, offset_y: f64);

    /// Marks slot layout as stale.
    fn invalidate_layout(&mut self);

    /// Resolves the contents of every visible slot again.
    fn reload_visible_slots(&mut self);

    /// Whether the surface is applying a layout change of its own, such as an
    /// animated column change. Scroll events reported meanwhile are ignored.
    fn is_programmatic_layout_change_in_progress(&self) -> bool;
}

/// A buffer slot resolved to its current virtual and backing index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotBinding {
    /// Buffer slot, in `0..slot_count()`.
    pub slot: usize,
    /// Virtual index currently assigned to the slot.
    pub virtual_index: i64,
    /// Position of the item in the backing store.
    pub backing_index: usize,
}

/// Identifies an asynchronous thumbnail request by the slot and the virtual
/// index that slot was showing when the request was made.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageTicket {
    /// Buffer slot that asked for the image.
    pub slot: usize,
    /// Virtual index the slot was bound to.
    pub virtual_index: i64,
}

/// An endlessly scrolling grid over a finite [`BackingStore`].
///
/// The grid subscribes to the store on construction and unsubscribes on drop.
/// Store changes are coalesced and applied by [`Self::process_store_changes`],
/// which [`Self::on_scroll`] also calls first.
#[derive(Debug)]
pub struct InfiniteGrid<S: BackingStore> {
    store: S,
    config: GridConfig,
    layout: GridLayout,
    anchor: AnchorController,
    cache_window: CacheWindowManager,
    /// Virtual index each bound slot was last resolved to.
    slot_tags: HashMap<usize, i64>,
    /// Compensating offset written to the surface and not yet echoed back.
    pending_offset: Option<f64>,
    store_changed: Rc<Cell<bool>>,
    subscription: SubscriptionId,
}

impl<S: BackingStore> InfiniteGrid<S> {
    /// Creates a grid over `store`, laid out for `available_width`.
    pub fn new(mut store: S, config: GridConfig, available_width: f64) -> Self {
        let store_changed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&store_changed);
        let subscription = store.subscribe(Box::new(move || flag.set(true)));
        let layout = GridLayout::from_config(available_width, &config);
        Self {
            store,
            anchor: AnchorController::new(config.top_edge()),
            cache_window: CacheWindowManager::new(layout.thumbnail_size()),
            config,
            layout,
            slot_tags: HashMap::new(),
            pending_offset: None,
            store_changed,
            subscription,
        }
    }

    /// The backing store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access to the backing store. Changes it announces are applied
    /// on the next [`Self::process_store_changes`] or [`Self::on_scroll`].
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// The session configuration.
    #[must_use]
    pub const fn config(&self) -> &GridConfig {
        &self.config
    }

    /// The current geometry snapshot.
    #[must_use]
    pub const fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// The virtual index shown by slot 0.
    #[must_use]
    pub const fn anchor(&self) -> i64 {
        self.anchor.anchor()
    }

    /// The cache window bookkeeping.
    #[must_use]
    pub const fn cache_window(&self) -> &CacheWindowManager {
        &self.cache_window
    }

    /// Returns `true` from a reanchor until the surface acknowledges the
    /// compensating offset, either by reporting it through [`Self::on_scroll`]
    /// or through [`Self::finish_layout_change`].
    ///
    /// The first scroll event that follows a reanchor ends this state. It is
    /// ignored if it reports exactly the written offset and handled normally
    /// otherwise.
    #[must_use]
    pub const fn is_applying_layout_change(&self) -> bool {
        self.pending_offset.is_some()
    }

    /// Acknowledges the last compensating offset for hosts that do not report
    /// programmatic scrolls back.
    pub fn finish_layout_change(&mut self) {
        self.pending_offset = None;
    }

    /// Number of slots the surface should materialize: the buffer length, or
    /// zero when the store is empty.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        if self.store.is_empty() {
            0
        } else {
            self.config.buffer_length()
        }
    }

    /// Height of the realized slots.
    #[must_use]
    pub fn content_height(&self) -> f64 {
        self.layout.content_height(self.slot_count())
    }

    /// The virtual index window covered by the buffer.
    #[must_use]
    pub fn window(&self) -> CacheWindow {
        CacheWindow::at(self.anchor.anchor(), self.config.buffer_length())
    }

    /// Size thumbnails are requested and cached at.
    #[must_use]
    pub fn thumbnail_size(&self) -> Size {
        self.layout.thumbnail_size()
    }

    /// Handles a scroll position from the surface, reanchoring when needed.
    pub fn on_scroll<R, C>(&mut self, event: ScrollEvent, surface: &mut R, cache: &mut C) -> Invalidation
    where
        R: RenderSurface + ?Sized,
        C: ThumbnailCache + ?Sized,
    {
        let mut invalidation = self.process_store_changes(surface, cache);
        if self.pending_offset.take() == Some(event.offset_y)
            || surface.is_programmatic_layout_change_in_progress()
            || self.slot_count() == 0
        {
            return invalidation;
        }

        if let Some(reanchor) = self.anchor.on_scroll(event, &self.layout, false) {
            self.pending_offset = Some(reanchor.new_offset_y);
            surface.set_scroll_offset_y(reanchor.new_offset_y);
            surface.invalidate_layout();
            invalidation |= Invalidation::SCROLL_OFFSET | Invalidation::LAYOUT;
        }

        invalidation | self.sync_cache_window(cache)
    }

    /// Changes the number of columns (clamped to at least 1).
    pub fn set_columns<R, C>(&mut self, columns: usize, surface: &mut R, cache: &mut C) -> Invalidation
    where
        R: RenderSurface + ?Sized,
        C: ThumbnailCache + ?Sized,
    {
        self.config.set_columns(columns);
        self.relayout(self.layout.available_width(), surface, cache)
    }

    /// Changes the number of columns to match `preset`.
    pub fn apply_preset<R, C>(
        &mut self,
        preset: ThumbnailPreset,
        surface: &mut R,
        cache: &mut C,
    ) -> Invalidation
    where
        R: RenderSurface + ?Sized,
        C: ThumbnailCache + ?Sized,
    {
        self.set_columns(preset.columns(), surface, cache)
    }

    /// Changes the width available to the grid.
    pub fn set_available_width<R, C>(
        &mut self,
        available_width: f64,
        surface: &mut R,
        cache: &mut C,
    ) -> Invalidation
    where
        R: RenderSurface + ?Sized,
        C: ThumbnailCache + ?Sized,
    {
        self.relayout(available_width, surface, cache)
    }

    /// Changes the display scale used for pixel snapping and thumbnail sizes.
    pub fn set_scale<R, C>(&mut self, scale: f64, surface: &mut R, cache: &mut C) -> Invalidation
    where
        R: RenderSurface + ?Sized,
        C: ThumbnailCache + ?Sized,
    {
        self.config.set_scale(scale);
        self.relayout(self.layout.available_width(), surface, cache)
    }

    /// Turns thumbnail precaching on or off.
    ///
    /// Enabling warms the current window right away; disabling stops
    /// everything that is warm.
    pub fn set_precaching<C>(&mut self, enabled: bool, cache: &mut C) -> Invalidation
    where
        C: ThumbnailCache + ?Sized,
    {
        self.config.set_precaching(enabled);
        if enabled {
            self.sync_cache_window(cache)
        } else if self.cache_window.window().is_some() {
            self.cache_window.reset(cache);
            Invalidation::CACHE_WINDOW
        } else {
            Invalidation::empty()
        }
    }

    /// Applies a pending store change, if the store announced one.
    pub fn process_store_changes<R, C>(&mut self, surface: &mut R, cache: &mut C) -> Invalidation
    where
        R: RenderSurface + ?Sized,
        C: ThumbnailCache + ?Sized,
    {
        if self.store_changed.replace(false) {
            self.on_store_changed(surface, cache)
        } else {
            Invalidation::empty()
        }
    }

    /// Treats the whole mapping as stale after a store change.
    ///
    /// Drops every slot binding, stops the warm cache set, warms the current
    /// window again if precaching is on, and reloads the visible slots.
    pub fn on_store_changed<R, C>(&mut self, surface: &mut R, cache: &mut C) -> Invalidation
    where
        R: RenderSurface + ?Sized,
        C: ThumbnailCache + ?Sized,
    {
        self.store_changed.set(false);
        #[cfg(feature = "tracing")]
        tracing::debug!(
            count = self.store.count(),
            bound_slots = self.slot_tags.len(),
            "backing store changed"
        );
        self.slot_tags.clear();
        self.cache_window.reset(cache);
        self.sync_cache_window(cache);
        surface.reload_visible_slots();
        Invalidation::VISIBLE_SLOTS | Invalidation::CACHE_WINDOW
    }

    /// Resolves buffer slot `slot` and records it as the slot's current binding.
    ///
    /// Returns `None` for slots outside `0..slot_count()`.
    pub fn bind_slot(&mut self, slot: usize) -> Option<SlotBinding> {
        let binding = self.resolve_slot(slot)?;
        self.slot_tags.insert(slot, binding.virtual_index);
        Some(binding)
    }

    /// Resolves buffer slot `slot` without recording a binding.
    #[must_use]
    pub fn resolve_slot(&self, slot: usize) -> Option<SlotBinding> {
        if slot >= self.slot_count() {
            return None;
        }
        let virtual_index = self.anchor.virtual_index_of_slot(slot);
        let backing_index = backing_index(virtual_index, self.store.count())?;
        Some(SlotBinding {
            slot,
            virtual_index,
            backing_index,
        })
    }

    /// The item shown by buffer slot `slot`.
    #[must_use]
    pub fn item_for_slot(&self, slot: usize) -> Option<&S::Item> {
        let binding = self.resolve_slot(slot)?;
        self.store.item_at(binding.backing_index)
    }

    /// Forgets the binding of a slot the surface has recycled.
    pub fn unbind_slot(&mut self, slot: usize) {
        self.slot_tags.remove(&slot);
    }

    /// Binds `slot` and asks `cache` for its thumbnail.
    ///
    /// Returns the ticket the result must be checked against.
    pub fn request_thumbnail<C>(&mut self, slot: usize, cache: &mut C) -> Option<ImageTicket>
    where
        C: ThumbnailCache + ?Sized,
    {
        let binding = self.bind_slot(slot)?;
        let ticket = ImageTicket {
            slot,
            virtual_index: binding.virtual_index,
        };
        cache.request_image(binding.backing_index, self.thumbnail_size(), ticket);
        Some(ticket)
    }

    /// Returns `true` if an image requested with `ticket` may still be shown.
    ///
    /// A result is stale once its slot was recycled, rebound, or moved to a
    /// different virtual index by reanchoring. Stale results should be dropped
    /// without retrying.
    #[must_use]
    pub fn accept_image(&self, ticket: ImageTicket) -> bool {
        let current = self.slot_tags.get(&ticket.slot) == Some(&ticket.virtual_index)
            && self.anchor.virtual_index_of_slot(ticket.slot) == ticket.virtual_index;
        #[cfg(feature = "tracing")]
        if !current {
            tracing::trace!(
                slot = ticket.slot,
                virtual_index = ticket.virtual_index,
                "dropping stale image"
            );
        }
        current
    }

    /// Diagnostic caption for a slot: its virtual index, backing index (`-1`
    /// when unresolved), and buffer position.
    #[must_use]
    pub fn debug_caption(&self, slot: usize) -> String {
        let virtual_index = self.anchor.virtual_index_of_slot(slot);
        let photo = match self.resolve_slot(slot) {
            Some(binding) => format!("{}", binding.backing_index),
            None => String::from("-1"),
        };
        format!("index: {virtual_index}\nphoto: {photo}\nbuffer: {slot}")
    }

    fn relayout<R, C>(&mut self, available_width: f64, surface: &mut R, cache: &mut C) -> Invalidation
    where
        R: RenderSurface + ?Sized,
        C: ThumbnailCache + ?Sized,
    {
        let layout = GridLayout::from_config(available_width, &self.config);
        if layout == self.layout {
            return Invalidation::empty();
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(
            columns = layout.columns(),
            item_size = layout.item_size(),
            available_width = layout.available_width(),
            "grid relayout"
        );
        let columns_changed = layout.columns() != self.layout.columns();
        self.layout = layout;
        if columns_changed {
            self.anchor.align_to_columns(layout.columns());
        }

        surface.invalidate_layout();
        surface.reload_visible_slots();

        self.cache_window
            .set_target_size(self.layout.thumbnail_size(), cache);
        Invalidation::LAYOUT | Invalidation::VISIBLE_SLOTS | self.sync_cache_window(cache)
    }

    /// Brings the warm cache window in line with the buffer, when precaching.
    fn sync_cache_window<C>(&mut self, cache: &mut C) -> Invalidation
    where
        C: ThumbnailCache + ?Sized,
    {
        if !self.config.precaching() || self.store.is_empty() {
            return Invalidation::empty();
        }
        let window = self.window();
        if self.cache_window.window() == Some(window) {
            return Invalidation::empty();
        }
        self.cache_window.update(window, self.store.count(), cache);
        Invalidation::CACHE_WINDOW
    }
}

impl<S: BackingStore> Drop for InfiniteGrid<S> {
    fn drop(&mut self) {
        self.store.unsubscribe(self.subscription);
    }
}
