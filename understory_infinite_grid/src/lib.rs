// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Endless, wrap-around scrolling over a finite collection laid out as a grid.
//!
//! A render surface can only materialize a fixed number of cells. This crate
//! makes a grid of square thumbnails appear to scroll forever in both
//! directions by keeping a fixed buffer of slots, mapping them onto an
//! unbounded *virtual index* space through a moving *anchor*, and resolving
//! every virtual index to a real item with a true modulo over the collection
//! length.
//!
//! ## Concepts
//!
//! - **Virtual index**: any `i64`. Slot `i` of the buffer shows virtual index
//!   `anchor + i`.
//! - **Backing index**: position in the backing collection,
//!   `virtual_index.rem_euclid(count)`. See [`backing_index`].
//! - **Anchor**: owned by [`AnchorController`]. It moves by whole rows when the
//!   viewport nears either end of the buffer, and the scroll offset is
//!   compensated so nothing on screen moves.
//! - **Cache window**: the buffer's virtual index range, resolved to a
//!   [`BackingIndexSet`]. [`CacheWindowManager`] tells a [`ThumbnailCache`]
//!   what to start and stop warming as the window moves.
//!
//! [`InfiniteGrid`] ties these together with a [`GridLayout`] and a
//! [`BackingStore`], and talks to the host through [`RenderSurface`].
//!
//! ## Example
//!
//! ```
//! use understory_infinite_grid::{GridConfig, GridLayout, ScrollEvent, AnchorController, TopEdge};
//!
//! // Four columns across 402 units with 2 unit gaps: 99 unit squares.
//! let layout = GridLayout::from_config(402.0, &GridConfig::new().with_columns(4));
//! assert_eq!(layout.item_size(), 99.0);
//!
//! // 300 slots make 75 rows. Scrolling near the bottom moves the anchor forward.
//! let content_height = layout.content_height(300);
//! let mut anchor = AnchorController::new(TopEdge::Bounded);
//! let event = ScrollEvent::new(content_height - 900.0, 800.0, content_height);
//! let reanchor = anchor.on_scroll(event, &layout, false).unwrap();
//! assert_eq!(anchor.anchor(), 200);
//! assert_eq!(reanchor.new_offset_y, event.offset_y - 50.0 * layout.row_pitch());
//! ```
//!
//! ## Features
//!
//! - `std` *(default)*: enables `std` support in `kurbo`.
//! - `libm`: `no_std` float support for `kurbo`.
//! - `tracing`: structured events for reanchors, relayouts, cache window moves
//!   and store changes.
//! - `serde`: `Serialize`/`Deserialize` for [`GridConfig`], [`TopEdge`] and
//!   [`ThumbnailPreset`].

#![no_std]

extern crate alloc;

mod anchor;
mod cache_window;
mod circular;
mod config;
mod geometry;
mod grid;
mod store;
mod util;

pub use anchor::{AnchorController, Reanchor, ScrollEvent};
pub use cache_window::{
    CacheDelta, CacheWindow, CacheWindowManager, ThumbnailCache, compute_cache_delta,
};
pub use circular::{BackingIndexSet, backing_index, backing_index_set};
pub use config::{
    DEFAULT_BUFFER_LENGTH, DEFAULT_COLUMNS, DEFAULT_SPACING, GridConfig, ThumbnailPreset, TopEdge,
};
pub use geometry::{GridLayout, floor_to_device_pixels};
pub use grid::{ImageTicket, InfiniteGrid, Invalidation, RenderSurface, SlotBinding};
pub use store::{BackingStore, ChangeNotifier, SubscriptionId, VecStore};
