// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The anchor and the reanchoring protocol.
//!
//! Buffer slot `i` always shows virtual index `anchor + i`. The render surface
//! has a fixed number of slots, so its content has a finite height. To make
//! scrolling appear endless, the controller watches scroll positions and, when
//! the viewport gets within one viewport height of either end of the content,
//! moves the anchor by whole rows and reports a compensating scroll offset so
//! that nothing on screen moves.
//!
//! ## Transitions
//!
//! With `buffer = dead_zone = viewport_height`:
//!
//! - **Top**: when `offset_y < buffer`, look up the row at
//!   `viewport_bottom + buffer - content_height + dead_zone`. If that row
//!   resolves before slot 0, move the anchor back by that many items and push
//!   the scroll offset down by the matching number of rows.
//! - **Bottom**: when `viewport_bottom > content_height - buffer`, look up the row
//!   at `offset_y - buffer - dead_zone`, move the anchor forward by that many
//!   items, and pull the scroll offset up by the matching number of rows.
//!
//! Both transitions may fire for a single event. The bottom check sees the
//! offset already compensated by the top transition.

use crate::{GridLayout, TopEdge};

/// A scroll position reported by the render surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollEvent {
    /// Vertical scroll offset of the viewport's top edge.
    pub offset_y: f64,
    /// Height of the viewport.
    pub viewport_height: f64,
    /// Height of the realized buffer content.
    pub content_height: f64,
}

impl ScrollEvent {
    /// Creates a scroll event.
    #[must_use]
    pub const fn new(offset_y: f64, viewport_height: f64, content_height: f64) -> Self {
        Self {
            offset_y,
            viewport_height,
            content_height,
        }
    }

    /// Vertical position of the viewport's bottom edge.
    #[must_use]
    pub fn viewport_bottom(&self) -> f64 {
        self.offset_y + self.viewport_height
    }
}

/// The result of reanchoring for one scroll event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reanchor {
    /// Change applied to the anchor, in items. Negative when moving backward.
    pub anchor_delta: i64,
    /// Change applied to the scroll offset.
    pub offset_delta: f64,
    /// The compensated scroll offset the surface must adopt.
    pub new_offset_y: f64,
}

/// Owns the anchor and decides when to move it.
#[derive(Clone, Debug)]
pub struct AnchorController {
    anchor: i64,
    top_edge: TopEdge,
}

impl Default for AnchorController {
    fn default() -> Self {
        Self::new(TopEdge::default())
    }
}

impl AnchorController {
    /// Creates a controller with the anchor at 0.
    #[must_use]
    pub const fn new(top_edge: TopEdge) -> Self {
        Self::with_anchor(0, top_edge)
    }

    /// Creates a controller resuming from a previously saved anchor.
    #[must_use]
    pub const fn with_anchor(anchor: i64, top_edge: TopEdge) -> Self {
        Self { anchor, top_edge }
    }

    /// The virtual index shown by buffer slot 0.
    #[must_use]
    pub const fn anchor(&self) -> i64 {
        self.anchor
    }

    /// The top edge policy.
    #[must_use]
    pub const fn top_edge(&self) -> TopEdge {
        self.top_edge
    }

    /// Changes the top edge policy. Takes effect on the next scroll event.
    pub fn set_top_edge(&mut self, top_edge: TopEdge) {
        self.top_edge = top_edge;
    }

    /// Moves the anchor back to 0.
    pub fn reset(&mut self) {
        self.anchor = 0;
    }

    /// Moves the anchor back to the start of its row in a grid of `columns`.
    ///
    /// Call after a column change: the top clamp stays row-aligned only while
    /// the anchor is. Returns the (non-positive) change applied.
    pub fn align_to_columns(&mut self, columns: usize) -> i64 {
        let columns = i64::try_from(columns.max(1)).unwrap_or(i64::MAX);
        let delta = -self.anchor.rem_euclid(columns);
        self.anchor = self.anchor.saturating_add(delta);
        delta
    }

    /// Virtual index currently shown by buffer slot `slot`.
    #[must_use]
    pub fn virtual_index_of_slot(&self, slot: usize) -> i64 {
        self.anchor
            .saturating_add(i64::try_from(slot).unwrap_or(i64::MAX))
    }

    /// Handles one scroll position, reanchoring if the viewport is near either end.
    ///
    /// `suppress` is set while a programmatic scroll or layout change is being
    /// applied; such events are echoes of earlier decisions and are ignored.
    /// Returns `None` when the anchor did not move.
    pub fn on_scroll(
        &mut self,
        event: ScrollEvent,
        layout: &GridLayout,
        suppress: bool,
    ) -> Option<Reanchor> {
        if suppress || event.content_height.is_nan() || event.content_height <= 0.0 {
            return None;
        }

        let content_offset_buffer = event.viewport_height;
        let dead_zone_buffer = event.viewport_height;
        let min_virtual_index = self.top_edge.min_virtual_index();
        let start_anchor = self.anchor;
        let mut offset_y = event.offset_y;

        if offset_y < content_offset_buffer {
            let viewport_bottom = offset_y + event.viewport_height;
            let target_y =
                viewport_bottom + content_offset_buffer - event.content_height + dead_zone_buffer;
            let shift = layout.first_item_offset_at(target_y, self.anchor, min_virtual_index);
            if shift < 0 {
                offset_y -= layout.vertical_offset(shift);
                self.anchor = self.anchor.saturating_add(shift);
            }
        }

        if offset_y + event.viewport_height > event.content_height - content_offset_buffer {
            let target_y = offset_y - content_offset_buffer - dead_zone_buffer;
            let shift = layout.first_item_offset_at(target_y, self.anchor, min_virtual_index);
            offset_y -= layout.vertical_offset(shift);
            self.anchor = self.anchor.saturating_add(shift);
        }

        let anchor_delta = self.anchor.saturating_sub(start_anchor);
        let offset_delta = offset_y - event.offset_y;
        if anchor_delta == 0 && offset_delta == 0.0 {
            return None;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            anchor = self.anchor,
            anchor_delta,
            offset_delta,
            offset_y = event.offset_y,
            viewport_height = event.viewport_height,
            content_height = event.content_height,
            "reanchored"
        );

        Some(Reanchor {
            anchor_delta,
            offset_delta,
            new_offset_y: offset_y,
        })
    }
}
