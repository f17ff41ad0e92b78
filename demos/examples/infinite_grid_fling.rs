// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Endless grid: fling through a small photo library in both directions.
//!
//! This example drives `understory_infinite_grid` with a simulated scroll
//! surface and an in-memory thumbnail cache:
//! - a decaying fling scrolls down far past the end of the library,
//! - a second fling scrolls back up past the first item,
//! - thumbnail requests issued before a reanchor are checked on delivery and
//!   stale ones are dropped.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p understory_demos --example infinite_grid_fling`

use std::collections::HashSet;

use kurbo::Size;
use tracing_subscriber::EnvFilter;
use understory_infinite_grid::{
    BackingIndexSet, BackingStore, GridConfig, ImageTicket, InfiniteGrid, RenderSurface, ScrollEvent,
    ThumbnailCache, ThumbnailPreset, TopEdge, VecStore,
};

/// A scroll view that only remembers its offset and what it was asked to do.
#[derive(Debug)]
struct SimulatedSurface {
    offset_y: f64,
    viewport_height: f64,
    layout_passes: usize,
    reloads: usize,
}

impl RenderSurface for SimulatedSurface {
    fn set_scroll_offset_y(&mut self, offset_y: f64) {
        self.offset_y = offset_y;
    }

    fn invalidate_layout(&mut self) {
        self.layout_passes += 1;
    }

    fn reload_visible_slots(&mut self) {
        self.reloads += 1;
    }

    fn is_programmatic_layout_change_in_progress(&self) -> bool {
        false
    }
}

/// Keeps the warm set and queues image requests for later delivery.
#[derive(Debug, Default)]
struct MemoryCache {
    warm: HashSet<usize>,
    pending: Vec<(usize, ImageTicket)>,
}

impl ThumbnailCache for MemoryCache {
    fn start_caching(&mut self, indices: &BackingIndexSet, _: Size) {
        self.warm.extend(indices.iter());
    }

    fn stop_caching(&mut self, indices: &BackingIndexSet, _: Size) {
        for index in indices.iter() {
            self.warm.remove(&index);
        }
    }

    fn request_image(&mut self, backing_index: usize, _: Size, ticket: ImageTicket) {
        self.pending.push((backing_index, ticket));
    }
}

fn visible_slots(grid: &InfiniteGrid<VecStore<String>>, surface: &SimulatedSurface) -> (usize, usize) {
    let layout = grid.layout();
    let pitch = layout.row_pitch();
    let columns = layout.columns();
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Offsets are non-negative and bounded by the content height."
    )]
    let first_row = (surface.offset_y / pitch) as usize;
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Offsets are non-negative and bounded by the content height."
    )]
    let last_row = ((surface.offset_y + surface.viewport_height) / pitch) as usize;
    let end = ((last_row + 1) * columns).min(grid.slot_count());
    (first_row * columns, end)
}

/// Scrolls with an exponentially decaying velocity, one 16 ms frame at a time.
fn fling(
    grid: &mut InfiniteGrid<VecStore<String>>,
    surface: &mut SimulatedSurface,
    cache: &mut MemoryCache,
    mut velocity: f64,
) {
    let mut frames = 0;
    while velocity.abs() > 50.0 {
        let max_offset = (grid.content_height() - surface.viewport_height).max(0.0);
        surface.offset_y = (surface.offset_y + velocity * 0.016).clamp(0.0, max_offset);
        velocity *= 0.985;
        frames += 1;

        let event = ScrollEvent::new(
            surface.offset_y,
            surface.viewport_height,
            grid.content_height(),
        );
        let invalidation = grid.on_scroll(event, surface, cache);
        if !invalidation.is_empty() {
            tracing::info!(frame = frames, anchor = grid.anchor(), ?invalidation, "frame");
        }

        let (start, end) = visible_slots(grid, surface);
        for slot in start..end {
            grid.request_thumbnail(slot, cache);
        }
    }
}

/// Delivers every queued image, dropping those whose slot moved on.
fn deliver_images(grid: &InfiniteGrid<VecStore<String>>, cache: &mut MemoryCache) -> (usize, usize) {
    let mut shown = 0;
    let mut dropped = 0;
    for (_, ticket) in cache.pending.drain(..) {
        if grid.accept_image(ticket) {
            shown += 1;
        } else {
            dropped += 1;
        }
    }
    (shown, dropped)
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let photos: Vec<String> = (0..37).map(|i| format!("IMG_{i:04}.heic")).collect();
    let config = GridConfig::new()
        .with_preset(ThumbnailPreset::ExtraSmall)
        .with_scale(2.0)
        .with_precaching(true)
        .with_top_edge(TopEdge::Unbounded);
    let mut grid = InfiniteGrid::new(VecStore::from_vec(photos), config, 402.0);
    let mut surface = SimulatedSurface {
        offset_y: 0.0,
        viewport_height: 800.0,
        layout_passes: 0,
        reloads: 0,
    };
    let mut cache = MemoryCache::default();

    println!(
        "{} photos, {} slots of {} px, content height {}",
        grid.store().count(),
        grid.slot_count(),
        grid.layout().item_size(),
        grid.content_height(),
    );

    fling(&mut grid, &mut surface, &mut cache, 40_000.0);
    let (shown, dropped) = deliver_images(&grid, &mut cache);
    println!(
        "after fling down: anchor {}, offset {:.1}, {} warm, {shown} images shown, {dropped} stale",
        grid.anchor(),
        surface.offset_y,
        cache.warm.len(),
    );

    fling(&mut grid, &mut surface, &mut cache, -60_000.0);
    let (shown, dropped) = deliver_images(&grid, &mut cache);
    println!(
        "after fling up: anchor {}, offset {:.1}, {} warm, {shown} images shown, {dropped} stale",
        grid.anchor(),
        surface.offset_y,
        cache.warm.len(),
    );

    let (start, _) = visible_slots(&grid, &surface);
    if let Some(photo) = grid.item_for_slot(start) {
        println!("top left: {photo}");
        println!("{}", grid.debug_caption(start));
    }

    grid.apply_preset(ThumbnailPreset::Medium, &mut surface, &mut cache);
    grid.store_mut().push(String::from("IMG_0037.heic"));
    grid.process_store_changes(&mut surface, &mut cache);
    println!(
        "after relayout and import: {} columns, thumbnails at {:?}, {} layout passes, {} reloads",
        grid.layout().columns(),
        grid.thumbnail_size(),
        surface.layout_passes,
        surface.reloads,
    );
}
