// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Uniform square-cell grid geometry.
//!
//! A [`GridLayout`] is an immutable snapshot computed from the available width,
//! column count, spacings, and display scale. It converts between buffer slot
//! offsets (virtual index minus anchor) and vertical positions. The layout itself
//! never depends on the anchor; only [`GridLayout::first_item_offset_at`] takes
//! it as an input, to clamp how far back a reanchor may reach.
//!
//! Offsets are signed: a position above the realized buffer yields a negative
//! offset, which is exactly what the reanchoring logic looks for.

use core::num::NonZeroUsize;

use kurbo::{Rect, Size};

use crate::GridConfig;
use crate::util::{floor_f64, floor_to_i64, len_to_i64};

/// Floors `value` to the device pixel grid for the given `scale`.
///
/// With `scale == 2.0`, `10.3` floors to `10.0` and `10.7` floors to `10.5`.
/// Non-positive or non-finite scales floor to whole logical units.
#[must_use]
pub fn floor_to_device_pixels(value: f64, scale: f64) -> f64 {
    if scale.is_finite() && scale > 0.0 {
        floor_f64(value * scale) / scale
    } else {
        floor_f64(value)
    }
}

/// Geometry snapshot for a grid of uniform square items.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    available_width: f64,
    columns: NonZeroUsize,
    item_size: f64,
    column_spacing: f64,
    row_spacing: f64,
    scale: f64,
}

impl GridLayout {
    /// Computes the layout for `columns` square items across `available_width`.
    ///
    /// The item size is floored to the device pixel grid so that `columns`
    /// items plus `columns - 1` gaps never exceed `available_width`. A column
    /// count of zero is treated as one; negative or non-finite widths and
    /// spacings are treated as zero.
    #[must_use]
    pub fn new(
        available_width: f64,
        columns: usize,
        column_spacing: f64,
        row_spacing: f64,
        scale: f64,
    ) -> Self {
        let available_width = non_negative(available_width);
        let column_spacing = non_negative(column_spacing);
        let row_spacing = non_negative(row_spacing);
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        let columns = NonZeroUsize::new(columns).unwrap_or(NonZeroUsize::MIN);

        let column_count = columns.get() as f64;
        let usable = available_width - (column_count - 1.0) * column_spacing;
        let item_size = non_negative(floor_to_device_pixels(usable / column_count, scale));

        Self {
            available_width,
            columns,
            item_size,
            column_spacing,
            row_spacing,
            scale,
        }
    }

    /// Computes the layout for `available_width` using the columns, spacings
    /// and scale from `config`.
    #[must_use]
    pub fn from_config(available_width: f64, config: &GridConfig) -> Self {
        Self::new(
            available_width,
            config.columns(),
            config.column_spacing(),
            config.row_spacing(),
            config.scale(),
        )
    }

    /// The width this layout was computed for.
    #[must_use]
    pub const fn available_width(&self) -> f64 {
        self.available_width
    }

    /// Number of items per row.
    #[must_use]
    pub const fn columns(&self) -> usize {
        self.columns.get()
    }

    /// Side length of each square item.
    #[must_use]
    pub const fn item_size(&self) -> f64 {
        self.item_size
    }

    /// Horizontal gap between columns.
    #[must_use]
    pub const fn column_spacing(&self) -> f64 {
        self.column_spacing
    }

    /// Vertical gap between rows.
    #[must_use]
    pub const fn row_spacing(&self) -> f64 {
        self.row_spacing
    }

    /// Device pixels per logical unit.
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    /// Distance between the tops of two consecutive rows.
    #[must_use]
    pub fn row_pitch(&self) -> f64 {
        self.item_size + self.row_spacing
    }

    /// Row containing the slot at `offset`, rounding toward negative infinity.
    #[must_use]
    pub fn row_of(&self, offset: i64) -> i64 {
        offset.div_euclid(self.columns_i64())
    }

    /// Column of the slot at `offset`.
    #[must_use]
    #[allow(
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation,
        reason = "A Euclidean remainder lies in `0..columns`, which fits in usize."
    )]
    pub fn column_of(&self, offset: i64) -> usize {
        let column = offset.rem_euclid(self.columns_i64());
        debug_assert!((0..self.columns_i64()).contains(&column));
        column as usize
    }

    /// Vertical position of the top of the row containing the slot at `offset`.
    #[must_use]
    pub fn vertical_offset(&self, offset: i64) -> f64 {
        self.row_of(offset) as f64 * self.row_pitch()
    }

    /// Offset of the first slot in the row at vertical position `y`.
    ///
    /// The result is `floor(y / row_pitch) * columns`, clamped so that
    /// `anchor + offset` never drops below `min_virtual_index`. Pass `None` to
    /// disable the clamp. Positions above the buffer produce negative offsets.
    #[must_use]
    pub fn first_item_offset_at(&self, y: f64, anchor: i64, min_virtual_index: Option<i64>) -> i64 {
        let pitch = self.row_pitch();
        let row = if pitch > 0.0 {
            floor_to_i64(y / pitch)
        } else {
            0
        };
        let offset = row.saturating_mul(self.columns_i64());
        match min_virtual_index {
            Some(min) => offset.max(min.saturating_sub(anchor)),
            None => offset,
        }
    }

    /// Number of rows needed for `slot_count` slots.
    #[must_use]
    pub const fn rows_for(&self, slot_count: usize) -> usize {
        slot_count.div_ceil(self.columns.get())
    }

    /// Total height of `slot_count` slots, without trailing row spacing.
    #[must_use]
    pub fn content_height(&self, slot_count: usize) -> f64 {
        let rows = self.rows_for(slot_count);
        if rows == 0 {
            return 0.0;
        }
        rows as f64 * self.item_size + (rows - 1) as f64 * self.row_spacing
    }

    /// Frame of buffer slot `slot` in content coordinates.
    #[must_use]
    pub fn slot_frame(&self, slot: usize) -> Rect {
        let columns = self.columns.get();
        let x = (slot % columns) as f64 * (self.item_size + self.column_spacing);
        let y = (slot / columns) as f64 * self.row_pitch();
        Rect::new(x, y, x + self.item_size, y + self.item_size)
    }

    /// Pixel size thumbnails should be requested at: the item size in device pixels.
    #[must_use]
    pub fn thumbnail_size(&self) -> Size {
        let side = self.item_size * self.scale;
        Size::new(side, side)
    }

    fn columns_i64(&self) -> i64 {
        len_to_i64(self.columns.get())
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
