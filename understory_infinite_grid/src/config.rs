// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Configuration for an [`InfiniteGrid`](crate::InfiniteGrid) session.

/// Default number of rendering slots materialized by the surface.
pub const DEFAULT_BUFFER_LENGTH: usize = 300;

/// Default number of columns.
pub const DEFAULT_COLUMNS: usize = 3;

/// Default spacing between columns and between rows, in logical units.
pub const DEFAULT_SPACING: f64 = 2.0;

/// How the grid behaves when scrolling toward the start of the virtual index space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TopEdge {
    /// The anchor never moves below virtual index 0, so the first item of the
    /// collection is a hard top edge.
    #[default]
    Bounded,
    /// No lower bound: the grid wraps upward forever, resolving negative
    /// virtual indices to the end of the collection.
    Unbounded,
}

impl TopEdge {
    /// Smallest virtual index the anchor may reach, if any.
    #[must_use]
    pub const fn min_virtual_index(self) -> Option<i64> {
        match self {
            Self::Bounded => Some(0),
            Self::Unbounded => None,
        }
    }
}

/// Thumbnail size presets, expressed as column counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ThumbnailPreset {
    /// Four columns.
    ExtraSmall,
    /// Three columns.
    Small,
    /// Two columns.
    Medium,
    /// One column.
    Large,
}

impl ThumbnailPreset {
    /// All presets, smallest thumbnails first.
    pub const ALL: [Self; 4] = [Self::ExtraSmall, Self::Small, Self::Medium, Self::Large];

    /// Number of grid columns for this preset.
    #[must_use]
    pub const fn columns(self) -> usize {
        match self {
            Self::ExtraSmall => 4,
            Self::Small => 3,
            Self::Medium => 2,
            Self::Large => 1,
        }
    }

    /// The preset matching `columns` exactly, if there is one.
    #[must_use]
    pub fn from_columns(columns: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.columns() == columns)
    }
}

/// Session configuration for an infinite grid.
///
/// Setters clamp invalid values instead of failing: column count and buffer
/// length are at least 1, spacings are non-negative, and a non-positive or
/// non-finite scale falls back to `1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GridConfig {
    columns: usize,
    buffer_length: usize,
    column_spacing: f64,
    row_spacing: f64,
    scale: f64,
    precaching: bool,
    top_edge: TopEdge,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            buffer_length: DEFAULT_BUFFER_LENGTH,
            column_spacing: DEFAULT_SPACING,
            row_spacing: DEFAULT_SPACING,
            scale: 1.0,
            precaching: false,
            top_edge: TopEdge::Bounded,
        }
    }
}

impl GridConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of columns, clamped to at least 1.
    #[must_use]
    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = columns.max(1);
        self
    }

    /// Sets the column count from a [`ThumbnailPreset`].
    #[must_use]
    pub fn with_preset(self, preset: ThumbnailPreset) -> Self {
        self.with_columns(preset.columns())
    }

    /// Sets the number of rendering slots, clamped to at least 1.
    ///
    /// The buffer must be tall enough that one scroll gesture never crosses
    /// more than one dead zone; a few viewports worth of rows is typical.
    #[must_use]
    pub fn with_buffer_length(mut self, buffer_length: usize) -> Self {
        self.buffer_length = buffer_length.max(1);
        self
    }

    /// Sets both column and row spacing.
    #[must_use]
    pub fn with_spacing(self, spacing: f64) -> Self {
        self.with_column_spacing(spacing).with_row_spacing(spacing)
    }

    /// Sets the horizontal gap between columns.
    #[must_use]
    pub fn with_column_spacing(mut self, spacing: f64) -> Self {
        self.column_spacing = clamp_spacing(spacing);
        self
    }

    /// Sets the vertical gap between rows.
    #[must_use]
    pub fn with_row_spacing(mut self, spacing: f64) -> Self {
        self.row_spacing = clamp_spacing(spacing);
        self
    }

    /// Sets the number of device pixels per logical unit.
    #[must_use]
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = clamp_scale(scale);
        self
    }

    /// Enables or disables thumbnail precaching for the buffer window.
    #[must_use]
    pub fn with_precaching(mut self, precaching: bool) -> Self {
        self.precaching = precaching;
        self
    }

    /// Sets the top edge policy.
    #[must_use]
    pub fn with_top_edge(mut self, top_edge: TopEdge) -> Self {
        self.top_edge = top_edge;
        self
    }

    /// Number of columns (always at least 1).
    #[must_use]
    pub fn columns(&self) -> usize {
        // Deserialized configs bypass the clamping setters.
        self.columns.max(1)
    }

    /// Number of rendering slots (always at least 1).
    #[must_use]
    pub fn buffer_length(&self) -> usize {
        // Deserialized configs bypass the clamping setters.
        self.buffer_length.max(1)
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

    /// Whether thumbnails for the buffer window are precached.
    #[must_use]
    pub const fn precaching(&self) -> bool {
        self.precaching
    }

    /// The top edge policy.
    #[must_use]
    pub const fn top_edge(&self) -> TopEdge {
        self.top_edge
    }

    pub(crate) fn set_columns(&mut self, columns: usize) {
        self.columns = columns.max(1);
    }

    pub(crate) fn set_scale(&mut self, scale: f64) {
        self.scale = clamp_scale(scale);
    }

    pub(crate) fn set_precaching(&mut self, precaching: bool) {
        self.precaching = precaching;
    }
}

fn clamp_spacing(spacing: f64) -> f64 {
    if spacing.is_finite() && spacing > 0.0 {
        spacing
    } else {
        0.0
    }
}

fn clamp_scale(scale: f64) -> f64 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_BUFFER_LENGTH, GridConfig, ThumbnailPreset, TopEdge};

    #[test]
    fn defaults() {
        let config = GridConfig::default();
        assert_eq!(config.columns(), 3);
        assert_eq!(config.buffer_length(), DEFAULT_BUFFER_LENGTH);
        assert_eq!(config.column_spacing(), 2.0);
        assert_eq!(config.row_spacing(), 2.0);
        assert_eq!(config.scale(), 1.0);
        assert!(!config.precaching());
        assert_eq!(config.top_edge(), TopEdge::Bounded);
    }

    #[test]
    fn invalid_values_are_clamped() {
        let config = GridConfig::new()
            .with_columns(0)
            .with_buffer_length(0)
            .with_spacing(-4.0)
            .with_scale(f64::NAN);
        assert_eq!(config.columns(), 1);
        assert_eq!(config.buffer_length(), 1);
        assert_eq!(config.column_spacing(), 0.0);
        assert_eq!(config.row_spacing(), 0.0);
        assert_eq!(config.scale(), 1.0);
    }

    #[test]
    fn zero_fields_read_back_clamped() {
        let config = GridConfig {
            columns: 0,
            buffer_length: 0,
            ..GridConfig::default()
        };
        assert_eq!(config.columns(), 1);
        assert_eq!(config.buffer_length(), 1);
    }

    #[test]
    fn presets_map_to_columns() {
        assert_eq!(ThumbnailPreset::ExtraSmall.columns(), 4);
        assert_eq!(ThumbnailPreset::Large.columns(), 1);
        assert_eq!(
            ThumbnailPreset::from_columns(2),
            Some(ThumbnailPreset::Medium)
        );
        assert_eq!(ThumbnailPreset::from_columns(7), None);
        let config = GridConfig::new().with_preset(ThumbnailPreset::ExtraSmall);
        assert_eq!(config.columns(), 4);
    }

    #[test]
    fn top_edge_bounds() {
        assert_eq!(TopEdge::Bounded.min_virtual_index(), Some(0));
        assert_eq!(TopEdge::Unbounded.min_virtual_index(), None);
    }
}
