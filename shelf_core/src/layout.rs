//! Grid placement for shelf items. Items are addressed by flat index; the
//! single-row layout fills left to right and the multi-row layout fills
//! column-major, so vertically adjacent items always share a column.

use glam::Vec3;
use serde::Serialize;

use crate::config::{CoverAtlas, LayoutProfile};

/// World-space size of one cover box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoxDimensions {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl BoxDimensions {
    pub fn for_profile(atlas: &CoverAtlas, item_width: f32, profile: &LayoutProfile) -> Self {
        let width = item_width * profile.scale;
        Self {
            width,
            height: width / atlas.aspect_ratio(),
            depth: width * atlas.depth_ratio(),
        }
    }

    pub fn half_extents(&self) -> Vec3 {
        Vec3::new(self.width, self.height, self.depth) * 0.5
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GridCell {
    pub row: u32,
    pub col: u32,
}

/// Decode a flat index into its cell under the layout's fill order.
pub fn cell_for_index(index: usize, rows: u32) -> GridCell {
    let rows = rows.max(1) as usize;
    if rows == 1 {
        GridCell {
            row: 0,
            col: index as u32,
        }
    } else {
        GridCell {
            row: (index % rows) as u32,
            col: (index / rows) as u32,
        }
    }
}

/// Inverse of [`cell_for_index`].
pub fn index_for_cell(cell: GridCell, rows: u32) -> usize {
    let rows = rows.max(1) as usize;
    cell.col as usize * rows + cell.row as usize
}

pub fn column_count(item_count: usize, rows: u32) -> u32 {
    item_count.div_ceil(rows.max(1) as usize) as u32
}

/// Legal range of the horizontal pan target.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PanBounds {
    pub min: f32,
    pub max: f32,
}

impl PanBounds {
    pub const ZERO: PanBounds = PanBounds { min: 0.0, max: 0.0 };

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn span(&self) -> f32 {
        self.max - self.min
    }
}

/// Resolved placement of every item for one (count, profile, size) triple.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridLayout {
    pub item_count: usize,
    pub rows: u32,
    pub cols: u32,
    pub dimensions: BoxDimensions,
    pub step_x: f32,
    pub step_y: f32,
    pub pad_left: f32,
    pub pad_right: f32,
    pub bounds: PanBounds,
}

impl GridLayout {
    pub fn resolve(item_count: usize, profile: &LayoutProfile, dimensions: BoxDimensions) -> Self {
        let rows = profile.rows.max(1);
        let cols = column_count(item_count, rows);
        let step_x = dimensions.width * (1.0 + profile.gap_x);
        let step_y = dimensions.height * (1.0 + profile.gap_y);
        let pad_left = dimensions.width * profile.pad_left;
        let pad_right = dimensions.width * profile.pad_right;

        // A single column cannot move; an empty grid has nothing to move.
        let bounds = if cols <= 1 {
            PanBounds::ZERO
        } else {
            let half_span = (cols - 1) as f32 * 0.5 * step_x;
            PanBounds {
                min: -half_span - pad_left,
                max: half_span + pad_right,
            }
        };

        Self {
            item_count,
            rows,
            cols,
            dimensions,
            step_x,
            step_y,
            pad_left,
            pad_right,
            bounds,
        }
    }

    pub fn cell(&self, index: usize) -> GridCell {
        cell_for_index(index, self.rows)
    }

    /// Flat index of `cell`, or `None` when the cell lies outside the
    /// populated part of the grid.
    pub fn index_of(&self, cell: GridCell) -> Option<usize> {
        if cell.row >= self.rows || cell.col >= self.cols {
            return None;
        }
        let index = index_for_cell(cell, self.rows);
        (index < self.item_count).then_some(index)
    }

    /// Rows that actually hold items; a grid shorter than its row count is
    /// centred on what it has.
    pub fn occupied_rows(&self) -> u32 {
        self.rows.min(self.item_count.max(1) as u32)
    }

    pub fn position(&self, index: usize) -> Vec3 {
        let cell = self.cell(index);
        let col_center = (self.cols.max(1) - 1) as f32 * 0.5;
        let row_center = (self.occupied_rows() - 1) as f32 * 0.5;
        let pad_asymmetry = (self.pad_left - self.pad_right) * 0.5;
        Vec3::new(
            (cell.col as f32 - col_center) * self.step_x + pad_asymmetry,
            (row_center - cell.row as f32) * self.step_y,
            0.0,
        )
    }

    pub fn grid_width(&self) -> f32 {
        if self.cols == 0 {
            return 0.0;
        }
        (self.cols - 1) as f32 * self.step_x + self.dimensions.width
    }

    pub fn grid_height(&self) -> f32 {
        (self.occupied_rows() - 1) as f32 * self.step_y + self.dimensions.height
    }
}
