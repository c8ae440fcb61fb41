//! Fixed arena and block-grid configuration
//!
//! Consumed once at initialization. The defaults match the 600x400 canvas
//! and 5x8 grid all four variants share; tests can shrink the grid.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Canvas width in px
    pub width: f32,
    /// Canvas height in px
    pub height: f32,

    pub paddle_width: f32,
    pub paddle_height: f32,
    /// Distance from the canvas bottom to the paddle's top edge
    pub paddle_offset_bottom: f32,

    pub ball_radius: f32,

    pub rows: u32,
    pub cols: u32,
    pub block_width: f32,
    pub block_height: f32,
    pub block_padding: f32,
    pub offset_top: f32,
    pub offset_left: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 400.0,
            paddle_width: 100.0,
            paddle_height: 10.0,
            paddle_offset_bottom: 30.0,
            ball_radius: 8.0,
            rows: 5,
            cols: 8,
            block_width: 70.0,
            block_height: 20.0,
            block_padding: 5.0,
            offset_top: 50.0,
            offset_left: 35.0,
        }
    }
}

impl ArenaConfig {
    /// Top edge of the paddle
    pub fn paddle_y(&self) -> f32 {
        self.height - self.paddle_offset_bottom
    }

    /// Top-left corner of the grid cell at (row, col)
    pub fn cell_origin(&self, row: u32, col: u32) -> (f32, f32) {
        (
            col as f32 * (self.block_width + self.block_padding) + self.offset_left,
            row as f32 * (self.block_height + self.block_padding) + self.offset_top,
        )
    }

    /// Total number of grid cells
    pub fn cell_count(&self) -> usize {
        (self.rows * self.cols) as usize
    }
}
