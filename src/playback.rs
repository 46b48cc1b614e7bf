// Copyright 2024 the rtls-capture contributors
// SPDX-License-Identifier: MPL-2.0

use crate::error::{Error, Result};
use crate::incoming_message_parser::Sample;

/// The floor plan's extent in log units. The origin is its bottom left
/// corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloorPlan {
    width: f64,
    height: f64,
}

impl FloorPlan {
    pub fn new(width: f64, height: f64) -> Result<FloorPlan> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(Error::Config(format!(
                "floor plan must have a positive size, got {width} x {height}"
            )));
        }
        return Ok(FloorPlan {
            width: width,
            height: height,
        });
    }

    pub fn width(&self) -> f64 {
        return self.width;
    }

    pub fn height(&self) -> f64 {
        return self.height;
    }

    pub fn contains(&self, sample: &Sample) -> bool {
        return (0.0..=self.width).contains(&sample.x) && (0.0..=self.height).contains(&sample.y);
    }
}

impl Default for FloorPlan {
    /// The hall the capture tool was built for, 441 x 445 pixels at 3
    /// units per pixel.
    fn default() -> Self {
        FloorPlan {
            width: 441.0 * 3.0,
            height: 445.0 * 3.0,
        }
    }
}

/// One playback tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub index: usize,
    /// First sample of the log, drawn on every frame.
    pub anchor: Sample,
    pub marker: Sample,
}

/// Steps through a log's samples one frame at a time.
pub struct Playback<'a> {
    samples: &'a [Sample],
    next: usize,
}

impl<'a> Playback<'a> {
    pub fn new(samples: &'a [Sample]) -> Playback<'a> {
        return Playback {
            samples: samples,
            next: 0,
        };
    }
}

impl<'a> Iterator for Playback<'a> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        let anchor = *self.samples.first()?;
        let marker = *self.samples.get(self.next)?;
        let frame = Frame {
            index: self.next,
            anchor: anchor,
            marker: marker,
        };
        self.next += 1;
        return Some(frame);
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.samples.len().saturating_sub(self.next);
        return (left, Some(left));
    }
}

pub const ANCHOR_GLYPH: char = 'o';
pub const MARKER_GLYPH: char = '*';
const FLOOR_GLYPH: char = '.';

/// Maps a sample onto a grid cell, Y up. Samples off the plan are pinned
/// to its edge; the flag says whether that happened.
pub fn grid_cell(
    sample: &Sample,
    plan: &FloorPlan,
    columns: usize,
    rows: usize,
) -> (usize, usize, bool) {
    let inside = plan.contains(sample);
    let fx = (sample.x / plan.width()).clamp(0.0, 1.0);
    let fy = (sample.y / plan.height()).clamp(0.0, 1.0);

    let max_column = columns.saturating_sub(1);
    let max_row = rows.saturating_sub(1);
    let column = (fx * max_column as f64).round() as usize;
    let row = max_row - (fy * max_row as f64).round() as usize;
    return (column, row, inside);
}

/// Draws a frame as `rows` lines of `columns` characters. The marker is
/// drawn over the anchor when they share a cell.
pub fn render(frame: &Frame, plan: &FloorPlan, columns: usize, rows: usize) -> String {
    if columns == 0 || rows == 0 {
        return String::new();
    }
    let mut grid = vec![vec![FLOOR_GLYPH; columns]; rows];

    let (column, row, _) = grid_cell(&frame.anchor, plan, columns, rows);
    grid[row][column] = ANCHOR_GLYPH;
    let (column, row, _) = grid_cell(&frame.marker, plan, columns, rows);
    grid[row][column] = MARKER_GLYPH;

    let mut text = String::with_capacity((columns + 1) * rows);
    for line in grid {
        text.extend(line);
        text.push('\n');
    }
    return text;
}
