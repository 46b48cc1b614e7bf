// Copyright 2024 the rtls-capture contributors
// SPDX-License-Identifier: MPL-2.0

//! Positions from ranges to three fixed anchors, the way a tag works out
//! where it is before sending.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use log::debug;

use crate::error::{Error, Result};
use crate::incoming_message_parser::Sample;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub x: f64,
    pub y: f64,
}

impl Anchor {
    pub const fn new(x: f64, y: f64) -> Anchor {
        return Anchor { x: x, y: y };
    }
}

/// Where the anchors of the test hall stand.
pub const DEFAULT_ANCHORS: [Anchor; 3] = [
    Anchor::new(2.0, 1.0),
    Anchor::new(3.0, 6.0),
    Anchor::new(7.0, 4.0),
];

/// Distance from the tag to each anchor, in anchor order.
pub type Ranges = [f64; 3];

/// Intersects the three range circles.
///
/// Subtracting the circle equations pairwise leaves two linear equations
/// in x and y. Returns `None` when a range isn't positive yet, or when the
/// anchors are collinear and the system has no single solution.
pub fn trilaterate(anchors: &[Anchor; 3], ranges: &Ranges) -> Option<Sample> {
    if ranges.iter().any(|range| !range.is_finite() || *range <= 0.0) {
        return None;
    }
    let [a1, a2, a3] = anchors;
    let [r1, r2, r3] = ranges;

    let a = 2.0 * (a2.x - a1.x);
    let b = 2.0 * (a2.y - a1.y);
    let c = r1.powi(2) - r2.powi(2) - a1.x.powi(2) + a2.x.powi(2) - a1.y.powi(2) + a2.y.powi(2);
    let d = 2.0 * (a3.x - a2.x);
    let e = 2.0 * (a3.y - a2.y);
    let f = r2.powi(2) - r3.powi(2) - a2.x.powi(2) + a3.x.powi(2) - a2.y.powi(2) + a3.y.powi(2);

    let determinant = a * e - b * d;
    if determinant.abs() < f64::EPSILON {
        return None;
    }

    let x = (c * e - f * b) / determinant;
    let y = (a * f - d * c) / determinant;
    return Some(Sample::new(x, y));
}

/// Reads one set of ranges per line: `<r1> <r2> <r3>`.
pub fn read_ranges<R: BufRead>(reader: R) -> Result<Vec<Ranges>> {
    let mut all = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        if tokens.len() != 3 {
            return Err(Error::MalformedLog {
                line: line_number,
                token: line.trim().to_string(),
            });
        }

        let mut ranges = [0.0; 3];
        for (slot, token) in ranges.iter_mut().zip(&tokens) {
            *slot = token.parse().map_err(|_| Error::MalformedLog {
                line: line_number,
                token: token.to_string(),
            })?;
        }
        all.push(ranges);
    }
    return Ok(all);
}

pub fn read_ranges_from(path: &Path) -> Result<Vec<Ranges>> {
    let file = File::open(path)?;
    return read_ranges(BufReader::new(file));
}

/// Positions for every set of ranges that has one.
pub fn locate_all(anchors: &[Anchor; 3], all: &[Ranges]) -> Vec<Sample> {
    let mut samples = Vec::with_capacity(all.len());
    for (index, ranges) in all.iter().enumerate() {
        match trilaterate(anchors, ranges) {
            Some(sample) => samples.push(sample),
            None => debug!("No position for ranges {index}: {ranges:?}"),
        }
    }
    return samples;
}
