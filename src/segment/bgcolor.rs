//! Background color estimation from the page edges.
//!
//! The raw modal color is brittle on JPEG-noisy scans, so colors are first
//! grouped into coarse bins and the modal bin is selected; the returned color
//! is the most frequent exact color inside that bin.

use std::collections::BTreeMap;

use crate::image::{Pixel, Pixmap};
use crate::utils::error::{ComicError, Result};

/// Width in pixels of the sampled edge strips.
pub const DEFAULT_EDGE_WIDTH: u32 = 2;

/// Per-channel bin size used when grouping near-identical colors.
const COLOR_BIN_SIZE: i32 = 10;

/// Rounds one channel to the nearest multiple of [`COLOR_BIN_SIZE`], with a
/// remainder of half the bin rounding up, clamped to the 8-bit range.
fn round_channel(value: u8) -> u8 {
    let value = i32::from(value);
    let remainder = value % COLOR_BIN_SIZE;
    let rounded = if remainder >= COLOR_BIN_SIZE / 2 {
        value + (COLOR_BIN_SIZE - remainder)
    } else {
        value - remainder
    };
    rounded.clamp(0, 255) as u8
}

fn round_color((r, g, b): (u8, u8, u8)) -> (u8, u8, u8) {
    (round_channel(r), round_channel(g), round_channel(b))
}

/// Returns the dominant pixel color on the union of the left and right edge
/// strips of `image`, `edge_width` pixels wide (clamped to the image size).
///
/// Histogram entries are walked in ascending color order while grouping runs
/// that round to the same coarse bin; the group with the largest accumulated
/// count wins (earlier group on ties), and within it the color with the
/// highest individual count (earlier color on ties).
///
/// Fails with `InvalidInput` for a zero-area image.
pub fn most_common_edge_color(image: &Pixmap, edge_width: u32) -> Result<Pixel> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ComicError::InvalidInput(
            "cannot estimate background of a zero-area image".to_string(),
        ));
    }
    let edge = edge_width.min(width).min(height);
    if edge == 0 {
        return Err(ComicError::InvalidInput(
            "edge strip width must be nonzero".to_string(),
        ));
    }

    let mut histogram: BTreeMap<(u8, u8, u8), u64> = BTreeMap::new();
    for y in 0..height {
        for x in (0..edge).chain(width - edge..width) {
            let p = image.get(x, y);
            *histogram.entry((p.r, p.g, p.b)).or_insert(0) += 1;
        }
    }

    // One pass over the ascending color order: runs rounding to the same bin
    // form a group; remember the group with the largest total count.
    let mut group_bin = None;
    let mut group: Vec<((u8, u8, u8), u64)> = Vec::new();
    let mut group_count = 0u64;
    let mut prominent: Vec<((u8, u8, u8), u64)> = Vec::new();
    let mut prominent_count = 0u64;
    for (&color, &count) in &histogram {
        let bin = round_color(color);
        if group_bin == Some(bin) {
            group.push((color, count));
            group_count += count;
        } else {
            if group_count > prominent_count {
                prominent = std::mem::take(&mut group);
                prominent_count = group_count;
            }
            group_bin = Some(bin);
            group = vec![(color, count)];
            group_count = count;
        }
    }
    if group_count > prominent_count {
        prominent = group;
    }

    let mut best = prominent[0];
    for &entry in &prominent[1..] {
        if entry.1 > best.1 {
            best = entry;
        }
    }
    Ok(Pixel::new(best.0 .0, best.0 .1, best.0 .2))
}
