//! Per-zone memo of which pixels differ between the reference and live frame.
//!
//! A pixel is classified at most once per iteration. The first request samples both
//! frames and runs the colour-distance test; later requests are answered from the cache
//! until `reset()` marks every cell unset again.

use std::sync::Arc;

use crate::frame::FrameStore;
use crate::geometry::Bounds;
use crate::model::{Capture, Zone, ZoneId};

/// Colour distance above which a pixel counts as modified. Fixed for compatibility.
pub const SIGNIFICANT_COLOR_DISTANCE: f64 = 150.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PixelCell {
    Unset,
    Modified,
    Unmodified,
}

/// Weighted RGB distance between two packed pixels.
///
/// Red-mean weighting: red differences weigh more as the mean red level rises, blue
/// differences less. Intermediate products use integer arithmetic with arithmetic right
/// shifts so results match the reference formula bit for bit.
pub fn color_distance(source: u32, current: u32) -> f64 {
    let (sr, sg, sb) = channels(source);
    let (cr, cg, cb) = channels(current);
    let r_mean = (sr + cr) / 2;
    let r = sr - cr;
    let g = sg - cg;
    let b = sb - cb;
    let weighted = (((512 + r_mean) * r * r) >> 8) + 4 * g * g + (((767 - r_mean) * b * b) >> 8);
    (weighted as f64).sqrt()
}

pub fn is_significant_change(source: u32, current: u32) -> bool {
    color_distance(source, current) > SIGNIFICANT_COLOR_DISTANCE
}

fn channels(pixel: u32) -> (i32, i32, i32) {
    (
        ((pixel >> 16) & 0xff) as i32,
        ((pixel >> 8) & 0xff) as i32,
        (pixel & 0xff) as i32,
    )
}

/// A zone plus its classification cache.
pub struct ProcessableZone {
    zone: Zone,
    cells: Vec<PixelCell>,
}

impl ProcessableZone {
    pub fn new(zone: Zone) -> Self {
        let cells = vec![PixelCell::Unset; zone.area() as usize];
        Self { zone, cells }
    }

    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    pub fn id(&self) -> ZoneId {
        self.zone.id
    }

    pub fn capture(&self) -> &Arc<Capture> {
        self.zone.capture()
    }

    /// Whether the pixel at zone-relative `(rel_x, rel_y)` differs from the reference.
    pub fn is_modified(&mut self, rel_x: i32, rel_y: i32, frames: &FrameStore) -> bool {
        let index = self.index(rel_x, rel_y);
        match self.cells[index] {
            PixelCell::Modified => true,
            PixelCell::Unmodified => false,
            PixelCell::Unset => {
                let modified = self.classify(rel_x, rel_y, frames);
                self.cells[index] = if modified {
                    PixelCell::Modified
                } else {
                    PixelCell::Unmodified
                };
                modified
            }
        }
    }

    /// Cached state without triggering classification.
    pub fn cached(&self, rel_x: i32, rel_y: i32) -> PixelCell {
        self.cells[self.index(rel_x, rel_y)]
    }

    /// Forget every classification. Keeps the allocation.
    pub fn reset(&mut self) {
        self.cells.fill(PixelCell::Unset);
    }

    fn index(&self, rel_x: i32, rel_y: i32) -> usize {
        debug_assert!(rel_x >= 0 && rel_x < self.zone.width());
        debug_assert!(rel_y >= 0 && rel_y < self.zone.height());
        (rel_x + rel_y * self.zone.width()) as usize
    }

    fn classify(&self, rel_x: i32, rel_y: i32, frames: &FrameStore) -> bool {
        let x = (self.zone.offset_x() + rel_x) as u32;
        let y = (self.zone.offset_y() + rel_y) as u32;
        let (reference, live) = frames.pair(self.zone.capture());
        let source = reference.map_or(0, |frame| frame.get_pixel(x, y));
        let current = live.map_or(0, |frame| frame.get_pixel(x, y));
        is_significant_change(source, current)
    }
}

impl Bounds for ProcessableZone {
    fn x(&self) -> i32 {
        self.zone.x()
    }

    fn y(&self) -> i32 {
        self.zone.y()
    }

    fn width(&self) -> i32 {
        self.zone.width()
    }

    fn height(&self) -> i32 {
        self.zone.height()
    }
}
