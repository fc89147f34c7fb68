//! Scan-line flood fill that grows a modified seed pixel into an object outline.
//!
//! Walks operate in absolute coordinates and cross zone boundaries transparently: every
//! pixel is looked up through the zone that contains it. A shortcut zone index is
//! threaded through the walks so the common case (the pixel is in the zone we were just
//! in) skips the linear zone scan. When a lookup lands in a different zone, the walk
//! re-resolves its shortcut for the new position.
//!
//! Horizontal probes tolerate gaps: a quiet pixel only ends a row when none of the
//! following `INTERSECTION_THRESHOLD` pixels is modified.

use crate::detect::pixel_cache::ProcessableZone;
use crate::detect::{INTERSECTION_THRESHOLD, SIGNIFICANT_AREA_TO_DETECT, SKIP_PIXELS};
use crate::error::LookupError;
use crate::frame::FrameStore;
use crate::geometry::{find_index_for_position, Bounds, Outline};

/// Result of looking a pixel up across all zones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelState {
    /// Modified, found in the shortcut zone.
    Modified,
    /// Unmodified, found in the shortcut zone.
    Unmodified,
    /// Modified, found in a zone other than the shortcut.
    ModifiedZoneChanged,
    /// Unmodified, found in a zone other than the shortcut.
    UnmodifiedZoneChanged,
    /// Not inside any zone.
    NotExisting,
}

impl PixelState {
    pub fn is_modified(self) -> bool {
        matches!(self, PixelState::Modified | PixelState::ModifiedZoneChanged)
    }

    pub fn is_existing(self) -> bool {
        self != PixelState::NotExisting
    }

    pub fn is_zone_changed(self) -> bool {
        matches!(
            self,
            PixelState::ModifiedZoneChanged | PixelState::UnmodifiedZoneChanged
        )
    }
}

pub struct OutlineFinder<'a> {
    zones: &'a mut [ProcessableZone],
    frames: &'a FrameStore,
    bounds: Outline,
}

impl<'a> OutlineFinder<'a> {
    /// `bounds` is the outer limit of every walk, normally the union of all captures.
    pub fn new(zones: &'a mut [ProcessableZone], frames: &'a FrameStore, bounds: Outline) -> Self {
        Self {
            zones,
            frames,
            bounds,
        }
    }

    /// Classify the pixel at absolute `(x, y)`, trying the `shortcut` zone first.
    pub fn pixel_state(&mut self, x: i32, y: i32, shortcut: Option<usize>) -> PixelState {
        let frames = self.frames;
        if let Some(zone) = shortcut.and_then(|index| self.zones.get_mut(index)) {
            if zone.contains(x, y) {
                let (rel_x, rel_y) = (x - zone.x(), y - zone.y());
                return if zone.is_modified(rel_x, rel_y, frames) {
                    PixelState::Modified
                } else {
                    PixelState::Unmodified
                };
            }
        }
        for zone in self.zones.iter_mut() {
            if zone.contains(x, y) {
                let (rel_x, rel_y) = (x - zone.x(), y - zone.y());
                return if zone.is_modified(rel_x, rel_y, frames) {
                    PixelState::ModifiedZoneChanged
                } else {
                    PixelState::UnmodifiedZoneChanged
                };
            }
        }
        PixelState::NotExisting
    }

    /// First quiet pixel at or right of `start_x` with no modified pixel within
    /// `INTERSECTION_THRESHOLD` to its right. `start_x` if there is none.
    pub fn walk_right(&mut self, start_x: i32, y: i32, shortcut: Option<usize>) -> i32 {
        let end = self.bounds.end_x();
        let mut x = start_x;
        'candidates: while x <= end {
            if !self.is_quiet(x, y, shortcut) {
                x += 1;
                continue;
            }
            let look_end = (x + INTERSECTION_THRESHOLD).min(end);
            for probe in x + 1..=look_end {
                if self.pixel_state(probe, y, shortcut).is_modified() {
                    // Every candidate before `probe` has it inside its window too.
                    x = probe + 1;
                    continue 'candidates;
                }
            }
            return x;
        }
        start_x
    }

    /// Mirror of `walk_right`.
    pub fn walk_left(&mut self, start_x: i32, y: i32, shortcut: Option<usize>) -> i32 {
        let start = self.bounds.x();
        let mut x = start_x;
        'candidates: while x >= start {
            if !self.is_quiet(x, y, shortcut) {
                x -= 1;
                continue;
            }
            let look_end = (x - INTERSECTION_THRESHOLD).max(start);
            for probe in (look_end..x).rev() {
                if self.pixel_state(probe, y, shortcut).is_modified() {
                    x = probe - 1;
                    continue 'candidates;
                }
            }
            return x;
        }
        start_x
    }

    /// Sweep from the seed row towards larger `y`.
    pub fn walk_down(
        &mut self,
        x: i32,
        y: i32,
        shortcut: Option<usize>,
    ) -> Result<Outline, LookupError> {
        self.walk_vertical(x, y, shortcut, 1)
    }

    /// Sweep from the seed row towards smaller `y`.
    pub fn walk_up(
        &mut self,
        x: i32,
        y: i32,
        shortcut: Option<usize>,
    ) -> Result<Outline, LookupError> {
        self.walk_vertical(x, y, shortcut, -1)
    }

    /// Bounding box of the connected modified region around `(x, y)`.
    pub fn find_object_bounds(
        &mut self,
        x: i32,
        y: i32,
        shortcut: Option<usize>,
    ) -> Result<Outline, LookupError> {
        let lower = self.walk_down(x, y, shortcut)?;
        let upper = self.walk_up(x, y, shortcut)?;
        Ok(crate::geometry::compose(&lower, &upper))
    }

    /// Probe a `SKIP_PIXELS` grid in every zone and grow each modified seed.
    ///
    /// Outlines smaller than `SIGNIFICANT_AREA_TO_DETECT` are dropped. Results are not
    /// merged; overlapping duplicates are expected.
    pub fn find_candidates(&mut self) -> Result<Vec<Outline>, LookupError> {
        let mut found = Vec::new();
        for index in 0..self.zones.len() {
            let zone = self.zones[index].outline();
            for x in (zone.x()..=zone.end_x()).step_by(SKIP_PIXELS) {
                for y in (zone.y()..=zone.end_y()).step_by(SKIP_PIXELS) {
                    if !self.pixel_state(x, y, Some(index)).is_modified() {
                        continue;
                    }
                    let outline = self.find_object_bounds(x, y, Some(index))?;
                    if outline.area() >= SIGNIFICANT_AREA_TO_DETECT {
                        found.push(outline);
                    }
                }
            }
        }
        Ok(found)
    }

    fn is_quiet(&mut self, x: i32, y: i32, shortcut: Option<usize>) -> bool {
        let state = self.pixel_state(x, y, shortcut);
        state.is_existing() && !state.is_modified()
    }

    fn walk_vertical(
        &mut self,
        mut x: i32,
        start_y: i32,
        mut shortcut: Option<usize>,
        step: i32,
    ) -> Result<Outline, LookupError> {
        let (mut min_x, mut max_x) = (x, x);
        let (mut last_min_x, mut last_max_x) = (x, x);
        let (mut min_y, mut max_y) = (start_y, start_y);

        let mut y = start_y;
        while y >= self.bounds.y() && y <= self.bounds.end_y() {
            let state = self.pixel_state(x, y, shortcut);
            if state.is_zone_changed() {
                shortcut = Some(find_index_for_position(x, y, &*self.zones)?);
            }
            if !state.is_existing() {
                break;
            }
            if !state.is_modified() {
                // The tracked column went quiet; look for the object elsewhere on this
                // row, within the span the previous row covered.
                match self.correct_x(x, y, last_min_x, last_max_x, shortcut) {
                    Some(corrected) => x = corrected,
                    None => break,
                }
            }
            last_min_x = self.walk_left(x, y, shortcut);
            last_max_x = self.walk_right(x, y, shortcut);
            min_x = min_x.min(last_min_x);
            max_x = max_x.max(last_max_x);
            if step > 0 {
                max_y = y;
            } else {
                min_y = y;
            }
            y += step;
        }
        Ok(Outline::from_corners(min_x, min_y, max_x, max_y))
    }

    fn correct_x(
        &mut self,
        x: i32,
        y: i32,
        span_start: i32,
        span_end: i32,
        shortcut: Option<usize>,
    ) -> Option<i32> {
        (span_start..=span_end)
            .filter(|&candidate| candidate != x)
            .find(|&candidate| self.pixel_state(candidate, y, shortcut).is_modified())
    }
}
