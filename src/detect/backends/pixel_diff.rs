//! Portable detector built on reference/live colour differences.

use anyhow::Result;
use image::RgbImage;

use crate::detect::backend::DetectorBackend;
use crate::detect::outline_finder::OutlineFinder;
use crate::detect::pixel_cache::ProcessableZone;
use crate::detect::resolve::{merge_outlines, resolve_occupied_zones};
use crate::detect::result::DetectionResult;
use crate::detect::processable_zones;
use crate::frame::FrameStore;
use crate::geometry::{Bounds, Outline};
use crate::model::{ZoneId, ZoneLayout};
use crate::render::render_diagnostic;

pub struct PixelDiffBackend {
    zones: Vec<ProcessableZone>,
    bounds: Outline,
    last: DetectionResult,
}

impl PixelDiffBackend {
    pub const NAME: &'static str = "pixel-diff";

    pub fn new(layout: &ZoneLayout) -> Self {
        Self {
            zones: processable_zones(layout),
            bounds: layout.bounds(),
            last: DetectionResult::default(),
        }
    }

    /// Outcome of the most recent `detect`.
    pub fn last_result(&self) -> &DetectionResult {
        &self.last
    }

    pub fn zones(&self) -> &[ProcessableZone] {
        &self.zones
    }
}

impl DetectorBackend for PixelDiffBackend {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn detect(&mut self, frames: &FrameStore) -> Result<DetectionResult> {
        for zone in &mut self.zones {
            zone.reset();
        }
        let candidates = OutlineFinder::new(&mut self.zones, frames, self.bounds).find_candidates()?;
        let candidate_count = candidates.len();
        let objects = merge_outlines(candidates);
        let occupied = resolve_occupied_zones(self.zones.iter().map(ProcessableZone::zone), &objects);
        log::debug!(
            "{} candidates merged into {} objects, occupied zones {:?}",
            candidate_count,
            objects.len(),
            occupied
        );
        self.last = DetectionResult { objects, occupied };
        Ok(self.last.clone())
    }

    fn render(&mut self, frames: &FrameStore) -> RgbImage {
        let marks: Vec<(ZoneId, Outline)> = self
            .zones
            .iter()
            .map(|zone| (zone.id(), zone.outline()))
            .collect();
        let last = &self.last;
        let mut finder = OutlineFinder::new(&mut self.zones, frames, self.bounds);
        render_diagnostic(self.bounds, &marks, &last.occupied, &last.objects, |x, y| {
            finder.pixel_state(x, y, None).is_modified()
        })
    }
}
