//! Pixel-difference object detection.
//!
//! A run's zones are wrapped in [`ProcessableZone`]s that memoize the per-pixel
//! classification. [`OutlineFinder`] grows modified seed pixels into outlines,
//! [`merge_outlines`] fuses nearby ones and [`resolve_occupied_zones`] maps the resulting
//! objects to zones. Backends package that pipeline behind [`DetectorBackend`].

mod backend;
mod backends;
pub mod outline_finder;
pub mod pixel_cache;
mod registry;
pub mod resolve;
mod result;

pub use backend::DetectorBackend;
pub use backends::PixelDiffBackend;
pub use outline_finder::{OutlineFinder, PixelState};
pub use pixel_cache::{color_distance, is_significant_change, PixelCell, ProcessableZone};
pub use registry::{BackendFactory, BackendRegistry};
pub use resolve::{merge_outlines, resolve_occupied_zones};
pub use result::DetectionResult;

pub use pixel_cache::SIGNIFICANT_COLOR_DISTANCE;

/// Minimum outline area, in pixels, for a candidate to count as an object.
pub const SIGNIFICANT_AREA_TO_DETECT: i64 = 60;

/// Gap in pixels that walks bridge and merging tolerates between outlines.
pub const INTERSECTION_THRESHOLD: i32 = 40;

/// Seed grid spacing in both directions.
pub const SKIP_PIXELS: usize = 25;

use crate::model::ZoneLayout;

/// One classification cache per zone of `layout`, in layout order.
pub fn processable_zones(layout: &ZoneLayout) -> Vec<ProcessableZone> {
    layout
        .zones()
        .iter()
        .cloned()
        .map(ProcessableZone::new)
        .collect()
}
