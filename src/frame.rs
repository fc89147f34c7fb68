//! Frame layer.
//!
//! - `Frame`: a pixel-sampleable image. Pixels are packed `0xRRGGBB`.
//! - `FrameSource`: the acquisition boundary. Implementations talk to devices or files.
//! - `FrameStore`: the reference and live frame of every capture in a run.
//!
//! Acquisition failures never leave the store. A failed refresh keeps whatever frame the
//! capture already had, or substitutes a blank frame of the capture's size, and logs the
//! fallback. Analysis therefore always has something to sample.

use anyhow::{anyhow, Result};
use image::RgbImage;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

use crate::geometry::Bounds;
use crate::model::Capture;

// ----------------------------------------------------------------------------
// Frame: sampleable image
// ----------------------------------------------------------------------------

/// Read-only image with packed RGB pixels.
///
/// Callers keep `x < width()` and `y < height()`.
pub trait Frame: Send + Sync {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn get_pixel(&self, x: u32, y: u32) -> u32;
}

/// All-black frame used whenever nothing better is available.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlankFrame {
    pub width: u32,
    pub height: u32,
}

impl BlankFrame {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn for_capture(capture: &Capture) -> Self {
        Self::new(capture.width() as u32, capture.height() as u32)
    }
}

impl Frame for BlankFrame {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn get_pixel(&self, _x: u32, _y: u32) -> u32 {
        0
    }
}

/// Frame backed by a decoded `image::RgbImage`.
pub struct RgbFrame {
    image: RgbImage,
}

impl RgbFrame {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }
}

impl Frame for RgbFrame {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn get_pixel(&self, x: u32, y: u32) -> u32 {
        pack_rgb(self.image.get_pixel(x, y).0)
    }
}

pub fn pack_rgb([r, g, b]: [u8; 3]) -> u32 {
    (r as u32) << 16 | (g as u32) << 8 | b as u32
}

pub fn unpack_rgb(pixel: u32) -> [u8; 3] {
    [(pixel >> 16) as u8, (pixel >> 8) as u8, pixel as u8]
}

// ----------------------------------------------------------------------------
// FrameSource: acquisition boundary
// ----------------------------------------------------------------------------

/// Produces reference and live frames for a capture.
///
/// Calls may block on I/O. Errors are absorbed by `FrameStore`.
pub trait FrameSource: Send + Sync {
    fn fetch_reference(&self, capture: &Capture) -> Result<Arc<dyn Frame>>;
    fn fetch_live(&self, capture: &Capture) -> Result<Arc<dyn Frame>>;
}

/// Fetch the live frame of every capture in parallel.
///
/// Results are returned in the order of `captures`.
pub fn fetch_live_all(
    source: &dyn FrameSource,
    captures: &[Arc<Capture>],
) -> Vec<Result<Arc<dyn Frame>>> {
    captures
        .par_iter()
        .map(|capture| source.fetch_live(capture))
        .collect()
}

// ----------------------------------------------------------------------------
// FrameStore: per-run frame cache
// ----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FrameKind {
    Reference,
    Live,
}

impl FrameKind {
    fn label(self) -> &'static str {
        match self {
            FrameKind::Reference => "reference",
            FrameKind::Live => "live",
        }
    }
}

#[derive(Default)]
struct CaptureFrames {
    reference: Option<Arc<dyn Frame>>,
    live: Option<Arc<dyn Frame>>,
}

/// Reference and live frame per capture, keyed by device id.
#[derive(Default)]
pub struct FrameStore {
    frames: HashMap<String, CaptureFrames>,
}

impl FrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-acquire the reference frame. Never fails.
    pub fn refresh_reference(&mut self, source: &dyn FrameSource, capture: &Capture) {
        let fetched = source.fetch_reference(capture);
        self.install(FrameKind::Reference, capture, fetched);
    }

    /// Re-acquire the live frame. Never fails.
    pub fn refresh_live(&mut self, source: &dyn FrameSource, capture: &Capture) {
        let fetched = source.fetch_live(capture);
        self.install(FrameKind::Live, capture, fetched);
    }

    /// Store the outcome of a live fetch performed elsewhere (see `fetch_live_all`).
    pub fn install_live(&mut self, capture: &Capture, fetched: Result<Arc<dyn Frame>>) {
        self.install(FrameKind::Live, capture, fetched);
    }

    /// Reference frame for `capture`, blank if none was ever stored.
    pub fn reference(&self, capture: &Capture) -> Arc<dyn Frame> {
        self.get(FrameKind::Reference, capture)
    }

    /// Live frame for `capture`, blank if none was ever stored.
    pub fn live(&self, capture: &Capture) -> Arc<dyn Frame> {
        self.get(FrameKind::Live, capture)
    }

    /// Borrowing variant of `reference`/`live` for the per-pixel hot path.
    pub(crate) fn pair(&self, capture: &Capture) -> (Option<&dyn Frame>, Option<&dyn Frame>) {
        match self.frames.get(&capture.device_id) {
            Some(frames) => (frames.reference.as_deref(), frames.live.as_deref()),
            None => (None, None),
        }
    }

    fn get(&self, kind: FrameKind, capture: &Capture) -> Arc<dyn Frame> {
        let stored = self.frames.get(&capture.device_id).and_then(|frames| match kind {
            FrameKind::Reference => frames.reference.clone(),
            FrameKind::Live => frames.live.clone(),
        });
        stored.unwrap_or_else(|| Arc::new(BlankFrame::for_capture(capture)) as Arc<dyn Frame>)
    }

    fn install(&mut self, kind: FrameKind, capture: &Capture, fetched: Result<Arc<dyn Frame>>) {
        let checked = fetched.and_then(|frame| check_dimensions(capture, frame));
        let slot = self.frames.entry(capture.device_id.clone()).or_default();
        let slot = match kind {
            FrameKind::Reference => &mut slot.reference,
            FrameKind::Live => &mut slot.live,
        };
        match checked {
            Ok(frame) => *slot = Some(frame),
            Err(err) if slot.is_some() => {
                log::warn!(
                    "{} frame for '{}' unavailable, keeping previous frame: {:#}",
                    kind.label(),
                    capture.device_id,
                    err
                );
            }
            Err(err) => {
                log::warn!(
                    "{} frame for '{}' unavailable, using blank {}x{} frame: {:#}",
                    kind.label(),
                    capture.device_id,
                    capture.width(),
                    capture.height(),
                    err
                );
                *slot = Some(Arc::new(BlankFrame::for_capture(capture)) as Arc<dyn Frame>);
            }
        }
    }
}

fn check_dimensions(capture: &Capture, frame: Arc<dyn Frame>) -> Result<Arc<dyn Frame>> {
    let expected = (capture.width() as u32, capture.height() as u32);
    let actual = (frame.width(), frame.height());
    if actual != expected {
        return Err(anyhow!(
            "frame is {}x{}, capture expects {}x{}",
            actual.0,
            actual.1,
            expected.0,
            expected.1
        ));
    }
    Ok(frame)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
