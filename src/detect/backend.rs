use anyhow::Result;
use image::RgbImage;

use crate::detect::result::DetectionResult;
use crate::frame::FrameStore;

/// Detector backend trait.
///
/// A backend is built for one run's layout and owned by that run. `detect` is called once
/// per iteration after the live frames have been refreshed; `render` may be called between
/// iterations and sees the state the last `detect` left behind.
///
/// Implementations must not keep frames beyond the call that received them.
pub trait DetectorBackend: Send {
    /// Backend identifier, as used by the registry.
    fn name(&self) -> &'static str;

    /// Analyse the current frames and report objects and occupied zones.
    fn detect(&mut self, frames: &FrameStore) -> Result<DetectionResult>;

    /// Diagnostic image of the most recent detection.
    fn render(&mut self, frames: &FrameStore) -> RgbImage;

    /// Release backend resources. Called once when the run ends.
    fn close(&mut self) {}
}
