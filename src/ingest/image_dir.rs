//! Still-image directory frame source.
//!
//! File names inside the directory:
//! - virtual capture: `virtual-reference.png`, `virtual-live.png`
//! - physical capture: `<device>-reference.png`, `<device>.png`, where `<device>` is the
//!   device id with every `/` replaced by `_` (`/dev/video0` reads `_dev_video0.png`)
//!
//! Files are re-read on every fetch, so replacing a live image on disk is picked up by
//! the next iteration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::frame::{Frame, FrameSource, RgbFrame};
use crate::ingest::fit_to_capture;
use crate::model::{Capture, VIRTUAL_DEVICE_ID};

#[derive(Clone, Debug)]
pub struct ImageDirSource {
    dir: PathBuf,
}

impl ImageDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn reference_path(&self, capture: &Capture) -> PathBuf {
        if capture.is_virtual() {
            return self.dir.join(format!("{}-reference.png", VIRTUAL_DEVICE_ID));
        }
        self.dir.join(format!("{}-reference.png", file_stem(&capture.device_id)))
    }

    pub fn live_path(&self, capture: &Capture) -> PathBuf {
        if capture.is_virtual() {
            return self.dir.join(format!("{}-live.png", VIRTUAL_DEVICE_ID));
        }
        self.dir.join(format!("{}.png", file_stem(&capture.device_id)))
    }

    fn load(&self, path: &Path, capture: &Capture, what: &str) -> Result<Arc<dyn Frame>> {
        let image = image::open(path)
            .with_context(|| format!("read {} image {}", what, path.display()))?
            .to_rgb8();
        Ok(Arc::new(RgbFrame::new(fit_to_capture(image, capture, what))))
    }
}

impl FrameSource for ImageDirSource {
    fn fetch_reference(&self, capture: &Capture) -> Result<Arc<dyn Frame>> {
        self.load(&self.reference_path(capture), capture, "reference")
    }

    fn fetch_live(&self, capture: &Capture) -> Result<Arc<dyn Frame>> {
        self.load(&self.live_path(capture), capture, "live")
    }
}

fn file_stem(device_id: &str) -> String {
    device_id.replace('/', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn file_names_follow_device_ids() {
        let source = ImageDirSource::new("/srv/images");
        let physical = Capture::new("/dev/video0", 0, 0, 10, 10).unwrap();
        let virtual_capture = Capture::new(VIRTUAL_DEVICE_ID, 0, 0, 10, 10).unwrap();

        assert_eq!(
            source.live_path(&physical),
            PathBuf::from("/srv/images/_dev_video0.png")
        );
        assert_eq!(
            source.reference_path(&physical),
            PathBuf::from("/srv/images/_dev_video0-reference.png")
        );
        assert_eq!(
            source.live_path(&virtual_capture),
            PathBuf::from("/srv/images/virtual-live.png")
        );
        assert_eq!(
            source.reference_path(&virtual_capture),
            PathBuf::from("/srv/images/virtual-reference.png")
        );
    }

    #[test]
    fn loads_and_rescales_pngs() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::from_pixel(6, 4, Rgb([0, 0, 255]))
            .save(dir.path().join("cam.png"))
            .unwrap();
        RgbImage::from_pixel(12, 8, Rgb([255, 255, 255]))
            .save(dir.path().join("cam-reference.png"))
            .unwrap();

        let source = ImageDirSource::new(dir.path());
        let capture = Capture::new("cam", 0, 0, 6, 4).unwrap();
        let live = source.fetch_live(&capture).unwrap();
        assert_eq!((live.width(), live.height()), (6, 4));
        assert_eq!(live.get_pixel(5, 3), 0x0000ff);

        let reference = source.fetch_reference(&capture).unwrap();
        assert_eq!((reference.width(), reference.height()), (6, 4));
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let source = ImageDirSource::new(dir.path());
        let capture = Capture::new("cam", 0, 0, 6, 4).unwrap();
        let err = source.fetch_live(&capture).err().unwrap();
        assert!(format!("{:#}", err).contains("cam.png"));
    }
}
