//! In-memory frame source.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use image::RgbImage;

use crate::frame::{Frame, FrameSource, RgbFrame};
use crate::ingest::fit_to_capture;
use crate::model::Capture;

#[derive(Default)]
struct Images {
    reference: HashMap<String, Arc<RgbImage>>,
    live: HashMap<String, Arc<RgbImage>>,
}

/// Reference and live images per device id, replaceable at any time.
#[derive(Default)]
pub struct MemorySource {
    images: Mutex<Images>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reference(&self, device_id: &str, image: RgbImage) {
        self.store(device_id, image, false);
    }

    pub fn set_live(&self, device_id: &str, image: RgbImage) {
        self.store(device_id, image, true);
    }

    fn store(&self, device_id: &str, image: RgbImage, live: bool) {
        let what = if live { "live" } else { "reference" };
        match self.images.lock() {
            Ok(mut images) => {
                let map = if live { &mut images.live } else { &mut images.reference };
                map.insert(device_id.to_string(), Arc::new(image));
            }
            Err(_) => log::warn!(
                "memory source lock poisoned; {} image for '{}' dropped",
                what,
                device_id
            ),
        }
    }

    fn fetch(&self, capture: &Capture, live: bool) -> Result<Arc<dyn Frame>> {
        let what = if live { "live" } else { "reference" };
        let image = {
            let images = self
                .images
                .lock()
                .map_err(|_| anyhow!("memory source lock poisoned"))?;
            let map = if live { &images.live } else { &images.reference };
            map.get(&capture.device_id).cloned()
        }
        .ok_or_else(|| anyhow!("no {} image for '{}'", what, capture.device_id))?;
        let image = fit_to_capture(RgbImage::clone(&image), capture, what);
        Ok(Arc::new(RgbFrame::new(image)))
    }
}

impl FrameSource for MemorySource {
    fn fetch_reference(&self, capture: &Capture) -> Result<Arc<dyn Frame>> {
        self.fetch(capture, false)
    }

    fn fetch_live(&self, capture: &Capture) -> Result<Arc<dyn Frame>> {
        self.fetch(capture, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn serves_latest_images() {
        let source = MemorySource::new();
        let capture = Capture::new("cam", 0, 0, 2, 2).unwrap();
        assert!(source.fetch_live(&capture).is_err());

        source.set_live("cam", RgbImage::from_pixel(2, 2, Rgb([1, 1, 1])));
        assert_eq!(source.fetch_live(&capture).unwrap().get_pixel(0, 0), 0x010101);
        source.set_live("cam", RgbImage::from_pixel(2, 2, Rgb([2, 2, 2])));
        assert_eq!(source.fetch_live(&capture).unwrap().get_pixel(0, 0), 0x020202);
        assert!(source.fetch_reference(&capture).is_err());
    }

    #[test]
    fn poisoned_source_drops_updates_without_panicking() {
        let source = Arc::new(MemorySource::new());
        let poisoner = source.clone();
        let _ = std::thread::spawn(move || {
            let _images = poisoner.images.lock().unwrap();
            panic!("poison the image map");
        })
        .join();

        source.set_live("cam", RgbImage::from_pixel(2, 2, Rgb([1, 1, 1])));
        let capture = Capture::new("cam", 0, 0, 2, 2).unwrap();
        let err = source.fetch_live(&capture).err().unwrap();
        assert!(err.to_string().contains("poisoned"));
    }
}
