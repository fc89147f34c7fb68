//! Frame sources.
//!
//! - `ImageDirSource`: still PNG images from a local directory
//! - `MemorySource`: images held in memory (tests, embedding)
//!
//! Device control (exposure, focus, lens correction) is out of scope; sources only hand
//! over pixels. Images whose size differs from the capture are rescaled to fit.

pub mod image_dir;
pub mod memory;

pub use image_dir::ImageDirSource;
pub use memory::MemorySource;

use image::imageops::FilterType;
use image::RgbImage;

use crate::geometry::Bounds;
use crate::model::Capture;

/// Rescale `image` to the capture size with bilinear filtering, warning when needed.
pub(crate) fn fit_to_capture(image: RgbImage, capture: &Capture, what: &str) -> RgbImage {
    let expected = (capture.width() as u32, capture.height() as u32);
    if image.dimensions() == expected {
        return image;
    }
    log::warn!(
        "{} image for '{}' is {}x{}, rescaling to {}x{}",
        what,
        capture.device_id,
        image.width(),
        image.height(),
        expected.0,
        expected.1
    );
    image::imageops::resize(&image, expected.0, expected.1, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_images_pass_through() {
        let capture = Capture::new("cam", 0, 0, 4, 2).unwrap();
        let image = RgbImage::from_pixel(4, 2, image::Rgb([1, 2, 3]));
        assert_eq!(fit_to_capture(image.clone(), &capture, "live"), image);
    }

    #[test]
    fn mismatched_images_are_rescaled() {
        let capture = Capture::new("cam", 0, 0, 4, 2).unwrap();
        let image = RgbImage::from_pixel(8, 8, image::Rgb([200, 200, 200]));
        let fitted = fit_to_capture(image, &capture, "live");
        assert_eq!(fitted.dimensions(), (4, 2));
        let [r, g, b] = fitted.get_pixel(1, 1).0;
        assert!([r, g, b].iter().all(|c| c.abs_diff(200) <= 1));
    }
}
