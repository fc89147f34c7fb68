pub mod pixel_diff;

pub use pixel_diff::PixelDiffBackend;
