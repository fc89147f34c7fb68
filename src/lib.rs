//! Zonewatch
//!
//! Zone occupancy detection for fixed cameras. Each capture (a camera frame placed in a
//! shared coordinate space) is divided into rectangular zones. A background run compares
//! every capture's live frame against a stored reference frame, grows changed pixels into
//! object outlines, and reports which zones hold an object once that has been stable for
//! a short debounce window.
//!
//! # Architecture
//!
//! 1. **Layout**: captures and zones are validated up front (`model`, `geometry`).
//! 2. **Frames**: a `FrameSource` supplies reference and live frames; a failed fetch falls
//!    back to the previous or a blank frame, so analysis never sees an error (`frame`).
//! 3. **Detection**: per-pixel colour distance with a memo per zone, scan-line flood fill
//!    from a sparse seed grid, outline merging and zone resolution (`detect`).
//! 4. **Scheduling**: one background thread per run, cooperative cancellation, debounced
//!    change notification (`engine`, `notify`).
//!
//! # Module Structure
//!
//! - `geometry`: rectangles and the intersection/composition rules
//! - `model`: captures, zones and the validated `ZoneLayout`
//! - `frame`: `Frame`, `FrameSource` and the per-run `FrameStore`
//! - `detect`: pixel cache, outline finder, merge/resolve, detector backends
//! - `render`: diagnostic image rasterizer
//! - `engine`: run scheduler, pipeline and debounce window
//! - `notify`: occupancy change notifiers
//! - `ingest`: frame sources (image directory, in-memory)
//! - `config`: daemon configuration

pub mod config;
pub mod detect;
pub mod engine;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod ingest;
pub mod model;
pub mod notify;
pub mod render;

pub use detect::{BackendRegistry, DetectionResult, DetectorBackend, PixelDiffBackend};
pub use engine::{Engine, IterationOutcome, OccupancyWindow, Pipeline, RunConfig, RunToken};
pub use error::{LayoutError, LookupError};
pub use frame::{BlankFrame, Frame, FrameSource, FrameStore, RgbFrame};
pub use geometry::{Bounds, Outline};
pub use model::{Capture, Zone, ZoneId, ZoneLayout, ZoneSpec, VIRTUAL_DEVICE_ID};
pub use notify::{ChangeNotifier, ChannelNotifier, LogNotifier};
