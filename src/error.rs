//! Typed errors for layout validation and coordinate lookups.
//!
//! Everything else in the crate propagates `anyhow::Error`; these two enums exist
//! because callers branch on them (a rejected layout vs. a geometry inconsistency).

use thiserror::Error;

use crate::model::ZoneId;

/// Rejected capture/zone geometry. Always raised before a run starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("layout must contain at least one zone")]
    Empty,

    #[error("{what} '{name}' has an empty dimension ({width}x{height})")]
    EmptyDimension {
        what: &'static str,
        name: String,
        width: i32,
        height: i32,
    },

    #[error("{what} '{name}' has a negative position ({x}, {y})")]
    NegativePosition {
        what: &'static str,
        name: String,
        x: i32,
        y: i32,
    },

    #[error("capture '{device_id}' extends past the coordinate range ({x}, {y}, {width}x{height})")]
    CaptureOutOfRange {
        device_id: String,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },

    #[error("zone {zone} is wider than its capture '{device_id}' ({width} > {capture_width})")]
    ZoneTooWide {
        zone: ZoneId,
        device_id: String,
        width: i32,
        capture_width: i32,
    },

    #[error("zone {zone} is higher than its capture '{device_id}' ({height} > {capture_height})")]
    ZoneTooHigh {
        zone: ZoneId,
        device_id: String,
        height: i32,
        capture_height: i32,
    },

    #[error("zone {zone} extends past the edge of capture '{device_id}'")]
    ZoneOutsideCapture { zone: ZoneId, device_id: String },

    #[error("zone {zone} references unknown capture '{device_id}'")]
    UnknownCapture { zone: ZoneId, device_id: String },

    #[error("capture '{device_id}' is defined more than once")]
    DuplicateCapture { device_id: String },

    #[error("zone {zone} is defined more than once")]
    DuplicateZone { zone: ZoneId },
}

/// A coordinate that should have belonged to a known outline did not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("no outline contains position ({x}, {y})")]
    NotFound { x: i32, y: i32 },
}
