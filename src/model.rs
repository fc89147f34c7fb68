//! Static geometry of a detection run: captures and the zones carved out of them.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::LayoutError;
use crate::geometry::{compose_all, Bounds, Outline};

/// Zone identifier as reported to the change notifier.
pub type ZoneId = u32;

/// Device id marking a synthetic capture backed by fixed still images.
pub const VIRTUAL_DEVICE_ID: &str = "virtual";

/// A camera frame placed into the combined coordinate space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Capture {
    pub device_id: String,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

impl Capture {
    pub fn new(
        device_id: impl Into<String>,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> Result<Self, LayoutError> {
        let device_id = device_id.into();
        if width < 1 || height < 1 {
            return Err(LayoutError::EmptyDimension {
                what: "capture",
                name: device_id,
                width,
                height,
            });
        }
        if x < 0 || y < 0 {
            return Err(LayoutError::NegativePosition {
                what: "capture",
                name: device_id,
                x,
                y,
            });
        }
        // One past the far edge must still be representable.
        if x.checked_add(width).is_none() || y.checked_add(height).is_none() {
            return Err(LayoutError::CaptureOutOfRange {
                device_id,
                x,
                y,
                width,
                height,
            });
        }
        Ok(Self {
            device_id,
            x,
            y,
            width,
            height,
        })
    }

    /// Synthetic captures load fixed images instead of talking to a device.
    pub fn is_virtual(&self) -> bool {
        self.device_id == VIRTUAL_DEVICE_ID
    }
}

impl Bounds for Capture {
    fn x(&self) -> i32 {
        self.x
    }

    fn y(&self) -> i32 {
        self.y
    }

    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }
}

/// Rectangular sub-region of a capture; the unit of occupancy reporting.
///
/// Equality and hashing use `id` only.
#[derive(Clone, Debug)]
pub struct Zone {
    pub id: ZoneId,
    capture: Arc<Capture>,
    offset_x: i32,
    offset_y: i32,
    width: i32,
    height: i32,
}

impl Zone {
    pub fn new(
        id: ZoneId,
        capture: Arc<Capture>,
        offset_x: i32,
        offset_y: i32,
        width: i32,
        height: i32,
    ) -> Result<Self, LayoutError> {
        if width < 1 || height < 1 {
            return Err(LayoutError::EmptyDimension {
                what: "zone",
                name: id.to_string(),
                width,
                height,
            });
        }
        if width > capture.width() {
            return Err(LayoutError::ZoneTooWide {
                zone: id,
                device_id: capture.device_id.clone(),
                width,
                capture_width: capture.width(),
            });
        }
        if height > capture.height() {
            return Err(LayoutError::ZoneTooHigh {
                zone: id,
                device_id: capture.device_id.clone(),
                height,
                capture_height: capture.height(),
            });
        }
        if offset_x < 0
            || offset_y < 0
            || i64::from(offset_x) + i64::from(width) > i64::from(capture.width())
            || i64::from(offset_y) + i64::from(height) > i64::from(capture.height())
        {
            return Err(LayoutError::ZoneOutsideCapture {
                zone: id,
                device_id: capture.device_id.clone(),
            });
        }
        Ok(Self {
            id,
            capture,
            offset_x,
            offset_y,
            width,
            height,
        })
    }

    pub fn capture(&self) -> &Arc<Capture> {
        &self.capture
    }

    pub fn offset_x(&self) -> i32 {
        self.offset_x
    }

    pub fn offset_y(&self) -> i32 {
        self.offset_y
    }
}

impl Bounds for Zone {
    fn x(&self) -> i32 {
        self.capture.x() + self.offset_x
    }

    fn y(&self) -> i32 {
        self.capture.y() + self.offset_y
    }

    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }
}

impl PartialEq for Zone {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Zone {}

impl Hash for Zone {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Zone description before its capture has been resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoneSpec {
    pub id: ZoneId,
    pub device_id: String,
    pub offset_x: i32,
    pub offset_y: i32,
    pub width: i32,
    pub height: i32,
}

/// Validated set of captures and zones for one run.
#[derive(Clone, Debug)]
pub struct ZoneLayout {
    captures: Vec<Arc<Capture>>,
    zones: Vec<Zone>,
    bounds: Outline,
}

impl ZoneLayout {
    /// Resolve every zone against its capture and validate the whole layout.
    ///
    /// Only captures that at least one zone uses are kept.
    pub fn new(captures: Vec<Capture>, specs: Vec<ZoneSpec>) -> Result<Self, LayoutError> {
        if specs.is_empty() {
            return Err(LayoutError::Empty);
        }

        let mut seen_devices = HashSet::new();
        for capture in &captures {
            if !seen_devices.insert(capture.device_id.as_str()) {
                return Err(LayoutError::DuplicateCapture {
                    device_id: capture.device_id.clone(),
                });
            }
        }
        let all_captures: Vec<Arc<Capture>> = captures.into_iter().map(Arc::new).collect();

        let mut seen_zones = HashSet::new();
        let mut zones = Vec::with_capacity(specs.len());
        for spec in specs {
            if !seen_zones.insert(spec.id) {
                return Err(LayoutError::DuplicateZone { zone: spec.id });
            }
            let capture = all_captures
                .iter()
                .find(|capture| capture.device_id == spec.device_id)
                .ok_or_else(|| LayoutError::UnknownCapture {
                    zone: spec.id,
                    device_id: spec.device_id.clone(),
                })?;
            zones.push(Zone::new(
                spec.id,
                Arc::clone(capture),
                spec.offset_x,
                spec.offset_y,
                spec.width,
                spec.height,
            )?);
        }

        let captures: Vec<Arc<Capture>> = all_captures
            .into_iter()
            .filter(|capture| zones.iter().any(|zone| zone.capture() == capture))
            .collect();
        let bounds = compose_all(captures.iter().map(|capture| capture.as_ref()))
            .ok_or(LayoutError::Empty)?;

        Ok(Self {
            captures,
            zones,
            bounds,
        })
    }

    /// Distinct captures referenced by the zones, in definition order.
    pub fn captures(&self) -> &[Arc<Capture>] {
        &self.captures
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Bounding union of all captures.
    pub fn bounds(&self) -> Outline {
        self.bounds
    }
}
