use crate::geometry::Outline;
use crate::model::ZoneId;

/// Result of one detection pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DetectionResult {
    /// Merged object outlines in absolute coordinates.
    pub objects: Vec<Outline>,
    /// Zones holding at least one object, in order of first appearance.
    pub occupied: Vec<ZoneId>,
}

impl DetectionResult {
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
