//! Turning raw candidate outlines into objects and occupied zones.

use crate::detect::INTERSECTION_THRESHOLD;
use crate::geometry::{compose, intersection_area, intersects, intersects_within, Outline};
use crate::model::{Zone, ZoneId};

/// Fold candidates that lie within `INTERSECTION_THRESHOLD` of each other.
///
/// After a merge the grown outline is compared against every later candidate again, so
/// chains of nearby candidates collapse into one object. Earlier outlines are not
/// revisited when a later one grows, so the result is not guaranteed minimal.
pub fn merge_outlines(mut outlines: Vec<Outline>) -> Vec<Outline> {
    let mut index = 0;
    while index < outlines.len() {
        let mut merged = false;
        let mut other = index + 1;
        while other < outlines.len() {
            if intersects_within(&outlines[index], &outlines[other], INTERSECTION_THRESHOLD) {
                let absorbed = outlines.remove(other);
                outlines[index] = compose(&outlines[index], &absorbed);
                merged = true;
            } else {
                other += 1;
            }
        }
        // A grown outline may now reach candidates it skipped earlier in the pass.
        if !merged {
            index += 1;
        }
    }
    outlines
}

/// Zones occupied by `objects`, in order of first appearance.
///
/// Each object counts towards the one zone it overlaps the most. Ties go to the zone
/// listed first. Objects that touch no zone are ignored.
pub fn resolve_occupied_zones<'z>(
    zones: impl IntoIterator<Item = &'z Zone> + Clone,
    objects: &[Outline],
) -> Vec<ZoneId> {
    let mut occupied = Vec::new();
    for object in objects {
        let mut best: Option<(ZoneId, i64)> = None;
        for zone in zones.clone() {
            if !intersects(zone, object) {
                continue;
            }
            let overlap = intersection_area(zone, object);
            if best.map_or(overlap > 0, |(_, area)| overlap > area) {
                best = Some((zone.id, overlap));
            }
        }
        if let Some((id, _)) = best {
            if !occupied.contains(&id) {
                occupied.push(id);
            }
        }
    }
    occupied
}
