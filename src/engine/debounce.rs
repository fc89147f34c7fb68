//! Sliding window that suppresses single-frame occupancy flicker.

use std::collections::{BTreeSet, VecDeque};
use std::time::Duration;

use crate::model::ZoneId;

/// How long a zone must stay occupied before it is reported.
const SUSTAIN_MS: f64 = 1500.0;

/// Window length used when the iteration interval is zero.
const UNPACED_SLOTS: usize = 4;

/// The occupied-zone sets of the most recent iterations.
///
/// A zone is committed only while it appears in every slot. Slots start out empty, so a
/// freshly created window commits nothing until it has seen `len()` occupied iterations.
#[derive(Clone, Debug)]
pub struct OccupancyWindow {
    slots: VecDeque<BTreeSet<ZoneId>>,
    len: usize,
}

impl OccupancyWindow {
    pub fn new(len: usize) -> Self {
        let len = len.max(1);
        Self {
            slots: std::iter::repeat_with(BTreeSet::new).take(len).collect(),
            len,
        }
    }

    /// Window sized so a zone has to persist for roughly 1.5 seconds.
    pub fn for_interval(interval: Duration) -> Self {
        Self::new(Self::slots_for_interval(interval))
    }

    pub fn slots_for_interval(interval: Duration) -> usize {
        let ms = interval.as_secs_f64() * 1000.0;
        if ms <= 0.0 {
            return UNPACED_SLOTS;
        }
        ((SUSTAIN_MS / ms).round() as usize).max(1)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(BTreeSet::is_empty)
    }

    /// Record one iteration's occupied zones and return the committed set.
    pub fn push(&mut self, occupied: impl IntoIterator<Item = ZoneId>) -> BTreeSet<ZoneId> {
        if self.slots.len() == self.len {
            self.slots.pop_front();
        }
        self.slots.push_back(occupied.into_iter().collect());
        self.committed()
    }

    /// Zones present in every slot.
    pub fn committed(&self) -> BTreeSet<ZoneId> {
        let mut slots = self.slots.iter();
        let Some(first) = slots.next() else {
            return BTreeSet::new();
        };
        slots.fold(first.clone(), |acc, slot| acc.intersection(slot).copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_size_follows_interval() {
        assert_eq!(OccupancyWindow::slots_for_interval(Duration::from_millis(500)), 3);
        assert_eq!(OccupancyWindow::slots_for_interval(Duration::from_millis(1000)), 2);
        assert_eq!(OccupancyWindow::slots_for_interval(Duration::from_millis(100)), 15);
        assert_eq!(OccupancyWindow::slots_for_interval(Duration::from_millis(5000)), 1);
        assert_eq!(OccupancyWindow::slots_for_interval(Duration::ZERO), 4);
    }

    #[test]
    fn zone_must_fill_every_slot() {
        let mut window = OccupancyWindow::new(3);
        assert!(window.push([1]).is_empty());
        assert!(window.push([1]).is_empty());
        assert_eq!(window.push([1]), BTreeSet::from([1]));
    }

    #[test]
    fn one_missing_slot_drops_the_zone() {
        let mut window = OccupancyWindow::new(3);
        window.push([1, 2]);
        window.push([1, 2]);
        window.push([1, 2]);
        // Occupied in the previous iterations but not this one.
        assert_eq!(window.push([2]), BTreeSet::from([2]));
        // Zone 1 needs three fresh sightings to come back.
        assert_eq!(window.push([1, 2]), BTreeSet::from([2]));
        assert_eq!(window.push([1, 2]), BTreeSet::from([2]));
        assert_eq!(window.push([1, 2]), BTreeSet::from([1, 2]));
    }

    #[test]
    fn single_slot_window_commits_immediately() {
        let mut window = OccupancyWindow::new(0);
        assert_eq!(window.len(), 1);
        assert_eq!(window.push([4]), BTreeSet::from([4]));
        assert!(window.push(Vec::<ZoneId>::new()).is_empty());
        assert!(window.is_empty());
    }
}
