//! One run's synchronous analysis core.
//!
//! The run thread calls [`Pipeline::iterate`] on its cadence; other threads may call
//! [`Pipeline::render`] at any time. Both go through the same per-run lock, so a render
//! never observes a half-finished iteration. Live frames are fetched before that lock is
//! taken and notifications are sent after it is released.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{anyhow, Result};
use image::RgbImage;

use crate::detect::DetectorBackend;
use crate::engine::debounce::OccupancyWindow;
use crate::frame::{fetch_live_all, FrameSource, FrameStore};
use crate::geometry::Outline;
use crate::model::{ZoneId, ZoneLayout};
use crate::notify::ChangeNotifier;

/// Everything a run needs, supplied atomically when it starts.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub interval: Duration,
    pub layout: ZoneLayout,
    /// Registry name of the detector; `None` selects the registry default.
    pub detector: Option<String>,
}

impl RunConfig {
    pub fn new(interval: Duration, layout: ZoneLayout) -> Self {
        Self {
            interval,
            layout,
            detector: None,
        }
    }

    pub fn with_detector(mut self, name: impl Into<String>) -> Self {
        self.detector = Some(name.into());
        self
    }
}

/// What one iteration saw and decided.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IterationOutcome {
    pub objects: Vec<Outline>,
    /// Raw occupancy of this iteration, before debouncing.
    pub occupied: Vec<ZoneId>,
    /// Debounced occupancy after this iteration.
    pub committed: BTreeSet<ZoneId>,
    /// Whether `committed` differs from the last reported set.
    pub changed: bool,
}

struct RunState {
    frames: FrameStore,
    backend: Box<dyn DetectorBackend>,
    window: OccupancyWindow,
    reported: BTreeSet<ZoneId>,
}

pub struct Pipeline {
    interval: Duration,
    layout: ZoneLayout,
    source: Arc<dyn FrameSource>,
    notifier: Arc<dyn ChangeNotifier>,
    state: Mutex<RunState>,
}

impl Pipeline {
    /// Build the run and load the reference frame of every capture.
    pub fn new(
        config: RunConfig,
        source: Arc<dyn FrameSource>,
        notifier: Arc<dyn ChangeNotifier>,
        backend: Box<dyn DetectorBackend>,
    ) -> Self {
        let mut frames = FrameStore::new();
        for capture in config.layout.captures() {
            frames.refresh_reference(source.as_ref(), capture);
        }
        let window = OccupancyWindow::for_interval(config.interval);
        log::debug!(
            "run pipeline: {} zones on {} captures, {} backend, debounce over {} iterations",
            config.layout.zones().len(),
            config.layout.captures().len(),
            backend.name(),
            window.len()
        );
        Self {
            interval: config.interval,
            layout: config.layout,
            source,
            notifier,
            state: Mutex::new(RunState {
                frames,
                backend,
                window,
                reported: BTreeSet::new(),
            }),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn layout(&self) -> &ZoneLayout {
        &self.layout
    }

    /// Refresh live frames, detect, debounce and notify on change.
    ///
    /// A failed detection leaves the debounce window untouched.
    pub fn iterate(&self) -> Result<IterationOutcome> {
        let fetched = fetch_live_all(self.source.as_ref(), self.layout.captures());

        let outcome = {
            let mut guard = self.lock_state()?;
            let state = &mut *guard;
            for (capture, frame) in self.layout.captures().iter().zip(fetched) {
                state.frames.install_live(capture, frame);
            }
            let result = state.backend.detect(&state.frames)?;
            let committed = state.window.push(result.occupied.iter().copied());
            let changed = committed != state.reported;
            if changed {
                state.reported = committed.clone();
            }
            IterationOutcome {
                objects: result.objects,
                occupied: result.occupied,
                committed,
                changed,
            }
        };

        if outcome.changed {
            let zones: Vec<ZoneId> = outcome.committed.iter().copied().collect();
            log::info!("occupancy changed: {:?}", zones);
            if let Err(err) = self.notifier.notify_occupied_zones(&zones) {
                log::warn!("occupancy notification failed: {:#}", err);
            }
        }
        Ok(outcome)
    }

    /// Diagnostic image of the latest iteration.
    pub fn render(&self) -> Result<RgbImage> {
        let mut guard = self.lock_state()?;
        let state = &mut *guard;
        Ok(state.backend.render(&state.frames))
    }

    /// The debounced set most recently reported.
    pub fn committed(&self) -> Result<BTreeSet<ZoneId>> {
        Ok(self.lock_state()?.reported.clone())
    }

    /// Release the backend. The pipeline must not be iterated afterwards.
    pub fn close(&self) {
        match self.lock_state() {
            Ok(mut state) => state.backend.close(),
            Err(err) => log::warn!("run close skipped: {}", err),
        }
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, RunState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("run state lock poisoned"))
    }
}
