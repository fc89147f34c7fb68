//! Detection scheduler.
//!
//! An [`Engine`] owns at most one current run. Each run is a background thread looping
//! over a [`Pipeline`] at a fixed interval until its cancellation flag is raised.
//! Starting a new run raises the old run's flag and moves on without waiting; the old
//! thread finishes its iteration, notices the flag and exits. Superseded threads are kept
//! only so [`Engine::shutdown`] can join them.
//!
//! Run states, as seen through the queries:
//!
//! | state      | thread alive | flag raised |
//! |------------|--------------|-------------|
//! | stopped    | no           | any         |
//! | running    | yes          | no          |
//! | cancelling | yes          | yes         |

pub mod debounce;
pub mod pipeline;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use image::RgbImage;

use crate::detect::BackendRegistry;
use crate::frame::FrameSource;
use crate::notify::ChangeNotifier;
use crate::render::placeholder_frame;

pub use debounce::OccupancyWindow;
pub use pipeline::{IterationOutcome, Pipeline, RunConfig};

/// Longest uninterrupted nap between cancellation checks while waiting out an interval.
const CANCEL_POLL: Duration = Duration::from_millis(50);

/// Identifies one run and exposes its cancellation flag.
#[derive(Clone, Debug)]
pub struct RunToken {
    id: u64,
    cancel: Arc<AtomicBool>,
}

impl RunToken {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }
}

struct ActiveRun {
    id: u64,
    cancel: Arc<AtomicBool>,
    pipeline: Arc<Pipeline>,
    join: JoinHandle<()>,
}

impl ActiveRun {
    fn is_alive(&self) -> bool {
        !self.join.is_finished()
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct RunSlot {
    current: Option<ActiveRun>,
    superseded: Vec<(u64, JoinHandle<()>)>,
}

pub struct Engine {
    source: Arc<dyn FrameSource>,
    notifier: Arc<dyn ChangeNotifier>,
    registry: BackendRegistry,
    slot: Mutex<RunSlot>,
    next_id: AtomicU64,
    last_frame: Mutex<Option<RgbImage>>,
}

impl Engine {
    pub fn new(
        source: Arc<dyn FrameSource>,
        notifier: Arc<dyn ChangeNotifier>,
        registry: BackendRegistry,
    ) -> Self {
        Self {
            source,
            notifier,
            registry,
            slot: Mutex::new(RunSlot::default()),
            next_id: AtomicU64::new(1),
            last_frame: Mutex::new(None),
        }
    }

    /// Replace the current run with a new one for `config`.
    ///
    /// The backend is built and the reference frames are loaded before the previous run
    /// is touched, so a rejected configuration leaves the engine as it was.
    pub fn start(&self, config: RunConfig) -> Result<RunToken> {
        let started = Instant::now();
        let backend = match &config.detector {
            Some(name) => self.registry.create(name, &config.layout)?,
            None => self.registry.create_default(&config.layout)?,
        };
        let pipeline = Arc::new(Pipeline::new(
            config,
            self.source.clone(),
            self.notifier.clone(),
            backend,
        ));

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let cancel = Arc::new(AtomicBool::new(false));

        // The slot is held across the spawn so every started thread ends up tracked.
        let replaced = {
            let mut slot = self.lock_slot()?;
            let join = {
                let pipeline = pipeline.clone();
                let cancel = cancel.clone();
                std::thread::Builder::new()
                    .name(format!("zonewatch-run-{}", id))
                    .spawn(move || run_loop(id, &pipeline, &cancel))
                    .context("spawn detection run thread")?
            };
            slot.superseded.retain(|(_, join)| !join.is_finished());
            let previous = slot.current.replace(ActiveRun {
                id,
                cancel: cancel.clone(),
                pipeline,
                join,
            });
            previous.map(|run| {
                run.cancel.store(true, Ordering::SeqCst);
                slot.superseded.push((run.id, run.join));
                run.id
            })
        };

        match replaced {
            Some(old) => log::info!(
                "detection engine restarted in {} ms (run {} replaces run {})",
                started.elapsed().as_millis(),
                id,
                old
            ),
            None => log::info!(
                "detection engine started in {} ms (run {})",
                started.elapsed().as_millis(),
                id
            ),
        }
        Ok(RunToken { id, cancel })
    }

    /// Ask the current run to stop. No-op when nothing is running.
    pub fn cancel(&self) -> Result<()> {
        let slot = self.lock_slot()?;
        if let Some(run) = slot.current.as_ref().filter(|run| run.is_alive()) {
            if !run.cancel.swap(true, Ordering::SeqCst) {
                log::info!("detection run {} cancelling", run.id);
            }
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.with_current(|run| run.is_alive() && !run.is_cancelled())
    }

    pub fn is_stopped(&self) -> bool {
        !self.with_current(ActiveRun::is_alive)
    }

    /// Cancellation requested and the run thread still finishing. False when stopped.
    pub fn is_canceled(&self) -> bool {
        self.with_current(|run| run.is_alive() && run.is_cancelled())
    }

    /// Id of the run the engine currently tracks, alive or not.
    pub fn current_run_id(&self) -> Option<u64> {
        self.lock_slot()
            .ok()
            .and_then(|slot| slot.current.as_ref().map(|run| run.id))
    }

    /// Diagnostic image of the current run, or a 1x1 placeholder when stopped.
    ///
    /// Never fails: if rendering does, the last good image (or the placeholder) is
    /// returned instead.
    pub fn get_rendered_frame(&self) -> RgbImage {
        let pipeline = match self.lock_slot() {
            Ok(slot) => slot
                .current
                .as_ref()
                .filter(|run| run.is_alive())
                .map(|run| run.pipeline.clone()),
            Err(err) => {
                log::warn!("render skipped: {}", err);
                None
            }
        };
        let Some(pipeline) = pipeline else {
            return placeholder_frame();
        };

        match pipeline.render() {
            Ok(image) => {
                if let Ok(mut last) = self.last_frame.lock() {
                    *last = Some(image.clone());
                }
                image
            }
            Err(err) => {
                log::warn!("render failed, serving previous frame: {:#}", err);
                self.last_frame
                    .lock()
                    .ok()
                    .and_then(|last| last.clone())
                    .unwrap_or_else(placeholder_frame)
            }
        }
    }

    /// Cancel every run this engine started and wait for their threads.
    pub fn shutdown(&self) -> Result<()> {
        let (current, superseded) = {
            let mut slot = self.lock_slot()?;
            (slot.current.take(), std::mem::take(&mut slot.superseded))
        };

        let mut joins = superseded;
        if let Some(run) = current {
            run.cancel.store(true, Ordering::SeqCst);
            joins.push((run.id, run.join));
        }
        let mut panicked = Vec::new();
        for (id, join) in joins {
            if join.join().is_err() {
                panicked.push(id);
            }
        }
        if !panicked.is_empty() {
            return Err(anyhow!("detection run thread panicked: {:?}", panicked));
        }
        log::info!("detection engine shut down");
        Ok(())
    }

    fn with_current(&self, query: impl FnOnce(&ActiveRun) -> bool) -> bool {
        match self.lock_slot() {
            Ok(slot) => slot.current.as_ref().is_some_and(query),
            Err(_) => false,
        }
    }

    fn lock_slot(&self) -> Result<MutexGuard<'_, RunSlot>> {
        self.slot
            .lock()
            .map_err(|_| anyhow!("engine run slot lock poisoned"))
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Ok(slot) = self.slot.lock() {
            if let Some(run) = &slot.current {
                run.cancel.store(true, Ordering::SeqCst);
            }
        }
    }
}

fn run_loop(id: u64, pipeline: &Pipeline, cancel: &AtomicBool) {
    log::info!("detection run {} started", id);
    let interval = pipeline.interval();
    while !cancel.load(Ordering::SeqCst) {
        let started = Instant::now();
        match pipeline.iterate() {
            Ok(outcome) => log::debug!(
                "run {}: {} objects, occupied {:?}",
                id,
                outcome.objects.len(),
                outcome.occupied
            ),
            Err(err) => log::error!("detection run {} iteration failed: {:#}", id, err),
        }
        let elapsed = started.elapsed();
        match interval.checked_sub(elapsed) {
            Some(remaining) => sleep_unless_cancelled(remaining, cancel),
            None if !interval.is_zero() => log::warn!(
                "detection run {} overran its {} ms interval ({} ms)",
                id,
                interval.as_millis(),
                elapsed.as_millis()
            ),
            None => {}
        }
    }
    pipeline.close();
    log::info!("detection run {} stopped", id);
}

fn sleep_unless_cancelled(duration: Duration, cancel: &AtomicBool) {
    let deadline = Instant::now() + duration;
    loop {
        if cancel.load(Ordering::SeqCst) {
            return;
        }
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        std::thread::sleep((deadline - now).min(CANCEL_POLL));
    }
}
