use std::collections::BTreeSet;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::{Rgb, RgbImage};

use zonewatch::ingest::MemorySource;
use zonewatch::{
    BackendRegistry, Capture, ChannelNotifier, Engine, LogNotifier, PixelDiffBackend, Pipeline,
    RunConfig, ZoneId, ZoneLayout, ZoneSpec,
};

/// One 200x100 capture with zone 1 on the left half and zone 2 on the right half.
fn two_zones() -> ZoneLayout {
    let zone = |id, offset_x| ZoneSpec {
        id,
        device_id: "cam".to_string(),
        offset_x,
        offset_y: 0,
        width: 100,
        height: 100,
    };
    ZoneLayout::new(
        vec![Capture::new("cam", 0, 0, 200, 100).unwrap()],
        vec![zone(1, 0), zone(2, 100)],
    )
    .unwrap()
}

fn white() -> RgbImage {
    RgbImage::from_pixel(200, 100, Rgb([255, 255, 255]))
}

fn paint(image: &mut RgbImage, (x0, y0, x1, y1): (u32, u32, u32, u32)) {
    for y in y0..=y1 {
        for x in x0..=x1 {
            image.put_pixel(x, y, Rgb([0, 0, 0]));
        }
    }
}

fn source_with(blocks: &[(u32, u32, u32, u32)]) -> Arc<MemorySource> {
    let source = Arc::new(MemorySource::new());
    source.set_reference("cam", white());
    let mut live = white();
    for &block in blocks {
        paint(&mut live, block);
    }
    source.set_live("cam", live);
    source
}

fn pipeline(
    source: Arc<MemorySource>,
    interval: Duration,
) -> (Pipeline, mpsc::Receiver<Vec<ZoneId>>) {
    let (tx, rx) = mpsc::channel();
    let layout = two_zones();
    let backend = Box::new(PixelDiffBackend::new(&layout));
    let pipeline = Pipeline::new(
        RunConfig::new(interval, layout),
        source,
        Arc::new(ChannelNotifier::new(tx)),
        backend,
    );
    (pipeline, rx)
}

#[test]
fn straddling_block_is_committed_to_majority_zone_after_window_fills() {
    let source = source_with(&[(70, 20, 120, 40)]);
    // 500 ms interval: three-slot window.
    let (pipeline, rx) = pipeline(source, Duration::from_millis(500));

    for _ in 0..2 {
        let outcome = pipeline.iterate().unwrap();
        assert_eq!(outcome.objects.len(), 1);
        assert!(outcome.committed.is_empty());
    }
    assert!(rx.try_recv().is_err());

    let outcome = pipeline.iterate().unwrap();
    // The block covers 31 columns of zone 1 and 22 of zone 2.
    assert_eq!(outcome.occupied, vec![1]);
    assert_eq!(outcome.committed, BTreeSet::from([1]));
    assert_eq!(rx.try_recv().unwrap(), vec![1]);
}

#[test]
fn blocks_in_both_zones_are_both_reported() {
    let source = source_with(&[(20, 20, 60, 40), (140, 50, 180, 80)]);
    let (pipeline, rx) = pipeline(source, Duration::from_millis(500));

    for _ in 0..3 {
        pipeline.iterate().unwrap();
    }
    assert_eq!(rx.try_recv().unwrap(), vec![1, 2]);
    assert_eq!(pipeline.committed().unwrap(), BTreeSet::from([1, 2]));
}

#[test]
fn identical_frames_report_nothing() {
    let source = source_with(&[]);
    let (pipeline, rx) = pipeline(source, Duration::from_millis(500));
    for _ in 0..5 {
        let outcome = pipeline.iterate().unwrap();
        assert!(outcome.objects.is_empty());
        assert!(outcome.occupied.is_empty());
        assert!(!outcome.changed);
    }
    assert!(rx.try_recv().is_err());
}

#[test]
fn single_pixel_noise_is_ignored() {
    let source = source_with(&[(50, 50, 50, 50), (150, 25, 150, 25)]);
    let (pipeline, _rx) = pipeline(source, Duration::from_millis(500));
    let outcome = pipeline.iterate().unwrap();
    assert!(outcome.objects.is_empty());
    assert!(outcome.occupied.is_empty());
}

#[test]
fn zone_missing_from_latest_iteration_is_not_committed() {
    let source = source_with(&[(20, 20, 60, 40)]);
    let (pipeline, rx) = pipeline(source.clone(), Duration::from_millis(500));

    pipeline.iterate().unwrap();
    pipeline.iterate().unwrap();
    source.set_live("cam", white());
    let outcome = pipeline.iterate().unwrap();
    assert!(outcome.committed.is_empty());
    assert!(rx.try_recv().is_err());
}

#[test]
fn missing_live_frames_fall_back_to_blank() {
    let source = Arc::new(MemorySource::new());
    source.set_reference("cam", white());
    let (pipeline, _rx) = pipeline(source, Duration::from_millis(500));
    // A blank live frame differs from the white reference everywhere.
    let outcome = pipeline.iterate().unwrap();
    assert_eq!(outcome.objects.len(), 1);
    assert_eq!(outcome.occupied, vec![1]);
}

fn engine(source: Arc<MemorySource>) -> (Engine, mpsc::Receiver<Vec<ZoneId>>) {
    let (tx, rx) = mpsc::channel();
    let engine = Engine::new(
        source,
        Arc::new(ChannelNotifier::new(tx)),
        BackendRegistry::with_defaults(),
    );
    (engine, rx)
}

fn wait_until(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let started = Instant::now();
    while started.elapsed() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    condition()
}

#[test]
fn running_engine_notifies_occupancy() {
    let source = source_with(&[(140, 50, 180, 80)]);
    let (engine, rx) = engine(source);
    // 750 ms interval: two-slot window.
    engine
        .start(RunConfig::new(Duration::from_millis(750), two_zones()))
        .unwrap();
    assert!(engine.is_running());

    let zones = rx.recv_timeout(Duration::from_secs(10)).unwrap();
    assert_eq!(zones, vec![2]);

    let frame = engine.get_rendered_frame();
    assert_eq!(frame.dimensions(), (200, 100));
    engine.shutdown().unwrap();
    assert!(engine.is_stopped());
}

#[test]
fn restart_cancels_previous_run() {
    let (engine, _rx) = engine(source_with(&[]));
    let first = engine
        .start(RunConfig::new(Duration::from_millis(50), two_zones()))
        .unwrap();
    let second = engine
        .start(RunConfig::new(Duration::from_millis(50), two_zones()))
        .unwrap();

    assert!(first.is_cancel_requested());
    assert!(!second.is_cancel_requested());
    assert_eq!(engine.current_run_id(), Some(second.id()));
    assert!(engine.is_running());

    engine.shutdown().unwrap();
    assert!(second.is_cancel_requested());
    assert!(engine.is_stopped());
}

#[test]
fn cancel_on_stopped_engine_is_a_no_op() {
    let (engine, _rx) = engine(source_with(&[]));
    assert!(engine.is_stopped());
    engine.cancel().unwrap();
    assert!(engine.is_stopped());
    assert!(!engine.is_running());
    assert!(!engine.is_canceled());
    assert_eq!(engine.current_run_id(), None);
}

#[test]
fn cancel_stops_the_run_thread() {
    let (engine, _rx) = engine(source_with(&[]));
    let run = engine
        .start(RunConfig::new(Duration::from_millis(20), two_zones()))
        .unwrap();
    engine.cancel().unwrap();
    assert!(run.is_cancel_requested());
    assert!(!engine.is_running());
    assert!(wait_until(Duration::from_secs(5), || engine.is_stopped()));
    assert!(!engine.is_canceled());
    engine.shutdown().unwrap();
}

#[test]
fn stopped_engine_renders_placeholder() {
    let engine = Engine::new(
        Arc::new(MemorySource::new()),
        Arc::new(LogNotifier),
        BackendRegistry::with_defaults(),
    );
    let frame = engine.get_rendered_frame();
    assert_eq!(frame.dimensions(), (1, 1));
    assert_eq!(*frame.get_pixel(0, 0), Rgb([0, 0, 0]));
}
