//! zonewatchd - zone occupancy daemon
//!
//! This daemon:
//! 1. Loads captures, zones and timing from the config file and environment
//! 2. Reads reference and live frames from a still-image directory
//! 3. Logs every debounced change of the occupied zone set
//! 4. Optionally writes the diagnostic frame to a PNG file at a fixed cadence

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use zonewatch::config::DaemonConfig;
use zonewatch::ingest::ImageDirSource;
use zonewatch::{BackendRegistry, Engine, LogNotifier};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Config file (JSON, or TOML when the name ends in .toml).
    #[arg(long, env = "ZONEWATCH_CONFIG")]
    config: Option<PathBuf>,
    /// Write the diagnostic frame to this PNG file periodically.
    #[arg(long, value_name = "PATH")]
    render_to: Option<PathBuf>,
    /// Seconds between diagnostic snapshots (overrides render.every_secs).
    #[arg(long)]
    render_every_secs: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => DaemonConfig::load_from(path)?,
        None => DaemonConfig::load()?,
    };
    let render_path = args.render_to.or_else(|| config.render.path.clone());
    let render_every = args
        .render_every_secs
        .map(Duration::from_secs)
        .unwrap_or(config.render.every);
    if render_path.is_some() && render_every.is_zero() {
        return Err(anyhow!("--render-every-secs must be greater than zero"));
    }

    let registry = BackendRegistry::with_defaults();
    log::info!("detector backends: {}", registry.list().join(", "));
    let engine = Engine::new(
        Arc::new(ImageDirSource::new(&config.image_dir)),
        Arc::new(LogNotifier),
        registry,
    );
    let run = engine.start(config.run_config()?)?;
    log::info!(
        "zonewatchd running: run {}, {} zones, {} ms interval, images from {}",
        run.id(),
        config.zones.len(),
        config.interval.as_millis(),
        config.image_dir.display()
    );

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .expect("error setting Ctrl-C handler");

    log::info!("zonewatchd waiting for shutdown signal (Ctrl-C)...");
    match &render_path {
        Some(path) => loop {
            match rx.recv_timeout(render_every) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => write_snapshot(&engine, path),
            }
        },
        None => {
            let _ = rx.recv();
        }
    }

    log::info!("shutdown signal received, stopping detection...");
    engine.shutdown()?;
    Ok(())
}

fn write_snapshot(engine: &Engine, path: &Path) {
    let frame = engine.get_rendered_frame();
    match frame.save(path) {
        Ok(()) => log::debug!(
            "diagnostic frame {}x{} written to {}",
            frame.width(),
            frame.height(),
            path.display()
        ),
        Err(err) => log::warn!("failed to write diagnostic frame {}: {}", path.display(), err),
    }
}
