use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::RunConfig;
use crate::model::{Capture, ZoneId, ZoneLayout, ZoneSpec};

const DEFAULT_INTERVAL_MS: u64 = 500;
const DEFAULT_IMAGE_DIR: &str = "images";
const DEFAULT_DETECTOR: &str = "pixel-diff";
const DEFAULT_RENDER_EVERY_SECS: u64 = 5;

#[derive(Debug, Deserialize, Default)]
struct DaemonConfigFile {
    interval_ms: Option<u64>,
    image_dir: Option<PathBuf>,
    detector: Option<String>,
    render: Option<RenderConfigFile>,
    captures: Option<Vec<CaptureConfigFile>>,
    zones: Option<Vec<ZoneConfigFile>>,
}

#[derive(Debug, Deserialize, Default)]
struct RenderConfigFile {
    path: Option<PathBuf>,
    every_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct CaptureConfigFile {
    device_id: String,
    #[serde(default)]
    x: i32,
    #[serde(default)]
    y: i32,
    width: i32,
    height: i32,
}

#[derive(Debug, Deserialize)]
struct ZoneConfigFile {
    id: ZoneId,
    device_id: String,
    #[serde(default)]
    offset_x: i32,
    #[serde(default)]
    offset_y: i32,
    width: i32,
    height: i32,
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub interval: Duration,
    pub image_dir: PathBuf,
    pub detector: String,
    pub render: RenderSettings,
    pub captures: Vec<CaptureSettings>,
    pub zones: Vec<ZoneSpec>,
}

/// Periodic diagnostic snapshot. Disabled while `path` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    pub path: Option<PathBuf>,
    pub every: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSettings {
    pub device_id: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl DaemonConfig {
    /// File named by `ZONEWATCH_CONFIG` (if set), then environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("ZONEWATCH_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        Self::finish(file_cfg.unwrap_or_default())
    }

    /// Like `load`, with an explicit config file.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::finish(read_config_file(path)?)
    }

    fn finish(file: DaemonConfigFile) -> Result<Self> {
        let mut cfg = Self::from_file(file);
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: DaemonConfigFile) -> Self {
        let interval = Duration::from_millis(file.interval_ms.unwrap_or(DEFAULT_INTERVAL_MS));
        let image_dir = file
            .image_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGE_DIR));
        let detector = file
            .detector
            .unwrap_or_else(|| DEFAULT_DETECTOR.to_string());
        let render = RenderSettings {
            path: file.render.as_ref().and_then(|render| render.path.clone()),
            every: Duration::from_secs(
                file.render
                    .and_then(|render| render.every_secs)
                    .unwrap_or(DEFAULT_RENDER_EVERY_SECS),
            ),
        };
        let captures = file
            .captures
            .unwrap_or_default()
            .into_iter()
            .map(|capture| CaptureSettings {
                device_id: capture.device_id,
                x: capture.x,
                y: capture.y,
                width: capture.width,
                height: capture.height,
            })
            .collect();
        let zones = file
            .zones
            .unwrap_or_default()
            .into_iter()
            .map(|zone| ZoneSpec {
                id: zone.id,
                device_id: zone.device_id,
                offset_x: zone.offset_x,
                offset_y: zone.offset_y,
                width: zone.width,
                height: zone.height,
            })
            .collect();
        Self {
            interval,
            image_dir,
            detector,
            render,
            captures,
            zones,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(interval) = std::env::var("ZONEWATCH_INTERVAL_MS") {
            let ms: u64 = interval.trim().parse().map_err(|_| {
                anyhow!("ZONEWATCH_INTERVAL_MS must be an integer number of milliseconds")
            })?;
            self.interval = Duration::from_millis(ms);
        }
        if let Ok(dir) = std::env::var("ZONEWATCH_IMAGE_DIR") {
            if !dir.trim().is_empty() {
                self.image_dir = PathBuf::from(dir);
            }
        }
        if let Ok(detector) = std::env::var("ZONEWATCH_DETECTOR") {
            if !detector.trim().is_empty() {
                self.detector = detector.trim().to_string();
            }
        }
        if let Ok(path) = std::env::var("ZONEWATCH_RENDER_PATH") {
            if !path.trim().is_empty() {
                self.render.path = Some(PathBuf::from(path));
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.detector.trim().is_empty() {
            return Err(anyhow!("detector name must not be empty"));
        }
        if self.render.path.is_some() && self.render.every.is_zero() {
            return Err(anyhow!("render.every_secs must be greater than zero"));
        }
        self.layout()?;
        Ok(())
    }

    /// Validated capture and zone geometry.
    pub fn layout(&self) -> Result<ZoneLayout> {
        let captures = self
            .captures
            .iter()
            .map(|capture| {
                Capture::new(
                    capture.device_id.clone(),
                    capture.x,
                    capture.y,
                    capture.width,
                    capture.height,
                )
            })
            .collect::<Result<Vec<_>, _>>()
            .context("invalid capture")?;
        ZoneLayout::new(captures, self.zones.clone()).context("invalid zone layout")
    }

    /// Run parameters for the engine.
    pub fn run_config(&self) -> Result<RunConfig> {
        Ok(RunConfig::new(self.interval, self.layout()?).with_detector(self.detector.clone()))
    }
}

fn read_config_file(path: &Path) -> Result<DaemonConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}
