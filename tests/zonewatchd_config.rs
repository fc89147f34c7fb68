use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use zonewatch::config::DaemonConfig;
use zonewatch::Bounds;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "ZONEWATCH_CONFIG",
        "ZONEWATCH_INTERVAL_MS",
        "ZONEWATCH_IMAGE_DIR",
        "ZONEWATCH_DETECTOR",
        "ZONEWATCH_RENDER_PATH",
    ] {
        std::env::remove_var(key);
    }
}

fn temp_config(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("temp config");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

const JSON: &str = r#"{
    "interval_ms": 250,
    "image_dir": "/var/lib/zonewatch/images",
    "render": { "path": "/tmp/zones.png", "every_secs": 2 },
    "captures": [
        { "device_id": "/dev/video0", "x": 0, "y": 0, "width": 640, "height": 480 },
        { "device_id": "virtual", "x": 640, "y": 0, "width": 320, "height": 240 }
    ],
    "zones": [
        { "id": 1, "device_id": "/dev/video0", "offset_x": 0, "offset_y": 0, "width": 320, "height": 480 },
        { "id": 2, "device_id": "/dev/video0", "offset_x": 320, "offset_y": 0, "width": 320, "height": 480 },
        { "id": 3, "device_id": "virtual", "width": 320, "height": 240 }
    ]
}"#;

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = temp_config(".json", JSON);
    std::env::set_var("ZONEWATCH_CONFIG", file.path());
    std::env::set_var("ZONEWATCH_INTERVAL_MS", "100");
    std::env::set_var("ZONEWATCH_IMAGE_DIR", "/srv/frames");

    let cfg = DaemonConfig::load().expect("load config");
    assert_eq!(cfg.interval, Duration::from_millis(100));
    assert_eq!(cfg.image_dir.to_str(), Some("/srv/frames"));
    assert_eq!(cfg.detector, "pixel-diff");
    assert_eq!(cfg.render.path.as_deref().and_then(|p| p.to_str()), Some("/tmp/zones.png"));
    assert_eq!(cfg.render.every, Duration::from_secs(2));

    let layout = cfg.layout().expect("layout");
    assert_eq!(layout.captures().len(), 2);
    assert_eq!(layout.zones().len(), 3);
    assert_eq!(layout.zones()[2].x(), 640);
    assert_eq!((layout.bounds().width(), layout.bounds().height()), (960, 480));

    let run = cfg.run_config().expect("run config");
    assert_eq!(run.interval, Duration::from_millis(100));
    assert_eq!(run.detector.as_deref(), Some("pixel-diff"));

    clear_env();
}

#[test]
fn loads_toml_config_from_explicit_path() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = temp_config(
        ".toml",
        r#"
interval_ms = 1000
detector = "pixel-diff"

[[captures]]
device_id = "cam"
width = 200
height = 100

[[zones]]
id = 7
device_id = "cam"
width = 100
height = 100
"#,
    );
    std::env::set_var("ZONEWATCH_RENDER_PATH", "/tmp/render.png");

    let cfg = DaemonConfig::load_from(file.path()).expect("load toml");
    assert_eq!(cfg.interval, Duration::from_secs(1));
    assert_eq!(cfg.zones[0].id, 7);
    assert!(cfg.render.path.is_some());
    assert_eq!(cfg.render.every, Duration::from_secs(5));

    clear_env();
}

#[test]
fn rejects_invalid_interval_override() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = temp_config(".json", JSON);
    std::env::set_var("ZONEWATCH_INTERVAL_MS", "soon");
    let err = DaemonConfig::load_from(file.path()).unwrap_err();
    assert!(err.to_string().contains("ZONEWATCH_INTERVAL_MS"));

    clear_env();
}

#[test]
fn rejects_zone_larger_than_its_capture() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = temp_config(
        ".json",
        r#"{
            "captures": [{ "device_id": "cam", "width": 100, "height": 100 }],
            "zones": [{ "id": 1, "device_id": "cam", "width": 150, "height": 50 }]
        }"#,
    );
    let err = DaemonConfig::load_from(file.path()).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("invalid zone layout"));
    assert!(message.contains("wider than its capture"));

    clear_env();
}

#[test]
fn rejects_zone_on_unknown_capture() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = temp_config(
        ".json",
        r#"{
            "captures": [{ "device_id": "cam", "width": 100, "height": 100 }],
            "zones": [{ "id": 1, "device_id": "other", "width": 50, "height": 50 }]
        }"#,
    );
    let err = DaemonConfig::load_from(file.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("unknown capture 'other'"));

    clear_env();
}

#[test]
fn missing_config_file_is_reported() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("ZONEWATCH_CONFIG", "/nonexistent/zonewatch.json");
    let err = DaemonConfig::load().unwrap_err();
    assert!(err.to_string().contains("failed to read config file"));

    clear_env();
}
