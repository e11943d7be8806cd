//! Configuration file loading and validation tests

use gesture_light_control::{
    config::{Config, LightConfig, EXAMPLE_CONFIG},
    gesture::HandOrdering,
    Error,
};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_round_trip_through_file() {
    let mut config = Config::default();
    config.gesture.hand_ordering = HandOrdering::Proximity;
    config.brightness.dead_zone_px = 45.0;
    config.lights.push(LightConfig {
        label: "Desk".to_string(),
        mac: Some("d0:73:d5:00:00:01".to_string()),
        ip: None,
    });

    let file = NamedTempFile::new().unwrap();
    config.to_file(file.path()).unwrap();
    let loaded = Config::from_file(file.path()).unwrap();

    assert_eq!(loaded, config);
}

#[test]
fn test_load_example_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(EXAMPLE_CONFIG.as_bytes()).unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.audio.queue_capacity, 20);
    assert_eq!(config.dispatch.queue_capacity, 10);
    assert_eq!(config.clap.threshold_bias, 6000);
    assert!(config.validate().is_ok());
}

#[test]
fn test_lights_section() {
    let yaml = "lights:\n  - label: Kitchen\n    ip: 192.168.1.20\n  - label: Hall\n";
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.lights.len(), 2);
    assert_eq!(config.lights[0].ip.as_deref(), Some("192.168.1.20"));
    assert_eq!(config.lights[1].mac, None);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = Config::from_file(dir.path().join("absent.yaml"));
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_malformed_yaml_is_config_error() {
    let result = Config::from_yaml("gesture: [not, a, map");
    assert!(matches!(result, Err(Error::ConfigError(_))));

    let result = Config::from_yaml("gesture:\n  hand_ordering: sideways\n");
    assert!(matches!(result, Err(Error::ConfigError(_))));
}

#[test]
fn test_validation_rejects_bad_values() {
    let cases: Vec<fn(&mut Config)> = vec![
        |c| c.camera.width = 0,
        |c| c.gesture.smoothing_alpha = 0.0,
        |c| c.gesture.leeway_px = -1.0,
        |c| c.brightness.scale_factor = 0.0,
        |c| c.brightness.dead_zone_px = f64::NAN,
        |c| c.audio.sample_rate = 0,
        |c| c.audio.queue_capacity = 0,
        |c| c.simulation.fps = 0,
        |c| c.simulation.gesture_period_secs = 0.0,
    ];

    for mutate in cases {
        let mut config = Config::default();
        mutate(&mut config);
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
    }
}
