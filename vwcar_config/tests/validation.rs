use rstest::rstest;
use vwcar_config::{NetworkLocation, Platform, RadarMode, Transmission, load_file, load_toml};

const MINIMAL: &str = r#"
[car]
platform = "mqb"
"#;

#[test]
fn minimal_config_uses_defaults() {
    let cfg = load_toml(MINIMAL).expect("parse TOML");
    cfg.validate().expect("valid");
    assert_eq!(cfg.car.platform, Platform::Mqb);
    assert_eq!(cfg.car.transmission, Transmission::Automatic);
    assert_eq!(cfg.car.network_location, NetworkLocation::FwdCamera);
    assert_eq!(cfg.car.radar, RadarMode::Acc);
    assert!(cfg.car.pcm_cruise);
    assert!(cfg.car.pcm_cruise_speed);
    assert!(!cfg.car.openpilot_longitudinal);
    assert_eq!(cfg.buttons.press_cap, 5);
    assert_eq!(cfg.buttons.hold_interval, 7);
    assert_eq!(cfg.lead.upscaled_marker, 512);
    assert_eq!(cfg.lead.marker, 8);
}

#[test]
fn full_config_round_trips_values() {
    let toml = r#"
[car]
platform = "meb"
network_location = "gateway"
radar = "cruise_only"
enable_bsm = true
openpilot_longitudinal = true
pcm_cruise = true
pcm_cruise_speed = false
v_ego_stopping = 0.25

[limits]
accel_max = 1.5
steer_max = 250

[buttons]
press_cap = 3
large_step = 5

[logging]
level = "debug"
rotation = "daily"
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid");
    assert_eq!(cfg.car.platform, Platform::Meb);
    assert_eq!(cfg.car.network_location, NetworkLocation::Gateway);
    assert_eq!(cfg.car.radar, RadarMode::CruiseOnly);
    assert!(!cfg.car.pcm_cruise_speed);
    assert_eq!(cfg.limits.accel_max, Some(1.5));
    assert_eq!(cfg.limits.steer_max, Some(250));
    assert_eq!(cfg.buttons.press_cap, 3);
    assert_eq!(cfg.buttons.large_step, 5);
    // untouched keys keep their defaults
    assert_eq!(cfg.buttons.hold_interval, 7);
}

#[test]
fn rejects_unknown_platform() {
    let toml = r#"
[car]
platform = "mlb"
"#;
    assert!(load_toml(toml).is_err());
}

#[rstest]
#[case("[car]\nplatform = \"pq\"\ntransmission = \"direct\"\n", "not available on pq")]
#[case("[car]\nplatform = \"meb\"\ntransmission = \"manual\"\n", "must be \"automatic\" on meb")]
#[case("[car]\nplatform = \"mqb\"\nv_ego_stopping = -1.0\n", "v_ego_stopping must be >= 0.0")]
#[case(
    "[car]\nplatform = \"mqb\"\npcm_cruise = false\npcm_cruise_speed = false\n",
    "requires car.pcm_cruise"
)]
#[case("[car]\nplatform = \"mqb\"\n[limits]\naccel_max = 0.0\n", "accel_max must be in")]
#[case("[car]\nplatform = \"mqb\"\n[limits]\naccel_min = 1.0\n", "accel_min must be in")]
#[case("[car]\nplatform = \"mqb\"\n[limits]\nsteer_max = 0\n", "steer_max must be in")]
#[case("[car]\nplatform = \"mqb\"\n[limits]\nsteer_delta_up = 0\n", "steer_delta_up must be > 0")]
#[case("[car]\nplatform = \"mqb\"\n[buttons]\npress_cap = 0\n", "press_cap must be >= 1")]
#[case("[car]\nplatform = \"mqb\"\n[buttons]\nhold_interval = 0\n", "hold_interval must be >= 1")]
#[case("[car]\nplatform = \"mqb\"\n[lead]\nmax_distance_m = 0.0\n", "max_distance_m must be > 0.0")]
#[case("[car]\nplatform = \"mqb\"\n[logging]\nrotation = \"weekly\"\n", "rotation must be one of")]
fn rejects_out_of_range(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    assert!(
        format!("{err}").to_lowercase().contains(&needle.to_lowercase()),
        "unexpected error: {err}"
    );
}

#[test]
fn load_file_reads_and_validates() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("car.toml");
    std::fs::write(&path, MINIMAL).expect("write");
    let cfg = load_file(&path).expect("load");
    assert_eq!(cfg.car.platform, Platform::Mqb);

    let bad = dir.path().join("bad.toml");
    std::fs::write(&bad, "[car]\nplatform = \"mqb\"\n[buttons]\npress_cap = 0\n").expect("write");
    assert!(load_file(&bad).is_err());

    let missing = dir.path().join("missing.toml");
    let err = load_file(&missing).expect_err("missing file");
    assert!(format!("{err}").contains("read config"));
}
