use assert_cmd::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[car]
platform = "mqb"
openpilot_longitudinal = true
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

/// Ten frames of a steady 36 km/h cruise with lateral engaged.
fn write_log(dir: &tempfile::TempDir) -> PathBuf {
    let mut rows = String::from("frame,source,message,signal,value\n");
    for f in 0..10 {
        for w in [
            "ESP_VL_Radgeschw_02",
            "ESP_VR_Radgeschw_02",
            "ESP_HL_Radgeschw_02",
            "ESP_HR_Radgeschw_02",
        ] {
            rows.push_str(&format!("{f},pt,ESP_19,{w},36\n"));
        }
        rows.push_str(&format!("{f},control,,enabled,1\n"));
        rows.push_str(&format!("{f},control,,lat_active,1\n"));
        rows.push_str(&format!("{f},control,,steer,0.5\n"));
    }
    let path = dir.path().join("frames.csv");
    fs::write(&path, rows).unwrap();
    path
}

/// Validate the JSONL schema of a replay run.
#[rstest]
fn jsonl_tick_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir);
    let log = write_log(&dir);

    let out = Command::cargo_bin("vwcar")
        .unwrap()
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(&cfg)
        .arg("replay")
        .arg("--input")
        .arg(&log)
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8(out.stdout).unwrap();
    let records: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(records.len(), 10);

    for (i, rec) in records.iter().enumerate() {
        let obj = rec.as_object().unwrap();
        for key in [
            "frame",
            "tick",
            "can_valid",
            "v_ego",
            "cruise_enabled",
            "steer_fault_temporary",
            "steer_fault_permanent",
            "soft_disable_alert",
            "echo",
            "messages",
        ] {
            assert!(obj.contains_key(key), "record {i} missing {key}");
        }
        assert_eq!(rec["frame"], i as u64);
        assert_eq!(rec["tick"], i as u64 + 1);
        // MQB has no raw radar objects
        assert!(!obj.contains_key("radar"));
        for m in rec["messages"].as_array().unwrap() {
            assert!(m["name"].is_string());
            assert!(m["bus"] == 0 || m["bus"] == 2);
            assert!(m["signals"].is_object());
        }
    }

    // Steering goes out every other frame, longitudinal with it.
    let names = |i: usize| -> Vec<String> {
        records[i]["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["name"].as_str().unwrap().to_owned())
            .collect()
    };
    assert!(names(0).contains(&"HCA_01".to_owned()));
    assert!(names(0).contains(&"ACC_06".to_owned()));
    assert!(!names(1).contains(&"HCA_01".to_owned()));
    assert!(names(4).contains(&"ACC_02".to_owned()));
}

#[rstest]
fn skip_empty_drops_quiet_frames() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.toml");
    fs::write(&cfg, "[car]\nplatform = \"mqb\"\n").unwrap();
    let log = write_log(&dir);

    let out = Command::cargo_bin("vwcar")
        .unwrap()
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(&cfg)
        .arg("replay")
        .arg("--input")
        .arg(&log)
        .arg("--skip-empty")
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    let frames: Vec<u64> = stdout
        .lines()
        .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["frame"].as_u64().unwrap())
        .collect();
    // Without longitudinal control only the even steering frames carry messages.
    assert_eq!(frames, vec![0, 2, 4, 6, 8]);
}
