// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let config = EngineConfig::load(&path).unwrap();
    assert_eq!(config.patrol_interval, Duration::from_secs(30));
    assert_eq!(config.circuit_breaker_max, 3);
    assert_eq!(config.specialists.len(), 3);
}

#[test]
fn partial_overrides_apply_over_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(
        f,
        r#"
patrol_interval_sec = 10
circuit_breaker_max = 5

[health_thresholds]
stuck_sec = 1200
"#
    )
    .unwrap();
    let config = EngineConfig::load(&path).unwrap();
    assert_eq!(config.patrol_interval, Duration::from_secs(10));
    assert_eq!(config.circuit_breaker_max, 5);
    assert_eq!(config.health_thresholds.stuck, Duration::from_secs(1200));
    // Unmentioned fields keep their default.
    assert_eq!(config.health_thresholds.stale, Duration::from_secs(120));
    assert_eq!(config.activity_retention, 100);
}

#[test]
fn operation_ceiling_overrides_the_ten_minute_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "operation_ceiling_sec = 60\n").unwrap();
    let config = EngineConfig::load(&path).unwrap();
    assert_eq!(config.operation_ceiling, Duration::from_secs(60));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "not valid = [toml").unwrap();
    assert!(matches!(
        EngineConfig::load(&path),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn unknown_specialist_name_is_ignored_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[specialists.not-a-real-specialist]
command = "echo"
"#,
    )
    .unwrap();
    let config = EngineConfig::load(&path).unwrap();
    assert_eq!(config.specialists.len(), 3);
}