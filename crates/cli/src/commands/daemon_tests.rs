// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn format_uptime_renders_hours_minutes_seconds() {
    assert_eq!(format_uptime(5), "5s");
    assert_eq!(format_uptime(65), "1m 5s");
    assert_eq!(format_uptime(3725), "1h 2m 5s");
}

#[test]
fn find_panod_binary_honors_env_override() {
    std::env::set_var("PANO_DAEMON_BINARY", "/custom/panod");
    assert_eq!(find_panod_binary(), PathBuf::from("/custom/panod"));
    std::env::remove_var("PANO_DAEMON_BINARY");
}