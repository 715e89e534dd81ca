// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI crate.

use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Override for the `panod` binary path, otherwise resolved relative to the
/// running `pano` executable.
pub fn daemon_binary() -> Option<String> {
    std::env::var("PANO_DAEMON_BINARY").ok()
}

pub fn timeout_ipc() -> Duration {
    parse_duration_ms("PANO_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(10))
}

pub fn timeout_connect() -> Duration {
    parse_duration_ms("PANO_TIMEOUT_CONNECT_MS").unwrap_or(Duration::from_secs(5))
}

pub fn timeout_exit() -> Duration {
    parse_duration_ms("PANO_TIMEOUT_EXIT_MS").unwrap_or(Duration::from_secs(2))
}

pub fn poll_interval() -> Duration {
    parse_duration_ms("PANO_CONNECT_POLL_MS").unwrap_or(Duration::from_millis(50))
}
