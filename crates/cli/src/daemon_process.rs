// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `panod` process management: starting, stopping, and probing the daemon
//! process from the CLI side of the socket.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use panopticon_config::PanopticonPaths;

use crate::client::ClientError;

/// Start `panod` in the background, returning the child process handle.
pub fn start_daemon_background() -> Result<std::process::Child, ClientError> {
    let panod_path = find_panod_binary();

    Command::new(&panod_path)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|e| ClientError::DaemonStartFailed(e.to_string()))
}

/// Stop the daemon synchronously via SIGTERM, polling for exit.
pub fn stop_daemon_sync() {
    if let Ok(Some(pid)) = read_daemon_pid() {
        kill_signal("-15", pid);

        let start = Instant::now();
        let timeout = crate::env::timeout_exit();
        while start.elapsed() < timeout {
            if !process_exists(pid) {
                return;
            }
            std::thread::sleep(Duration::from_millis(50));
        }

        if process_exists(pid) {
            force_kill_daemon(pid);
        }
    }
}

/// Find the `panod` binary: env override, then a sibling of the running
/// `pano` executable, then bare `panod` resolved via `PATH`.
fn find_panod_binary() -> PathBuf {
    if let Some(path) = crate::env::daemon_binary() {
        return PathBuf::from(path);
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("panod");
            if sibling.exists() {
                return sibling;
            }
        }
    }

    PathBuf::from("panod")
}

pub fn daemon_socket() -> PathBuf {
    PanopticonPaths::resolve().socket_file()
}

fn daemon_lock_file() -> PathBuf {
    PanopticonPaths::resolve().lock_file()
}

/// Read the PID recorded in the daemon's lock file, if any.
pub fn read_daemon_pid() -> Result<Option<u32>, ClientError> {
    let lock_path = daemon_lock_file();
    if !lock_path.exists() {
        return Ok(None);
    }
    match std::fs::read_to_string(&lock_path) {
        Ok(content) => Ok(content.trim().parse::<u32>().ok()),
        Err(_) => Ok(None),
    }
}

fn kill_signal(signal: &str, pid: u32) -> bool {
    Command::new("kill")
        .args([signal, &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn process_exists(pid: u32) -> bool {
    kill_signal("-0", pid)
}

pub fn force_kill_daemon(pid: u32) -> bool {
    kill_signal("-9", pid)
}

/// Probe whether a Unix socket is accepting connections.
pub fn probe_socket(socket_path: &Path) -> bool {
    std::os::unix::net::UnixStream::connect(socket_path).is_ok()
}

/// Remove a stale socket left behind by a daemon that is no longer running.
pub fn cleanup_stale_socket() {
    let socket_path = daemon_socket();
    let lock_path = daemon_lock_file();

    let daemon_alive = read_daemon_pid()
        .ok()
        .flatten()
        .map(process_exists)
        .unwrap_or(false);

    if !daemon_alive {
        let _ = std::fs::remove_file(&socket_path);
        let _ = std::fs::remove_file(&lock_path);
    }
}
