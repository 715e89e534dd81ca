// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `panod` entry point: log setup, single-instance startup, the Unix socket
//! listener, and the Patrol Loop's tick schedule.

use panopticon_config::PanopticonPaths;
use panopticon_daemon::lifecycle::{Daemon, LifecycleError};
use panopticon_daemon::listener::{ListenCtx, Listener};
use std::sync::Arc;
use tracing_subscriber::prelude::*;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

fn print_help() {
    println!("panod {VERSION}");
    println!("Agent supervision and pipeline orchestration daemon.");
    println!();
    println!("USAGE:");
    println!("    panod [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --version    Print version and exit");
    println!("    --help       Print this help and exit");
    println!();
    println!("ENVIRONMENT:");
    println!("    PANOPTICON_HOME     Override the state root (default: ~/.panopticon)");
    println!("    PANOPTICON_CONFIG   Override the config file path");
    println!("    RUST_LOG            Tracing filter (default: info)");
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--version") {
        println!("panod {VERSION}");
        return;
    }
    if args.iter().any(|a| a == "--help") {
        print_help();
        return;
    }

    let paths = PanopticonPaths::resolve();
    if let Err(e) = std::fs::create_dir_all(paths.root()) {
        eprintln!("panod: failed to create state directory: {e}");
        std::process::exit(1);
    }

    rotate_log_if_needed(&paths.daemon_log_file());
    let _log_guard = setup_logging(&paths.daemon_log_file());

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("panod: failed to start async runtime: {e}");
            std::process::exit(1);
        }
    };

    let exit_code = rt.block_on(run(paths));
    std::process::exit(exit_code);
}

async fn run(paths: PanopticonPaths) -> i32 {
    let daemon = match Daemon::startup(paths.clone()) {
        Ok(d) => Arc::new(d),
        Err(LifecycleError::AlreadyRunning { pid }) => {
            eprintln!("panod: already running (pid {pid})");
            return 1;
        }
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            eprintln!("panod: startup failed: {e}");
            return 1;
        }
    };

    let shutdown = Arc::new(tokio::sync::Notify::new());
    let ctx = Arc::new(ListenCtx {
        daemon: daemon.clone(),
        shutdown: shutdown.clone(),
    });

    let listener = match Listener::bind(&paths.socket_file(), ctx) {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(error = %e, "failed to bind socket");
            eprintln!("panod: failed to bind socket: {e}");
            daemon.shutdown();
            return 1;
        }
    };

    tracing::info!(version = VERSION, root = %paths.root().display(), "panod starting");
    println!("READY");

    let listener_task = tokio::spawn(listener.run());

    let mut patrol_interval = tokio::time::interval(daemon.config.patrol_interval);
    patrol_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to install SIGTERM handler");
            daemon.shutdown();
            return 1;
        }
    };
    let mut sigint = tokio::signal::ctrl_c();

    loop {
        tokio::select! {
            _ = patrol_interval.tick() => {
                match daemon.patrol.tick().await {
                    Ok(report) => tracing::debug!(?report, "patrol tick complete"),
                    Err(e) => tracing::warn!(error = %e, "patrol tick failed"),
                }
            }
            _ = shutdown.notified() => {
                tracing::info!("shutdown requested via socket");
                break;
            }
            _ = sigterm.recv() => {
                tracing::info!("received SIGTERM");
                break;
            }
            res = &mut sigint => {
                if res.is_ok() {
                    tracing::info!("received SIGINT");
                }
                break;
            }
        }
    }

    shutdown.notify_waiters();
    let _ = listener_task.await;
    daemon.shutdown();
    tracing::info!("panod stopped");
    0
}

/// Rotate `daemon.log` to `.log.1` (best-effort, single generation) once it
/// crosses [`MAX_LOG_BYTES`], so a long-lived daemon doesn't grow the log
/// file unboundedly.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let Ok(meta) = std::fs::metadata(log_path) else {
        return;
    };
    if meta.len() < MAX_LOG_BYTES {
        return;
    }
    let rotated = log_path.with_extension("log.1");
    let _ = std::fs::rename(log_path, rotated);
}

fn setup_logging(log_path: &std::path::Path) -> tracing_appender::non_blocking::WorkerGuard {
    let dir = log_path.parent().unwrap_or_else(|| std::path::Path::new("."));
    let file_name = log_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "daemon.log".to_string());
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    guard
}
