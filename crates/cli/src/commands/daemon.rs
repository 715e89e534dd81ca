// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pano daemon` - daemon lifecycle management.

use std::path::PathBuf;
use std::process::Command;

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use panopticon_config::PanopticonPaths;

use crate::client::DaemonClient;
use crate::daemon_process::stop_daemon_sync;
use crate::output::{display_log, OutputFormat};

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon (foreground or background)
    Start {
        /// Run in foreground (useful for debugging)
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the daemon
    Stop,
    /// Stop and restart the daemon
    Restart,
    /// Check daemon status
    Status,
    /// View daemon logs
    Logs {
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
        #[arg(long, conflicts_with = "limit")]
        no_limit: bool,
        #[arg(long, short)]
        follow: bool,
    },
}

pub async fn handle(args: DaemonArgs, format: OutputFormat) -> Result<()> {
    match args.command {
        DaemonCommand::Start { foreground } => start(foreground).await,
        DaemonCommand::Stop => stop().await,
        DaemonCommand::Restart => restart().await,
        DaemonCommand::Status => status(format).await,
        DaemonCommand::Logs { limit, no_limit, follow } => logs(limit, no_limit, follow, format).await,
    }
}

async fn start(foreground: bool) -> Result<()> {
    if foreground {
        let panod_path = find_panod_binary();
        let status = Command::new(&panod_path).status()?;
        if !status.success() {
            return Err(anyhow!("daemon exited with status: {}", status));
        }
        return Ok(());
    }

    if let Ok(client) = DaemonClient::connect() {
        if client.ping().await.is_ok() {
            println!("daemon already running");
            return Ok(());
        }
    }

    match DaemonClient::for_action() {
        Ok(_client) => {
            println!("daemon started");
            Ok(())
        }
        Err(e) => Err(anyhow!("{}", e)),
    }
}

async fn stop() -> Result<()> {
    let running = DaemonClient::connect().is_ok();
    if !running {
        println!("daemon not running");
        return Ok(());
    }
    if let Ok(client) = DaemonClient::connect() {
        let _ = client.shutdown().await;
    }
    stop_daemon_sync();
    println!("daemon stopped");
    Ok(())
}

async fn restart() -> Result<()> {
    stop().await?;
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    match DaemonClient::for_action() {
        Ok(_client) => {
            println!("daemon restarted");
            Ok(())
        }
        Err(e) => Err(anyhow!("{}", e)),
    }
}

async fn status(format: OutputFormat) -> Result<()> {
    let not_running = || match format {
        OutputFormat::Text => {
            println!("daemon not running");
            Ok(())
        }
        OutputFormat::Json => {
            println!(r#"{{ "status": "not_running" }}"#);
            Ok(())
        }
    };

    let client = match DaemonClient::connect() {
        Ok(c) => c,
        Err(_) => return not_running(),
    };

    let status = match client.status().await {
        Ok(status) => status,
        Err(crate::client::ClientError::DaemonNotRunning) => return not_running(),
        Err(e) => return Err(anyhow!("{}", e)),
    };

    match format {
        OutputFormat::Text => {
            println!("status              running");
            println!("version             {}", status.version);
            println!("uptime              {}", format_uptime(status.uptime_secs));
            println!("agents              {}", status.agent_count);
            println!("pending operations  {}", status.pending_operations);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
    }

    Ok(())
}

async fn logs(limit: usize, no_limit: bool, follow: bool, format: OutputFormat) -> Result<()> {
    let log_path = PanopticonPaths::resolve().daemon_log_file();

    if !log_path.exists() {
        match format {
            OutputFormat::Text => println!("no log file found at {}", log_path.display()),
            OutputFormat::Json => {
                let obj = serde_json::json!({
                    "log_path": log_path.to_string_lossy(),
                    "lines": [],
                });
                println!("{}", serde_json::to_string_pretty(&obj)?);
            }
        }
        return Ok(());
    }

    let content = if no_limit {
        std::fs::read_to_string(&log_path)?
    } else {
        read_last_lines(&log_path, limit)?
    };
    display_log(&log_path, &content, follow, format, "daemon", "log").await
}

fn read_last_lines(path: &std::path::Path, n: usize) -> Result<String> {
    use std::io::{BufRead, BufReader};
    let file = std::fs::File::open(path)?;
    let lines: Vec<String> = BufReader::new(file).lines().collect::<std::io::Result<_>>()?;
    let start = lines.len().saturating_sub(n);
    Ok(lines[start..].join("\n"))
}

fn format_uptime(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;
    if hours > 0 {
        format!("{hours}h {mins}m {secs}s")
    } else if mins > 0 {
        format!("{mins}m {secs}s")
    } else {
        format!("{secs}s")
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

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
