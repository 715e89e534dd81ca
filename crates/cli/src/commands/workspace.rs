// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Review→test→merge pipeline commands and the Operation Journal
//! listing of in-flight long-running operations.

use std::time::Duration;

use anyhow::Result;
use clap::{Args, Subcommand};
use panopticon_core::MergeState;

use crate::client::DaemonClient;
use crate::output::OutputFormat;
use crate::poll::{Poller, Tick};
use crate::table::{Column, Table};

#[derive(Args)]
pub struct WorkspaceArgs {
    #[command(subcommand)]
    pub command: WorkspaceCommand,
}

#[derive(Subcommand)]
pub enum WorkspaceCommand {
    /// Start (or requeue) review for an issue's branch
    Review {
        issue_id: String,
        #[arg(long)]
        branch: Option<String>,
    },
    /// Show review/test/merge status for one issue, or all issues if omitted
    Status {
        issue_id: Option<String>,
        /// Poll until the issue reaches a terminal state (ready for merge,
        /// merged, or needs human action) instead of printing once
        #[arg(long, requires = "issue_id")]
        wait: bool,
        /// Give up waiting after this many seconds (default: no limit)
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// List in-flight operations from the Operation Journal
    Operations,
}

pub async fn handle(
    command: WorkspaceCommand,
    client: &DaemonClient,
    format: OutputFormat,
) -> Result<()> {
    match command {
        WorkspaceCommand::Review { issue_id, branch } => {
            let queued = client.review_start(&issue_id, branch).await?;
            if queued {
                println!("review queued for {issue_id} (review-agent busy)");
            } else {
                println!("review started for {issue_id}");
            }
            Ok(())
        }
        WorkspaceCommand::Status { issue_id, wait, timeout_secs } => match issue_id {
            Some(issue_id) if wait => {
                wait_for_terminal_status(client, &issue_id, timeout_secs, format).await
            }
            Some(issue_id) => {
                let status = client.review_status_get(&issue_id).await?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
                    OutputFormat::Text => match status {
                        Some(status) => print_status_line(&issue_id, &status),
                        None => println!("no review status recorded for {issue_id}"),
                    },
                }
                Ok(())
            }
            None => {
                let statuses = client.review_status_all().await?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&statuses)?),
                    OutputFormat::Text => {
                        let mut table = Table::new(vec![
                            Column::left("ISSUE"),
                            Column::status("REVIEW"),
                            Column::status("TEST"),
                            Column::left("READY"),
                        ]);
                        for (issue, status) in &statuses {
                            table.row(vec![
                                issue.clone(),
                                format!("{:?}", status.review_status).to_lowercase(),
                                format!("{:?}", status.test_status).to_lowercase(),
                                status.ready_for_merge.to_string(),
                            ]);
                        }
                        table.render(&mut std::io::stdout());
                        if statuses.is_empty() {
                            println!("no review status recorded");
                        }
                    }
                }
                Ok(())
            }
        },
        WorkspaceCommand::Operations => {
            let operations = client.operations_list().await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&operations)?),
                OutputFormat::Text => {
                    let mut table = Table::new(vec![
                        Column::left("ISSUE"),
                        Column::left("TYPE"),
                        Column::status("STATUS"),
                        Column::muted("STARTED"),
                    ]);
                    for op in &operations {
                        table.row(vec![
                            op.issue_id.as_str().to_string(),
                            format!("{:?}", op.op_type).to_lowercase(),
                            format!("{:?}", op.status).to_lowercase(),
                            crate::output::format_time_ago(op.started_at_ms),
                        ]);
                    }
                    table.render(&mut std::io::stdout());
                    if operations.is_empty() {
                        println!("no in-flight operations");
                    }
                }
            }
            Ok(())
        }
    }
}

/// An issue is done for waiting purposes once it's ready to merge, already
/// merged or failed, or stuck needing a human's attention.
fn is_settled(status: &panopticon_core::ReviewStatus) -> bool {
    status.ready_for_merge
        || status.needs_human_action()
        || matches!(status.merge_status, Some(MergeState::Merged) | Some(MergeState::Failed))
}

/// Poll review status until the issue is ready for merge, merged, failed, or
/// needs human attention — whichever comes first — or the timeout elapses.
async fn wait_for_terminal_status(
    client: &DaemonClient,
    issue_id: &str,
    timeout_secs: Option<u64>,
    format: OutputFormat,
) -> Result<()> {
    let mut poller = Poller::new(Duration::from_secs(2), timeout_secs.map(Duration::from_secs));
    loop {
        let status = client.review_status_get(issue_id).await?;
        if let Some(status) = &status {
            if is_settled(status) {
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
                    OutputFormat::Text => print_status_line(issue_id, status),
                }
                return Ok(());
            }
        }

        match poller.tick().await {
            Tick::Ready => continue,
            Tick::Timeout => {
                println!("timed out waiting for {issue_id}");
                return Ok(());
            }
            Tick::Interrupted => {
                println!("interrupted");
                return Ok(());
            }
        }
    }
}

fn print_status_line(issue_id: &str, status: &panopticon_core::ReviewStatus) {
    println!("issue        {issue_id}");
    println!("review       {:?}", status.review_status);
    println!("test         {:?}", status.test_status);
    if let Some(merge) = status.merge_status {
        println!("merge        {merge:?}");
    }
    println!("ready        {}", status.ready_for_merge);
    if !status.review_notes.is_empty() {
        println!("review notes {}", status.review_notes);
    }
    if !status.test_notes.is_empty() {
        println!("test notes   {}", status.test_notes);
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
