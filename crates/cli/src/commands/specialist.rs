// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Specialist singleton commands: queue management, suspend/resume,
//! and the `done` report a specialist's own session posts back through
//! `pano specialist done` when it finishes a review/test/merge.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use panopticon_core::{Priority, SpecialistName, WorkItemId};

use crate::client::DaemonClient;
use crate::commands::{parse_priority, parse_specialist_name};
use crate::output::OutputFormat;
use crate::table::{Column, Table};

#[derive(Args)]
pub struct SpecialistArgs {
    #[command(subcommand)]
    pub command: SpecialistCommand,
}

#[derive(Subcommand)]
pub enum SpecialistCommand {
    /// List the three specialist singletons and their state
    List,
    /// Queue management for a specialist's priority queue
    Queue(QueueArgs),
    /// Suspend a specialist, freeing its tmux session while idle
    Suspend { name: String },
    /// Resume a suspended specialist
    Resume {
        name: String,
        #[arg(long)]
        message: Option<String>,
    },
    /// Manually wake a specialist if idle, popping its next queued item
    Wake { name: String },
    /// Force a specialist back to idle, clearing its current issue
    Reset { name: String },
    /// Reset all three specialists back to idle
    ResetAll,
    /// Ensure a specialist's durable record exists without starting it
    Init { name: String },
    /// Report a specialist's own outcome for an issue (review/test/merge)
    Done {
        name: String,
        issue_id: String,
        status: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
}

#[derive(Args)]
pub struct QueueArgs {
    #[command(subcommand)]
    pub command: QueueCommand,
}

#[derive(Subcommand)]
pub enum QueueCommand {
    /// List a specialist's queued work items
    List { name: String },
    /// Push a work item onto a specialist's queue
    Push {
        name: String,
        issue_id: String,
        workspace_path: PathBuf,
        #[arg(long)]
        branch: Option<String>,
        #[arg(long)]
        custom_prompt: Option<String>,
        #[arg(long, default_value = "normal")]
        priority: String,
    },
    /// Remove a queued item by id
    Remove { name: String, id: String },
    /// Reorder a specialist's queue to the given id order
    Reorder {
        name: String,
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

fn resolve_name(name: &str) -> Result<SpecialistName> {
    parse_specialist_name(name).map_err(anyhow::Error::msg)
}

fn resolve_priority(priority: &str) -> Result<Priority> {
    parse_priority(priority).map_err(anyhow::Error::msg)
}

pub async fn handle(
    command: SpecialistCommand,
    client: &DaemonClient,
    format: OutputFormat,
) -> Result<()> {
    match command {
        SpecialistCommand::List => {
            let records = client.specialist_list().await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
                OutputFormat::Text => {
                    let mut table = Table::new(vec![
                        Column::left("NAME"),
                        Column::status("STATE"),
                        Column::left("CURRENT ISSUE"),
                    ]);
                    for record in &records {
                        table.row(vec![
                            record.name.to_string(),
                            format!("{:?}", record.state).to_lowercase(),
                            record
                                .current_issue
                                .as_ref()
                                .map(|i| i.as_str().to_string())
                                .unwrap_or_else(|| "-".to_string()),
                        ]);
                    }
                    table.render(&mut std::io::stdout());
                }
            }
            Ok(())
        }
        SpecialistCommand::Queue(args) => handle_queue(args.command, client, format).await,
        SpecialistCommand::Suspend { name } => {
            client.specialist_suspend(resolve_name(&name)?).await?;
            println!("suspended {name}");
            Ok(())
        }
        SpecialistCommand::Resume { name, message } => {
            client.specialist_resume(resolve_name(&name)?, message).await?;
            println!("resumed {name}");
            Ok(())
        }
        SpecialistCommand::Wake { name } => {
            let queued = client.specialist_wake(resolve_name(&name)?).await?;
            if queued {
                println!("{name} is busy; item re-queued");
            } else {
                println!("woke {name}");
            }
            Ok(())
        }
        SpecialistCommand::Reset { name } => {
            client.specialist_reset(resolve_name(&name)?).await?;
            println!("reset {name}");
            Ok(())
        }
        SpecialistCommand::ResetAll => {
            client.specialist_reset_all().await?;
            println!("reset all specialists");
            Ok(())
        }
        SpecialistCommand::Init { name } => {
            let record = client.specialist_init(resolve_name(&name)?).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
                OutputFormat::Text => println!("initialized {name}"),
            }
            Ok(())
        }
        SpecialistCommand::Done { name, issue_id, status, notes } => {
            client.specialist_done(resolve_name(&name)?, &issue_id, &status, notes).await?;
            Ok(())
        }
    }
}

async fn handle_queue(
    command: QueueCommand,
    client: &DaemonClient,
    format: OutputFormat,
) -> Result<()> {
    match command {
        QueueCommand::List { name } => {
            let items = client.specialist_queue_list(resolve_name(&name)?).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&items)?),
                OutputFormat::Text => {
                    let mut table = Table::new(vec![
                        Column::left("ID"),
                        Column::left("ISSUE"),
                        Column::left("PRIORITY"),
                        Column::left("SOURCE"),
                    ]);
                    for item in &items {
                        table.row(vec![
                            item.id.as_str().to_string(),
                            item.payload.issue_id.as_str().to_string(),
                            format!("{:?}", item.priority).to_lowercase(),
                            item.source.clone(),
                        ]);
                    }
                    table.render(&mut std::io::stdout());
                    if items.is_empty() {
                        println!("queue empty");
                    }
                }
            }
            Ok(())
        }
        QueueCommand::Push { name, issue_id, workspace_path, branch, custom_prompt, priority } => {
            client
                .specialist_queue_push(
                    resolve_name(&name)?,
                    &issue_id,
                    workspace_path,
                    branch,
                    custom_prompt,
                    resolve_priority(&priority)?,
                )
                .await?;
            Ok(())
        }
        QueueCommand::Remove { name, id } => {
            let removed = client.specialist_queue_remove(resolve_name(&name)?, WorkItemId::new(id)).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&removed)?),
                OutputFormat::Text => match removed {
                    Some(item) => println!("removed {}", item.id),
                    None => println!("no matching queue item"),
                },
            }
            Ok(())
        }
        QueueCommand::Reorder { name, ids } => {
            let ids = ids.into_iter().map(WorkItemId::new).collect();
            client.specialist_queue_reorder(resolve_name(&name)?, ids).await?;
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "specialist_tests.rs"]
mod tests;
