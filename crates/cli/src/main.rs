// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! pano - Panopticon CLI

mod client;
mod color;
mod commands;
mod daemon_process;
mod env;
mod output;
mod poll;
mod table;

use output::OutputFormat;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{agent, daemon, specialist, workspace};

use crate::client::DaemonClient;

#[derive(Parser)]
#[command(
    name = "pano",
    version,
    about = "Panopticon - agent supervision and pipeline orchestration"
)]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Worker agent management
    Agent(agent::AgentArgs),
    /// Specialist singleton management
    Specialist(specialist::SpecialistArgs),
    /// Review/test/merge pipeline and operation journal
    Workspace(workspace::WorkspaceArgs),
    /// Daemon lifecycle management
    Daemon(daemon::DaemonArgs),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.output;

    match cli.command {
        Commands::Daemon(args) => daemon::handle(args, format).await,

        Commands::Agent(args) => {
            use agent::AgentCommand;
            let client = match &args.command {
                // Action: spawns, mutates, or sends input to a session
                AgentCommand::Spawn { .. }
                | AgentCommand::Kill { .. }
                | AgentCommand::Message { .. }
                | AgentCommand::Poke { .. }
                | AgentCommand::Suspend { .. }
                | AgentCommand::Resume { .. }
                | AgentCommand::Handoff { .. }
                | AgentCommand::Answer { .. } => DaemonClient::for_action()?,
                // Signal: agent-initiated hook callbacks, no auto-restart
                AgentCommand::Heartbeat { .. } => DaemonClient::for_signal()?,
                // Query: reads agent state
                AgentCommand::List
                | AgentCommand::Get { .. }
                | AgentCommand::Activity { .. }
                | AgentCommand::PendingQuestions { .. } => DaemonClient::for_query()?,
            };
            agent::handle(args.command, &client, format).await
        }

        Commands::Specialist(args) => {
            use specialist::{QueueCommand, SpecialistCommand};
            let client = match &args.command {
                SpecialistCommand::List => DaemonClient::for_query()?,
                SpecialistCommand::Queue(queue_args) => match &queue_args.command {
                    QueueCommand::List { .. } => DaemonClient::for_query()?,
                    QueueCommand::Push { .. } | QueueCommand::Remove { .. } | QueueCommand::Reorder { .. } => {
                        DaemonClient::for_action()?
                    }
                },
                // Done is an agent-initiated completion report, not a user action
                SpecialistCommand::Done { .. } => DaemonClient::for_signal()?,
                SpecialistCommand::Suspend { .. }
                | SpecialistCommand::Resume { .. }
                | SpecialistCommand::Wake { .. }
                | SpecialistCommand::Reset { .. }
                | SpecialistCommand::ResetAll
                | SpecialistCommand::Init { .. } => DaemonClient::for_action()?,
            };
            specialist::handle(args.command, &client, format).await
        }

        Commands::Workspace(args) => {
            use workspace::WorkspaceCommand;
            let client = match &args.command {
                WorkspaceCommand::Review { .. } => DaemonClient::for_action()?,
                WorkspaceCommand::Status { .. } | WorkspaceCommand::Operations => {
                    DaemonClient::for_query()?
                }
            };
            workspace::handle(args.command, &client, format).await
        }
    }
}
