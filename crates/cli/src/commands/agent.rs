// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker agent commands: spawn, message, suspend/resume, handoff,
//! and the Pending-Question Broker surface.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use panopticon_core::{QuestionAnswer, WorkerRuntimeState};

use crate::client::{AgentView, DaemonClient};
use crate::output::{format_time_ago, OutputFormat};
use crate::table::{Column, Table};

#[derive(Args)]
pub struct AgentArgs {
    #[command(subcommand)]
    pub command: AgentCommand,
}

#[derive(Subcommand)]
pub enum AgentCommand {
    /// List all worker agents
    List,
    /// Show a single agent's record and cached health
    Get { agent_id: String },
    /// Spawn a new worker agent for an issue
    Spawn {
        issue_id: String,
        workspace_path: PathBuf,
        #[arg(long)]
        runtime_kind: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
    /// Kill a worker agent's session
    Kill { agent_id: String },
    /// Send a message to a running agent's session
    Message { agent_id: String, text: String },
    /// Poke an idle/stuck agent with a nudge message
    Poke {
        agent_id: String,
        #[arg(long)]
        message: Option<String>,
    },
    /// Suspend an agent, freeing its tmux session
    Suspend {
        agent_id: String,
        #[arg(long)]
        session_token: Option<String>,
    },
    /// Resume a suspended agent
    Resume {
        agent_id: String,
        #[arg(long)]
        message: Option<String>,
    },
    /// Hand an agent off to a different declared model
    Handoff {
        agent_id: String,
        to_model: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Show recent activity log entries for an agent
    Activity {
        agent_id: String,
        #[arg(long, default_value = "50")]
        limit: usize,
    },
    /// List an agent's unanswered pending questions
    PendingQuestions { agent_id: String },
    /// Answer one or more pending questions (`tool_id=answer text`)
    Answer {
        agent_id: String,
        #[arg(required = true, value_parser = parse_answer)]
        answers: Vec<QuestionAnswer>,
    },
    /// Record a heartbeat for an agent (invoked by the agent's own hooks)
    #[command(hide = true)]
    Heartbeat {
        agent_id: String,
        state: String,
        #[arg(long)]
        tool: Option<String>,
        #[arg(long)]
        session_id: Option<String>,
    },
}

fn parse_answer(s: &str) -> Result<QuestionAnswer, String> {
    let (tool_id, answer) = s
        .split_once('=')
        .ok_or_else(|| format!("expected 'tool_id=answer', got '{s}'"))?;
    Ok(QuestionAnswer { tool_id: tool_id.to_string(), answer: answer.to_string() })
}

fn parse_runtime_state(s: &str) -> WorkerRuntimeState {
    match s {
        "working" => WorkerRuntimeState::Working,
        "waiting_for_input" => WorkerRuntimeState::WaitingForInput,
        "suspended" => WorkerRuntimeState::Suspended,
        "exited" => WorkerRuntimeState::Exited,
        other => WorkerRuntimeState::Other(other.to_string()),
    }
}

pub async fn handle(
    command: AgentCommand,
    client: &DaemonClient,
    format: OutputFormat,
) -> Result<()> {
    match command {
        AgentCommand::List => {
            let agents = client.agent_list().await?;
            print_agents(&agents, format)
        }
        AgentCommand::Get { agent_id } => {
            let agent = client.agent_get(&agent_id).await?;
            print_agent(&agent, format)
        }
        AgentCommand::Spawn { issue_id, workspace_path, runtime_kind, model } => {
            let agent = client.agent_spawn(&issue_id, workspace_path, runtime_kind, model).await?;
            print_agent(&agent, format)
        }
        AgentCommand::Kill { agent_id } => {
            client.agent_kill(&agent_id).await?;
            println!("killed {agent_id}");
            Ok(())
        }
        AgentCommand::Message { agent_id, text } => {
            client.agent_message(&agent_id, &text).await?;
            Ok(())
        }
        AgentCommand::Poke { agent_id, message } => {
            client.agent_poke(&agent_id, message).await?;
            Ok(())
        }
        AgentCommand::Suspend { agent_id, session_token } => {
            client.agent_suspend(&agent_id, session_token).await?;
            println!("suspended {agent_id}");
            Ok(())
        }
        AgentCommand::Resume { agent_id, message } => {
            let agent = client.agent_resume(&agent_id, message).await?;
            print_agent(&agent, format)
        }
        AgentCommand::Handoff { agent_id, to_model, reason } => {
            let agent = client.agent_handoff(&agent_id, &to_model, reason).await?;
            print_agent(&agent, format)
        }
        AgentCommand::Activity { agent_id, limit } => {
            let entries = client.agent_activity(&agent_id, limit).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
                OutputFormat::Text => {
                    for entry in &entries {
                        println!("{entry}");
                    }
                }
            }
            Ok(())
        }
        AgentCommand::PendingQuestions { agent_id } => {
            let questions = client.agent_pending_questions(&agent_id).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&questions)?),
                OutputFormat::Text => {
                    if questions.is_empty() {
                        println!("no pending questions for {agent_id}");
                    }
                    for q in &questions {
                        println!("{}: {}", q.tool_id, q.prompt);
                        for (i, opt) in q.options.iter().enumerate() {
                            println!("  {}) {}", i + 1, opt.label);
                        }
                        println!("  {}) (custom answer)", q.custom_choice_index());
                    }
                }
            }
            Ok(())
        }
        AgentCommand::Answer { agent_id, answers } => {
            client.agent_answer_question(&agent_id, answers).await?;
            Ok(())
        }
        AgentCommand::Heartbeat { agent_id, state, tool, session_id } => {
            client.agent_heartbeat(&agent_id, parse_runtime_state(&state), tool, session_id).await?;
            Ok(())
        }
    }
}

fn print_agents(agents: &[AgentView], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(agents)?),
        OutputFormat::Text => {
            let mut table = Table::new(vec![
                Column::left("AGENT"),
                Column::left("ISSUE"),
                Column::status("HEALTH"),
                Column::left("MODEL"),
                Column::muted("LAST SEEN"),
            ]);
            for agent in agents {
                table.row(vec![
                    agent.agent_id.clone(),
                    agent.issue_id.clone(),
                    agent.health.as_ref().map(|h| h.status.to_string()).unwrap_or_else(|| "-".to_string()),
                    agent.declared_model.clone(),
                    agent
                        .health
                        .as_ref()
                        .map(|h| format_time_ago(h.computed_at_ms))
                        .unwrap_or_else(|| "-".to_string()),
                ]);
            }
            table.render(&mut std::io::stdout());
            if agents.is_empty() {
                println!("no worker agents");
            }
        }
    }
    Ok(())
}

fn print_agent(agent: &AgentView, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(agent)?),
        OutputFormat::Text => {
            println!("agent       {}", agent.agent_id);
            println!("issue       {}", agent.issue_id);
            println!("workspace   {}", agent.workspace_path.display());
            println!("model       {}", agent.declared_model);
            match &agent.health {
                Some(h) => println!("health      {} ({} ago)", h.status, format_time_ago(h.computed_at_ms)),
                None => println!("health      unknown"),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
