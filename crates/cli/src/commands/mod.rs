// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subcommand modules. Each owns its `clap` arg struct plus a `handle`
//! entry point dispatched from `main.rs`.

pub mod agent;
pub mod daemon;
pub mod specialist;
pub mod workspace;

use panopticon_core::{Priority, SpecialistName};

/// Parse a `SpecialistName` from a CLI-facing string (`review`, `test`,
/// `merge`, or their `-agent` suffixed forms).
pub fn parse_specialist_name(s: &str) -> Result<SpecialistName, String> {
    SpecialistName::parse(s).ok_or_else(|| {
        format!("unknown specialist '{s}' (expected review-agent, test-agent, or merge-agent)")
    })
}

/// Parse a `Priority` from a CLI-facing string.
pub fn parse_priority(s: &str) -> Result<Priority, String> {
    match s {
        "low" => Ok(Priority::Low),
        "normal" => Ok(Priority::Normal),
        "high" => Ok(Priority::High),
        "urgent" => Ok(Priority::Urgent),
        other => Err(format!("unknown priority '{other}' (expected low, normal, high, urgent)")),
    }
}
