// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Agent supervision and pipeline orchestration engine.
//!
//! Owns the in-memory coordination logic on top of `panopticon-storage`'s
//! durable records and `panopticon-adapters`' external-process drivers:
//! health classification, the specialist registry, the pipeline
//! controller, the worker agent supervisor, the global mutation
//! lock, the patrol loop, and the pending-question broker.

mod convert;
pub mod health;
pub mod lock;
pub mod patrol;
pub mod pipeline;
pub mod questions;
pub mod specialists;
pub mod workers;

pub use health::classify;
pub use lock::{GlobalMutationLock, LockGuard};
pub use patrol::{PatrolLoop, PatrolReport};
pub use pipeline::PipelineController;
pub use questions::QuestionBroker;
pub use specialists::SpecialistRegistry;
pub use workers::WorkerSupervisor;
