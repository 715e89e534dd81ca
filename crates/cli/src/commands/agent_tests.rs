// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parse_answer_splits_on_first_equals() {
    let answer = parse_answer("tool-1=use option a=b").unwrap();
    assert_eq!(answer.tool_id, "tool-1");
    assert_eq!(answer.answer, "use option a=b");
}

#[test]
fn parse_answer_rejects_missing_equals() {
    assert!(parse_answer("tool-1").is_err());
}

#[test]
fn parse_runtime_state_maps_known_vocabulary() {
    assert_eq!(parse_runtime_state("working"), WorkerRuntimeState::Working);
    assert_eq!(parse_runtime_state("waiting_for_input"), WorkerRuntimeState::WaitingForInput);
    assert_eq!(parse_runtime_state("suspended"), WorkerRuntimeState::Suspended);
    assert_eq!(parse_runtime_state("exited"), WorkerRuntimeState::Exited);
}

#[test]
fn parse_runtime_state_preserves_unknown_vocabulary() {
    assert_eq!(
        parse_runtime_state("compiling"),
        WorkerRuntimeState::Other("compiling".to_string())
    );
}