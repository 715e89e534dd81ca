// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parse_accepts_canonical_and_short_forms() {
    assert_eq!(SpecialistName::parse("review-agent"), Some(SpecialistName::ReviewAgent));
    assert_eq!(SpecialistName::parse("review"), Some(SpecialistName::ReviewAgent));
    assert_eq!(SpecialistName::parse("test-agent"), Some(SpecialistName::TestAgent));
    assert_eq!(SpecialistName::parse("merge-agent"), Some(SpecialistName::MergeAgent));
    assert_eq!(SpecialistName::parse("bogus"), None);
}

#[test]
fn display_round_trips_through_parse() {
    for name in SpecialistName::ALL {
        assert_eq!(SpecialistName::parse(&name.to_string()), Some(name));
    }
}

#[yare::parameterized(
    uninitialized = { SpecialistRuntimeState::Uninitialized, true },
    idle          = { SpecialistRuntimeState::Idle, true },
    suspended     = { SpecialistRuntimeState::Suspended, true },
    active        = { SpecialistRuntimeState::Active, false },
)]
fn wake_eligibility(state: SpecialistRuntimeState, expected: bool) {
    assert_eq!(state.is_wake_eligible(), expected);
}

#[test]
fn new_record_defaults_to_not_busy() {
    let record = SpecialistRecord::new(SpecialistName::ReviewAgent);
    assert!(!record.is_busy());
    assert_eq!(record.state, SpecialistRuntimeState::Uninitialized);
}
