// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use panopticon_core::{AgentRecord, HealthRecord, HealthStatus, RuntimeRecord, WorkerRuntimeState};
use tempfile::tempdir;

fn store() -> (tempfile::TempDir, AgentStore) {
    let dir = tempdir().unwrap();
    let store = AgentStore::new(dir.path());
    (dir, store)
}

fn sample_record(id: &str) -> AgentRecord {
    AgentRecord::new(
        AgentId::new(id),
        panopticon_core::IssueId::new("PAN-100"),
        PathBuf::from("/workspaces/pan-100"),
        "claude",
        "sonnet",
        1_000,
    )
}

#[test]
fn load_missing_state_is_none() {
    let (_dir, store) = store();
    assert!(store.load_state(&AgentId::new("agent-pan-1")).unwrap().is_none());
}

#[test]
fn save_then_load_state_roundtrips() {
    let (_dir, store) = store();
    let record = sample_record("agent-pan-100");
    store.save_state(&record).unwrap();
    let loaded = store.load_state(&record.id).unwrap().unwrap();
    assert_eq!(loaded.id, record.id);
    assert_eq!(loaded.issue_id, record.issue_id);
}

#[test]
fn exists_reflects_directory_presence_not_liveness() {
    let (_dir, store) = store();
    let record = sample_record("agent-pan-100");
    assert!(!store.exists(&record.id));
    store.save_state(&record).unwrap();
    assert!(store.exists(&record.id));
}

#[test]
fn merge_state_is_read_modify_write() {
    let (_dir, store) = store();
    let record = sample_record("agent-pan-100");
    store.save_state(&record).unwrap();
    store
        .merge_state(&record.id, |r| r.consecutive_failures += 1)
        .unwrap();
    let loaded = store.load_state(&record.id).unwrap().unwrap();
    assert_eq!(loaded.consecutive_failures, 1);
}

#[test]
fn merge_state_on_missing_agent_is_not_found() {
    let (_dir, store) = store();
    let err = store
        .merge_state(&AgentId::new("agent-missing"), |_| {})
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[test]
fn runtime_defaults_when_absent() {
    let (_dir, store) = store();
    let id = AgentId::new("agent-pan-100");
    let runtime = store.load_runtime(&id).unwrap();
    assert_eq!(runtime.state, WorkerRuntimeState::Working);
}

#[test]
fn merge_runtime_persists_heartbeat_fields() {
    let (_dir, store) = store();
    let id = AgentId::new("agent-pan-100");
    store
        .merge_runtime(&id, |r| {
            r.state = WorkerRuntimeState::WaitingForInput;
            r.current_tool = Some("Read".to_string());
            r.last_activity_ms = Some(42);
        })
        .unwrap();
    let loaded = store.load_runtime(&id).unwrap();
    assert_eq!(loaded.state, WorkerRuntimeState::WaitingForInput);
    assert_eq!(loaded.current_tool.as_deref(), Some("Read"));
    assert_eq!(loaded.last_activity_ms, Some(42));
}

#[test]
fn health_roundtrips() {
    let (_dir, store) = store();
    let id = AgentId::new("agent-pan-100");
    store
        .save_health(
            &id,
            &HealthRecord {
                status: HealthStatus::Stuck,
                computed_at_ms: 5_000,
            },
        )
        .unwrap();
    let loaded = store.load_health(&id).unwrap().unwrap();
    assert_eq!(loaded.status, HealthStatus::Stuck);
}

#[test]
fn session_id_roundtrips_and_trims_whitespace() {
    let (_dir, store) = store();
    let id = AgentId::new("agent-pan-100");
    assert_eq!(store.read_session_id(&id).unwrap(), None);
    store.save_session_id(&id, "sess-abc123\n").unwrap();
    assert_eq!(store.read_session_id(&id).unwrap().as_deref(), Some("sess-abc123"));
}

#[test]
fn activity_read_empty_before_any_append() {
    let (_dir, store) = store();
    let id = AgentId::new("agent-pan-100");
    assert!(store.read_activity(&id, 10).unwrap().is_empty());
}

#[test]
fn activity_append_and_read_preserves_order() {
    let (_dir, store) = store();
    let id = AgentId::new("agent-pan-100");
    for i in 0..5 {
        store
            .append_activity(&id, &serde_json::json!({"seq": i}), 100)
            .unwrap();
    }
    let entries = store.read_activity(&id, 100).unwrap();
    let seqs: Vec<i64> = entries.iter().map(|v| v["seq"].as_i64().unwrap()).collect();
    assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
}

/// The 101st activity entry purges the oldest when retention is 100.
#[test]
fn activity_retention_purges_oldest_entry() {
    let (_dir, store) = store();
    let id = AgentId::new("agent-pan-100");
    for i in 0..101 {
        store
            .append_activity(&id, &serde_json::json!({"seq": i}), 100)
            .unwrap();
    }
    let entries = store.read_activity(&id, 200).unwrap();
    assert_eq!(entries.len(), 100);
    assert_eq!(entries.first().unwrap()["seq"], 1);
    assert_eq!(entries.last().unwrap()["seq"], 100);
}

/// A torn trailing line yields the same pending set as if it were
/// absent entirely.
#[test]
fn activity_read_tolerates_truncated_trailing_line() {
    let (_dir, store) = store();
    let id = AgentId::new("agent-pan-100");
    store
        .append_activity(&id, &serde_json::json!({"seq": 0}), 100)
        .unwrap();
    // Simulate a writer crashing mid-line.
    let path = _dir.path().join(id.as_str()).join("activity.ndjson");
    let mut contents = std::fs::read_to_string(&path).unwrap();
    contents.push_str("{\"seq\": 1, \"trunc");
    std::fs::write(&path, contents).unwrap();

    let entries = store.read_activity(&id, 100).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["seq"], 0);
}

#[test]
fn read_activity_limit_returns_most_recent() {
    let (_dir, store) = store();
    let id = AgentId::new("agent-pan-100");
    for i in 0..10 {
        store
            .append_activity(&id, &serde_json::json!({"seq": i}), 100)
            .unwrap();
    }
    let entries = store.read_activity(&id, 3).unwrap();
    let seqs: Vec<i64> = entries.iter().map(|v| v["seq"].as_i64().unwrap()).collect();
    assert_eq!(seqs, vec![7, 8, 9]);
}

/// kill (purge) is idempotent.
#[test]
fn purge_is_idempotent() {
    let (_dir, store) = store();
    let record = sample_record("agent-pan-100");
    store.save_state(&record).unwrap();
    store.purge(&record.id).unwrap();
    assert!(!store.exists(&record.id));
    store.purge(&record.id).unwrap();
}

#[test]
fn list_agent_ids_enumerates_all_state_directories() {
    let (_dir, store) = store();
    store.save_state(&sample_record("agent-pan-100")).unwrap();
    store.save_state(&sample_record("agent-pan-200")).unwrap();
    let mut ids: Vec<String> = store
        .list_agent_ids()
        .unwrap()
        .into_iter()
        .map(|id| id.to_string())
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["agent-pan-100", "agent-pan-200"]);
}
