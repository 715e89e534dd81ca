// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-temp-then-rename atomicity, shared by every store in this crate.
//!
//! Every persisted entity in `~/.panopticon` is its own file (or, for the
//! two process-wide maps, its own single file); none of them are replayed
//! from a log. Atomicity is therefore a per-file property rather than a
//! cross-file transaction: concurrent readers either see the old content or
//! the new content in full, never a partial write.

use crate::StorageError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Serialize `value` as pretty JSON and write it to `path` atomically: write
/// to `path.tmp`, then rename over `path`. `rename` is atomic on the same
/// filesystem, which is guaranteed here because the temp file is created as
/// a sibling of the target.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp_path = sibling_tmp_path(path);
    let json = serde_json::to_vec_pretty(value)?;
    std::fs::write(&tmp_path, &json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Read and parse `path` as JSON. `None` when the file does not exist yet
/// (the normal state before the first write) rather than an error.
pub fn read_json_opt<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Append a line to an append-only file, creating it (and its parent
/// directory) if necessary. Not rename-atomic — `activity.ndjson` is
/// designed to tolerate a torn trailing line on the read side instead (see
/// [`crate::agent_store::read_activity_lines`]).
pub fn append_line(path: &Path, line: &str) -> Result<(), StorageError> {
    use std::io::Write;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "{line}")?;
    Ok(())
}

fn sibling_tmp_path(path: &Path) -> std::path::PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{file_name}.tmp"))
}
