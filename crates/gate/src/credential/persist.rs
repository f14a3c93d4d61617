// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Auth-state persistence: load/save to JSON file with atomic writes.

use std::collections::BTreeMap;
use std::path::Path;

/// On-disk auth state: a flat key/value map (see the key constants in
/// [`crate::credential`]). Each key has a single logical writer, so
/// last-writer-wins per key is sufficient across contexts.
pub type StateMap = BTreeMap<String, serde_json::Value>;

/// Load the persisted state map from a JSON file.
///
/// A missing file is an empty map, not an error. Only unreadable or
/// corrupt state surfaces as `Err` (callers fail closed on it).
pub fn load(path: &Path) -> anyhow::Result<StateMap> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let state: StateMap = serde_json::from_str(&contents)?;
            Ok(state)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StateMap::new()),
        Err(e) => Err(e.into()),
    }
}

/// Save the state map to a JSON file atomically (write tmp + rename).
///
/// Uses a unique temp filename (PID + counter) to avoid corruption when
/// concurrent saves race on the same `.tmp` file — a shorter write can leave
/// trailing bytes from a longer previous write.
pub fn save(path: &Path, state: &StateMap) -> anyhow::Result<()> {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    if let Some(dir) = path.parent() {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
        }
    }

    let json = serde_json::to_string_pretty(state)?;
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(
        "{}.{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id(),
        seq,
    );
    let tmp_path = path.with_file_name(tmp_name);
    std::fs::write(&tmp_path, json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
