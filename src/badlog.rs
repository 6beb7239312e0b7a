//! A persisted skip-list of `(stage, key) -> message` consulted before
//! retrying expensive or previously-failed work.
//!
//! Loaded once at process start, mutated in memory during a run, and rewritten
//! atomically (write-to-temp + rename) at exit.

use crate::constants::Action;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

#[derive(Serialize, Deserialize, Default)]
struct BadLogPayload {
    timestamp: u64,
    entries: BTreeMap<Action, BTreeMap<Vec<u8>, String>>,
}

pub struct BadLog {
    path: Option<PathBuf>,
    payload: BadLogPayload,
    dirty: bool,
}

impl BadLog {
    /// Load from `path` if it exists; a missing file starts with an empty log.
    pub fn open(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut payload = BadLogPayload::default();
        if let Some(p) = path {
            match std::fs::read(p) {
                Ok(bytes) => {
                    payload = bincode::deserialize(&bytes)
                        .map_err(|e| anyhow::anyhow!("corrupt bad-log {}: {e}", p.display()))?;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(anyhow::anyhow!("cannot read bad-log {}: {e}", p.display())),
            }
        }
        Ok(Self {
            path: path.map(Path::to_path_buf),
            payload,
            dirty: false,
        })
    }

    pub fn get(&self, action: Action, key: &[u8]) -> Option<&str> {
        self.payload
            .entries
            .get(&action)
            .and_then(|m| m.get(key))
            .map(String::as_str)
    }

    /// Record a failed attempt. The message must be non-empty.
    pub fn set(&mut self, action: Action, key: Vec<u8>, message: String) -> anyhow::Result<()> {
        if message.is_empty() {
            anyhow::bail!("bad-log message must not be the empty string");
        }
        self.payload.entries.entry(action).or_default().insert(key, message);
        self.dirty = true;
        Ok(())
    }

    pub fn iter(&self, action: Action) -> impl Iterator<Item = (&Vec<u8>, &String)> {
        self.payload
            .entries
            .get(&action)
            .into_iter()
            .flat_map(|m| m.iter())
    }

    /// Atomically persist: write to `<path>~` then rename over `<path>`.
    pub fn flush(&mut self) -> anyhow::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }
        self.payload.timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let bytes = bincode::serialize(&self.payload)?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, path)?;
        self.dirty = false;
        Ok(())
    }
}

impl Drop for BadLog {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            log::error!("failed to flush bad-log: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_on_rerun() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.log");
        {
            let mut log = BadLog::open(Some(&path)).unwrap();
            log.set(Action::Graphs, b"rome-1".to_vec(), "timeout".into()).unwrap();
            log.flush().unwrap();
        }
        let log = BadLog::open(Some(&path)).unwrap();
        assert_eq!(log.get(Action::Graphs, b"rome-1"), Some("timeout"));
        assert_eq!(log.get(Action::Graphs, b"rome-2"), None);
    }

    #[test]
    fn rejects_empty_message() {
        let mut log = BadLog::open(None).unwrap();
        assert!(log.set(Action::Graphs, b"x".to_vec(), String::new()).is_err());
    }
}
