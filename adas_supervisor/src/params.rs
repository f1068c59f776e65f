//! File-backed persistent parameter store.
//!
//! One file per key under a root directory. Reads happen at startup;
//! writes are either synchronous (`put`) or handed to a detached thread
//! (`put_nonblocking`) so the control loop never waits on storage.

use std::fs;
use std::path::PathBuf;
use std::thread;

use thiserror::Error;
use tracing::warn;

/// Error type for parameter-store operations.
#[derive(Debug, Error)]
pub enum ParamError {
    /// Key contains path separators or is empty.
    #[error("invalid parameter key {0:?}")]
    InvalidKey(String),
    /// Underlying filesystem error.
    #[error("param store I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Directory-backed key–value store.
#[derive(Debug, Clone)]
pub struct ParamStore {
    root: PathBuf,
}

impl ParamStore {
    /// Open (and create if missing) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ParamError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, ParamError> {
        if key.is_empty() || key.contains('/') || key.contains("..") {
            return Err(ParamError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }

    /// Raw value for `key`, or `None` when unset.
    pub fn get(&self, key: &str) -> Result<Option<String>, ParamError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(v) => Ok(Some(v)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Boolean value for `key`; unset or unparsable reads as `false`.
    pub fn get_bool(&self, key: &str) -> bool {
        matches!(self.get(key), Ok(Some(v)) if v.trim() == "1")
    }

    /// Write `value` under `key`, atomically via a temp-file rename.
    pub fn put(&self, key: &str, value: &str) -> Result<(), ParamError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Write a boolean under `key` ("1"/"0").
    pub fn put_bool(&self, key: &str, value: bool) -> Result<(), ParamError> {
        self.put(key, if value { "1" } else { "0" })
    }

    /// Fire-and-forget write on a detached thread. Failures are logged.
    pub fn put_nonblocking(&self, key: &str, value: String) {
        let store = self.clone();
        let key = key.to_string();
        thread::spawn(move || {
            if let Err(e) = store.put(&key, &value) {
                warn!(key = %key, error = %e, "non-blocking param write failed");
            }
        });
    }

    /// Fire-and-forget boolean write.
    pub fn put_bool_nonblocking(&self, key: &str, value: bool) {
        self.put_nonblocking(key, if value { "1" } else { "0" }.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, ParamStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ParamStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn get_unset_is_none() {
        let (_dir, s) = store();
        assert!(s.get("IsMetric").unwrap().is_none());
        assert!(!s.get_bool("IsMetric"));
    }

    #[test]
    fn put_then_get_round_trip() {
        let (_dir, s) = store();
        s.put("CarParamsCache", "{\"x\":1}").unwrap();
        assert_eq!(s.get("CarParamsCache").unwrap().unwrap(), "{\"x\":1}");
    }

    #[test]
    fn bool_encoding() {
        let (_dir, s) = store();
        s.put_bool("IsLdwEnabled", true).unwrap();
        assert!(s.get_bool("IsLdwEnabled"));
        s.put_bool("IsLdwEnabled", false).unwrap();
        assert!(!s.get_bool("IsLdwEnabled"));
    }

    #[test]
    fn invalid_keys_rejected() {
        let (_dir, s) = store();
        assert!(matches!(s.put("a/b", "x"), Err(ParamError::InvalidKey(_))));
        assert!(matches!(s.get("../x"), Err(ParamError::InvalidKey(_))));
        assert!(matches!(s.get(""), Err(ParamError::InvalidKey(_))));
    }

    #[test]
    fn nonblocking_write_lands() {
        let (_dir, s) = store();
        s.put_bool_nonblocking("ControlsReady", true);
        // The write happens on a detached thread; poll briefly.
        for _ in 0..100 {
            if s.get_bool("ControlsReady") {
                return;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        panic!("non-blocking write never landed");
    }
}
