//! StateFile: durable storage for the last known review status of every PR.
//!
//! One JSON object per installation, key string → status string, sorted by
//! key and pretty-printed:
//!
//! ```text
//! {
//!   "octo/widgets#12": "APPROVED",
//!   "octo/widgets#9": "REVIEW_REQUIRED"
//! }
//! ```
//!
//! ## Atomic replace
//!
//! `save` never writes the target in place:
//!   1. write the full document to `.<name>.<uuid>.tmp` next to the target
//!   2. fsync the temp file
//!   3. rename it over the target
//!   4. fsync the directory
//!
//! A reader sees either the old file or the new one. If any of steps 1–3
//! fails the temp file is removed and the old file is left as it was.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::errors::StateError;
use crate::models::StateSnapshot;

/// Handle to the state file location. Cheap to clone; holds no open file.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot. A missing file is the first run and yields an empty
    /// snapshot; a file that exists but does not parse is `StateError::Corrupt`.
    pub fn load(&self) -> Result<StateSnapshot, StateError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no state file yet, starting empty");
                return Ok(StateSnapshot::new());
            }
            Err(source) => {
                return Err(StateError::Unreadable {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_slice(&data).map_err(|source| StateError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Atomically replace the stored snapshot with `snapshot`.
    pub fn save(&self, snapshot: &StateSnapshot) -> Result<(), StateError> {
        let bytes = encode(snapshot).map_err(|e| self.persist_err("encode", e.into()))?;
        let dir = self.dir();

        fs::create_dir_all(&dir).map_err(|e| self.persist_err("create directory", e))?;

        let tmp_path = dir.join(self.temp_name());
        if let Err(err) = self.write_and_rename(&tmp_path, &bytes) {
            if let Err(e) = fs::remove_file(&tmp_path) {
                if e.kind() != ErrorKind::NotFound {
                    tracing::warn!(
                        path = %tmp_path.display(),
                        error = %e,
                        "failed to remove temporary state file"
                    );
                }
            }
            return Err(err);
        }

        // The rename already happened, so the new content is in place.
        if let Err(e) = fsync_dir(&dir) {
            tracing::warn!(dir = %dir.display(), error = %e, "directory fsync failed after state save");
        }

        Ok(())
    }

    fn write_and_rename(&self, tmp_path: &Path, bytes: &[u8]) -> Result<(), StateError> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(tmp_path)
            .map_err(|e| self.persist_err("create temp file", e))?;

        file.write_all(bytes)
            .map_err(|e| self.persist_err("write temp file", e))?;
        file.sync_all()
            .map_err(|e| self.persist_err("sync temp file", e))?;
        drop(file);

        fs::rename(tmp_path, &self.path).map_err(|e| self.persist_err("rename", e))
    }

    fn dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn temp_name(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "state".to_string());
        format!(".{}.{}.tmp", name, uuid::Uuid::new_v4().simple())
    }

    fn persist_err(&self, step: &'static str, source: std::io::Error) -> StateError {
        StateError::Persist {
            path: self.path.clone(),
            step,
            source,
        }
    }
}

/// Canonical encoding: sorted keys, 2-space indent, trailing newline.
pub fn encode(snapshot: &StateSnapshot) -> Result<Vec<u8>, serde_json::Error> {
    let mut bytes = serde_json::to_vec_pretty(snapshot)?;
    bytes.push(b'\n');
    Ok(bytes)
}

fn fsync_dir(dir: &Path) -> std::io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = StateFile::new(dir.path().join("state.json"));
        let snap = store.load().unwrap();
        assert!(snap.is_empty());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = StateFile::new(dir.path().join("state.json"));
        let want = StateSnapshot::from([
            ("envato/repo#123", "REVIEW_REQUIRED"),
            ("envato/repo#456", "APPROVED"),
            ("other/thing#7", ""),
        ]);

        store.save(&want).unwrap();
        assert_eq!(store.load().unwrap(), want);
    }

    #[test]
    fn test_round_trips_empty_snapshot() {
        let dir = tempdir().unwrap();
        let store = StateFile::new(dir.path().join("state.json"));
        store.save(&StateSnapshot::new()).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_replaces_and_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let store = StateFile::new(dir.path().join("state.json"));

        store
            .save(&StateSnapshot::from([("a/b#1", "REVIEW_REQUIRED")]))
            .unwrap();
        store
            .save(&StateSnapshot::from([("a/b#1", "APPROVED"), ("c/d#2", "")]))
            .unwrap();

        assert_eq!(entries(dir.path()), vec!["state.json".to_string()]);
        let got = store.load().unwrap();
        assert!(got.is_approved(&"a/b#1".into()));
        assert_eq!(got.len(), 2);
    }

    #[test]
    fn test_identical_snapshots_encode_to_identical_bytes() {
        let dir = tempdir().unwrap();
        let store = StateFile::new(dir.path().join("state.json"));

        let a = StateSnapshot::from([("z/z#1", "APPROVED"), ("a/a#1", "REVIEW_REQUIRED")]);
        let b = StateSnapshot::from([("a/a#1", "REVIEW_REQUIRED"), ("z/z#1", "APPROVED")]);

        store.save(&a).unwrap();
        let first = fs::read(store.path()).unwrap();
        store.save(&b).unwrap();
        let second = fs::read(store.path()).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            String::from_utf8(first).unwrap(),
            "{\n  \"a/a#1\": \"REVIEW_REQUIRED\",\n  \"z/z#1\": \"APPROVED\"\n}\n"
        );
    }

    #[test]
    fn test_encode_is_canonical_and_never_substitutes_content() {
        let snap = StateSnapshot::from([("b/b#2", "APPROVED"), ("a/a#1", "")]);
        let bytes = encode(&snap).unwrap();
        assert_eq!(
            String::from_utf8(bytes.clone()).unwrap(),
            "{\n  \"a/a#1\": \"\",\n  \"b/b#2\": \"APPROVED\"\n}\n"
        );
        let decoded: StateSnapshot = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, snap);

        assert_eq!(encode(&StateSnapshot::new()).unwrap(), b"{}\n".to_vec());
    }

    #[test]
    fn test_corrupt_file_is_an_error_not_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, b"{\"a/b#1\": \"APPR").unwrap();

        let err = StateFile::new(&path).load().unwrap_err();
        assert!(matches!(err, StateError::Corrupt { .. }));
    }

    #[test]
    fn test_wrong_shape_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, b"[\"a/b#1\"]").unwrap();

        let err = StateFile::new(&path).load().unwrap_err();
        assert!(matches!(err, StateError::Corrupt { .. }));
    }

    #[test]
    fn test_loads_files_written_without_trailing_newline() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, b"{\n  \"a/b#1\": \"APPROVED\"\n}").unwrap();

        let snap = StateFile::new(&path).load().unwrap();
        assert!(snap.is_approved(&"a/b#1".into()));
    }

    #[test]
    fn test_failed_rename_cleans_up_and_keeps_target() {
        let dir = tempdir().unwrap();
        // A directory sitting at the target path makes the rename fail.
        let target = dir.path().join("state.json");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), b"x").unwrap();

        let err = StateFile::new(&target)
            .save(&StateSnapshot::from([("a/b#1", "APPROVED")]))
            .unwrap_err();

        assert!(matches!(err, StateError::Persist { step: "rename", .. }));
        assert_eq!(entries(dir.path()), vec!["state.json".to_string()]);
        assert!(target.join("keep").exists());
    }

    #[test]
    fn test_failed_save_keeps_previous_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = StateFile::new(&path);
        let original = StateSnapshot::from([("a/b#1", "REVIEW_REQUIRED")]);
        store.save(&original).unwrap();

        // Point a second handle at a path whose parent is a regular file.
        let bad = StateFile::new(path.join("nested.json"));
        let err = bad.save(&StateSnapshot::from([("a/b#1", "APPROVED")])).unwrap_err();

        assert!(matches!(err, StateError::Persist { .. }));
        assert_eq!(store.load().unwrap(), original);
        assert_eq!(entries(dir.path()), vec!["state.json".to_string()]);
    }

    #[test]
    fn test_save_creates_missing_parent_directory() {
        let dir = tempdir().unwrap();
        let store = StateFile::new(dir.path().join("nested").join("state.json"));
        store.save(&StateSnapshot::from([("a/b#1", "")])).unwrap();
        assert_eq!(store.load().unwrap().len(), 1);
    }
}
