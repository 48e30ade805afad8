use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::constants::paths;
use crate::error::StateError;

/// Synchronous JSON file primitives used by the store
pub trait StateStorage: Send + Sync {
    fn read_json(&self, path: &Path) -> Result<Value, StateError>;
    fn create_dir_all(&self, dir: &Path) -> Result<(), StateError>;
    fn write_json(&self, path: &Path, value: &Value) -> Result<(), StateError>;
}

/// Plain files on the local filesystem.
///
/// Writes go to a sibling scratch file that is synced and renamed over the
/// target, so a crash mid-write never leaves a truncated state file behind.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFileStorage;

/// `<file>.tmp` next to the target; appended so `a.json` and `a.cfg` never share one
fn scratch_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(paths::TMP_EXTENSION);
    PathBuf::from(name)
}

impl StateStorage for JsonFileStorage {
    fn read_json(&self, path: &Path) -> Result<Value, StateError> {
        let bytes = fs::read(path).map_err(|source| StateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| StateError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn create_dir_all(&self, dir: &Path) -> Result<(), StateError> {
        fs::create_dir_all(dir).map_err(|source| StateError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })
    }

    fn write_json(&self, path: &Path, value: &Value) -> Result<(), StateError> {
        let contents = serde_json::to_vec_pretty(value).map_err(StateError::Serialize)?;
        let write_err = |source| StateError::Write {
            path: path.to_path_buf(),
            source,
        };

        let tmp = scratch_path(path);
        let mut file = fs::File::create(&tmp).map_err(write_err)?;
        file.write_all(&contents)
            .and_then(|_| file.write_all(b"\n"))
            .and_then(|_| file.sync_all())
            .map_err(write_err)?;
        drop(file);

        fs::rename(&tmp, path).map_err(|source| {
            let _ = fs::remove_file(&tmp);
            write_err(source)
        })
    }
}
