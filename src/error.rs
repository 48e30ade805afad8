use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::geometry::Rect;

/// Everything that can go wrong while loading, validating, refreshing or
/// persisting window state.
///
/// None of these ever cross the store's public API. They are logged and handed
/// to the optional `on_error` hook, and the store carries on with defaults or
/// with its in-memory record.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to read window state from {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("window state at {} is not valid JSON", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("window state at {} does not have the expected shape", path.display())]
    Shape {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("saved window state has incomplete bounds")]
    MissingBounds,

    #[error("saved display {saved:?} no longer matches the current display {current:?}")]
    StaleDisplay { saved: Rect, current: Rect },

    #[error("failed to create state directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize window state")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to write window state to {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("window query failed: {0:#}")]
    Window(anyhow::Error),

    #[error("display query failed: {0:#}")]
    Display(anyhow::Error),
}

impl StateError {
    /// True for the first-run case where no state file exists yet
    pub fn is_missing_file(&self) -> bool {
        matches!(self, StateError::Read { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}
