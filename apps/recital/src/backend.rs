//! # Storage Backend Selection
//!
//! Opens a `Library` for the configured backend and, for the file backend,
//! writes it back as a JSON snapshot after changes.
//!
//! - `redb`: ACID database; every mutation is already durable
//! - `file`: in-memory store loaded from / saved to a JSON file

use recital_core::{Library, MemoryStore, RecitalError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Storage backend choice.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// redb embedded database.
    #[default]
    Redb,
    /// JSON snapshot file.
    File,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Redb => f.write_str("redb"),
            Self::File => f.write_str("file"),
        }
    }
}

/// Open or create a library at `db_path`.
pub fn open_library(db_path: &Path, backend: Backend) -> Result<Library, RecitalError> {
    match backend {
        Backend::Redb => Library::with_redb(db_path),
        Backend::File => {
            if !db_path.exists() {
                return Ok(Library::new());
            }
            let data = std::fs::read(db_path)
                .map_err(|e| RecitalError::IoError(format!("Read db: {}", e)))?;
            let store: MemoryStore = serde_json::from_slice(&data).map_err(|e| {
                RecitalError::DeserializationError(format!("Could not parse database file: {}", e))
            })?;
            Ok(Library::with_memory(store))
        }
    }
}

/// Persist a library after a change.
///
/// A no-op for redb; writes the JSON snapshot for the file backend.
pub fn save_library(library: &Library, db_path: &Path) -> Result<(), RecitalError> {
    let Some(store) = library.memory_opt() else {
        return Ok(());
    };

    let data = serde_json::to_vec_pretty(store)
        .map_err(|e| RecitalError::SerializationError(e.to_string()))?;
    std::fs::write(db_path, data).map_err(|e| RecitalError::IoError(format!("Write db: {}", e)))
}

// =============================================================================
// TESTS
// =============================================================================
