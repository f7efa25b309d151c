//! The on-disk record of the resolved index, read by downstream tooling.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::SyncError;
use crate::index::IndexHandle;

/// JSON shape of the persisted index record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub vector_store_id: String,
    pub name: String,
}

impl From<&IndexHandle> for IndexRecord {
    fn from(handle: &IndexHandle) -> Self {
        Self {
            vector_store_id: handle.id.clone(),
            name: handle.name.clone(),
        }
    }
}

/// Write the index record to `path`, creating parent directories as needed and
/// replacing whatever was there before.
pub fn save_index_config(path: &Path, handle: &IndexHandle) -> Result<(), SyncError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| SyncError::Persist {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let json = serde_json::to_string_pretty(&IndexRecord::from(handle))?;
    fs::write(path, json).map_err(|source| SyncError::Persist {
        path: path.to_path_buf(),
        source,
    })?;

    info!(path = %path.display(), index_id = %handle.id, "[SYNC][PERSIST] Index config saved");
    Ok(())
}

/// Read a previously saved record. A missing or malformed file yields `None`.
pub fn load_index_config(path: &Path) -> Option<IndexRecord> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Index config not found");
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Index config is invalid");
            None
        }
    }
}
