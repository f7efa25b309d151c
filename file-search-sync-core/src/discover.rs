//! Local content discovery: which markdown files take part in a run.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::DiscoveryConfig;
use crate::error::SyncError;

/// A markdown file found under the content root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    /// Basename of `path`. Matched against remote document names.
    pub name: String,
}

/// Recursively collect every file under `root` with the configured extension,
/// minus excluded names. Entries are visited in file-name order within each directory.
pub fn discover_files(root: &Path, config: &DiscoveryConfig) -> Result<Vec<LocalFile>, SyncError> {
    info!(root = %root.display(), extension = %config.extension, "Scanning content directory");
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| SyncError::Discovery {
            path: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(config.extension.as_str()) {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            debug!(path = %path.display(), "Skipping file with non UTF-8 name");
            continue;
        };
        if config.exclude.iter().any(|excluded| excluded == name) {
            debug!(path = %path.display(), "Skipping excluded file");
            continue;
        }
        files.push(LocalFile {
            path: path.to_path_buf(),
            name: name.to_string(),
        });
    }

    info!(count = files.len(), "Discovered content files");
    Ok(files)
}
