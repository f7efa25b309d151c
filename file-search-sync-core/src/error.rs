use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::contract::BoxError;
use crate::membership::PollCounts;

/// Failure of a synchronisation stage. Each variant names the stage that stopped the run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to scan content directory {}: {source}", .path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to list remote {what}: {source}")]
    Listing {
        what: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("failed to upload {filename}: {source}")]
    Upload {
        filename: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to create index {name}: {source}")]
    CreateIndex {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to add document {document_id} to index {index_id}: {source}")]
    AddMember {
        index_id: String,
        document_id: String,
        #[source]
        source: BoxError,
    },

    #[error(
        "index {index_id} still processing after {waited:?}: {} completed, {} failed, {} in progress",
        .counts.completed,
        .counts.failed,
        .counts.in_progress
    )]
    PollTimeout {
        index_id: String,
        waited: Duration,
        counts: PollCounts,
    },

    #[error("failed to write index config {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize index config: {0}")]
    Serialize(#[from] serde_json::Error),
}
