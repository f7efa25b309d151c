//! Snapshot of what already exists remotely, keyed by the names used for reconciliation.

use std::collections::HashMap;

use tracing::{debug, error, info};

use crate::contract::{DocumentStore, IndexStore, RemoteDocument, RemoteIndex};
use crate::error::SyncError;

/// Remote state at the start of a run.
#[derive(Debug, Clone, Default)]
pub struct RemoteState {
    /// Logical file name → remote document id.
    pub documents: HashMap<String, String>,
    /// Index name → remote index id.
    pub indexes: HashMap<String, String>,
}

pub async fn list_remote_state<D, I>(documents: &D, indexes: &I) -> Result<RemoteState, SyncError>
where
    D: DocumentStore + ?Sized,
    I: IndexStore + ?Sized,
{
    info!("[SYNC][LIST] Listing existing documents");
    let remote_documents = documents.list_documents().await.map_err(|source| {
        error!(error = ?source, "[SYNC][ERROR][LIST] Failed to list documents");
        SyncError::Listing {
            what: "documents",
            source,
        }
    })?;

    info!("[SYNC][LIST] Listing existing indexes");
    let remote_indexes = indexes.list_indexes().await.map_err(|source| {
        error!(error = ?source, "[SYNC][ERROR][LIST] Failed to list indexes");
        SyncError::Listing {
            what: "indexes",
            source,
        }
    })?;

    let state = RemoteState {
        documents: documents_by_name(&remote_documents),
        indexes: indexes_by_name(&remote_indexes),
    };
    info!(
        documents = state.documents.len(),
        indexes = state.indexes.len(),
        "[SYNC][LIST] Remote state loaded"
    );
    Ok(state)
}

/// Map file name → id. When names repeat, the first listed document wins.
pub fn documents_by_name(documents: &[RemoteDocument]) -> HashMap<String, String> {
    let mut by_name = HashMap::with_capacity(documents.len());
    for doc in documents {
        debug!(filename = %doc.filename, id = %doc.id, "Found remote document");
        by_name
            .entry(doc.filename.clone())
            .or_insert_with(|| doc.id.clone());
    }
    by_name
}

/// Map index name → id. When names repeat, the first listed index wins.
pub fn indexes_by_name(indexes: &[RemoteIndex]) -> HashMap<String, String> {
    let mut by_name = HashMap::with_capacity(indexes.len());
    for index in indexes {
        debug!(name = %index.name, id = %index.id, "Found remote index");
        by_name
            .entry(index.name.clone())
            .or_insert_with(|| index.id.clone());
    }
    by_name
}
