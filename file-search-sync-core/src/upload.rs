//! Upload reconciliation: push only the local files the document store has not seen yet.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::UploadFailurePolicy;
use crate::contract::{DocumentStore, ASSISTANTS_PURPOSE};
use crate::discover::LocalFile;
use crate::error::SyncError;

/// A local file paired with the remote document it resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub name: String,
    pub document_id: String,
}

/// A file left out of the run under [`UploadFailurePolicy::Skip`].
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct UploadOutcome {
    /// One id per input file, in input order. Skipped files have no entry.
    pub document_ids: Vec<String>,
    pub uploaded: Vec<FileReport>,
    pub reused: Vec<FileReport>,
    pub skipped: Vec<SkippedFile>,
}

/// Resolve every local file to a remote document id, uploading the ones whose
/// name is not known yet. `existing` maps file name → document id as listed remotely.
pub async fn reconcile_uploads<D>(
    store: &D,
    files: &[LocalFile],
    existing: &HashMap<String, String>,
    policy: UploadFailurePolicy,
) -> Result<UploadOutcome, SyncError>
where
    D: DocumentStore + ?Sized,
{
    let mut known = existing.clone();
    // Name -> first local path resolved for it in this run.
    let mut seen_paths: HashMap<String, PathBuf> = HashMap::new();
    let mut outcome = UploadOutcome::default();

    for file in files {
        let first_path = seen_paths
            .entry(file.name.clone())
            .or_insert_with(|| file.path.clone());
        if *first_path != file.path {
            warn!(
                file = %file.path.display(),
                first = %first_path.display(),
                "[SYNC][UPLOAD] File name already used by another path in this run, its content is not uploaded"
            );
        }

        if let Some(id) = known.get(&file.name) {
            info!(file = %file.path.display(), document_id = %id, "[SYNC][UPLOAD] Skipping existing file");
            outcome.document_ids.push(id.clone());
            outcome.reused.push(FileReport {
                name: file.name.clone(),
                document_id: id.clone(),
            });
            continue;
        }

        info!(file = %file.path.display(), "[SYNC][UPLOAD] Uploading file");
        match upload_one(store, file).await {
            Ok(id) => {
                info!(file = %file.name, document_id = %id, "[SYNC][UPLOAD] Upload succeeded");
                known.insert(file.name.clone(), id.clone());
                outcome.document_ids.push(id.clone());
                outcome.uploaded.push(FileReport {
                    name: file.name.clone(),
                    document_id: id,
                });
            }
            Err(e) if policy == UploadFailurePolicy::Skip => {
                warn!(file = %file.name, error = %e, "[SYNC][UPLOAD] Upload failed, skipping file");
                outcome.skipped.push(SkippedFile {
                    name: file.name.clone(),
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                error!(file = %file.name, error = %e, "[SYNC][ERROR][UPLOAD] Upload failed, aborting run");
                return Err(e);
            }
        }
    }

    info!(
        uploaded = outcome.uploaded.len(),
        reused = outcome.reused.len(),
        skipped = outcome.skipped.len(),
        "[SYNC][UPLOAD] Upload reconciliation finished"
    );
    Ok(outcome)
}

async fn upload_one<D>(store: &D, file: &LocalFile) -> Result<String, SyncError>
where
    D: DocumentStore + ?Sized,
{
    let content = tokio::fs::read(&file.path)
        .await
        .map_err(|source| SyncError::Read {
            path: file.path.clone(),
            source,
        })?;
    let doc = store
        .upload_document(&file.name, content, ASSISTANTS_PURPOSE)
        .await
        .map_err(|source| SyncError::Upload {
            filename: file.name.clone(),
            source,
        })?;
    Ok(doc.id)
}
