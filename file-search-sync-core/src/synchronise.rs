//! High-level pipeline: list → upload → index → membership → poll → persist.
//!
//! This module provides the top-level orchestration for "synchronising" a local
//! content directory into a remote file-search index. It runs, strictly in order:
//!   - Lists existing remote documents and indexes ([`crate::lister`])
//!   - Uploads only the files the document store does not know yet ([`crate::upload`])
//!   - Reuses or creates the named index ([`crate::index`])
//!   - Adds missing documents to the index and waits for ingestion ([`crate::membership`])
//!   - Writes the resolved index id to disk ([`crate::persist`])
//!
//! # Idempotency
//! Re-running against unchanged content and the remote state left by a previous
//! run uploads nothing, creates no index and adds no members.
//!
//! # Error Handling
//! Each stage returns immediately with a [`SyncError`] naming the failed step.
//! Documents that fail remote processing are counted in the report, not raised.
//!
//! # Callable From
//! Used by the CLI crate and integration tests. The remote client is built once by
//! the caller and passed in by reference.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, info_span, Instrument};

use crate::config::SyncConfig;
use crate::contract::{DocumentStore, IndexStore};
use crate::discover::discover_files;
use crate::error::SyncError;
use crate::index::{create_or_get_index, IndexHandle};
use crate::lister::list_remote_state;
use crate::membership::{poll_until_settled, reconcile_membership, PollOutcome};
use crate::persist::save_index_config;
use crate::upload::{reconcile_uploads, FileReport};

/// Everything a run did, for printing and for tests.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub index: IndexHandle,
    pub index_created: bool,
    /// Remote document id for every synced file, in discovery order.
    pub document_ids: Vec<String>,
    pub uploaded: Vec<FileReport>,
    pub reused: Vec<FileReport>,
    pub skipped: Vec<String>,
    pub members_added: Vec<String>,
    pub processing: PollOutcome,
    pub output_path: PathBuf,
}

pub async fn synchronise<D, I>(
    config: &SyncConfig,
    documents: &D,
    indexes: &I,
) -> Result<SyncReport, SyncError>
where
    D: DocumentStore + ?Sized,
    I: IndexStore + ?Sized,
{
    let span = info_span!("synchronise", index_name = %config.index_name);
    async move {
        info!("[SYNC] Starting synchronisation pipeline");

        // Step 0: Current remote state
        let state = list_remote_state(documents, indexes).await?;

        // Step 1: Upload missing files
        let files = discover_files(&config.content_dir, &config.discovery)?;
        let uploads =
            reconcile_uploads(documents, &files, &state.documents, config.upload_failure).await?;

        // Step 2: Reuse or create the index
        let index_created = !state.indexes.contains_key(&config.index_name);
        let index = create_or_get_index(indexes, &config.index_name, &state.indexes).await?;

        // Step 3: Attach documents and wait for ingestion
        let members_added = reconcile_membership(
            indexes,
            &index.id,
            &uploads.document_ids,
            config.lenient_member_listing,
        )
        .await?;
        let processing = poll_until_settled(indexes, &index.id, &config.poll).await?;

        // Step 4: Record the index for downstream consumers
        save_index_config(&config.output_path, &index)?;

        info!(
            index_id = %index.id,
            uploaded = uploads.uploaded.len(),
            reused = uploads.reused.len(),
            members_added = members_added.len(),
            failed = processing.counts.failed,
            "[SYNC] Synchronisation complete"
        );

        Ok(SyncReport {
            index,
            index_created,
            document_ids: uploads.document_ids,
            uploaded: uploads.uploaded,
            reused: uploads.reused,
            skipped: uploads.skipped.into_iter().map(|s| s.name).collect(),
            members_added,
            processing,
            output_path: config.output_path.clone(),
        })
    }
    .instrument(span)
    .await
}
