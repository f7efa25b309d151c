#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use file_search_sync_core::config::{PollConfig, SyncConfig};
use file_search_sync_core::contract::{
    BoxError, DocumentStore, IndexStore, Membership, MembershipStatus, RemoteDocument, RemoteIndex,
};

/// In-memory stand-in for the remote service. Members start in progress and move
/// to their terminal state on the listing after the one that first reports them.
#[derive(Default)]
pub struct FakeRemote {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    documents: Vec<RemoteDocument>,
    indexes: Vec<RemoteIndex>,
    members: HashMap<String, Vec<Membership>>,
    failing_ingest: HashSet<String>,
    failing_upload: HashSet<String>,
    next_id: u32,
    uploads: Vec<String>,
    creates: Vec<String>,
    adds: Vec<String>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, id: &str, filename: &str) -> Self {
        self.state.lock().unwrap().documents.push(RemoteDocument {
            id: id.into(),
            filename: filename.into(),
        });
        self
    }

    pub fn with_index(self, id: &str, name: &str) -> Self {
        self.state.lock().unwrap().indexes.push(RemoteIndex {
            id: id.into(),
            name: name.into(),
        });
        self
    }

    /// Documents uploaded under this name end up `failed` once ingested.
    pub fn failing_ingest(self, filename: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_ingest
            .insert(filename.into());
        self
    }

    /// Uploads of this name are rejected.
    pub fn failing_upload(self, filename: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_upload
            .insert(filename.into());
        self
    }

    pub fn upload_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn create_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().creates.clone()
    }

    pub fn add_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().adds.clone()
    }

    pub fn reset_calls(&self) {
        let mut state = self.state.lock().unwrap();
        state.uploads.clear();
        state.creates.clear();
        state.adds.clear();
    }
}

#[async_trait]
impl DocumentStore for FakeRemote {
    async fn list_documents(&self) -> Result<Vec<RemoteDocument>, BoxError> {
        Ok(self.state.lock().unwrap().documents.clone())
    }

    async fn upload_document(
        &self,
        filename: &str,
        _content: Vec<u8>,
        _purpose: &str,
    ) -> Result<RemoteDocument, BoxError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_upload.contains(filename) {
            return Err(format!("upload rejected: {filename}").into());
        }
        state.next_id += 1;
        let doc = RemoteDocument {
            id: format!("file-{}", state.next_id),
            filename: filename.to_string(),
        };
        state.uploads.push(filename.to_string());
        state.documents.push(doc.clone());
        Ok(doc)
    }
}

#[async_trait]
impl IndexStore for FakeRemote {
    async fn list_indexes(&self) -> Result<Vec<RemoteIndex>, BoxError> {
        Ok(self.state.lock().unwrap().indexes.clone())
    }

    async fn create_index(&self, name: &str) -> Result<RemoteIndex, BoxError> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let index = RemoteIndex {
            id: format!("vs-{}", state.next_id),
            name: name.to_string(),
        };
        state.creates.push(name.to_string());
        state.indexes.push(index.clone());
        Ok(index)
    }

    async fn list_members(&self, index_id: &str) -> Result<Vec<Membership>, BoxError> {
        let mut state = self.state.lock().unwrap();
        let FakeState {
            members,
            documents,
            failing_ingest,
            ..
        } = &mut *state;
        let entries = members.entry(index_id.to_string()).or_default();
        let snapshot = entries.clone();
        for member in entries.iter_mut() {
            if member.status == MembershipStatus::InProgress {
                let failing = documents
                    .iter()
                    .any(|d| d.id == member.document_id && failing_ingest.contains(&d.filename));
                member.status = if failing {
                    MembershipStatus::Failed
                } else {
                    MembershipStatus::Completed
                };
            }
        }
        Ok(snapshot)
    }

    async fn add_member(&self, index_id: &str, document_id: &str) -> Result<(), BoxError> {
        let mut state = self.state.lock().unwrap();
        state.adds.push(document_id.to_string());
        state
            .members
            .entry(index_id.to_string())
            .or_default()
            .push(Membership {
                document_id: document_id.to_string(),
                status: MembershipStatus::InProgress,
            });
        Ok(())
    }
}

/// Write `files` (relative path, content) under `root`.
pub fn write_content(root: &Path, files: &[(&str, &str)]) {
    for (rel, content) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }
}

/// Config pointing at `content_dir`, writing the record into `output_dir`, polling without delay.
pub fn test_config(content_dir: &Path, output_dir: &Path) -> SyncConfig {
    SyncConfig {
        content_dir: content_dir.to_path_buf(),
        output_path: output_dir.join("vector_store").join("config.json"),
        poll: instant_poll(),
        ..SyncConfig::default()
    }
}

pub fn instant_poll() -> PollConfig {
    PollConfig {
        interval: Duration::ZERO,
        max_interval: Duration::ZERO,
        backoff_factor: 1.0,
        max_wait: None,
    }
}

pub fn member(id: &str, status: MembershipStatus) -> Membership {
    Membership {
        document_id: id.to_string(),
        status,
    }
}
