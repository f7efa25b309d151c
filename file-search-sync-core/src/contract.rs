//! # contract: interfaces to the remote file-search service
//!
//! This module defines the traits the pipeline talks to and the plain data types
//! that cross them. The remote service is split by concern:
//!
//! - [`DocumentStore`]: raw file uploads (the "files" collection).
//! - [`IndexStore`]: search indexes (vector stores) and their memberships.
//! - [`Querier`]: question answering over one or more indexes.
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall`, so tests can build deterministic mocks
//!   (`MockDocumentStore`, `MockIndexStore`, `MockQuerier`).
//! - The mocks are exported under the `test-export-mocks` feature for use from
//!   integration tests and dependent crates.
//!
//! ## Implementing a Remote
//! - List methods must return the complete collection. Paginated backends are
//!   expected to follow their cursors until exhausted before returning.
//! - Convert all upstream failures to a [`BoxError`]; the pipeline does not retry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::query::QueryResponse;

/// Boxed error returned by every remote call.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Purpose tag attached to every uploaded document.
pub const ASSISTANTS_PURPOSE: &str = "assistants";

/// A document as reported by the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDocument {
    /// Opaque remote identifier.
    pub id: String,
    /// Logical name (the basename of the uploaded file). Correlation key back to local files.
    pub filename: String,
}

/// A search index as reported by the index store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteIndex {
    pub id: String,
    pub name: String,
}

/// Processing state of a document inside an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembershipStatus {
    InProgress,
    Completed,
    Failed,
}

impl MembershipStatus {
    /// Completed and failed are terminal; nothing moves out of them.
    pub fn is_terminal(self) -> bool {
        matches!(self, MembershipStatus::Completed | MembershipStatus::Failed)
    }
}

impl From<&str> for MembershipStatus {
    fn from(s: &str) -> Self {
        match s {
            "completed" => MembershipStatus::Completed,
            // A cancelled ingestion never completes, so it is counted with the failures.
            "failed" | "cancelled" => MembershipStatus::Failed,
            "in_progress" | "pending" | "queued" => MembershipStatus::InProgress,
            other => {
                tracing::warn!(
                    status = other,
                    "Unknown membership status, treating as in progress"
                );
                MembershipStatus::InProgress
            }
        }
    }
}

/// Association between a document and an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub document_id: String,
    pub status: MembershipStatus,
}

/// Raw file storage on the remote service.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// List every document currently stored, across all pages.
    async fn list_documents(&self) -> Result<Vec<RemoteDocument>, BoxError>;

    /// Upload raw bytes under `filename` with the given purpose tag.
    async fn upload_document(
        &self,
        filename: &str,
        content: Vec<u8>,
        purpose: &str,
    ) -> Result<RemoteDocument, BoxError>;
}

/// Search indexes and their memberships on the remote service.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// List every index, across all pages, in the order the remote reports them.
    async fn list_indexes(&self) -> Result<Vec<RemoteIndex>, BoxError>;

    /// Create a new, empty index.
    async fn create_index(&self, name: &str) -> Result<RemoteIndex, BoxError>;

    /// List every member of an index together with its processing status.
    async fn list_members(&self, index_id: &str) -> Result<Vec<Membership>, BoxError>;

    /// Attach a stored document to an index. Ingestion continues asynchronously.
    async fn add_member(&self, index_id: &str, document_id: &str) -> Result<(), BoxError>;
}

/// Question answering backed by the remote file-search tool.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Querier: Send + Sync {
    /// Ask `text` against the given indexes and return the raw structured response.
    async fn query(&self, text: &str, index_ids: &[String]) -> Result<QueryResponse, BoxError>;
}
