#![doc = "Remote client: implements the core contracts against the OpenAI files, vector store and responses APIs."]
//
//! # OpenAI Client (CLI <-> Core)
//!
//! This module wires the [`DocumentStore`], [`IndexStore`] and [`Querier`] traits from
//! `file-search-sync-core` to the real HTTP API. The CLI builds one [`OpenAiClient`] per
//! run and hands it to every pipeline stage by reference.
//!
//! - List endpoints are cursor paginated; every page is fetched before returning.
//! - Listings and queries are retried on HTTP 429, 5xx and transport errors with
//!   exponential backoff. Other 4xx responses fail immediately.
//! - Uploads, index creation and member adds are retried only on 429 or when the
//!   connection could not be opened, so a lost response never creates a duplicate.
//! - The API key comes from `OPENAI_API_KEY` (see [`crate::load_config`]).

use std::time::Duration;

use async_trait::async_trait;
use file_search_sync_core::contract::{
    BoxError, DocumentStore, IndexStore, Membership, MembershipStatus, Querier, RemoteDocument,
    RemoteIndex,
};
use file_search_sync_core::query::QueryResponse;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const PAGE_LIMIT: u32 = 100;

/// Connection settings for [`OpenAiClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub max_retries: u32,
    /// First retry delay; doubles on every further attempt.
    pub retry_base_delay: Duration,
    pub timeout: Duration,
    /// Model used by the query command.
    pub model: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            max_retries: 3,
            retry_base_delay: Duration::from_secs(1),
            timeout: Duration::from_secs(60),
            model: "gpt-4.1-mini".to_string(),
        }
    }
}

pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
    retry_base_delay: Duration,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, BoxError> {
        let api_key = match &config.api_key {
            Some(key) if !key.is_empty() => key.clone(),
            _ => {
                tracing::error!("OPENAI_API_KEY missing in environment");
                return Err("OPENAI_API_KEY environment variable not set".into());
            }
        };
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        tracing::info!(
            base_url = %config.base_url,
            max_retries = config.max_retries,
            "Initialized OpenAiClient"
        );
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay,
            model: config.model.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
    }

    /// Send the request built by `build`, rebuilding it for every retry.
    ///
    /// Reads are retried on 429, 5xx and any transport error. Writes are retried
    /// only when the server cannot have acted on them: 429 or a failed connect.
    async fn send<F>(&self, what: &str, kind: RequestKind, build: F) -> Result<Response, BoxError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut last_err: Option<BoxError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.retry_base_delay * (1u32 << (attempt - 1).min(5));
                tracing::warn!(what, attempt, delay = ?delay, "Retrying request");
                tokio::time::sleep(delay).await;
            }

            match self.authorized(build()).send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    let err: BoxError = format!("API error {status} during {what}: {body}").into();
                    if kind.retries_status(status) {
                        tracing::warn!(what, %status, "Retryable API error");
                        last_err = Some(err);
                        continue;
                    }
                    tracing::error!(what, %status, body = %body, "API error");
                    return Err(err);
                }
                Err(e) if kind.retries_transport(&e) => {
                    tracing::warn!(what, error = %e, "Transport error");
                    last_err = Some(e.into());
                }
                Err(e) => {
                    tracing::error!(what, error = %e, "Transport error after the request was sent");
                    return Err(e.into());
                }
            }
        }

        Err(last_err.unwrap_or_else(|| format!("{what} failed after retries").into()))
    }

    async fn send_json<T, F>(&self, what: &str, kind: RequestKind, build: F) -> Result<T, BoxError>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let response = self.send(what, kind, build).await?;
        Ok(response.json::<T>().await?)
    }

    /// GET every page of a cursor-paginated list endpoint.
    async fn list_all<T>(&self, path: &str) -> Result<Vec<T>, BoxError>
    where
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let mut items = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let page: ListPage<T> = self
                .send_json(path, RequestKind::Read, || {
                    let mut request = self.http.get(&url).query(&[("limit", PAGE_LIMIT)]);
                    if let Some(cursor) = &after {
                        request = request.query(&[("after", cursor.as_str())]);
                    }
                    request
                })
                .await?;
            tracing::debug!(path, count = page.data.len(), has_more = page.has_more, "Fetched page");
            items.extend(page.data);

            match (page.has_more, page.last_id) {
                (true, Some(last_id)) => after = Some(last_id),
                _ => break,
            }
        }

        Ok(items)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    /// Safe to repeat: listings and queries.
    Read,
    /// Creates a remote resource; a repeat may create it twice.
    Write,
}

impl RequestKind {
    fn retries_status(self, status: StatusCode) -> bool {
        match self {
            RequestKind::Read => is_retryable(status),
            RequestKind::Write => status == StatusCode::TOO_MANY_REQUESTS,
        }
    }

    fn retries_transport(self, error: &reqwest::Error) -> bool {
        match self {
            RequestKind::Read => true,
            RequestKind::Write => error.is_connect(),
        }
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[derive(Debug, Deserialize)]
struct ListPage<T> {
    data: Vec<T>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    last_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiFile {
    id: String,
    #[serde(default)]
    filename: String,
}

#[derive(Debug, Deserialize)]
struct ApiVectorStore {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiVectorStoreFile {
    id: String,
    status: String,
}

impl From<ApiFile> for RemoteDocument {
    fn from(file: ApiFile) -> Self {
        RemoteDocument {
            id: file.id,
            filename: file.filename,
        }
    }
}

impl From<ApiVectorStore> for RemoteIndex {
    fn from(store: ApiVectorStore) -> Self {
        RemoteIndex {
            id: store.id,
            name: store.name.unwrap_or_default(),
        }
    }
}

impl From<ApiVectorStoreFile> for Membership {
    fn from(file: ApiVectorStoreFile) -> Self {
        Membership {
            status: MembershipStatus::from(file.status.as_str()),
            document_id: file.id,
        }
    }
}

#[async_trait]
impl DocumentStore for OpenAiClient {
    async fn list_documents(&self) -> Result<Vec<RemoteDocument>, BoxError> {
        tracing::info!("Listing all uploaded files");
        let files: Vec<ApiFile> = self.list_all("files").await?;
        tracing::info!(count = files.len(), "Fetched all files");
        Ok(files.into_iter().map(RemoteDocument::from).collect())
    }

    async fn upload_document(
        &self,
        filename: &str,
        content: Vec<u8>,
        purpose: &str,
    ) -> Result<RemoteDocument, BoxError> {
        tracing::info!(filename, size = content.len(), purpose, "Uploading file");
        let url = self.url("files");
        let file: ApiFile = self
            .send_json("file upload", RequestKind::Write, || {
                let part = reqwest::multipart::Part::bytes(content.clone())
                    .file_name(filename.to_string());
                let form = reqwest::multipart::Form::new()
                    .text("purpose", purpose.to_string())
                    .part("file", part);
                self.http.post(&url).multipart(form)
            })
            .await?;
        tracing::info!(file_id = %file.id, "Successfully uploaded file");
        Ok(RemoteDocument {
            id: file.id,
            filename: filename.to_string(),
        })
    }
}

#[async_trait]
impl IndexStore for OpenAiClient {
    async fn list_indexes(&self) -> Result<Vec<RemoteIndex>, BoxError> {
        tracing::info!("Listing all vector stores");
        let stores: Vec<ApiVectorStore> = self.list_all("vector_stores").await?;
        tracing::info!(count = stores.len(), "Fetched all vector stores");
        Ok(stores.into_iter().map(RemoteIndex::from).collect())
    }

    async fn create_index(&self, name: &str) -> Result<RemoteIndex, BoxError> {
        tracing::info!(name, "Creating vector store");
        let url = self.url("vector_stores");
        let body = json!({ "name": name });
        let store: ApiVectorStore = self
            .send_json("vector store creation", RequestKind::Write, || self.http.post(&url).json(&body))
            .await?;
        tracing::info!(vector_store_id = %store.id, "Successfully created vector store");
        Ok(RemoteIndex {
            id: store.id,
            name: store.name.unwrap_or_else(|| name.to_string()),
        })
    }

    async fn list_members(&self, index_id: &str) -> Result<Vec<Membership>, BoxError> {
        let files: Vec<ApiVectorStoreFile> = self
            .list_all(&format!("vector_stores/{index_id}/files"))
            .await?;
        tracing::debug!(index_id, count = files.len(), "Fetched vector store files");
        Ok(files.into_iter().map(Membership::from).collect())
    }

    async fn add_member(&self, index_id: &str, document_id: &str) -> Result<(), BoxError> {
        tracing::info!(index_id, document_id, "Adding file to vector store");
        let url = self.url(&format!("vector_stores/{index_id}/files"));
        let body = json!({ "file_id": document_id });
        self.send("vector store file creation", RequestKind::Write, || self.http.post(&url).json(&body))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Querier for OpenAiClient {
    async fn query(&self, text: &str, index_ids: &[String]) -> Result<QueryResponse, BoxError> {
        let url = self.url("responses");
        let body = json!({
            "model": self.model,
            "input": text,
            "tools": [{
                "type": "file_search",
                "vector_store_ids": index_ids,
            }],
        });
        self.send_json("response creation", RequestKind::Read, || self.http.post(&url).json(&body))
            .await
    }
}
