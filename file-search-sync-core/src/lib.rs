#![doc = "file-search-sync-core: reconciliation logic for file-search-sync."]

//! This crate holds the pipeline that keeps a remote file-search index in step with
//! a local directory of markdown posts: contracts for the remote service, local
//! discovery, the upload/index/membership reconcilers, the ingestion poller and the
//! persisted index record. No HTTP code lives here; see the `file-search-sync` crate.
//!
//! # Usage
//! Implement [`contract::DocumentStore`] and [`contract::IndexStore`] for a remote and
//! call [`synchronise::synchronise`].

pub mod config;
pub mod contract;
pub mod discover;
pub mod error;
pub mod index;
pub mod lister;
pub mod membership;
pub mod persist;
pub mod query;
pub mod synchronise;
pub mod upload;

pub use error::SyncError;
