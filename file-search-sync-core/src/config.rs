use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Name the index is created under and recorded with in the persisted config.
pub const DEFAULT_INDEX_NAME: &str = "zola_posts";

/// The top-level synchronise configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Root of the markdown content tree.
    pub content_dir: PathBuf,
    pub index_name: String,
    /// Where the resolved index record is written.
    pub output_path: PathBuf,
    pub discovery: DiscoveryConfig,
    pub upload_failure: UploadFailurePolicy,
    /// Treat a failed member listing as "no members" instead of stopping the run.
    pub lenient_member_listing: bool,
    pub poll: PollConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("../content"),
            index_name: DEFAULT_INDEX_NAME.to_string(),
            output_path: PathBuf::from("../vector_store/config.json"),
            discovery: DiscoveryConfig::default(),
            upload_failure: UploadFailurePolicy::Abort,
            lenient_member_listing: false,
            poll: PollConfig::default(),
        }
    }
}

impl SyncConfig {
    pub fn trace_loaded(&self) {
        info!(
            content_dir = %self.content_dir.display(),
            index_name = %self.index_name,
            output_path = %self.output_path.display(),
            upload_failure = ?self.upload_failure,
            max_wait = ?self.poll.max_wait,
            "Loaded SyncConfig"
        );
        debug!(?self, "SyncConfig loaded (full debug)");
    }
}

/// Which local files take part in a run.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// File extension, without the dot.
    pub extension: String,
    /// Exact file names that are never uploaded, at any depth.
    pub exclude: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            extension: "md".to_string(),
            exclude: vec!["_index.md".to_string(), "chat.md".to_string()],
        }
    }
}

/// What to do when a single upload fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadFailurePolicy {
    /// Stop the whole run on the first failure.
    #[default]
    Abort,
    /// Log the failure, record the file as skipped and carry on.
    Skip,
}

/// Timing of the ingestion poll loop.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay before the second poll.
    pub interval: Duration,
    /// Upper bound for the delay once backoff kicks in.
    pub max_interval: Duration,
    /// Multiplier applied to the delay after every unsettled poll. `1.0` keeps it fixed.
    pub backoff_factor: f64,
    /// Give up after this long. `None` polls until every member is terminal.
    pub max_wait: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_interval: Duration::from_secs(2),
            backoff_factor: 1.0,
            max_wait: Some(Duration::from_secs(600)),
        }
    }
}

impl PollConfig {
    /// Delay to use after `current`, grown by the backoff factor and capped.
    pub fn next_interval(&self, current: Duration) -> Duration {
        if self.backoff_factor <= 1.0 {
            return current;
        }
        current
            .mul_f64(self.backoff_factor)
            .min(self.max_interval.max(self.interval))
    }
}
