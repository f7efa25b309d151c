/// `load_config` module: Loads an optional static YAML config and injects secrets from the environment.
///
/// This is the only place where user-supplied YAML is parsed and mapped onto the
/// strongly-typed configs of the core crate ([`SyncConfig`]) and of the remote
/// client ([`ClientConfig`]).
///
/// # Responsibilities
/// - Parse the YAML file into loosely-typed, all-optional sections
/// - Overlay every key that is present onto the built-in defaults
/// - Inject `OPENAI_API_KEY` from the environment (secrets never live in the file)
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::{Context, Result};
use file_search_sync_core::config::{SyncConfig, UploadFailurePolicy};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

use crate::client::ClientConfig;

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Everything the CLI needs for one run.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub sync: SyncConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    content_dir: Option<PathBuf>,
    index_name: Option<String>,
    output_path: Option<PathBuf>,
    exclude: Option<Vec<String>>,
    extension: Option<String>,
    upload_failure: Option<UploadFailurePolicy>,
    lenient_member_listing: Option<bool>,
    poll: PollSection,
    client: ClientSection,
    query: QuerySection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PollSection {
    interval_secs: Option<f64>,
    max_interval_secs: Option<f64>,
    backoff_factor: Option<f64>,
    /// Explicit `null` disables the limit.
    #[serde(deserialize_with = "explicit_null")]
    max_wait_secs: Option<Option<u64>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ClientSection {
    base_url: Option<String>,
    max_retries: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct QuerySection {
    model: Option<String>,
}

/// Distinguish a missing key (outer `None`) from an explicit `null` (`Some(None)`).
fn explicit_null<'de, D>(deserializer: D) -> Result<Option<Option<u64>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<u64>::deserialize(deserializer).map(Some)
}

/// Load the config at `path`, or the defaults when no path is given.
pub fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<AppConfig> {
    let raw = match path {
        Some(path) => read_raw(path.as_ref())?,
        None => {
            info!("No config file given, using defaults");
            RawConfig::default()
        }
    };

    let mut config = apply(raw)?;
    config.client.api_key = std::env::var(API_KEY_VAR).ok();
    if config.client.api_key.is_some() {
        info!("{API_KEY_VAR} found in env");
    }

    config.sync.trace_loaded();
    Ok(config)
}

fn read_raw(path_ref: &Path) -> Result<RawConfig> {
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    // An empty file is a valid "all defaults" config.
    if config_content.trim().is_empty() {
        return Ok(RawConfig::default());
    }

    match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

fn apply(raw: RawConfig) -> Result<AppConfig> {
    let mut config = AppConfig::default();
    let sync = &mut config.sync;

    if let Some(dir) = raw.content_dir {
        sync.content_dir = dir;
    }
    if let Some(name) = raw.index_name {
        anyhow::ensure!(!name.trim().is_empty(), "index_name must not be empty");
        sync.index_name = name;
    }
    if let Some(path) = raw.output_path {
        sync.output_path = path;
    }
    if let Some(exclude) = raw.exclude {
        sync.discovery.exclude = exclude;
    }
    if let Some(extension) = raw.extension {
        sync.discovery.extension = extension.trim_start_matches('.').to_string();
    }
    if let Some(policy) = raw.upload_failure {
        sync.upload_failure = policy;
    }
    if let Some(lenient) = raw.lenient_member_listing {
        sync.lenient_member_listing = lenient;
    }

    let poll = &mut sync.poll;
    if let Some(secs) = raw.poll.interval_secs {
        anyhow::ensure!(secs > 0.0, "poll.interval_secs must be positive, got {secs}");
        poll.interval = secs_to_duration("poll.interval_secs", secs)?;
        poll.max_interval = poll.max_interval.max(poll.interval);
    }
    if let Some(secs) = raw.poll.max_interval_secs {
        poll.max_interval = secs_to_duration("poll.max_interval_secs", secs)?;
    }
    if let Some(factor) = raw.poll.backoff_factor {
        anyhow::ensure!(factor >= 1.0, "poll.backoff_factor must be at least 1.0, got {factor}");
        poll.backoff_factor = factor;
    }
    if let Some(max_wait) = raw.poll.max_wait_secs {
        poll.max_wait = max_wait.map(Duration::from_secs);
    }

    let client = &mut config.client;
    if let Some(base_url) = raw.client.base_url {
        client.base_url = base_url;
    }
    if let Some(retries) = raw.client.max_retries {
        client.max_retries = retries;
    }
    if let Some(secs) = raw.client.timeout_secs {
        client.timeout = Duration::from_secs(secs);
    }
    if let Some(model) = raw.query.model {
        client.model = model;
    }

    Ok(config)
}

fn secs_to_duration(key: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).with_context(|| format!("{key} must be a non-negative number"))
}
