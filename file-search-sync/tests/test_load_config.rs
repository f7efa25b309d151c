use file_search_sync::load_config::{load_config, API_KEY_VAR};
use file_search_sync_core::config::UploadFailurePolicy;
use serial_test::serial;
use std::env;
use std::fs::write;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::NamedTempFile;

fn config_file(yaml: &str) -> NamedTempFile {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), yaml).unwrap();
    config_file
}

/// A full config maps every key onto the sync and client settings.
#[test]
#[serial]
fn test_load_config_success_all_sections() {
    let config_file = config_file(
        r#"
content_dir: ./site/content
index_name: my_posts
output_path: ./out/config.json
exclude: ["_index.md", "drafts.md"]
extension: .md
upload_failure: skip
lenient_member_listing: true
poll:
  interval_secs: 0.5
  max_interval_secs: 4
  backoff_factor: 2.0
  max_wait_secs: 30
client:
  base_url: http://localhost:8080/v1
  max_retries: 5
  timeout_secs: 10
query:
  model: gpt-4o-mini
"#,
    );
    env::set_var(API_KEY_VAR, "sk-test");

    let config = load_config(Some(config_file.path())).expect("Config should load");

    let sync = &config.sync;
    assert_eq!(sync.content_dir, PathBuf::from("./site/content"));
    assert_eq!(sync.index_name, "my_posts");
    assert_eq!(sync.output_path, PathBuf::from("./out/config.json"));
    assert_eq!(sync.discovery.exclude, vec!["_index.md", "drafts.md"]);
    assert_eq!(sync.discovery.extension, "md");
    assert_eq!(sync.upload_failure, UploadFailurePolicy::Skip);
    assert!(sync.lenient_member_listing);
    assert_eq!(sync.poll.interval, Duration::from_millis(500));
    assert_eq!(sync.poll.max_interval, Duration::from_secs(4));
    assert_eq!(sync.poll.backoff_factor, 2.0);
    assert_eq!(sync.poll.max_wait, Some(Duration::from_secs(30)));

    assert_eq!(config.client.base_url, "http://localhost:8080/v1");
    assert_eq!(config.client.max_retries, 5);
    assert_eq!(config.client.timeout, Duration::from_secs(10));
    assert_eq!(config.client.model, "gpt-4o-mini");
    assert_eq!(config.client.api_key.as_deref(), Some("sk-test"));

    env::remove_var(API_KEY_VAR);
}

/// No file and an empty file both produce the built-in defaults.
#[test]
#[serial]
fn test_load_config_defaults() {
    env::remove_var(API_KEY_VAR);

    let from_nothing = load_config(None::<PathBuf>).expect("defaults should load");
    let empty = config_file("");
    let from_empty = load_config(Some(empty.path())).expect("empty file should load");

    for config in [from_nothing, from_empty] {
        assert_eq!(config.sync.content_dir, PathBuf::from("../content"));
        assert_eq!(config.sync.index_name, "zola_posts");
        assert_eq!(
            config.sync.output_path,
            PathBuf::from("../vector_store/config.json")
        );
        assert_eq!(config.sync.discovery.exclude, vec!["_index.md", "chat.md"]);
        assert_eq!(config.sync.upload_failure, UploadFailurePolicy::Abort);
        assert!(!config.sync.lenient_member_listing);
        assert_eq!(config.sync.poll.interval, Duration::from_secs(2));
        assert_eq!(config.sync.poll.max_wait, Some(Duration::from_secs(600)));
        assert_eq!(config.client.max_retries, 3);
        assert!(config.client.api_key.is_none());
    }
}

/// An explicit null lifts the processing wait limit; omitting the key keeps the default.
#[test]
#[serial]
fn test_load_config_null_max_wait_is_unbounded() {
    let unbounded = config_file("poll:\n  max_wait_secs: null\n");
    let config = load_config(Some(unbounded.path())).expect("Config should load");
    assert_eq!(config.sync.poll.max_wait, None);

    let partial = config_file("poll:\n  interval_secs: 1\n");
    let config = load_config(Some(partial.path())).expect("Config should load");
    assert_eq!(config.sync.poll.interval, Duration::from_secs(1));
    assert_eq!(config.sync.poll.max_wait, Some(Duration::from_secs(600)));
}

/// This test ensures that if the config file is not valid YAML, load_config errors and reports as such.
#[test]
#[serial]
fn test_load_config_errors_for_invalid_file() {
    let config_file = config_file("not-yaml: [:::");

    let err = load_config(Some(config_file.path())).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[test]
#[serial]
fn test_load_config_rejects_unknown_keys() {
    let config_file = config_file("index_nmae: typo\n");

    let err = load_config(Some(config_file.path())).unwrap_err();
    assert!(err.to_string().contains("index_nmae"), "got: {err}");
}

#[test]
#[serial]
fn test_load_config_rejects_invalid_values() {
    let empty_name = config_file("index_name: \"  \"\n");
    let err = load_config(Some(empty_name.path())).unwrap_err();
    assert!(err.to_string().contains("index_name"), "got: {err}");

    let shrinking = config_file("poll:\n  backoff_factor: 0.5\n");
    let err = load_config(Some(shrinking.path())).unwrap_err();
    assert!(err.to_string().contains("backoff_factor"), "got: {err}");

    let busy_poll = config_file("poll:\n  interval_secs: 0\n  max_wait_secs: null\n");
    let err = load_config(Some(busy_poll.path())).unwrap_err();
    assert!(err.to_string().contains("interval_secs"), "got: {err}");

    let negative = config_file("poll:\n  interval_secs: -1\n");
    assert!(load_config(Some(negative.path())).is_err());

    let bad_policy = config_file("upload_failure: retry\n");
    assert!(load_config(Some(bad_policy.path())).is_err());
}

#[test]
#[serial]
fn test_load_config_missing_file_is_an_error() {
    let err = load_config(Some(PathBuf::from("does/not/exist.yaml"))).unwrap_err();
    assert!(
        err.to_string().contains("Failed to read config file"),
        "got: {err}"
    );
}
