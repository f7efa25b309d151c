mod common;

use common::write_content;
use file_search_sync_core::config::DiscoveryConfig;
use file_search_sync_core::discover::discover_files;
use file_search_sync_core::SyncError;
use tempfile::tempdir;

#[test]
fn test_excluded_names_are_skipped_at_any_depth() {
    let root = tempdir().unwrap();
    write_content(
        root.path(),
        &[
            ("a.md", "a"),
            ("b.md", "b"),
            ("chat.md", "chat"),
            ("_index.md", "root index"),
            ("blog/_index.md", "section index"),
            ("blog/deep/nested/chat.md", "nested chat"),
            ("blog/deep/nested/post.md", "post"),
            ("blog/image.png", "not markdown"),
            ("notes.markdown", "other extension"),
        ],
    );

    let files = discover_files(root.path(), &DiscoveryConfig::default()).unwrap();
    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();

    assert_eq!(names, vec!["a.md", "b.md", "post.md"]);
    assert!(files[2].path.ends_with("blog/deep/nested/post.md"));
}

#[test]
fn test_custom_exclusions_replace_defaults() {
    let root = tempdir().unwrap();
    write_content(root.path(), &[("chat.md", "chat"), ("draft.md", "draft")]);

    let config = DiscoveryConfig {
        extension: "md".into(),
        exclude: vec!["draft.md".into()],
    };
    let files = discover_files(root.path(), &config).unwrap();
    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["chat.md"]);
}

#[test]
fn test_missing_content_dir_is_an_error() {
    let root = tempdir().unwrap();
    let missing = root.path().join("does-not-exist");

    let err = discover_files(&missing, &DiscoveryConfig::default()).unwrap_err();
    assert!(matches!(err, SyncError::Discovery { .. }));
}
