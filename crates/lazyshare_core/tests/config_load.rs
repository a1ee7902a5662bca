use lazyshare_core::{origin_fn, CachingProxy, ConfigError, CoreConfig, FillPolicy};
use std::path::PathBuf;

#[test]
fn load_reads_full_document_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lazyshare.json");
    std::fs::write(
        &path,
        r#"{
            "logging": { "level": "warn", "log_dir": "/var/log/lazyshare" },
            "cache": { "fill_policy": "relaxed" }
        }"#,
    )
    .unwrap();

    let config = CoreConfig::load(&path).unwrap();
    assert_eq!(config.logging.level, "warn");
    assert_eq!(
        config.logging.log_dir,
        Some(PathBuf::from("/var/log/lazyshare"))
    );
    assert_eq!(config.cache.fill_policy, FillPolicy::Relaxed);

    let proxy = CachingProxy::from_config(origin_fn(|k: &u32| Ok::<_, ()>(*k)), &config.cache);
    assert_eq!(proxy.policy(), FillPolicy::Relaxed);
}

#[test]
fn load_missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");

    let err = CoreConfig::load(&path).unwrap_err();
    match &err {
        ConfigError::Io { path: reported, .. } => assert_eq!(reported, &path),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("absent.json"));
}

#[test]
fn load_malformed_json_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = CoreConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}
