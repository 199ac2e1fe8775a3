use image_poster::client::{Endpoints, DEFAULT_MEDIA_UPLOAD_URL};
use image_poster::load_config::{load_credentials, load_settings};
use image_poster_core::config::Layout;
use serial_test::serial;
use std::env;
use std::fs::write;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, NamedTempFile};

const CREDENTIAL_VARS: [&str; 4] = [
    "X_CONSUMER_KEY",
    "X_CONSUMER_SECRET",
    "X_ACCESS_TOKEN",
    "X_ACCESS_TOKEN_SECRET",
];

/// A config file with every key set produces the matching layout and endpoints.
#[test]
#[serial]
fn test_load_settings_from_full_config() {
    let config_yaml = r#"
root: /srv/image-bot
images_dir: pool
posted_dir: archive
state_file: state/posted.json
endpoints:
  media_upload: http://localhost:9000/upload
  create_post: http://localhost:9000/posts
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    let settings = load_settings(Some(config_file.path()), None).expect("Config should load");

    assert_eq!(settings.layout.root, PathBuf::from("/srv/image-bot"));
    assert_eq!(
        settings.layout.images_path(),
        PathBuf::from("/srv/image-bot/pool")
    );
    assert_eq!(
        settings.layout.posted_path(),
        PathBuf::from("/srv/image-bot/archive")
    );
    assert_eq!(
        settings.layout.state_path(),
        PathBuf::from("/srv/image-bot/state/posted.json")
    );
    assert_eq!(settings.endpoints.media_upload, "http://localhost:9000/upload");
    assert_eq!(settings.endpoints.create_post, "http://localhost:9000/posts");
}

/// Without a config file the standard layout under the given root is used.
#[test]
#[serial]
fn test_load_settings_defaults_without_config() {
    let root = tempdir().unwrap();

    let settings = load_settings(None, Some(root.path())).expect("Defaults should load");

    assert_eq!(settings.layout, Layout::at(root.path()));
    assert_eq!(settings.endpoints, Endpoints::default());
    assert_eq!(settings.endpoints.media_upload, DEFAULT_MEDIA_UPLOAD_URL);
}

/// The --root flag wins over the root in the file; a relative root in the
/// file is resolved against the file's directory.
#[test]
#[serial]
fn test_root_override_and_relative_root() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("bot.yaml");
    write(&config_path, "root: bot-data\n").unwrap();

    let from_file = load_settings(Some(config_path.as_path()), None).unwrap();
    assert_eq!(from_file.layout.root, dir.path().join("bot-data"));

    let overridden = load_settings(Some(config_path.as_path()), Some(Path::new("/elsewhere"))).unwrap();
    assert_eq!(overridden.layout.root, PathBuf::from("/elsewhere"));
}

#[test]
#[serial]
fn test_empty_config_file_means_defaults() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), "").unwrap();

    let settings = load_settings(Some(config_file.path()), Some(Path::new("/data"))).unwrap();

    assert_eq!(settings.layout, Layout::at("/data"));
}

/// If the config file is not valid YAML, loading errors and reports as such.
#[test]
#[serial]
fn test_load_settings_errors_for_invalid_file() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), b"not-yaml: [:::").unwrap();

    let err = load_settings(Some(config_file.path()), None).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[test]
#[serial]
fn test_load_settings_rejects_unknown_keys() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), "imagesdir: typo\n").unwrap();

    assert!(load_settings(Some(config_file.path()), None).is_err());
}

#[test]
#[serial]
fn test_load_settings_errors_for_missing_file() {
    let err = load_settings(Some(Path::new("/definitely/not/here.yaml")), None).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
#[serial]
fn test_load_credentials_reads_all_four_vars() {
    for (i, var) in CREDENTIAL_VARS.iter().enumerate() {
        env::set_var(var, format!("value-{i}"));
    }

    let creds = load_credentials().expect("Credentials should load");

    assert_eq!(creds.consumer_key, "value-0");
    assert_eq!(creds.consumer_secret, "value-1");
    assert_eq!(creds.access_token, "value-2");
    assert_eq!(creds.access_token_secret, "value-3");
}

#[test]
#[serial]
fn test_load_credentials_fails_when_one_is_missing() {
    for var in CREDENTIAL_VARS {
        env::set_var(var, "present");
    }
    env::remove_var("X_ACCESS_TOKEN_SECRET");

    let err = load_credentials().unwrap_err();

    assert!(
        err.to_string().contains("X_ACCESS_TOKEN_SECRET"),
        "error should name the variable, got: {err}"
    );
}
