//! Integration tests for config load/save and the required MCM_URL variable.

use ivy_chat_client::{config, Config};
use predicates::prelude::*;

#[test]
fn load_existing_yaml_config() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    std::fs::write(
        &config_path,
        r#"
qa:
  api_key: "test-key"
  timeout_secs: 120
server:
  host: "0.0.0.0"
  port: 9000
  store_path: "/data/ivy.db"
  export_dir: "/data/exports"
  typing_delay_ms: 0
identity:
  username: "alice"
  session_id: "s-1"
"#,
    )
    .unwrap();

    let cfg = config::load(&config_path).expect("load should succeed");
    assert_eq!(cfg.qa.api_key.as_deref(), Some("test-key"));
    assert_eq!(cfg.timeout_secs(), 120);
    assert_eq!(cfg.host(), "0.0.0.0");
    assert_eq!(cfg.port(), 9000);
    assert_eq!(cfg.store_path(), Some("/data/ivy.db".into()));
    assert_eq!(cfg.export_dir(), std::path::PathBuf::from("/data/exports"));
    assert_eq!(cfg.typing_delay_ms(), 0);
    assert_eq!(cfg.username(), "alice");
    assert_eq!(cfg.session_id(), "s-1");
}

#[test]
fn out_of_range_timeout_is_clamped_on_read() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    std::fs::write(&config_path, "qa:\n  timeout_secs: 9999\n").unwrap();

    let cfg = config::load(&config_path).unwrap();
    assert_eq!(cfg.qa.timeout_secs, Some(9999));
    assert_eq!(cfg.timeout_secs(), config::MAX_TIMEOUT_SECS);
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config::load_or_default(&dir.path().join("nope.yaml")).unwrap();
    assert_eq!(cfg, Config::default());
}

#[test]
fn malformed_yaml_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    std::fs::write(&config_path, "server: [unterminated").unwrap();

    let err = config::load(&config_path).unwrap_err();
    assert!(predicate::str::contains("YAML").eval(&err.to_string()));
}

#[test]
fn save_creates_directory_and_file_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("ivy-chat");
    let config_path = config_dir.join("config.yaml");
    assert!(!config_dir.exists(), "config dir should not exist yet");

    let mut config = Config::default();
    config.qa.api_key = Some("key".into());
    config.server.port = Some(8001);

    config::save(&config_path, &config).expect("save should succeed");
    assert!(predicates::path::exists().eval(&config_path));

    let reloaded = config::load(&config_path).unwrap();
    assert_eq!(reloaded, config);
}

#[test]
fn saved_file_omits_unset_fields() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    let mut config = Config::default();
    config.identity.username = Some("bob".into());

    config::save(&config_path, &config).unwrap();
    let contents = std::fs::read_to_string(&config_path).unwrap();
    assert!(predicate::str::contains("username: bob").eval(&contents));
    assert!(!contents.contains("api_key"));
}

/// Config path resolves to `~/.ivy-chat/config.yaml` using the current platform's home dir.
#[test]
fn default_config_path_uses_home_directory() {
    let dir = tempfile::tempdir().unwrap();
    let home = dir.path().to_str().unwrap().to_string();

    let key = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    let original = std::env::var(key).ok();

    std::env::set_var(key, &home);
    let path = config::default_config_path();
    match original {
        Some(v) => std::env::set_var(key, v),
        None => std::env::remove_var(key),
    }

    let path = path.expect("should resolve a config path");
    assert_eq!(path, dir.path().join(".ivy-chat").join("config.yaml"));
}

#[test]
fn explicit_config_path_wins() {
    let p = std::path::Path::new("/etc/ivy/config.yaml");
    assert_eq!(config::resolve_config_path(Some(p)), Some(p.to_path_buf()));
}

#[test]
fn required_qa_url_reads_environment() {
    let original = std::env::var(config::QA_URL_ENV).ok();

    std::env::remove_var(config::QA_URL_ENV);
    let missing = config::required_qa_url();

    std::env::set_var(config::QA_URL_ENV, "   ");
    let blank = config::required_qa_url();

    std::env::set_var(config::QA_URL_ENV, "http://qa.local/ask");
    let present = config::required_qa_url();

    match original {
        Some(v) => std::env::set_var(config::QA_URL_ENV, v),
        None => std::env::remove_var(config::QA_URL_ENV),
    }

    let err = missing.unwrap_err();
    assert!(err.to_string().contains("MCM_URL"));
    assert!(blank.is_err());
    assert_eq!(present.unwrap(), "http://qa.local/ask");
}
