//! Configuration file resolution and graceful degradation
//!
//! Tests touching SNOWGUARD_CONFIG are marked #[serial] so that they do not
//! race on the process environment.

use std::env;
use std::fs;
use std::path::Path;

use serial_test::serial;
use snowguard_common::config::{resolve_config_path, TomlConfig, CONFIG_ENV_VAR};
use snowguard_common::Error;
use tempfile::TempDir;

fn write_config(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
#[serial]
fn test_cli_path_beats_env_var() {
    let temp_dir = TempDir::new().unwrap();
    let cli = write_config(&temp_dir, "cli.toml", "");
    let from_env = write_config(&temp_dir, "env.toml", "");
    env::set_var(CONFIG_ENV_VAR, &from_env);

    let resolved = resolve_config_path(Some(&cli));

    env::remove_var(CONFIG_ENV_VAR);
    assert_eq!(resolved, Some(cli));
}

#[test]
#[serial]
fn test_env_var_used_without_cli_path() {
    let temp_dir = TempDir::new().unwrap();
    let from_env = write_config(&temp_dir, "env.toml", "");
    env::set_var(CONFIG_ENV_VAR, &from_env);

    let resolved = resolve_config_path(None);

    env::remove_var(CONFIG_ENV_VAR);
    assert_eq!(resolved, Some(from_env));
}

#[test]
#[serial]
fn test_blank_env_var_ignored() {
    env::set_var(CONFIG_ENV_VAR, "   ");

    let resolved = resolve_config_path(None);

    env::remove_var(CONFIG_ENV_VAR);
    assert_ne!(resolved.as_deref(), Some(Path::new("   ")));
}

#[test]
fn test_load_full_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(
        &temp_dir,
        "config.toml",
        r#"
[server]
bind = "0.0.0.0"
port = 9000

[warehouse]
account = "xy12345.us-east-1"
user = "ADMIN_USER"
token = "secret"
warehouse = "COMPUTE_WH"
role = "SYSADMIN"
timeout_secs = 30

[logging]
level = "debug"
"#,
    );

    let config = TomlConfig::load(Some(&path));

    assert_eq!(config.server.bind, "0.0.0.0");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.warehouse.warehouse.as_deref(), Some("COMPUTE_WH"));
    assert_eq!(config.warehouse.timeout_secs, 30);
    assert!(config.warehouse.missing_credentials().is_none());
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("does-not-exist.toml");

    let config = TomlConfig::load(Some(&path));

    assert_eq!(config.server.port, 8501);
    assert!(config.warehouse.missing_credentials().is_some());
}

#[test]
fn test_malformed_file_reports_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(&temp_dir, "bad.toml", "[server\nport = ");

    let err = TomlConfig::from_file(&path).unwrap_err();
    assert!(matches!(err, Error::Config(_)));

    // load() degrades instead of failing
    let config = TomlConfig::load(Some(&path));
    assert_eq!(config.server.port, 8501);
}
