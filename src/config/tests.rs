use std::env;
use std::fs;

use serial_test::serial;
use tempfile::TempDir;

use super::load_config;
use super::settings::Settings;

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.logger.level, "info");
    assert_eq!(settings.logger.format, "json");
    assert_eq!(settings.server.host, "127.0.0.1");
    assert_eq!(settings.server.port, 8080);
    assert_eq!(settings.graceful_shutdown_timeout_secs, 5);
}

#[test]
#[serial]
fn load_config_from_file_overrides_defaults() {
    // Run from a temporary directory so load_config picks up
    // config/default.toml from there.
    let tmp = TempDir::new().expect("create tempdir");
    let orig = env::current_dir().expect("current_dir");
    env::set_current_dir(tmp.path()).expect("set current dir");

    fs::create_dir_all("config").expect("create config dir");
    let toml = r#"
        graceful_shutdown_timeout_secs = 30

        [logger]
        level = "debug"
        format = "plain"

        [server]
        host = "0.0.0.0"
        port = 9000
    "#;
    fs::write("config/default.toml", toml).expect("write config file");

    let cfg = load_config().expect("load_config failed");
    assert_eq!(cfg.logger.level, "debug");
    assert_eq!(cfg.logger.format, "plain");
    assert_eq!(cfg.server.host, "0.0.0.0");
    assert_eq!(cfg.server.port, 9000);
    assert_eq!(cfg.graceful_shutdown_timeout_secs, 30);

    env::set_current_dir(orig).expect("restore cwd");
}

#[test]
#[serial]
fn load_config_fills_missing_values_with_defaults() {
    let tmp = TempDir::new().expect("create tempdir");
    let orig = env::current_dir().expect("current_dir");
    env::set_current_dir(tmp.path()).expect("set current dir");

    fs::create_dir_all("config").expect("create config dir");
    let toml = r#"
        [server]
        port = 9000
    "#;
    fs::write("config/default.toml", toml).expect("write config file");

    let cfg = load_config().expect("load_config failed");
    assert_eq!(cfg.logger.level, "info");
    assert_eq!(cfg.logger.format, "json");
    assert_eq!(cfg.server.host, "127.0.0.1");
    assert_eq!(cfg.server.port, 9000);
    assert_eq!(cfg.graceful_shutdown_timeout_secs, 5);

    env::set_current_dir(orig).expect("restore cwd");
}

#[test]
#[serial]
fn load_config_requires_server_port() {
    // No config file and no environment: loading must fail rather than
    // fall back to a default port.
    let tmp = TempDir::new().expect("create tempdir");
    let orig = env::current_dir().expect("current_dir");
    env::set_current_dir(tmp.path()).expect("set current dir");

    let err = load_config().expect_err("expected missing port to fail");
    assert!(err.to_string().contains("port is required"));

    env::set_current_dir(orig).expect("restore cwd");
}
