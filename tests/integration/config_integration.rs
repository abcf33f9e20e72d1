//! Integration tests for configuration loading

use navrelay::config::ENV_PREFIX;
use navrelay::{RouterConfig, RouterError};
use std::sync::Mutex;
use tempfile::TempDir;

/// Serializes tests that touch process environment
static ENV_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn test_environment_overrides_file() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("navrelay.toml");
    std::fs::write(
        &config_file,
        r#"
main_entry_point = "home"

[back]
debounce_ms = 250
"#,
    )
    .unwrap();

    let key = format!("{}__BACK__DEBOUNCE_MS", ENV_PREFIX);
    std::env::set_var(&key, "50");
    let loaded = RouterConfig::load(Some(&config_file));
    std::env::remove_var(&key);

    let config = loaded.unwrap();
    assert_eq!(config.main_entry_point, "home");
    assert_eq!(config.back.debounce_ms, 50);
    assert_eq!(config.back.pop_threshold, 2);
}

#[test]
fn test_malformed_file_is_config_error() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("navrelay.toml");
    std::fs::write(&config_file, "back = [not toml").unwrap();

    assert!(matches!(
        RouterConfig::load(Some(&config_file)),
        Err(RouterError::Config(_))
    ));
}

#[test]
fn test_load_without_file_uses_defaults() -> anyhow::Result<()> {
    let _guard = ENV_MUTEX.lock().unwrap();
    let config = RouterConfig::load(None)?;
    assert_eq!(config, RouterConfig::default());
    Ok(())
}

#[test]
fn test_written_file_round_trips_through_load() -> anyhow::Result<()> {
    let _guard = ENV_MUTEX.lock().unwrap();
    let temp_dir = TempDir::new()?;
    let config_file = temp_dir.path().join("navrelay.toml");
    let mut config = RouterConfig::default();
    config.multi_context = false;
    config.back.pop_threshold = 4;
    config.logging.format = "json".to_string();
    std::fs::write(&config_file, config.to_toml()?)?;

    assert_eq!(RouterConfig::load(Some(&config_file))?, config);
    Ok(())
}
