//! Integration test for file log output.
//!
//! The only test in this binary that installs the global subscriber.

use navrelay::logging::{init_logging, LoggingConfig};
use tempfile::TempDir;

#[test]
fn test_file_output_writes_json_lines() {
    let temp_dir = TempDir::new().unwrap();
    let log_file = temp_dir.path().join("logs").join("navrelay.log");
    let config = LoggingConfig {
        level: "info".to_string(),
        format: "json".to_string(),
        output: "file".to_string(),
        file: log_file.clone(),
        color: false,
        ..LoggingConfig::default()
    };

    init_logging(Some(&config)).unwrap();
    tracing::info!(marker = "file-output-check", "Logging to file");

    let contents = std::fs::read_to_string(&log_file).unwrap();
    let line = contents
        .lines()
        .find(|line| line.contains("file-output-check"))
        .expect("marker line missing");
    let value: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(value["level"], "INFO");

    assert!(init_logging(Some(&config)).is_err());
}
