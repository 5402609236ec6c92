use log::{debug, info};
use sitekeeper::config::LoggingConfig;
use sitekeeper::logger::{get_log_file_path, init_logging, log_buffer, LogBuffer};

#[test]
fn test_log_buffer_newest_first() {
    let buffer = LogBuffer::new();
    buffer.log("first".to_string());
    buffer.log("second".to_string());

    let logs = buffer.get_logs();
    assert_eq!(logs.len(), 2);
    assert!(logs[0].contains("second"));
    assert!(logs[1].contains("first"));
    assert!(logs[0].starts_with('['));
}

#[test]
fn test_log_buffer_is_bounded() {
    let buffer = LogBuffer::with_capacity(3);
    for i in 0..5 {
        buffer.log(format!("message {i}"));
    }

    let logs = buffer.get_logs();
    assert_eq!(buffer.len(), 3);
    assert!(logs[0].contains("message 4"));
    assert!(logs[2].contains("message 2"));

    buffer.clear();
    assert!(buffer.is_empty());
}

#[test]
fn test_log_file_path() {
    let mut config = LoggingConfig::default();
    config.file = "/tmp/custom.log".to_string();
    assert_eq!(get_log_file_path(&config).unwrap().to_str(), Some("/tmp/custom.log"));

    config.file = String::new();
    if let Ok(path) = get_log_file_path(&config) {
        assert!(path.ends_with("sitekeeper/sitekeeper.log"));
    }
}

// Installing the global logger is process-wide, so everything that depends on
// it lives in this single test.
#[test]
fn test_init_logging_routes_records() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("logs").join("sitekeeper.log");
    let config = LoggingConfig {
        enabled: true,
        level: "info".to_string(),
        file: log_path.display().to_string(),
    };

    let buffer = init_logging(&config).unwrap();
    info!("Test message with file");
    debug!("Filtered out");
    log::logger().flush();

    let logs = buffer.get_logs();
    assert_eq!(logs.len(), 1);
    assert!(logs[0].contains("INFO"));
    assert!(logs[0].contains("Test message with file"));
    assert_eq!(log_buffer().map(|b| b.len()), Some(1));

    let content = std::fs::read_to_string(&log_path).unwrap();
    assert!(content.contains("Test message with file"));
    assert!(!content.contains("Filtered out"));

    // A second installation is an error, not a panic
    assert!(init_logging(&config).is_err());
}
