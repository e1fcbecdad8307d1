//! Integration tests for daraja-core infrastructure

use daraja_core::{storage_error, with_timeout, DarajaConfig, DarajaError, LogFormat, LoggingConfig};
use std::time::Duration;
use tokio::time::sleep;

#[test]
fn test_error_handling() {
    let error = storage_error!("Quota exceeded", "test_component");

    match &error {
        DarajaError::Storage {
            message, context, ..
        } => {
            assert_eq!(message, "Quota exceeded");
            assert_eq!(context.component, "test_component");
            assert!(!context.error_id.is_empty());
            assert!(!context.recovery_suggestions.is_empty());
        }
        _ => panic!("Expected Storage error"),
    }

    // Logging an error must not panic without a subscriber
    error.log();

    let io_error: DarajaError =
        std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
    assert!(io_error.context().is_none());
    io_error.log();
}

#[test]
fn test_storage_error_keeps_source() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
    let error = storage_error!("Write failed", "store", io);
    assert!(std::error::Error::source(&error).is_some());
}

#[tokio::test]
async fn test_timeout_mechanism() {
    let quick_operation = async {
        sleep(Duration::from_millis(10)).await;
        "Success"
    };

    let result = with_timeout(quick_operation, 500, "quick_test").await;
    assert_eq!(result.unwrap(), "Success");

    let slow_operation = async {
        sleep(Duration::from_millis(500)).await;
        "Should not reach here"
    };

    let result = with_timeout(slow_operation, 20, "slow_test").await;
    match result {
        Err(DarajaError::Timeout {
            operation,
            duration_ms,
            ..
        }) => {
            assert_eq!(operation, "slow_test");
            assert_eq!(duration_ms, 20);
        }
        other => panic!("Expected Timeout error, got {:?}", other),
    }
}

#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = DarajaConfig::default();
    config.api.base_url = "https://api.daraja.test/v1".to_string();
    config.session.expiry_warning_secs = 600;
    config.logging.format = LogFormat::Json;

    config.save_to_file(&path).unwrap();
    let loaded = DarajaConfig::from_file(&path).unwrap();

    assert_eq!(loaded, config);
}

#[test]
fn test_partial_config_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[api]
base_url = "https://remit.example.com/api"

[session]
expiry_check_interval_secs = 30
"#,
    )
    .unwrap();

    let config = DarajaConfig::from_file(&path).unwrap();
    assert_eq!(config.api.base_url, "https://remit.example.com/api");
    assert_eq!(config.api.login_path, "/auth/login");
    assert_eq!(config.session.expiry_check_interval_secs, 30);
    assert_eq!(config.session.storage_key, "daraja.session");
    assert_eq!(config.logging, LoggingConfig::default());
}

#[test]
fn test_invalid_config_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[session\nstorage_key = ").unwrap();

    let err = DarajaConfig::from_file(&path).unwrap_err();
    match err {
        DarajaError::Config { context, .. } => {
            assert_eq!(context.operation.as_deref(), Some("parse_toml"));
        }
        other => panic!("Expected Config error, got {:?}", other),
    }
}

#[test]
fn test_logging_initialization_only_once() {
    let config = LoggingConfig {
        level: "debug".to_string(),
        format: LogFormat::Compact,
        filter_directives: vec!["daraja_core=debug".to_string()],
        ..Default::default()
    };

    let first = daraja_core::init_logging(&config);
    assert!(first.is_ok());

    // A second global subscriber is refused instead of panicking
    let second = daraja_core::init_logging(&config);
    assert!(second.is_err());
}
