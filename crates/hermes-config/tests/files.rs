//! Loading settings from files on disk.

use std::io::Write;

use hermes_config::{ConfigError, ConfigLoader};
use hermes_core::ErrorShape;
use hermes_telemetry::LogFormat;
use tempfile::NamedTempFile;

fn write_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_toml_file() {
    let file = write_file(
        ".toml",
        r#"
            [logging]
            level = "warn"
            format = "pretty"

            [validation]
            all_errors = true
            error_shape = "full"
        "#,
    );

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();

    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.logging.format, LogFormat::Pretty);
    assert!(config.validation.all_errors);
    assert!(config.validation.validate_formats);
    assert_eq!(config.error_shape(), ErrorShape::Full);
    assert_eq!(config.http.default_status, 200);
}

#[test]
fn test_json_file() {
    let file = write_file(".json", r#"{ "http": { "expose_internal_errors": true } }"#);

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
    assert!(config.http.expose_internal_errors);
}

#[test]
fn test_unknown_field_is_rejected() {
    let file = write_file(".toml", "[http]\ndefault_code = 201\n");

    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::TomlError(_))));
}

#[test]
fn test_unsupported_extension() {
    let file = write_file(".yaml", "validation: {}\n");

    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::ValidationError(_))));
}

#[test]
fn test_invalid_value_fails_load() {
    let file = write_file(".toml", "[http]\ndefault_status = 1000\n");

    let result = ConfigLoader::new().with_file(file.path()).unwrap().load();
    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}

#[test]
fn test_settings_drive_engine_options() {
    let file = write_file(".toml", "[validation]\nall_errors = true\nvalidate_formats = false\n");

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
    let options = config.engine_options();
    assert!(options.collects_all_errors());
    assert!(!options.validates_formats());
}

#[test]
fn test_partial_file_keeps_preset() {
    let file = write_file(".toml", "[http]\ndefault_status = 201\n");

    let config = ConfigLoader::new()
        .with_development()
        .with_file(file.path())
        .unwrap()
        .load()
        .unwrap();

    assert_eq!(config.http.default_status, 201);
    assert!(config.http.expose_internal_errors);
    assert!(config.validation.all_errors);
    assert_eq!(config.logging.format, LogFormat::Pretty);
}
