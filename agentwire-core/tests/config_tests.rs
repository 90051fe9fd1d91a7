//! Integration tests for configuration loading and validation

use agentwire_core::config::{load_from_json, load_from_yaml, ConfigError, ValidationErrorKind};
use agentwire_core::protocol::Protocol;
use agentwire_core::{Agent, Model};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

/// Helper to create a test config file
fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_valid_yaml_config() {
    use std::env;
    env::set_var("AGENTWIRE_TEST_AZURE_KEY", "az-test-key");

    let yaml = r#"
name: reviewer
system_prompt: You review pull requests.
transport:
  timeout: 30s
  max_retries: 5
  retry_backoff_base: 250ms
  provider:
    name: azure
    base_url: https://example.openai.azure.com/openai
    options:
      deployment: gpt4o
      api_version: "2024-06-01"
      auth_type: api_key
      token: ${AGENTWIRE_TEST_AZURE_KEY}
    model:
      name: gpt-4o
      capabilities:
        chat:
          format: chat
          options:
            temperature: 0.3
        vision:
          format: vision
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "agent.yaml", yaml);

    let result = load_from_yaml(path);
    assert!(result.is_ok());

    let config = result.unwrap();
    assert_eq!(config.name, "reviewer");
    assert_eq!(config.system_prompt.as_deref(), Some("You review pull requests."));
    assert_eq!(config.transport.timeout, Duration::from_secs(30));
    assert_eq!(config.transport.max_retries, 5);
    assert_eq!(config.transport.retry_backoff_base, Duration::from_millis(250));
    assert_eq!(config.transport.connection_pool_size, 10);
    assert_eq!(config.transport.provider.options["token"], "az-test-key");
    assert_eq!(config.transport.provider.model.capabilities.len(), 2);

    env::remove_var("AGENTWIRE_TEST_AZURE_KEY");
}

#[test]
fn test_load_valid_json_config() {
    let json = r#"{
        "name": "local-assistant",
        "transport": {
            "provider": {
                "name": "ollama",
                "base_url": "http://localhost:11434",
                "model": {
                    "name": "llama3",
                    "capabilities": {
                        "chat": {"format": "chat"},
                        "embeddings": {"format": "embeddings"}
                    }
                }
            }
        }
    }"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "agent.json", json);

    let config = load_from_json(path).unwrap();
    assert_eq!(config.name, "local-assistant");
    assert!(config.system_prompt.is_none());
    assert_eq!(config.transport.timeout, Duration::from_secs(120));
    assert_eq!(config.transport.max_retries, 3);
    assert_eq!(config.transport.retry_backoff_base, Duration::from_secs(1));

    let model = Model::from_config(&config.transport.provider.model).unwrap();
    assert!(model.supports(Protocol::Chat));
    assert!(model.supports(Protocol::Embeddings));
    assert!(!model.supports(Protocol::Tools));
}

#[test]
fn test_loaded_config_builds_agent() {
    let yaml = r#"
name: helper
system_prompt: Be brief.
transport:
  provider:
    name: local
    base_url: http://localhost:8080/
    model:
      name: qwen
      capabilities:
        chat:
          format: chat
"#;

    let dir = TempDir::new().unwrap();
    let config = load_from_yaml(create_test_file(&dir, "agent.yaml", yaml)).unwrap();
    let agent = Agent::from_config(&config).unwrap();

    assert_eq!(agent.name(), "helper");
    assert_eq!(agent.system_prompt(), Some("Be brief."));
    assert_eq!(agent.client().provider().name(), "local");
    assert_eq!(agent.client().provider().base_url(), "http://localhost:8080/v1");
    assert_eq!(agent.client().model().name(), "qwen");
}

#[test]
fn test_missing_env_var() {
    let yaml = r#"
name: broken
transport:
  provider:
    name: local
    base_url: ${AGENTWIRE_TEST_UNSET_BASE_URL}
    model:
      name: m
      capabilities:
        chat:
          format: chat
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "agent.yaml", yaml);

    let result = load_from_yaml(path);
    assert!(matches!(
        result,
        Err(ConfigError::EnvVarNotFound { ref var }) if var == "AGENTWIRE_TEST_UNSET_BASE_URL"
    ));
}

#[test]
fn test_invalid_url_rejected() {
    let yaml = r#"
name: bad-url
transport:
  provider:
    name: local
    base_url: ftp://localhost
    model:
      name: m
      capabilities:
        chat:
          format: chat
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "agent.yaml", yaml);

    match load_from_yaml(path) {
        Err(ConfigError::ValidationError(e)) => {
            assert_eq!(e.field_path, "transport.provider.base_url");
            assert!(matches!(e.kind, ValidationErrorKind::Invalid(_)));
            assert!(e.to_string().contains("http or https"));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn test_zero_retries_rejected() {
    let json = r#"{
        "name": "no-retries",
        "transport": {
            "max_retries": 0,
            "provider": {
                "name": "local",
                "base_url": "http://localhost:8080",
                "model": {"name": "m", "capabilities": {"chat": {"format": "chat"}}}
            }
        }
    }"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "agent.json", json);

    match load_from_json(path) {
        Err(ConfigError::ValidationError(e)) => {
            assert_eq!(e.field_path, "transport.max_retries");
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn test_empty_capabilities_rejected() {
    let yaml = r#"
name: no-protocols
transport:
  provider:
    name: local
    base_url: http://localhost:8080
    model:
      name: m
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "agent.yaml", yaml);

    match load_from_yaml(path) {
        Err(ConfigError::ValidationError(e)) => {
            assert_eq!(e.field_path, "transport.provider.model.capabilities");
            assert!(matches!(e.kind, ValidationErrorKind::Missing));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn test_unknown_field_is_parse_error() {
    let yaml = r#"
name: typo
transprt:
  provider: {}
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "agent.yaml", yaml);

    let result = load_from_yaml(path);
    assert!(matches!(result, Err(ConfigError::ParseError { .. })));
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = load_from_json(dir.path().join("absent.json"));
    assert!(matches!(result, Err(ConfigError::IoError { .. })));
}

#[test]
fn test_debug_output_redacts_token() {
    let json = r#"{
        "name": "secretive",
        "transport": {
            "provider": {
                "name": "local",
                "base_url": "http://localhost:8080",
                "options": {"auth_type": "bearer", "token": "sk-very-secret"},
                "model": {"name": "m", "capabilities": {"chat": {"format": "chat"}}}
            }
        }
    }"#;

    let dir = TempDir::new().unwrap();
    let config = load_from_json(create_test_file(&dir, "agent.json", json)).unwrap();

    let debug = format!("{:?}", config);
    assert!(!debug.contains("sk-very-secret"));
    assert!(debug.contains("[REDACTED]"));
}
