/*!
 * Tests for backend selection and construction
 */

use anyhow::Result;

use codescribe::app_config::BackendConfig;
use codescribe::errors::ScribeError;
use codescribe::providers::{Backend, ModelBackend};
use codescribe::translation::ChatConversation;
use crate::common;

#[test]
fn test_from_selector_withCheckpointDir_shouldUseServedName() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let checkpoint = temp_dir.path().join("starcoder-ft");
    common::create_test_file(&checkpoint, "config.json", r#"{ "eos_token_id": 0 }"#)?;

    let backend = Backend::from_selector(checkpoint.to_str().unwrap(), &BackendConfig::default())?;

    assert!(matches!(backend, Backend::LocalCheckpoint(_)));
    assert_eq!(backend.describe(), "checkpoint starcoder-ft");
    Ok(())
}

#[test]
fn test_from_selector_withServedModelOverride_shouldUseIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let checkpoint = temp_dir.path().join("llama-dir");
    common::create_test_file(&checkpoint, "tokenizer.model", "")?;
    common::create_test_file(&checkpoint, "params.json", "{}")?;
    let config = BackendConfig {
        served_model: Some("codellama:34b".to_string()),
        ..BackendConfig::default()
    };

    let backend = Backend::from_selector(checkpoint.to_str().unwrap(), &config)?;

    assert!(matches!(backend, Backend::LargeLocal(_)));
    assert_eq!(backend.describe(), "large checkpoint codellama:34b");
    Ok(())
}

#[test]
fn test_from_selector_withConfiguredKey_shouldBuildHosted() -> Result<()> {
    let mut config = BackendConfig::default();
    config.hosted.api_key = "sk-test".to_string();

    let backend = Backend::from_selector("OPENAI", &config)?;

    assert_eq!(backend.describe(), "openai (gpt-4o)");
    Ok(())
}

#[test]
fn test_from_selector_withUnknownName_shouldReportNotAvailable() {
    let err = Backend::from_selector("mystery-model", &BackendConfig::default()).unwrap_err();

    assert!(matches!(err, ScribeError::Configuration(_)));
    assert!(err.to_string().contains("mystery-model not available"));
}

/// A failed request surfaces as an error instead of an empty answer
#[tokio::test]
async fn test_chat_withUnreachableServer_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let checkpoint = temp_dir.path().join("tiny");
    std::fs::create_dir_all(&checkpoint)?;
    let config = BackendConfig {
        local_endpoint: "http://127.0.0.1:9".to_string(),
        timeout_secs: 5,
        ..BackendConfig::default()
    };

    let backend = Backend::from_selector(checkpoint.to_str().unwrap(), &config)?;
    let result = backend.chat(&ChatConversation::single_user("hello")).await;

    assert!(result.is_err());
    Ok(())
}
