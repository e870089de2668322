//! Unit tests for common-config crate

use common_config::{EngineConfig, RewriteConfig, UnguardConfig};
use common_error::UnguardError;

#[test]
fn test_unguard_config_default() {
    let config = UnguardConfig::default();

    assert!(config.rewrite.member_unwrap);
    assert!(config.rewrite.method_unwrap);
    assert_eq!(config.rewrite.max_passes, 1);
    assert!(!config.rewrite.enable_trace);

    assert!(!config.engine.strict);
    assert_eq!(config.engine.batch_size, 1024);
}

#[test]
fn test_rewrite_config_presets() {
    let member = RewriteConfig::member_only();
    assert!(member.member_unwrap);
    assert!(!member.method_unwrap);
    assert!(member.any_enabled());

    let method = RewriteConfig::method_only();
    assert!(!method.member_unwrap);
    assert!(method.method_unwrap);

    let none = RewriteConfig {
        member_unwrap: false,
        method_unwrap: false,
        ..Default::default()
    };
    assert!(!none.any_enabled());
}

#[test]
fn test_rewrite_config_builders() {
    let config = RewriteConfig::default().with_max_passes(5).with_trace(true);
    assert_eq!(config.max_passes, 5);
    assert!(config.enable_trace);
}

#[test]
fn test_engine_config_strict() {
    let config = EngineConfig::strict().with_batch_size(16);
    assert!(config.strict);
    assert_eq!(config.batch_size, 16);
}

#[test]
fn test_unguard_config_serialization() {
    let mut config = UnguardConfig::default();
    config.rewrite.method_unwrap = false;
    config.rewrite.max_passes = 3;
    config.engine.strict = true;

    let json = serde_json::to_string(&config).unwrap();
    let deserialized: UnguardConfig = serde_json::from_str(&json).unwrap();

    assert_eq!(deserialized, config);
}

#[test]
fn test_partial_config_uses_defaults() {
    let json = r#"{"rewrite": {"enable_trace": true}}"#;
    let config: UnguardConfig = serde_json::from_str(json).unwrap();

    assert!(config.rewrite.enable_trace);
    assert!(config.rewrite.member_unwrap);
    assert_eq!(config.rewrite.max_passes, 1);
    assert_eq!(config.engine, EngineConfig::default());
}

#[test]
fn test_empty_config_json() {
    let config: UnguardConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, UnguardConfig::default());
}

#[test]
fn test_config_json_helpers() {
    let config = UnguardConfig::from_json(r#"{"engine": {"strict": true}}"#).unwrap();
    assert!(config.engine.strict);
    assert_eq!(config.rewrite, RewriteConfig::default());

    let back = UnguardConfig::from_json(&config.to_json().unwrap()).unwrap();
    assert_eq!(back, config);

    let err = UnguardConfig::from_json("{\"rewrite\": 3}").unwrap_err();
    assert!(matches!(err, UnguardError::SerdeJsonError(_)));
}
