use super::*;

#[test]
fn test_default_config_validates() {
    let config = Config::default();
    config.validate().unwrap();
    assert_eq!(config.gateway.port, 8000);
    assert_eq!(config.session.max_turns, 10);
    assert!(config.cache.enabled);
}

#[test]
fn test_default_provider_order_is_gemini_anthropic_deepseek() {
    let config = Config::default();
    let names: Vec<&str> = config.providers.iter().map(|p| p.display_name()).collect();
    assert_eq!(names, vec!["gemini", "anthropic", "deepseek"]);
}

#[test]
fn test_empty_object_deserializes_to_defaults() {
    let config: Config = serde_json::from_str("{}").unwrap();
    assert_eq!(config.cache.ttl_secs, 3600);
    assert_eq!(config.queue.workers, 4);
    assert_eq!(config.delivery.instance, "main");
}

#[test]
fn test_camel_case_keys_round_trip() {
    let json = serde_json::json!({
        "session": {"maxTurns": 5},
        "cache": {"ttlSecs": 60, "scopeByConversation": true},
        "delivery": {"baseUrl": "http://evo:8080", "apiKey": "k", "webhookUrl": "http://me/webhook"},
        "providers": [
            {"kind": "anthropic", "apiKey": "sk", "timeoutSecs": 30}
        ],
    });
    let config: Config = serde_json::from_value(json).unwrap();
    assert_eq!(config.session.max_turns, 5);
    assert!(config.cache.scope_by_conversation);
    assert_eq!(config.delivery.webhook_url.as_deref(), Some("http://me/webhook"));
    assert_eq!(config.providers.len(), 1);
    assert_eq!(config.providers[0].kind, ProviderKind::Anthropic);
    assert_eq!(config.providers[0].timeout_secs, 30);

    let out = serde_json::to_value(&config).unwrap();
    assert_eq!(out.pointer("/session/maxTurns"), Some(&serde_json::json!(5)));
}

#[test]
fn test_provider_kind_names() {
    assert_eq!(
        serde_json::from_value::<ProviderKind>(serde_json::json!("openai")).unwrap(),
        ProviderKind::OpenAiCompat
    );
    assert_eq!(ProviderKind::Gemini.as_str(), "gemini");
}

#[test]
fn test_validate_rejects_zero_workers() {
    let mut config = Config::default();
    config.queue.workers = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_empty_providers() {
    let mut config = Config::default();
    config.providers.clear();
    assert!(config.validate().is_err());
}

#[test]
fn test_debug_redacts_api_keys() {
    let mut config = Config::default();
    config.providers[0].api_key = "super-secret".to_string();
    config.delivery.api_key = "evo-secret".to_string();
    let debug = format!("{:?}", config);
    assert!(!debug.contains("super-secret"));
    assert!(!debug.contains("evo-secret"));
}
