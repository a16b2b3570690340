//! Settings resolution tests

use std::collections::HashMap;

use connectapi::{ConnectError, Settings, SettingsInput};

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn test_environment_fallback() {
    let settings = Settings::resolve_with(
        SettingsInput::default(),
        env(&[
            ("CONNECT_SERVER", "https://connect.example.com"),
            ("CONNECT_API_KEY", "secret"),
        ]),
    )
    .unwrap();

    assert_eq!(settings.server(), "https://connect.example.com");
    assert_eq!(settings.api_endpoint(), "https://connect.example.com/__api__/v1");
    assert_eq!(settings.authorization(), "Key secret");
}

#[test]
fn test_explicit_values_beat_environment() {
    let settings = Settings::resolve_with(
        SettingsInput {
            server: Some("https://explicit.example.com".to_string()),
            api_key: Some("mine".to_string()),
            api_endpoint: None,
        },
        env(&[
            ("CONNECT_SERVER", "https://env.example.com"),
            ("CONNECT_API_KEY", "theirs"),
        ]),
    )
    .unwrap();

    assert_eq!(settings.server(), "https://explicit.example.com");
    assert_eq!(settings.authorization(), "Key mine");
}

#[test]
fn test_api_endpoint_override() {
    let settings = Settings::resolve_with(
        SettingsInput {
            server: Some("https://connect.example.com".to_string()),
            api_key: Some("k".to_string()),
            api_endpoint: None,
        },
        env(&[("API_ENDPOINT", "http://localhost:3939/__api__/v1/")]),
    )
    .unwrap();

    assert_eq!(settings.api_endpoint(), "http://localhost:3939/__api__/v1");
    assert_eq!(settings.server(), "https://connect.example.com");
}

#[test]
fn test_missing_values_are_config_errors() {
    let no_key = Settings::resolve_with(
        SettingsInput::default(),
        env(&[("CONNECT_SERVER", "https://connect.example.com")]),
    )
    .unwrap_err();
    assert!(matches!(no_key, ConnectError::Config(ref m) if m.contains("CONNECT_API_KEY")));

    let no_server =
        Settings::resolve_with(SettingsInput::default(), env(&[("CONNECT_API_KEY", "k")])).unwrap_err();
    assert!(matches!(no_server, ConnectError::Config(ref m) if m.contains("CONNECT_SERVER")));

    let blank_key = Settings::resolve_with(
        SettingsInput::default(),
        env(&[
            ("CONNECT_SERVER", "https://connect.example.com"),
            ("CONNECT_API_KEY", "   "),
        ]),
    )
    .unwrap_err();
    assert!(matches!(blank_key, ConnectError::Config(_)));
}
