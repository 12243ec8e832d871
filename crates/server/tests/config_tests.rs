//! Configuration resolution tests.

use config::Config;
use upkeep_gateway::config::{BASE_SCOPES, ConfigError, RawAuthConfig};

fn raw_from_yaml(yaml: &str) -> RawAuthConfig {
    let config = Config::builder()
        .add_source(config::File::from_str(yaml, config::FileFormat::Yaml))
        .build()
        .expect("Failed to build config");
    config.try_deserialize().expect("Failed to deserialize")
}

#[test]
fn test_full_config_deserialization() {
    let yaml = r#"
client_id: "client-123"
client_secret: "secret-456"
tenant_id: "contoso"
extra_scopes: "Mail.Read"
redirect_uri: "https://upkeep.example.com/api/auth/callback"
post_logout_redirect_uri: "https://upkeep.example.com/"
production: true
"#;

    let resolved = raw_from_yaml(yaml).resolve().expect("resolves");
    assert_eq!(resolved.client_id, "client-123");
    assert_eq!(resolved.client_secret, "secret-456");
    assert_eq!(resolved.tenant_id, "contoso");
    assert_eq!(
        resolved.authority,
        "https://login.microsoftonline.com/contoso/v2.0"
    );
    assert_eq!(
        resolved.redirect_uri.as_deref(),
        Some("https://upkeep.example.com/api/auth/callback")
    );
    assert!(resolved.production);
    assert!(resolved.scopes.iter().any(|s| s == "Mail.Read"));
}

#[test]
fn test_minimal_config_defaults() {
    let yaml = r#"
client_id: "client-123"
client_secret: "secret-456"
tenant_id: "contoso"
"#;

    let resolved = raw_from_yaml(yaml).resolve().expect("resolves");
    assert!(!resolved.production);
    assert!(resolved.redirect_uri.is_none());
    assert!(resolved.post_logout_redirect_uri.is_none());
    assert_eq!(resolved.scopes.len(), BASE_SCOPES.len());
    for base in BASE_SCOPES {
        assert!(resolved.scopes.iter().any(|s| s == base));
    }
}

#[test]
fn test_missing_client_secret_is_reported_by_name() {
    let yaml = r#"
client_id: "client-123"
tenant_id: "contoso"
"#;

    let err = raw_from_yaml(yaml).resolve().unwrap_err();
    match err {
        ConfigError::MissingKey(key) => assert_eq!(key, "client_secret"),
        other => panic!("expected MissingKey, got: {other}"),
    }
}

#[test]
fn test_missing_tenant_and_authority_is_reported() {
    let yaml = r#"
client_id: "client-123"
client_secret: "secret-456"
"#;

    let err = raw_from_yaml(yaml).resolve().unwrap_err();
    assert!(err.to_string().contains("tenant_id or authority"));
}

#[test]
fn test_authority_only_config_derives_tenant() {
    let yaml = r#"
client_id: "client-123"
client_secret: "secret-456"
authority: "https://login.microsoftonline.com/fabrikam"
"#;

    let resolved = raw_from_yaml(yaml).resolve().expect("resolves");
    assert_eq!(resolved.tenant_id, "fabrikam");
    assert_eq!(
        resolved.authority,
        "https://login.microsoftonline.com/fabrikam/v2.0"
    );
}

#[test]
fn test_invalid_authority_is_rejected() {
    let yaml = r#"
client_id: "client-123"
client_secret: "secret-456"
authority: "not a url"
"#;

    assert!(raw_from_yaml(yaml).resolve().is_err());
}

#[test]
fn test_environment_overrides_file() {
    let yaml = r#"
client_id: "from-file"
client_secret: "secret-456"
tenant_id: "contoso"
"#;

    unsafe {
        std::env::set_var("UPKEEP_TEST_CLIENT_ID", "from-env");
    }

    let config = Config::builder()
        .add_source(config::File::from_str(yaml, config::FileFormat::Yaml))
        .add_source(config::Environment::with_prefix("UPKEEP_TEST"))
        .build()
        .expect("Failed to build config");
    let raw: RawAuthConfig = config.try_deserialize().expect("Failed to deserialize");
    let resolved = raw.resolve().expect("resolves");

    assert_eq!(resolved.client_id, "from-env");
    assert_eq!(resolved.tenant_id, "contoso");

    unsafe {
        std::env::remove_var("UPKEEP_TEST_CLIENT_ID");
    }
}
