use std::io::Write;
use std::sync::Arc;

use switchyard_core::config::AppConfig;
use switchyard_core::error::SwitchyardError;
use switchyard_core::types::{ActionTag, NodeId};
use switchyard_flow::{Collaborators, DemoWeatherProvider, Orchestrator, StaticGeocoder};
use switchyard_test_utils::seeded_store;

#[test]
fn test_load_full_config_from_file() {
    let toml_content = r#"
[orchestrator]
max_steps = 40
transactions_limit = 2

[retry]
max_attempts = 4
failure_markers = ["Unable", "No", "Error"]

[memory]
account_prefixes = ["ACC", "account_", "CUST"]
default_actor = "anonymous"

[router]
priority = ["weather", "get_transactions", "get_rm"]

[weather]
default_location = "Davis, CA"
reference_date = "2025-08-05"

[storage]
path = "/tmp/switchyard-test/payments.db"

[gateway]
bind = "0.0.0.0:9999"

[audit]
enabled = true
log_dir = "/tmp/switchyard-test/audit"
"#;

    let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
    tmp.write_all(toml_content.as_bytes()).expect("write toml");

    let config = AppConfig::load(tmp.path()).expect("load config");

    assert_eq!(config.orchestrator.max_steps, 40);
    assert_eq!(config.orchestrator.transactions_limit, 2);
    assert_eq!(config.retry.max_attempts, 4);
    assert_eq!(config.retry.failure_markers.len(), 3);
    assert_eq!(config.memory.account_prefixes.len(), 3);
    assert_eq!(config.memory.default_actor, "anonymous");
    assert_eq!(config.router.priority[0], ActionTag::Weather);
    assert_eq!(config.weather.default_location, "Davis, CA");
    assert_eq!(config.gateway.bind, "0.0.0.0:9999");
    assert_eq!(
        config.storage_path().to_str(),
        Some("/tmp/switchyard-test/payments.db")
    );
    assert_eq!(
        config.audit_dir().and_then(|p| p.to_str().map(String::from)),
        Some("/tmp/switchyard-test/audit".to_string())
    );
}

#[test]
fn test_env_var_expansion_in_config() {
    std::env::set_var("SWITCHYARD_TEST_BIND", "10.0.0.5:8080");

    let toml_content = r#"
[gateway]
bind = "${SWITCHYARD_TEST_BIND}"
"#;

    let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
    tmp.write_all(toml_content.as_bytes()).expect("write toml");

    let config = AppConfig::load(tmp.path()).expect("load config");
    assert_eq!(config.gateway.bind, "10.0.0.5:8080");

    std::env::remove_var("SWITCHYARD_TEST_BIND");
}

#[test]
fn test_minimal_config_uses_defaults() {
    let toml_content = r#"
[weather]
reference_date = "2025-08-05"
"#;

    let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
    tmp.write_all(toml_content.as_bytes()).expect("write toml");

    let config = AppConfig::load(tmp.path()).expect("load config");

    assert_eq!(config.orchestrator.max_steps, 0);
    assert_eq!(config.retry.max_attempts, 3);
    assert_eq!(config.retry.failure_markers, vec!["Unable", "No"]);
    assert_eq!(config.memory.default_actor, "default_user");
    assert_eq!(config.router.priority.len(), 8);
    assert_eq!(config.weather.default_location, "Sacramento, CA");
    assert!(config.audit.enabled);
    assert!(config.audit_dir().is_none());
}

#[test]
fn test_malformed_config_is_a_config_error() {
    let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
    tmp.write_all(b"[retry]\nmax_attempts = \"three\"\n")
        .expect("write toml");

    let err = AppConfig::load(tmp.path()).unwrap_err();
    assert!(matches!(err, SwitchyardError::Config(_)));
    assert!(err.is_configuration());
}

#[tokio::test]
async fn test_loaded_priority_drives_entry_selection() {
    let toml_content = r#"
[router]
priority = ["weather", "get_transactions"]

[weather]
reference_date = "2025-08-05"
"#;
    let (_dir, path) = switchyard_test_utils::write_config(toml_content);
    let config = AppConfig::load(&path).expect("load config");

    let orch = Orchestrator::new(
        &config,
        Collaborators::new(
            seeded_store().await,
            Arc::new(StaticGeocoder),
            Arc::new(DemoWeatherProvider),
        ),
    )
    .expect("build orchestrator");

    let outcome = orch
        .process_request("weather and payment summary")
        .await
        .expect("run");
    assert_eq!(outcome.path[0], NodeId::ParseQuery);
    assert!(!outcome.path.contains(&NodeId::GetTransactions));
}

#[tokio::test]
async fn test_dispute_in_priority_is_rejected_at_build() {
    let (_dir, path) = switchyard_test_utils::write_config(
        "[router]\npriority = [\"raise_dispute\", \"get_transactions\"]\n",
    );
    let config = AppConfig::load(&path).expect("load config");

    let result = Orchestrator::new(
        &config,
        Collaborators::new(
            seeded_store().await,
            Arc::new(StaticGeocoder),
            Arc::new(DemoWeatherProvider),
        ),
    );
    assert!(matches!(result, Err(SwitchyardError::Config(_))));
}
