use std::sync::Arc;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use switchyard_core::config::AppConfig;
use switchyard_core::error::{Result, SwitchyardError};
use switchyard_core::traits::{Geocoder, RecordStore, WeatherProvider};
use switchyard_core::types::{fields, ActionTag, Coordinates, NodeId};
use switchyard_flow::{
    AuditLogger, ChannelAuditSink, Collaborators, DemoWeatherProvider, Orchestrator,
    StaticGeocoder,
};
use switchyard_store::SqliteStore;
use switchyard_test_utils::{
    sample_tables, seeded_store, CountingAlertProvider, CountingWeatherProvider,
    FailingWeatherProvider,
};

/// Resolves every place to the same rounded point.
struct FixedGeocoder;

impl Geocoder for FixedGeocoder {
    fn locate(&self, _location: &str) -> BoxFuture<'_, Result<Coordinates>> {
        Box::pin(async {
            Ok(Coordinates {
                latitude: 38.58,
                longitude: -121.49,
            })
        })
    }
}

fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.weather.reference_date = chrono::NaiveDate::from_ymd_opt(2025, 8, 5);
    config
}

async fn orchestrator_with(
    config: &AppConfig,
    weather: Arc<dyn WeatherProvider>,
) -> Orchestrator {
    let collab = Collaborators::new(seeded_store().await, Arc::new(StaticGeocoder), weather);
    Orchestrator::new(config, collab).expect("build orchestrator")
}

async fn orchestrator() -> Orchestrator {
    orchestrator_with(&config(), Arc::new(DemoWeatherProvider)).await
}

#[tokio::test]
async fn test_unrecognized_request_reports_no_action() {
    let orch = orchestrator().await;
    for request in ["", "   ", "hello, how are you?"] {
        let outcome = orch.process_request(request).await.unwrap();
        assert_eq!(
            outcome.response,
            "No actions were performed. Please specify what you'd like to do."
        );
        assert_eq!(outcome.path, vec![NodeId::FormatResponse]);
    }
}

#[tokio::test]
async fn test_recent_transactions_in_store_order() {
    let orch = orchestrator().await;
    let outcome = orch.process_request("Show me recent transactions").await.unwrap();

    assert_eq!(outcome.path, vec![NodeId::GetTransactions, NodeId::FormatResponse]);
    assert!(outcome
        .response
        .starts_with("**Recent Transactions:**\n\n1. Transaction ID: TXN1001"));

    let first = outcome.response.find("TXN1001").unwrap();
    let second = outcome.response.find("TXN1002").unwrap();
    let third = outcome.response.find("TXN1003").unwrap();
    assert!(first < second && second < third);
    assert!(outcome.response.contains("Amount: USD 250,000.00"));
    assert!(!outcome.response.contains("4. Transaction ID"));
}

#[tokio::test]
async fn test_dispute_walks_transactions_manager_dispute() {
    let orch = orchestrator().await;
    let request = "raise dispute on a failed transaction";

    let actions = orch.classifier().classify(request);
    assert_eq!(
        actions.into_iter().collect::<Vec<_>>(),
        vec![ActionTag::GetTransactions, ActionTag::RaiseDispute, ActionTag::GetRm]
    );

    let outcome = orch.process_request(request).await.unwrap();
    assert_eq!(
        outcome.path,
        vec![
            NodeId::GetTransactions,
            NodeId::GetRelationshipManager,
            NodeId::RaiseDispute,
            NodeId::FormatResponse,
        ]
    );

    let dispute = outcome.state.get(fields::DISPUTE_DETAILS).unwrap();
    assert_eq!(dispute["transaction_id"], "TXN1002");

    let tx = outcome.response.find("**Recent Transactions:**").unwrap();
    let rm = outcome.response.find("**Relationship Manager Details:**").unwrap();
    let sr = outcome.response.find("**Dispute Raised Successfully:**").unwrap();
    assert!(tx < rm && rm < sr);
}

#[tokio::test]
async fn test_forecast_cache_miss_then_hit() {
    let provider = Arc::new(CountingWeatherProvider::new("Sunny, high of 95°F"));
    let collab = Collaborators::new(
        seeded_store().await,
        Arc::new(FixedGeocoder),
        provider.clone(),
    );
    let orch = Orchestrator::new(&config(), collab).unwrap();

    let first = orch.process_request("weather in Sacramento today").await.unwrap();
    assert!(first.path.contains(&NodeId::Weather));
    assert!(first.path.contains(&NodeId::CacheUpdate));
    assert_eq!(
        orch.cache().get("38.58,-121.49,2025-08-05").await.as_deref(),
        Some("Sunny, high of 95°F")
    );

    let second = orch.process_request("weather in Sacramento today").await.unwrap();
    assert!(!second.path.contains(&NodeId::Weather));
    assert!(second.response.contains("Source: cache"));
    assert!(second.response.contains("Forecast: Sunny, high of 95°F"));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_weather_retry_bound_from_config() {
    let mut config = config();
    config.retry.max_attempts = 4;
    let provider = Arc::new(CountingWeatherProvider::new(
        "Unable to fetch forecast data for this location.",
    ));
    let orch = orchestrator_with(&config, provider.clone()).await;

    let outcome = orch.process_request("forecast for Sacramento").await.unwrap();
    assert_eq!(provider.calls(), 4);
    assert_eq!(
        outcome.state.get_str(fields::WEATHER),
        Some("Unable to fetch forecast data for this location.")
    );
    assert!(outcome.path.contains(&NodeId::Fallback));
    assert!(outcome.response.contains("**Weather Error:**"));
    assert!(outcome.response.contains("**Notice:**"));
}

#[tokio::test]
async fn test_activities_and_booking() {
    let provider = Arc::new(CountingWeatherProvider::new("Clear skies"));
    let orch = orchestrator_with(&config(), provider).await;

    let outcome = orch
        .process_request("suggest activities and book a playground in San Francisco tomorrow")
        .await
        .unwrap();
    assert_eq!(
        outcome.path,
        vec![
            NodeId::ParseQuery,
            NodeId::ResolveDate,
            NodeId::Preference,
            NodeId::Geocode,
            NodeId::CacheLookup,
            NodeId::Weather,
            NodeId::CacheUpdate,
            NodeId::Alerts,
            NodeId::Activities,
            NodeId::PlaygroundAdvice,
            NodeId::PlaygroundBooking,
            NodeId::Notification,
            NodeId::FormatResponse,
        ]
    );
    assert_eq!(outcome.state.get_str(fields::LOCATION_NAME), Some("San Francisco"));
    assert_eq!(outcome.state.get_str(fields::DATE), Some("2025-08-06"));
    assert!(outcome.response.contains("**Weather Alerts:**\nEvent: Heat Advisory"));
    assert!(outcome.response.contains("Outdoor activities: soccer, tennis, picnic."));
    assert!(outcome
        .response
        .contains("**Playground Advice:** You can book the playground!"));
    assert!(outcome.response.contains("**Playground Booking:** Playground booked!"));
    assert!(outcome
        .response
        .ends_with("**Notification:** No weather change notification."));
}

#[tokio::test]
async fn test_rain_cancels_booking_with_notification() {
    let provider = Arc::new(CountingWeatherProvider::new("Light Rain"));
    let orch = orchestrator_with(&config(), provider).await;

    let outcome = orch
        .process_request("book the playground in Sacramento")
        .await
        .unwrap();
    assert!(outcome.path.ends_with(&[
        NodeId::PlaygroundAdvice,
        NodeId::PlaygroundBooking,
        NodeId::Notification,
        NodeId::FormatResponse,
    ]));
    assert!(outcome
        .response
        .contains("**Playground Booking:** Playground not booked due to weather."));
    assert!(outcome.response.ends_with(
        "**Notification:** Weather changed to rain. Playground booking cancelled."
    ));
}

#[tokio::test]
async fn test_alerts_are_retried_up_to_the_bound() {
    let alerts = Arc::new(CountingAlertProvider::new(
        "Unable to fetch alerts or no alerts found.",
    ));
    let collab = Collaborators::new(
        seeded_store().await,
        Arc::new(StaticGeocoder),
        Arc::new(CountingWeatherProvider::new("Sunny")),
    )
    .with_alert_provider(alerts.clone());
    let orch = Orchestrator::new(&config(), collab).unwrap();

    let outcome = orch.process_request("weather in Sacramento").await.unwrap();
    assert_eq!(alerts.calls(), 3);
    assert!(outcome
        .response
        .contains("**Weather Alerts:**\nUnable to fetch alerts or no alerts found."));
    assert!(!outcome.path.contains(&NodeId::Fallback));
}

#[tokio::test]
async fn test_place_names_do_not_trigger_manager_lookup() {
    let provider = Arc::new(CountingWeatherProvider::new("Sunny"));
    let orch = orchestrator_with(&config(), provider).await;

    let outcome = orch
        .process_request("What's the weather in Vermont?")
        .await
        .unwrap();
    assert_eq!(outcome.path[0], NodeId::ParseQuery);
    assert!(outcome.response.starts_with("**Weather Forecast:**"));
    assert!(!outcome.response.contains("**Relationship Manager Details:**"));

    let outcome = orch.process_request("who is my manager").await.unwrap();
    assert_eq!(
        outcome.path,
        vec![NodeId::GetRelationshipManager, NodeId::FormatResponse]
    );
    assert!(outcome.response.contains("**Relationship Manager Details:**"));
}

#[tokio::test]
async fn test_weather_provider_error_is_a_collaborator_failure() {
    let orch = orchestrator_with(&config(), Arc::new(FailingWeatherProvider)).await;
    let err = orch.process_request("weather in Sacramento").await.unwrap_err();
    assert!(matches!(err, SwitchyardError::Weather(_)));
    assert!(err.is_collaborator());
}

#[tokio::test]
async fn test_actor_memory_keeps_five_most_recent() {
    let orch = orchestrator().await;
    orch.process_request("transactions for ACC1001").await.unwrap();
    orch.process_request("transactions for ACC1001").await.unwrap();

    let remembered = orch.memory().get("ACC1001").await;
    assert_eq!(remembered.len(), 5);
    assert_eq!(remembered[0]["transaction_id"], "TXN1003");
    assert!(orch.memory().get("default_user").await.is_empty());
}

#[tokio::test]
async fn test_step_ceiling_from_config() {
    let mut config = config();
    config.orchestrator.max_steps = 2;
    let orch = orchestrator_with(&config, Arc::new(DemoWeatherProvider)).await;

    let err = orch
        .process_request("raise dispute on a failed transaction")
        .await
        .unwrap_err();
    assert!(matches!(err, SwitchyardError::ExecutionLimit(2)));
}

#[tokio::test]
async fn test_cancelled_run_returns_no_output() {
    let orch = orchestrator().await;
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = orch.run("Show me recent transactions", &cancel).await.unwrap_err();
    assert!(matches!(err, SwitchyardError::Cancelled));
}

#[tokio::test]
async fn test_sqlite_store_and_jsonl_audit_trail() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::open(&dir.path().join("payments.db")).unwrap());
    for (table, records) in sample_tables() {
        for record in records {
            store.insert(table, record).await.unwrap();
        }
    }

    let (sink, rx) = ChannelAuditSink::new();
    let logger = tokio::spawn(
        AuditLogger::new(dir.path().join("audit")).run(rx, CancellationToken::new()),
    );

    let collab = Collaborators::new(
        store.clone(),
        Arc::new(StaticGeocoder),
        Arc::new(DemoWeatherProvider),
    )
    .with_audit_sink(Arc::new(sink));
    let orch = Orchestrator::new(&config(), collab).unwrap();

    let outcome = orch
        .process_request("raise dispute on a failed transaction")
        .await
        .unwrap();
    assert!(outcome.response.contains("**Dispute Raised Successfully:**"));

    let dispute_id = outcome.state.get(fields::DISPUTE_DETAILS).unwrap()["dispute_id"]
        .as_str()
        .unwrap()
        .to_string();
    let stored = store
        .lookup(switchyard_core::types::Table::ServiceRequests, &dispute_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored["status"], "open");

    drop(orch);
    let path = logger.await.unwrap().unwrap();
    let content = std::fs::read_to_string(path).unwrap();
    let nodes: Vec<String> = content
        .lines()
        .map(|l| {
            let v: serde_json::Value = serde_json::from_str(l).unwrap();
            v["node"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(nodes, vec!["get_transactions", "raise_dispute", "format_response"]);
}
