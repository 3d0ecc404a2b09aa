use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use switchyard_core::config::AppConfig;
use switchyard_core::error::{Result, SwitchyardError};
use switchyard_core::traits::{AlertProvider, AuditSink, Geocoder, RecordStore, WeatherProvider};
use switchyard_core::types::{fields, ActionTag, NodeId, WorkflowState};

use crate::aggregator::ResponseAggregator;
use crate::cache::ResultCache;
use crate::classifier::Classifier;
use crate::graph::{EntryRouter, GraphBuilder, Route, RunOutcome, WorkflowGraph};
use crate::memory::{ActorKeyResolver, ActorMemory};
use crate::providers::DemoAlertProvider;
use crate::retry::{FailureClassifier, RetryStep};
use crate::steps::weather::WeatherStep;
use crate::steps::{
    ActivitiesStep, AlertsStep, CacheLookupStep, CacheUpdateStep, CheckNostroCreditStep,
    FallbackStep, GeocodeStep, GetNostroAccountsStep, GetRelationshipManagerStep,
    GetTransactionsStep, NotificationStep, ParseQueryStep, PlaygroundAdviceStep,
    PlaygroundBookingStep, PreferenceStep, RaiseDisputeStep, ResolveDateStep,
    VerifyTransactionStep,
};

/// Nodes that emit an audit record after they run.
pub const AUDITED_NODES: [NodeId; 11] = [
    NodeId::GetTransactions,
    NodeId::RaiseDispute,
    NodeId::VerifyTransaction,
    NodeId::CheckNostroCredit,
    NodeId::Geocode,
    NodeId::Weather,
    NodeId::Alerts,
    NodeId::Activities,
    NodeId::PlaygroundBooking,
    NodeId::Notification,
    NodeId::FormatResponse,
];

/// External collaborators the deployment graph talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn RecordStore>,
    pub geocoder: Arc<dyn Geocoder>,
    pub weather: Arc<dyn WeatherProvider>,
    pub alerts: Arc<dyn AlertProvider>,
    pub audit_sinks: Vec<Arc<dyn AuditSink>>,
}

impl Collaborators {
    pub fn new(
        store: Arc<dyn RecordStore>,
        geocoder: Arc<dyn Geocoder>,
        weather: Arc<dyn WeatherProvider>,
    ) -> Self {
        Self {
            store,
            geocoder,
            weather,
            alerts: Arc::new(DemoAlertProvider),
            audit_sinks: Vec::new(),
        }
    }

    pub fn with_alert_provider(mut self, alerts: Arc<dyn AlertProvider>) -> Self {
        self.alerts = alerts;
        self
    }

    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sinks.push(sink);
        self
    }
}

/// Entry node for an action tag. `raise_dispute` is reached through the
/// relationship-manager node and has no entry of its own.
pub fn entry_node(tag: ActionTag) -> Option<NodeId> {
    match tag {
        ActionTag::CheckNostro => Some(NodeId::CheckNostroCredit),
        ActionTag::GetNostroAccounts => Some(NodeId::GetNostroAccounts),
        ActionTag::GetTransactions => Some(NodeId::GetTransactions),
        ActionTag::VerifyTransaction => Some(NodeId::VerifyTransaction),
        ActionTag::GetRm => Some(NodeId::GetRelationshipManager),
        ActionTag::Weather | ActionTag::Activity | ActionTag::Booking => Some(NodeId::ParseQuery),
        ActionTag::RaiseDispute => None,
    }
}

fn entry_router(priority: &[ActionTag]) -> Result<EntryRouter> {
    let mut table = Vec::with_capacity(priority.len());
    for tag in priority {
        let node = entry_node(*tag).ok_or_else(|| {
            SwitchyardError::Config(format!("Action {} cannot start a workflow", tag))
        })?;
        table.push((*tag, node));
    }
    Ok(EntryRouter::new(table, NodeId::FormatResponse))
}

/// Classifies requests and runs them through the deployment graph.
///
/// Actor memory and the forecast cache live as long as the orchestrator and
/// are shared by every run.
pub struct Orchestrator {
    classifier: Classifier,
    store: Arc<dyn RecordStore>,
    graph: WorkflowGraph,
    memory: Arc<ActorMemory>,
    cache: Arc<ResultCache>,
}

impl Orchestrator {
    pub fn new(config: &AppConfig, collaborators: Collaborators) -> Result<Self> {
        let memory = Arc::new(ActorMemory::new());
        let cache = Arc::new(ResultCache::new());
        let graph = build_graph(config, &collaborators, memory.clone(), cache.clone())?;

        info!(
            step_limit = graph.step_limit(),
            audit_sinks = collaborators.audit_sinks.len(),
            "Orchestrator ready"
        );

        Ok(Self {
            classifier: Classifier::from_config(&config.classifier),
            store: collaborators.store.clone(),
            graph,
            memory,
            cache,
        })
    }

    pub fn memory(&self) -> &Arc<ActorMemory> {
        &self.memory
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// The record store the payment steps read and write.
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    /// Run one request to completion.
    pub async fn process_request(&self, request: &str) -> Result<RunOutcome> {
        self.run(request, &CancellationToken::new()).await
    }

    /// Run one request, giving up with `Cancelled` once `cancel` fires.
    pub async fn run(&self, request: &str, cancel: &CancellationToken) -> Result<RunOutcome> {
        let actions = self.classifier.classify(request);
        info!(
            actions = ?actions.iter().map(|a| a.as_str()).collect::<Vec<_>>(),
            "Request classified"
        );
        let state = WorkflowState::new(request, actions);
        self.graph.execute(state, cancel).await
    }
}

fn build_graph(
    config: &AppConfig,
    collaborators: &Collaborators,
    memory: Arc<ActorMemory>,
    cache: Arc<ResultCache>,
) -> Result<WorkflowGraph> {
    let store = collaborators.store.clone();
    let actors = ActorKeyResolver::from_config(&config.memory);
    let failures = FailureClassifier::from_config(&config.retry);
    let attempts = config.retry.max_attempts.max(1);

    let weather = RetryStep::new(
        NodeId::Weather.as_str(),
        Arc::new(WeatherStep::new(collaborators.weather.clone())),
        attempts,
        failures.clone(),
    );

    let alerts = RetryStep::new(
        NodeId::Alerts.as_str(),
        Arc::new(AlertsStep::new(
            collaborators.alerts.clone(),
            config.weather.alert_area.clone(),
        )),
        attempts,
        failures.clone(),
    );

    let weather_failed = {
        let failures = failures.clone();
        move |state: &WorkflowState| {
            state
                .get_str(fields::WEATHER)
                .map_or(true, |text| failures.is_failure_text(text))
        }
    };

    let mut builder = GraphBuilder::new(
        NodeId::FormatResponse,
        ResponseAggregator::new(failures.clone()),
    )
    // payments
    .node(
        NodeId::GetTransactions,
        GetTransactionsStep::new(
            store.clone(),
            memory,
            actors.clone(),
            config.orchestrator.transactions_limit,
        ),
    )
    .node(
        NodeId::GetRelationshipManager,
        GetRelationshipManagerStep::new(store.clone(), actors),
    )
    .node(NodeId::RaiseDispute, RaiseDisputeStep::new(store.clone()))
    .node(NodeId::VerifyTransaction, VerifyTransactionStep::new(store.clone()))
    .node(NodeId::CheckNostroCredit, CheckNostroCreditStep::new(store.clone()))
    .node(NodeId::GetNostroAccounts, GetNostroAccountsStep::new(store))
    // weather
    .node(
        NodeId::ParseQuery,
        ParseQueryStep::new(config.weather.default_location.clone())?,
    )
    .node(NodeId::ResolveDate, ResolveDateStep::new(config.weather.clone()))
    .node(NodeId::Preference, PreferenceStep)
    .node(
        NodeId::Geocode,
        GeocodeStep::new(
            collaborators.geocoder.clone(),
            config.weather.default_location.clone(),
        ),
    )
    .node(NodeId::CacheLookup, CacheLookupStep::new(cache.clone()))
    .node(NodeId::Weather, weather)
    .node(NodeId::CacheUpdate, CacheUpdateStep::new(cache, failures))
    .node(NodeId::Alerts, alerts)
    .node(NodeId::Activities, ActivitiesStep)
    .node(NodeId::PlaygroundAdvice, PlaygroundAdviceStep)
    .node(NodeId::PlaygroundBooking, PlaygroundBookingStep)
    .node(NodeId::Notification, NotificationStep)
    .node(NodeId::Fallback, FallbackStep)
    // payment routes
    .route(
        NodeId::GetTransactions,
        Route::otherwise(NodeId::FormatResponse)
            .when_action(ActionTag::RaiseDispute, NodeId::GetRelationshipManager),
    )
    .route(
        NodeId::GetRelationshipManager,
        Route::otherwise(NodeId::FormatResponse)
            .when_action(ActionTag::RaiseDispute, NodeId::RaiseDispute),
    )
    .route(NodeId::RaiseDispute, Route::to(NodeId::FormatResponse))
    .route(NodeId::VerifyTransaction, Route::to(NodeId::FormatResponse))
    .route(NodeId::CheckNostroCredit, Route::to(NodeId::FormatResponse))
    .route(NodeId::GetNostroAccounts, Route::to(NodeId::FormatResponse))
    // weather routes
    .route(NodeId::ParseQuery, Route::to(NodeId::ResolveDate))
    .route(NodeId::ResolveDate, Route::to(NodeId::Preference))
    .route(NodeId::Preference, Route::to(NodeId::Geocode))
    .route(NodeId::Geocode, Route::to(NodeId::CacheLookup))
    .route(
        NodeId::CacheLookup,
        Route::otherwise(NodeId::Weather).when(
            |s: &WorkflowState| s.get(fields::CACHE_HIT).and_then(|v| v.as_bool()) == Some(true),
            NodeId::Alerts,
        ),
    )
    .route(
        NodeId::Weather,
        Route::otherwise(NodeId::CacheUpdate).when(weather_failed, NodeId::Fallback),
    )
    .route(NodeId::CacheUpdate, Route::to(NodeId::Alerts))
    .route(NodeId::Alerts, Route::to(NodeId::Activities))
    .route(
        NodeId::Activities,
        Route::otherwise(NodeId::FormatResponse)
            .when_action(ActionTag::Booking, NodeId::PlaygroundAdvice),
    )
    .route(NodeId::PlaygroundAdvice, Route::to(NodeId::PlaygroundBooking))
    .route(NodeId::PlaygroundBooking, Route::to(NodeId::Notification))
    .route(NodeId::Notification, Route::to(NodeId::FormatResponse))
    .route(NodeId::Fallback, Route::to(NodeId::FormatResponse))
    .entry(entry_router(&config.router.priority)?)
    .retry_bound(attempts)
    .step_limit(config.orchestrator.max_steps);

    for node in AUDITED_NODES {
        builder = builder.audit(node);
    }
    for sink in &collaborators.audit_sinks {
        builder = builder.audit_sink(sink.clone());
    }

    builder.build()
}
