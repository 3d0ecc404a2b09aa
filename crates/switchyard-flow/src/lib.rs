pub mod aggregator;
pub mod audit;
pub mod cache;
pub mod classifier;
pub mod graph;
pub mod memory;
pub mod orchestrator;
pub mod providers;
pub mod retry;
pub mod steps;

pub use aggregator::{format_amount, ResponseAggregator};
pub use audit::{AuditLogger, ChannelAuditSink, TracingAuditSink};
pub use cache::ResultCache;
pub use classifier::Classifier;
pub use graph::{EntryRouter, GraphBuilder, Route, RunOutcome, Step, WorkflowGraph};
pub use memory::{ActorMemory, ActorKeyResolver};
pub use orchestrator::{Collaborators, Orchestrator};
pub use providers::{DemoAlertProvider, DemoWeatherProvider, StaticGeocoder};
pub use retry::{FailureClassifier, RetryStep};
