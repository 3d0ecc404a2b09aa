use std::sync::Arc;

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use switchyard_core::types::Table;
use switchyard_flow::Orchestrator;

use crate::protocol::OperationResponse;

pub const USER_REQUEST: &str = "user_request";
pub const GET_ACTOR_MEMORY: &str = "get_actor_memory";
pub const HEALTH_CHECK: &str = "health_check";
pub const LIST_CUSTOMERS: &str = "list_customers";

/// Upper bound on customers returned when no `limit` argument is given.
const DEFAULT_CUSTOMER_LIMIT: usize = 100;

/// Maps `(operation, arguments)` to an `OperationResponse`.
///
/// Never fails: unknown operations, bad arguments, and failed runs all come
/// back as `status: "error"` with a message.
pub struct OperationDispatcher {
    orchestrator: Arc<Orchestrator>,
    shutdown: CancellationToken,
}

impl OperationDispatcher {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            shutdown: CancellationToken::new(),
        }
    }

    /// Runs in flight are cancelled when `shutdown` fires.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn operations(&self) -> [&'static str; 4] {
        [USER_REQUEST, GET_ACTOR_MEMORY, LIST_CUSTOMERS, HEALTH_CHECK]
    }

    pub async fn dispatch(&self, operation: &str, args: &Value) -> OperationResponse {
        match operation {
            USER_REQUEST => self.user_request(args).await,
            GET_ACTOR_MEMORY => self.actor_memory(args).await,
            LIST_CUSTOMERS => self.list_customers(args).await,
            HEALTH_CHECK => OperationResponse::ok(json!({
                "status": "healthy",
                "version": env!("CARGO_PKG_VERSION"),
            })),
            other => {
                warn!(operation = %other, "Unknown operation");
                OperationResponse::err(format!("Unknown operation: {}", other))
            }
        }
    }

    async fn user_request(&self, args: &Value) -> OperationResponse {
        let Some(text) = string_arg(args, "user_request") else {
            return missing("user_request");
        };

        match self.orchestrator.run(text, &self.shutdown).await {
            Ok(outcome) => {
                info!(run_id = %outcome.run_id, steps = outcome.path.len(), "user_request served");
                OperationResponse::ok(json!({
                    "response": outcome.response,
                    "run_id": outcome.run_id.to_string(),
                    "path": outcome.path.iter().map(|n| n.as_str()).collect::<Vec<_>>(),
                }))
            }
            Err(e) => {
                warn!(error = %e, "user_request failed");
                OperationResponse::err(e.to_string())
            }
        }
    }

    async fn actor_memory(&self, args: &Value) -> OperationResponse {
        let Some(actor) = string_arg(args, "actor_key") else {
            return missing("actor_key");
        };
        let entries = self.orchestrator.memory().get(actor).await;
        OperationResponse::ok(json!({
            "actor_key": actor,
            "count": entries.len(),
            "entries": entries,
        }))
    }

    async fn list_customers(&self, args: &Value) -> OperationResponse {
        let limit = args
            .get("limit")
            .and_then(Value::as_u64)
            .map_or(DEFAULT_CUSTOMER_LIMIT, |n| n as usize);

        match self.orchestrator.store().scan(Table::Customers, limit).await {
            Ok(customers) => {
                let count = customers.len();
                OperationResponse::ok(json!({
                    "customers": customers,
                    "count": count,
                }))
                .with_message(format!("Retrieved {} customers", count))
            }
            Err(e) => {
                warn!(error = %e, "list_customers failed");
                OperationResponse::err(e.to_string())
            }
        }
    }
}

fn string_arg<'a>(args: &'a Value, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Value::as_str)
}

fn missing(name: &str) -> OperationResponse {
    OperationResponse::err(format!("Missing required argument: {}", name))
}
