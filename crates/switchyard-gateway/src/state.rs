use crate::dispatcher::OperationDispatcher;

/// Shared application state for axum handlers.
pub struct AppState {
    pub dispatcher: OperationDispatcher,
}
