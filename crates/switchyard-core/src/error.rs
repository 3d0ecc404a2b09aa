use thiserror::Error;

use crate::types::NodeId;

#[derive(Debug, Error)]
pub enum SwitchyardError {
    // Config errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // Graph build errors
    #[error("Route from {from} targets undeclared node {to}")]
    UndeclaredTarget { from: NodeId, to: NodeId },

    #[error("Node {0} has no outgoing route")]
    MissingRoute(NodeId),

    #[error("Terminal node {0} must not declare a route")]
    TerminalHasRoute(NodeId),

    #[error("Graph cycle detected: {path}")]
    GraphCycle { path: String },

    // Execution errors
    #[error("Run exceeded the step ceiling ({0})")]
    ExecutionLimit(usize),

    #[error("Run cancelled")]
    Cancelled,

    // Collaborator errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Weather provider error: {0}")]
    Weather(String),

    #[error("Geocoder error: {0}")]
    Geocode(String),

    #[error("Transport error: {0}")]
    Transport(String),

    // Audit errors
    #[error("Audit sink error: {0}")]
    Audit(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SwitchyardError {
    /// Whether this error is a graph configuration problem rather than a
    /// runtime or collaborator failure.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::ConfigNotFound(_)
                | Self::UndeclaredTarget { .. }
                | Self::MissingRoute(_)
                | Self::TerminalHasRoute(_)
                | Self::GraphCycle { .. }
        )
    }

    /// Whether this error came from an external collaborator.
    pub fn is_collaborator(&self) -> bool {
        matches!(
            self,
            Self::Storage(_) | Self::Weather(_) | Self::Geocode(_) | Self::Transport(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SwitchyardError>;
