mod dispatcher;
mod protocol;
mod routes;
mod server;
mod state;

pub use dispatcher::OperationDispatcher;
pub use protocol::{OperationResponse, OperationStatus};
pub use server::GatewayServer;
