//! Workflow graph engine.
//!
//! A workflow is a closed set of `NodeId`s, each bound to a `Step` when the
//! graph is built. Every non-terminal node owns exactly one `Route` that picks
//! the next node from the state the step just produced. The entry node is
//! chosen by an `EntryRouter` from the request's action set.
//!
//! `GraphBuilder::build` refuses graphs whose declared edges could loop, so a
//! run visits each node at most once. Retries live inside `RetryStep`, not in
//! the graph.

pub mod executor;
pub mod route;
pub mod step;

pub use executor::{GraphBuilder, NodeTiming, RunOutcome, WorkflowGraph};
pub use route::{Condition, EntryRouter, Route};
pub use step::{FnStep, Step};
