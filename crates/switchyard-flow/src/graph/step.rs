use futures::future::BoxFuture;

use switchyard_core::error::Result;
use switchyard_core::types::WorkflowState;

/// One unit of work in the graph.
///
/// A step reads and writes fields of the state it is handed and must not keep
/// any reference to it after returning. In-band failures are written into the
/// state as text; an `Err` means a collaborator failed and aborts the run.
pub trait Step: Send + Sync + 'static {
    fn run<'a>(&'a self, state: &'a mut WorkflowState) -> BoxFuture<'a, Result<()>>;
}

/// A step backed by a plain synchronous function.
pub struct FnStep<F>(pub F);

impl<F> Step for FnStep<F>
where
    F: Fn(&mut WorkflowState) + Send + Sync + 'static,
{
    fn run<'a>(&'a self, state: &'a mut WorkflowState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            (self.0)(state);
            Ok(())
        })
    }
}
