use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use switchyard_core::error::{Result, SwitchyardError};
use switchyard_core::traits::AuditSink;
use switchyard_core::types::{fields, AuditRecord, NodeId, RunId, WorkflowState};

use super::route::{EntryRouter, Route};
use super::step::Step;

/// Time spent in one node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTiming {
    pub node: NodeId,
    pub elapsed_ms: u64,
}

/// Result of one workflow run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: RunId,
    /// The aggregated response text.
    pub response: String,
    /// Nodes in the order they ran, ending with the terminal.
    pub path: Vec<NodeId>,
    pub timings: Vec<NodeTiming>,
    /// The final state with all accumulated fields.
    pub state: WorkflowState,
    pub total_elapsed_ms: u64,
}

struct NodeSpec {
    step: Arc<dyn Step>,
    route: Option<Route>,
    audited: bool,
}

/// Collects nodes and routes, then validates them into a `WorkflowGraph`.
pub struct GraphBuilder {
    nodes: BTreeMap<NodeId, NodeSpec>,
    routes: Vec<(NodeId, Route)>,
    audited: BTreeSet<NodeId>,
    terminal: NodeId,
    entry: Option<EntryRouter>,
    sinks: Vec<Arc<dyn AuditSink>>,
    retry_bound: u32,
    step_limit: usize,
}

impl GraphBuilder {
    /// Start a graph whose single terminal node is `terminal`.
    pub fn new(terminal: NodeId, step: impl Step) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            terminal,
            NodeSpec {
                step: Arc::new(step),
                route: None,
                audited: false,
            },
        );
        Self {
            nodes,
            routes: Vec::new(),
            audited: BTreeSet::new(),
            terminal,
            entry: None,
            sinks: Vec::new(),
            retry_bound: 1,
            step_limit: 0,
        }
    }

    /// Declare a node and the step bound to it.
    pub fn node(mut self, id: NodeId, step: impl Step) -> Self {
        self.nodes.insert(
            id,
            NodeSpec {
                step: Arc::new(step),
                route: None,
                audited: false,
            },
        );
        self
    }

    /// Set the outgoing route of `from`.
    pub fn route(mut self, from: NodeId, route: Route) -> Self {
        self.routes.push((from, route));
        self
    }

    /// Emit an audit record after `id` runs.
    pub fn audit(mut self, id: NodeId) -> Self {
        self.audited.insert(id);
        self
    }

    pub fn audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn entry(mut self, router: EntryRouter) -> Self {
        self.entry = Some(router);
        self
    }

    /// Largest attempt count of any retry-wrapped step, used for the
    /// default step ceiling.
    pub fn retry_bound(mut self, bound: u32) -> Self {
        self.retry_bound = bound.max(1);
        self
    }

    /// Explicit step ceiling. 0 keeps the default of nodes times retry bound.
    pub fn step_limit(mut self, limit: usize) -> Self {
        self.step_limit = limit;
        self
    }

    /// Validate and freeze the graph.
    pub fn build(mut self) -> Result<WorkflowGraph> {
        for (from, route) in std::mem::take(&mut self.routes) {
            if from == self.terminal {
                return Err(SwitchyardError::TerminalHasRoute(from));
            }
            for to in route.targets() {
                if !self.nodes.contains_key(&to) {
                    return Err(SwitchyardError::UndeclaredTarget { from, to });
                }
            }
            match self.nodes.get_mut(&from) {
                Some(spec) => spec.route = Some(route),
                None => {
                    return Err(SwitchyardError::Config(format!(
                        "Route declared for undeclared node {}",
                        from
                    )))
                }
            }
        }

        for (id, spec) in &self.nodes {
            if *id != self.terminal && spec.route.is_none() {
                return Err(SwitchyardError::MissingRoute(*id));
            }
        }

        for id in &self.audited {
            match self.nodes.get_mut(id) {
                Some(spec) => spec.audited = true,
                None => {
                    return Err(SwitchyardError::Config(format!(
                        "Audit requested for undeclared node {}",
                        id
                    )))
                }
            }
        }

        let entry = self
            .entry
            .unwrap_or_else(|| EntryRouter::new(Vec::new(), self.terminal));
        for target in entry.targets() {
            if !self.nodes.contains_key(&target) {
                return Err(SwitchyardError::Config(format!(
                    "Entry route targets undeclared node {}",
                    target
                )));
            }
        }

        check_acyclic(&self.nodes)?;

        let default_step_limit = self.nodes.len() * self.retry_bound as usize;
        let step_limit = if self.step_limit == 0 {
            default_step_limit
        } else {
            self.step_limit
        };

        debug!(
            nodes = self.nodes.len(),
            step_limit,
            terminal = %self.terminal,
            "Workflow graph built"
        );

        Ok(WorkflowGraph {
            nodes: self.nodes,
            entry,
            terminal: self.terminal,
            sinks: self.sinks,
            step_limit,
            default_step_limit,
        })
    }
}

/// Depth-first search over every target a route may produce.
fn check_acyclic(nodes: &BTreeMap<NodeId, NodeSpec>) -> Result<()> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit(
        id: NodeId,
        nodes: &BTreeMap<NodeId, NodeSpec>,
        marks: &mut BTreeMap<NodeId, Mark>,
        stack: &mut Vec<NodeId>,
    ) -> Result<()> {
        match marks.get(&id) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                let start = stack.iter().position(|n| *n == id).unwrap_or(0);
                let mut cycle: Vec<&str> = stack[start..].iter().map(|n| n.as_str()).collect();
                cycle.push(id.as_str());
                return Err(SwitchyardError::GraphCycle {
                    path: cycle.join(" -> "),
                });
            }
            None => {}
        }

        marks.insert(id, Mark::Visiting);
        stack.push(id);
        if let Some(route) = nodes.get(&id).and_then(|spec| spec.route.as_ref()) {
            for next in route.targets() {
                visit(next, nodes, marks, stack)?;
            }
        }
        stack.pop();
        marks.insert(id, Mark::Done);
        Ok(())
    }

    let mut marks = BTreeMap::new();
    let mut stack = Vec::new();
    for id in nodes.keys() {
        visit(*id, nodes, &mut marks, &mut stack)?;
    }
    Ok(())
}

/// A validated workflow graph.
///
/// Walks from the entry node chosen for the request's actions, running each
/// step and following its route until the terminal node has run.
pub struct WorkflowGraph {
    nodes: BTreeMap<NodeId, NodeSpec>,
    entry: EntryRouter,
    terminal: NodeId,
    sinks: Vec<Arc<dyn AuditSink>>,
    step_limit: usize,
    default_step_limit: usize,
}

impl WorkflowGraph {
    pub fn step_limit(&self) -> usize {
        self.step_limit
    }

    pub fn terminal(&self) -> NodeId {
        self.terminal
    }

    /// Override the step ceiling. 0 restores nodes times retry bound, as in
    /// `GraphBuilder::step_limit`.
    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = if limit == 0 {
            self.default_step_limit
        } else {
            limit
        };
        self
    }

    /// Entry node for a set of actions.
    pub fn entry_for(&self, state: &WorkflowState) -> NodeId {
        self.entry.select(state.actions())
    }

    /// Execute one run.
    ///
    /// Cancellation is checked before every step; a cancelled run yields
    /// `SwitchyardError::Cancelled` and discards the partial state.
    pub async fn execute(
        &self,
        mut state: WorkflowState,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome> {
        let start = Instant::now();
        let run_id = RunId::new();
        let mut path: Vec<NodeId> = Vec::new();
        let mut timings = Vec::new();
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut current = self.entry_for(&state);

        info!(run_id = %run_id, entry = %current, "Workflow run started");

        loop {
            if cancel.is_cancelled() {
                info!(run_id = %run_id, node = %current, "Workflow run cancelled");
                return Err(SwitchyardError::Cancelled);
            }

            if path.len() >= self.step_limit {
                warn!(
                    run_id = %run_id,
                    limit = self.step_limit,
                    "Workflow run hit the step ceiling"
                );
                return Err(SwitchyardError::ExecutionLimit(self.step_limit));
            }

            if !visited.insert(current) {
                let mut cycle: Vec<&str> = path.iter().map(|n| n.as_str()).collect();
                cycle.push(current.as_str());
                return Err(SwitchyardError::GraphCycle {
                    path: cycle.join(" -> "),
                });
            }

            let spec = self.nodes.get(&current).ok_or_else(|| {
                SwitchyardError::Config(format!("Node {} not found in graph", current))
            })?;

            debug!(run_id = %run_id, node = %current, "Executing workflow node");

            let node_start = Instant::now();
            spec.step.run(&mut state).await?;
            let elapsed_ms = node_start.elapsed().as_millis() as u64;

            path.push(current);
            timings.push(NodeTiming {
                node: current,
                elapsed_ms,
            });

            if spec.audited {
                self.emit_audit(&run_id, current, &state);
            }

            match &spec.route {
                Some(route) => current = route.next(&state),
                None => break,
            }
        }

        let total_elapsed_ms = start.elapsed().as_millis() as u64;
        let response = state
            .get_str(fields::FINAL_RESPONSE)
            .unwrap_or_default()
            .to_string();

        info!(
            run_id = %run_id,
            steps = path.len(),
            total_elapsed_ms,
            "Workflow run complete"
        );

        Ok(RunOutcome {
            run_id,
            response,
            path,
            timings,
            state,
            total_elapsed_ms,
        })
    }

    fn emit_audit(&self, run_id: &RunId, node: NodeId, state: &WorkflowState) {
        for sink in &self.sinks {
            let record = AuditRecord::new(run_id.clone(), node, state);
            if let Err(e) = sink.record(record) {
                warn!(
                    sink = sink.name(),
                    node = %node,
                    error = %e,
                    "Audit sink failed, continuing"
                );
            }
        }
    }
}
