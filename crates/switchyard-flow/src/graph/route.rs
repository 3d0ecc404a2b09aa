use std::fmt;
use std::sync::Arc;

use switchyard_core::types::{ActionSet, ActionTag, NodeId, WorkflowState};

/// A predicate over the state produced by the source node.
pub type Condition = Arc<dyn Fn(&WorkflowState) -> bool + Send + Sync>;

/// Outgoing route of one node.
///
/// A conditional route is a table evaluated top to bottom; the first
/// matching branch wins and `default` is taken when none match. The set of
/// targets a route can produce is therefore known without running it.
#[derive(Clone)]
pub enum Route {
    /// Always go to this node.
    Static(NodeId),
    /// First matching branch, else `default`.
    Conditional {
        branches: Vec<(Condition, NodeId)>,
        default: NodeId,
    },
}

impl Route {
    pub fn to(target: NodeId) -> Self {
        Self::Static(target)
    }

    /// Start a conditional route whose fallback is `default`.
    pub fn otherwise(default: NodeId) -> Self {
        Self::Conditional {
            branches: Vec::new(),
            default,
        }
    }

    /// Add a branch. Branches are tried in the order they were added.
    pub fn when<F>(self, condition: F, target: NodeId) -> Self
    where
        F: Fn(&WorkflowState) -> bool + Send + Sync + 'static,
    {
        match self {
            Self::Static(default) => Self::Conditional {
                branches: vec![(Arc::new(condition), target)],
                default,
            },
            Self::Conditional {
                mut branches,
                default,
            } => {
                branches.push((Arc::new(condition), target));
                Self::Conditional { branches, default }
            }
        }
    }

    /// Branch on the presence of an action tag.
    pub fn when_action(self, tag: ActionTag, target: NodeId) -> Self {
        self.when(move |state| state.has_action(tag), target)
    }

    /// Every node this route may select.
    pub fn targets(&self) -> Vec<NodeId> {
        match self {
            Self::Static(target) => vec![*target],
            Self::Conditional { branches, default } => {
                let mut targets: Vec<NodeId> = branches.iter().map(|(_, t)| *t).collect();
                targets.push(*default);
                targets.sort();
                targets.dedup();
                targets
            }
        }
    }

    /// Select the next node.
    pub fn next(&self, state: &WorkflowState) -> NodeId {
        match self {
            Self::Static(target) => *target,
            Self::Conditional { branches, default } => branches
                .iter()
                .find(|(condition, _)| condition(state))
                .map(|(_, target)| *target)
                .unwrap_or(*default),
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(target) => write!(f, "Static({})", target),
            Self::Conditional { branches, default } => f
                .debug_struct("Conditional")
                .field(
                    "branches",
                    &branches.iter().map(|(_, t)| t.as_str()).collect::<Vec<_>>(),
                )
                .field("default", &default.as_str())
                .finish(),
        }
    }
}

/// Picks the entry node from a priority list of action tags.
#[derive(Debug, Clone)]
pub struct EntryRouter {
    priority: Vec<(ActionTag, NodeId)>,
    fallback: NodeId,
}

impl EntryRouter {
    /// `priority` is ordered highest first. `fallback` is used when no listed
    /// tag is present.
    pub fn new(priority: Vec<(ActionTag, NodeId)>, fallback: NodeId) -> Self {
        Self { priority, fallback }
    }

    pub fn select(&self, actions: &ActionSet) -> NodeId {
        self.priority
            .iter()
            .find(|(tag, _)| actions.contains(tag))
            .map(|(_, node)| *node)
            .unwrap_or(self.fallback)
    }

    pub fn targets(&self) -> Vec<NodeId> {
        let mut targets: Vec<NodeId> = self.priority.iter().map(|(_, n)| *n).collect();
        targets.push(self.fallback);
        targets.sort();
        targets.dedup();
        targets
    }
}
