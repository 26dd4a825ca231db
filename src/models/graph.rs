use serde::Serialize;

use super::{AgentStatus, ExecutionMode, IssueStatus, IssueType};

/// A parent/child edge: `child_id` must be resolved before `parent_id` can
/// complete. `position` orders siblings under the same parent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueLink {
    pub parent_id: String,
    pub child_id: String,
    pub position: i64,
}

/// An issue with its pre-computed position in the dependency graph.
///
/// `lane` and `row` come from the upstream placement pass
/// ([`crate::graph::placement`]); the layout engine consumes them as given
/// and never mutates them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub issue_id: String,
    pub title: String,
    /// Visual column the node occupies.
    pub lane: usize,
    /// Position within the node's connected component, 0 = closest to the
    /// leaves (the dependencies), increasing toward the final deliverable.
    pub row: usize,
    /// Issues this node feeds into. Order matters: the first entry is the
    /// primary parent used for connector geometry.
    pub parent_ids: Vec<String>,
    /// Meaningful only on nodes with children.
    pub execution_mode: ExecutionMode,
    /// No unresolved blocking dependency; eligible to be worked next.
    pub is_actionable: bool,
    pub status: IssueStatus,
    pub kind: IssueType,
    pub agent_status: Option<AgentStatus>,
}
