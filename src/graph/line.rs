use crate::models::{AgentStatus, IssueStatus, IssueType};

/// Glyph class for an issue row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Actionable,
    Open,
    Complete,
    Closed,
}

impl Marker {
    pub fn from_status(status: IssueStatus, is_actionable: bool) -> Self {
        match status {
            IssueStatus::Complete => Self::Complete,
            IssueStatus::Closed | IssueStatus::Archived => Self::Closed,
            IssueStatus::Open | IssueStatus::InProgress => {
                if is_actionable {
                    Self::Actionable
                } else {
                    Self::Open
                }
            }
        }
    }
}

/// One row of the flattened timeline carrying an issue.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueLine {
    pub issue_id: String,
    pub title: String,
    pub lane: usize,
    pub marker: Marker,
    /// Lane of the primary parent; `None` on nodes with no parent. The
    /// renderer draws this row's connector stub toward that lane.
    pub parent_lane: Option<usize>,
    /// True for the child row closest to its parent's connector anchor
    /// (lowest row among the parent's children).
    pub is_first_child: bool,
    /// True when the primary parent runs its children in series; the row's
    /// own horizontal stub is suppressed in favor of the parent's single
    /// L-shaped connector.
    pub is_series_child: bool,
    pub kind: IssueType,
    pub status: IssueStatus,
    pub agent_status: Option<AgentStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorShape {
    /// Vertical continuation: every child sits in the parent's lane.
    Straight,
    /// At least one turn: child lanes differ from the parent lane.
    Elbow,
}

/// Decorative filler row joining a parent to its children's lanes.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorLine {
    pub parent_lane: usize,
    /// Lanes occupied by the children, sorted and deduplicated.
    pub child_lanes: Vec<usize>,
    pub shape: ConnectorShape,
}

/// The flattened, ordered representation of the graph. A renderer switches
/// exhaustively over exactly these three cases.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderLine {
    Issue(IssueLine),
    Connector(ConnectorLine),
    /// Boundary between two disconnected groups of the graph.
    Separator,
}

impl RenderLine {
    pub fn as_issue(&self) -> Option<&IssueLine> {
        match self {
            Self::Issue(line) => Some(line),
            _ => None,
        }
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, Self::Separator)
    }
}
