use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Open,
    InProgress,
    Complete,
    Closed,
    Archived,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Complete => "complete",
            Self::Closed => "closed",
            Self::Archived => "archived",
        }
    }

    /// True once the issue no longer blocks anything that depends on it.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Complete | Self::Closed | Self::Archived)
    }

    /// Next status in the keyboard cycle. Closed/Archived are terminal
    /// states reached through other commands and cycle back to Open.
    pub fn cycle(&self) -> Self {
        match self {
            Self::Open => Self::InProgress,
            Self::InProgress => Self::Complete,
            Self::Complete | Self::Closed | Self::Archived => Self::Open,
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "complete" => Ok(Self::Complete),
            "closed" => Ok(Self::Closed),
            "archived" => Ok(Self::Archived),
            other => anyhow::bail!("invalid issue status: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Task,
    Bug,
    Feature,
    Chore,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Bug => "bug",
            Self::Feature => "feature",
            Self::Chore => "chore",
        }
    }

    pub fn cycle(&self) -> Self {
        match self {
            Self::Task => Self::Bug,
            Self::Bug => Self::Feature,
            Self::Feature => Self::Chore,
            Self::Chore => Self::Task,
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "task" => Ok(Self::Task),
            "bug" => Ok(Self::Bug),
            "feature" => Ok(Self::Feature),
            "chore" => Ok(Self::Chore),
            other => anyhow::bail!("invalid issue type: {other}"),
        }
    }
}

/// How the children of an issue are meant to be worked: one after another
/// (a vertical run in a single lane) or independently (one lane each).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Parallel,
    Series,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parallel => "parallel",
            Self::Series => "series",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parallel" => Ok(Self::Parallel),
            "series" => Ok(Self::Series),
            other => anyhow::bail!("invalid execution mode: {other}"),
        }
    }
}

/// State of an agent session attached to an issue, shown as a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Running,
    Waiting,
    Failed,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Waiting => "waiting",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "waiting" => Ok(Self::Waiting),
            "failed" => Ok(Self::Failed),
            other => anyhow::bail!("invalid agent status: {other}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: IssueStatus,
    pub kind: IssueType,
    pub execution_mode: ExecutionMode,
    pub agent_status: Option<AgentStatus>,
    pub created_at: String,
    pub updated_at: String,
}

/// Where a newly created issue should land relative to an existing one.
#[derive(Debug, Clone, Default)]
pub struct InsertionHint {
    pub anchor_id: Option<String>,
    pub above: bool,
}

pub struct CreateIssueInput {
    pub title: String,
    pub description: String,
    pub parent_id: Option<String>,
    pub hint: InsertionHint,
}

#[derive(Default)]
pub struct UpdateIssueInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<IssueStatus>,
    pub kind: Option<IssueType>,
    pub execution_mode: Option<ExecutionMode>,
    pub agent_status: Option<Option<AgentStatus>>,
}
