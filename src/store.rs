use anyhow::{Context, Result};
use rusqlite::OptionalExtension;

use crate::db::{self, Database};
use crate::models::{CreateIssueInput, InsertionHint, Issue, IssueStatus, IssueType, UpdateIssueInput};

/// The persistence boundary the navigation state machine talks to.
///
/// Everything here is fallible and asynchronous; on failure the caller keeps
/// its pending state so the user's in-progress input survives for resubmission.
pub trait IssueStore {
    async fn create_issue(&self, input: CreateIssueInput) -> Result<Issue>;
    async fn update_title(&self, id: &str, title: &str) -> Result<()>;
    async fn reparent(&self, id: &str, new_parent_id: Option<&str>) -> Result<()>;
    async fn update_kind(&self, id: &str, kind: IssueType) -> Result<()>;
    async fn update_status(&self, id: &str, status: IssueStatus) -> Result<()>;
}

pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Sibling position for a new child of `parent_id`, honoring the
    /// insertion hint when the anchor is itself a sibling; otherwise the
    /// new child is appended after the existing siblings.
    fn position_for(&self, parent_id: &str, hint: &InsertionHint) -> Result<i64> {
        if let Some(anchor_id) = &hint.anchor_id {
            let anchor_position: Option<i64> = self
                .db
                .conn()
                .query_row(
                    "SELECT position FROM issue_links WHERE parent_id = ?1 AND child_id = ?2",
                    [parent_id, anchor_id.as_str()],
                    |row| row.get(0),
                )
                .optional()
                .context("failed to query anchor position")?;
            if let Some(p) = anchor_position {
                // Ties sort after the anchor by child id; close enough for a hint.
                return Ok(if hint.above { p } else { p + 1 });
            }
        }

        self.db
            .conn()
            .query_row(
                "SELECT COALESCE(MAX(position), -1) + 1 FROM issue_links WHERE parent_id = ?1",
                [parent_id],
                |row| row.get(0),
            )
            .context("failed to compute sibling position")
    }
}

impl IssueStore for SqliteStore {
    async fn create_issue(&self, input: CreateIssueInput) -> Result<Issue> {
        let issue = db::issue::create_issue(&self.db, &input)?;
        if let Some(parent_id) = &input.parent_id {
            let position = self.position_for(parent_id, &input.hint)?;
            db::link::add_link(&self.db, parent_id, &issue.id, position)?;
        }
        Ok(issue)
    }

    async fn update_title(&self, id: &str, title: &str) -> Result<()> {
        db::issue::update_issue(
            &self.db,
            id,
            UpdateIssueInput {
                title: Some(title.to_string()),
                ..Default::default()
            },
        )?;
        Ok(())
    }

    async fn reparent(&self, id: &str, new_parent_id: Option<&str>) -> Result<()> {
        db::link::reparent(&self.db, id, new_parent_id)
    }

    async fn update_kind(&self, id: &str, kind: IssueType) -> Result<()> {
        db::issue::update_issue(
            &self.db,
            id,
            UpdateIssueInput {
                kind: Some(kind),
                ..Default::default()
            },
        )?;
        Ok(())
    }

    async fn update_status(&self, id: &str, status: IssueStatus) -> Result<()> {
        db::issue::update_issue(
            &self.db,
            id,
            UpdateIssueInput {
                status: Some(status),
                ..Default::default()
            },
        )?;
        Ok(())
    }
}
