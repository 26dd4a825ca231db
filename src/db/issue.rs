use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{OptionalExtension, Row, params_from_iter};

use crate::db::Database;
use crate::models::{
    AgentStatus, CreateIssueInput, ExecutionMode, Issue, IssueStatus, IssueType, UpdateIssueInput,
};

const SELECT_COLUMNS: &str =
    "id, title, description, status, kind, execution_mode, agent_status, created_at, updated_at";

fn parse_column<T: std::str::FromStr<Err = anyhow::Error>>(
    idx: usize,
    value: String,
) -> rusqlite::Result<T> {
    value.parse().map_err(|e: anyhow::Error| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())),
        )
    })
}

fn row_to_issue(row: &Row) -> rusqlite::Result<Issue> {
    let status: IssueStatus = parse_column(3, row.get("status")?)?;
    let kind: IssueType = parse_column(4, row.get("kind")?)?;
    let execution_mode: ExecutionMode = parse_column(5, row.get("execution_mode")?)?;
    let agent_status: Option<AgentStatus> = match row.get::<_, Option<String>>("agent_status")? {
        Some(s) => Some(parse_column(6, s)?),
        None => None,
    };

    Ok(Issue {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status,
        kind,
        execution_mode,
        agent_status,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Insert a new issue. Parent linking (from `input.parent_id` and the
/// insertion hint) is handled by the caller via [`crate::db::link`] so the
/// two writes can share a transaction boundary at the store level.
pub fn create_issue(db: &Database, input: &CreateIssueInput) -> Result<Issue> {
    let id = ulid::Ulid::new().to_string();
    let now = now_rfc3339();
    db.conn()
        .execute(
            "INSERT INTO issues (id, title, description, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            [&id, &input.title, &input.description, &now, &now],
        )
        .context("failed to insert issue")?;

    get_issue(db, &id)?.context("issue not found after insert")
}

pub fn get_issue(db: &Database, id: &str) -> Result<Option<Issue>> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM issues WHERE id = ?1");
    db.conn()
        .prepare(&sql)?
        .query_row([id], row_to_issue)
        .optional()
        .context("failed to query issue")
}

/// List issues in board order (oldest first, so the timeline is stable as
/// issues are added).
pub fn list_issues(db: &Database, status: Option<IssueStatus>) -> Result<Vec<Issue>> {
    let base = format!("SELECT {SELECT_COLUMNS} FROM issues");
    let tail = "ORDER BY created_at ASC, rowid ASC";

    let sql = match status {
        Some(_) => format!("{base} WHERE status = ?1 {tail}"),
        None => format!("{base} {tail}"),
    };

    let mut stmt = db.conn().prepare(&sql)?;
    let rows = match status {
        Some(s) => stmt.query_map([s.as_str()], row_to_issue)?,
        None => stmt.query_map([], row_to_issue)?,
    };

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to list issues")
}

pub fn update_issue(db: &Database, id: &str, input: UpdateIssueInput) -> Result<Issue> {
    let mut set_clauses: Vec<String> = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    let mut bind = |column: &str, value: Box<dyn rusqlite::types::ToSql>| {
        params.push(value);
        set_clauses.push(format!("\"{column}\" = ?{}", params.len()));
    };

    if let Some(title) = input.title {
        bind("title", Box::new(title));
    }
    if let Some(description) = input.description {
        bind("description", Box::new(description));
    }
    if let Some(status) = input.status {
        bind("status", Box::new(status.as_str().to_string()));
    }
    if let Some(kind) = input.kind {
        bind("kind", Box::new(kind.as_str().to_string()));
    }
    if let Some(mode) = input.execution_mode {
        bind("execution_mode", Box::new(mode.as_str().to_string()));
    }
    if let Some(agent_status) = input.agent_status {
        bind(
            "agent_status",
            Box::new(agent_status.map(|s| s.as_str().to_string())),
        );
    }

    set_clauses.push(format!("updated_at = ?{}", params.len() + 1));
    params.push(Box::new(now_rfc3339()));
    params.push(Box::new(id.to_string()));

    let sql = format!(
        "UPDATE issues SET {} WHERE id = ?{}",
        set_clauses.join(", "),
        params.len(),
    );

    let rows_affected = db
        .conn()
        .execute(&sql, params_from_iter(params.iter()))
        .context("failed to update issue")?;

    if rows_affected == 0 {
        anyhow::bail!("issue not found: {id}");
    }

    get_issue(db, id)?.context("issue not found after update")
}

pub fn delete_issue(db: &Database, id: &str) -> Result<bool> {
    // issue_links rows go with it via ON DELETE CASCADE
    let rows_affected = db
        .conn()
        .execute("DELETE FROM issues WHERE id = ?1", [id])
        .context("failed to delete issue")?;
    Ok(rows_affected > 0)
}

/// Latest `updated_at` across all issues, used as a cheap change watermark
/// for the TUI's refresh poll.
pub fn get_max_updated_at(db: &Database) -> Result<String> {
    db.conn()
        .query_row(
            "SELECT COALESCE(MAX(updated_at), '') FROM issues",
            [],
            |row| row.get(0),
        )
        .context("failed to query updated_at watermark")
}
