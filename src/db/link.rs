use anyhow::{Context, Result};
use rusqlite::Row;

use crate::db::Database;
use crate::models::IssueLink;

fn row_to_link(row: &Row) -> rusqlite::Result<IssueLink> {
    Ok(IssueLink {
        parent_id: row.get("parent_id")?,
        child_id: row.get("child_id")?,
        position: row.get("position")?,
    })
}

/// Link `child_id` under `parent_id`. Rejects self-links and links that
/// would close a cycle through the existing edges.
pub fn add_link(db: &Database, parent_id: &str, child_id: &str, position: i64) -> Result<()> {
    if parent_id == child_id {
        anyhow::bail!("issue cannot be its own parent: {parent_id}");
    }
    if is_ancestor(db, parent_id, child_id)? {
        anyhow::bail!("link {parent_id} -> {child_id} would create a cycle");
    }

    db.conn()
        .execute(
            "INSERT INTO issue_links (parent_id, child_id, position) VALUES (?1, ?2, ?3)",
            (parent_id, child_id, position),
        )
        .context("failed to insert link (check that both issue ids exist)")?;
    Ok(())
}

pub fn remove_link(db: &Database, parent_id: &str, child_id: &str) -> Result<bool> {
    let rows_affected = db
        .conn()
        .execute(
            "DELETE FROM issue_links WHERE parent_id = ?1 AND child_id = ?2",
            [parent_id, child_id],
        )
        .context("failed to delete link")?;
    Ok(rows_affected > 0)
}

/// All links, ordered for deterministic graph construction.
pub fn list_links(db: &Database) -> Result<Vec<IssueLink>> {
    let mut stmt = db
        .conn()
        .prepare("SELECT parent_id, child_id, position FROM issue_links ORDER BY parent_id, position, child_id")?;
    let rows = stmt.query_map([], row_to_link)?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to list links")
}

/// Parents of `child_id`, primary parent first (lowest position).
pub fn parents_of(db: &Database, child_id: &str) -> Result<Vec<String>> {
    let mut stmt = db
        .conn()
        .prepare("SELECT parent_id FROM issue_links WHERE child_id = ?1 ORDER BY position, parent_id")?;
    let rows = stmt.query_map([child_id], |row| row.get(0))?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to query parents")
}

pub fn children_of(db: &Database, parent_id: &str) -> Result<Vec<String>> {
    let mut stmt = db
        .conn()
        .prepare("SELECT child_id FROM issue_links WHERE parent_id = ?1 ORDER BY position, child_id")?;
    let rows = stmt.query_map([parent_id], |row| row.get(0))?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to query children")
}

/// Replace all parents of `child_id` with `new_parent_id` (or none).
pub fn reparent(db: &Database, child_id: &str, new_parent_id: Option<&str>) -> Result<()> {
    if let Some(parent_id) = new_parent_id {
        if parent_id == child_id {
            anyhow::bail!("issue cannot be its own parent: {child_id}");
        }
        if is_ancestor(db, parent_id, child_id)? {
            anyhow::bail!("reparenting {child_id} under {parent_id} would create a cycle");
        }
    }

    let tx = db
        .conn()
        .unchecked_transaction()
        .context("failed to begin transaction for reparent")?;

    tx.execute("DELETE FROM issue_links WHERE child_id = ?1", [child_id])
        .context("failed to clear existing parents")?;

    if let Some(parent_id) = new_parent_id {
        let next_position: i64 = tx
            .query_row(
                "SELECT COALESCE(MAX(position), -1) + 1 FROM issue_links WHERE parent_id = ?1",
                [parent_id],
                |row| row.get(0),
            )
            .context("failed to compute sibling position")?;
        tx.execute(
            "INSERT INTO issue_links (parent_id, child_id, position) VALUES (?1, ?2, ?3)",
            (parent_id, child_id, next_position),
        )
        .context("failed to insert new parent link")?;
    }

    tx.commit().context("failed to commit reparent")
}

/// Walks upward from `start`: is `candidate` reachable via parent edges?
/// Used to reject cycle-creating links before they hit the table.
fn is_ancestor(db: &Database, start: &str, candidate: &str) -> Result<bool> {
    let mut frontier = vec![start.to_string()];
    let mut seen = std::collections::HashSet::new();

    while let Some(id) = frontier.pop() {
        if id == candidate {
            return Ok(true);
        }
        if !seen.insert(id.clone()) {
            continue;
        }
        frontier.extend(parents_of(db, &id)?);
    }
    Ok(false)
}
