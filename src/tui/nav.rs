//! Modal cursor over the flattened issue timeline.
//!
//! One selection, one mode at a time: viewing, editing an existing title,
//! drafting a new issue, or picking a move target. An embeddable
//! incremental search rides alongside. Every operation is a tolerant
//! no-op when its guard fails; every real mutation bumps the revision
//! counter (and the optional change callback) exactly once.

use anyhow::Result;

use crate::graph::line::{IssueLine, Marker};
use crate::models::{CreateIssueInput, InsertionHint};
use crate::store::IssueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPlacement {
    Start,
    End,
    /// The whole title is being retyped from scratch.
    Replace,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingEdit {
    pub issue_id: String,
    pub title: String,
    pub original_title: String,
    pub cursor: CursorPlacement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingNewIssue {
    /// Index in the issue-line sequence where the draft row is shown.
    pub insert_at: usize,
    pub is_above: bool,
    pub reference_issue_id: Option<String>,
    pub title: String,
    /// Set and cleared by indent/unindent while drafting.
    pub pending_parent_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOperation {
    AsChildOf,
    AsParentOf,
}

/// Exactly one mode at a time; each carries its own pending payload, so
/// editing-while-creating is unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub enum EditMode {
    Viewing,
    Editing(PendingEdit),
    Creating(PendingNewIssue),
    SelectingMoveTarget(MoveOperation),
}

/// What an accepted edit did, so the host knows what to refresh/select.
#[derive(Debug, Clone, PartialEq)]
pub enum AcceptOutcome {
    Updated { issue_id: String },
    Created { issue_id: String },
    Moved { issue_id: String },
}

type ChangeListener = Box<dyn FnMut(u64)>;

pub struct NavigationState {
    lines: Vec<IssueLine>,
    selected: Option<usize>,
    mode: EditMode,
    searching: bool,
    embedded: bool,
    term: String,
    matches: Vec<usize>,
    current_match: Option<usize>,
    revision: u64,
    on_change: Option<ChangeListener>,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationState {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            selected: None,
            mode: EditMode::Viewing,
            searching: false,
            embedded: false,
            term: String::new(),
            matches: Vec::new(),
            current_match: None,
            revision: 0,
            on_change: None,
        }
    }

    /// Replace the issue-line sequence and reset selection, mode, and
    /// search state. Safe on an empty list.
    pub fn initialize(&mut self, lines: Vec<IssueLine>) {
        self.lines = lines;
        self.selected = None;
        self.mode = EditMode::Viewing;
        self.reset_search_fields();
        self.notify();
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn lines(&self) -> &[IssueLine] {
        &self.lines
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_line(&self) -> Option<&IssueLine> {
        self.selected.and_then(|i| self.lines.get(i))
    }

    pub fn selected_issue_id(&self) -> Option<&str> {
        self.selected_line().map(|l| l.issue_id.as_str())
    }

    pub fn mode(&self) -> &EditMode {
        &self.mode
    }

    pub fn is_viewing(&self) -> bool {
        matches!(self.mode, EditMode::Viewing)
    }

    pub fn is_searching(&self) -> bool {
        self.searching
    }

    pub fn is_search_embedded(&self) -> bool {
        self.embedded
    }

    pub fn search_term(&self) -> &str {
        &self.term
    }

    pub fn matching_indices(&self) -> &[usize] {
        &self.matches
    }

    pub fn current_match_index(&self) -> Option<usize> {
        self.current_match
    }

    /// Monotonic counter, bumped once per externally visible mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_on_change(&mut self, listener: ChangeListener) {
        self.on_change = Some(listener);
    }

    fn notify(&mut self) {
        self.revision += 1;
        if let Some(listener) = &mut self.on_change {
            listener(self.revision);
        }
    }

    fn reset_search_fields(&mut self) {
        self.searching = false;
        self.embedded = false;
        self.term.clear();
        self.matches.clear();
        self.current_match = None;
    }

    fn search_is_default(&self) -> bool {
        !self.searching
            && !self.embedded
            && self.term.is_empty()
            && self.matches.is_empty()
            && self.current_match.is_none()
    }

    fn set_selected(&mut self, index: usize) {
        if index < self.lines.len() && self.selected != Some(index) {
            self.selected = Some(index);
            self.notify();
        }
    }

    // ── Selection & movement ─────────────────────────────────────────

    /// Select the first actionable line, falling back to the first line.
    pub fn select_first_actionable(&mut self) {
        if self.lines.is_empty() {
            return;
        }
        let index = self
            .lines
            .iter()
            .position(|l| l.marker == Marker::Actionable)
            .unwrap_or(0);
        self.set_selected(index);
    }

    /// Select the line carrying `issue_id`; unknown ids leave the
    /// selection unchanged.
    pub fn select_issue(&mut self, issue_id: &str) {
        if let Some(index) = self.lines.iter().position(|l| l.issue_id == issue_id) {
            self.set_selected(index);
        }
    }

    fn can_move(&self) -> bool {
        // Typing a search query must not move the cursor; an embedded
        // search participates in normal navigation again.
        self.is_viewing() && !self.searching && !self.lines.is_empty()
    }

    pub fn move_up(&mut self) {
        if !self.can_move() {
            return;
        }
        let index = match self.selected {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.set_selected(index);
    }

    pub fn move_down(&mut self) {
        if !self.can_move() {
            return;
        }
        let index = match self.selected {
            Some(i) => (i + 1).min(self.lines.len() - 1),
            None => 0,
        };
        self.set_selected(index);
    }

    /// Jump forward to the nearest line occupying the current line's
    /// parent lane.
    pub fn move_to_parent(&mut self) {
        if !self.can_move() {
            return;
        }
        let Some(current) = self.selected else {
            return;
        };
        let Some(parent_lane) = self.lines[current].parent_lane else {
            return;
        };
        if let Some(offset) = self.lines[current + 1..]
            .iter()
            .position(|l| l.lane == parent_lane)
        {
            self.set_selected(current + 1 + offset);
        }
    }

    /// Jump backward to the nearest line whose parent lane is the current
    /// line's lane.
    pub fn move_to_child(&mut self) {
        if !self.can_move() {
            return;
        }
        let Some(current) = self.selected else {
            return;
        };
        let lane = self.lines[current].lane;
        if let Some(index) = self.lines[..current]
            .iter()
            .rposition(|l| l.parent_lane == Some(lane))
        {
            self.set_selected(index);
        }
    }

    // ── Editing ──────────────────────────────────────────────────────

    fn can_enter_edit(&self) -> bool {
        self.is_viewing() && !self.searching
    }

    fn start_editing(&mut self, cursor: CursorPlacement) {
        if !self.can_enter_edit() {
            return;
        }
        let Some(line) = self.selected_line() else {
            return;
        };
        let title = match cursor {
            CursorPlacement::Replace => String::new(),
            _ => line.title.clone(),
        };
        self.mode = EditMode::Editing(PendingEdit {
            issue_id: line.issue_id.clone(),
            title,
            original_title: line.title.clone(),
            cursor,
        });
        self.notify();
    }

    pub fn start_editing_at_start(&mut self) {
        self.start_editing(CursorPlacement::Start);
    }

    pub fn start_editing_at_end(&mut self) {
        self.start_editing(CursorPlacement::End);
    }

    pub fn start_replacing_title(&mut self) {
        self.start_editing(CursorPlacement::Replace);
    }

    /// Live-update the in-progress title, whichever draft owns it.
    pub fn update_edit_title(&mut self, text: &str) {
        let changed = match &mut self.mode {
            EditMode::Editing(pending) if pending.title != text => {
                pending.title = text.to_string();
                true
            }
            EditMode::Creating(pending) if pending.title != text => {
                pending.title = text.to_string();
                true
            }
            _ => false,
        };
        if changed {
            self.notify();
        }
    }

    /// Drop any pending edit/draft and any active search, back to plain
    /// viewing. The selection survives.
    pub fn cancel_edit(&mut self) {
        if self.is_viewing() && self.search_is_default() {
            return;
        }
        self.mode = EditMode::Viewing;
        self.reset_search_fields();
        self.notify();
    }

    /// Commit the pending edit or draft through the store.
    ///
    /// Empty and whitespace-only titles are rejected without leaving the
    /// edit mode. Everything the call needs is snapshotted before the
    /// await; pending state is cleared only after the store call resolves,
    /// so a duplicate accept while one is in flight stays a no-op and a
    /// failure leaves the draft intact for resubmission.
    pub async fn accept_edit<S: IssueStore>(&mut self, store: &S) -> Result<Option<AcceptOutcome>> {
        match &self.mode {
            EditMode::Editing(pending) => {
                let title = pending.title.trim();
                if title.is_empty() {
                    return Ok(None);
                }
                let issue_id = pending.issue_id.clone();
                let title = title.to_string();

                store.update_title(&issue_id, &title).await?;

                self.mode = EditMode::Viewing;
                self.notify();
                Ok(Some(AcceptOutcome::Updated { issue_id }))
            }
            EditMode::Creating(pending) => {
                let title = pending.title.trim();
                if title.is_empty() {
                    return Ok(None);
                }
                let input = CreateIssueInput {
                    title: title.to_string(),
                    description: String::new(),
                    parent_id: pending.pending_parent_id.clone(),
                    hint: InsertionHint {
                        anchor_id: pending.reference_issue_id.clone(),
                        above: pending.is_above,
                    },
                };

                let issue = store.create_issue(input).await?;

                self.mode = EditMode::Viewing;
                self.notify();
                Ok(Some(AcceptOutcome::Created { issue_id: issue.id }))
            }
            _ => Ok(None),
        }
    }

    // ── Creating ─────────────────────────────────────────────────────

    fn start_creating(&mut self, is_above: bool) {
        if !self.can_enter_edit() {
            return;
        }
        let insert_at = match self.selected {
            Some(i) if is_above => i,
            Some(i) => i + 1,
            None if is_above => 0,
            None => self.lines.len(),
        };
        self.mode = EditMode::Creating(PendingNewIssue {
            insert_at,
            is_above,
            reference_issue_id: self.selected_issue_id().map(str::to_owned),
            title: String::new(),
            pending_parent_id: None,
        });
        self.notify();
    }

    pub fn create_issue_below(&mut self) {
        self.start_creating(false);
    }

    pub fn create_issue_above(&mut self) {
        self.start_creating(true);
    }

    /// Make the draft a child of the line immediately preceding the
    /// insertion point. No-op when there is no preceding line.
    pub fn indent_as_child(&mut self) {
        let EditMode::Creating(pending) = &self.mode else {
            return;
        };
        let Some(preceding) = pending
            .insert_at
            .checked_sub(1)
            .and_then(|i| self.lines.get(i))
        else {
            return;
        };
        if pending.pending_parent_id.as_deref() == Some(preceding.issue_id.as_str()) {
            return;
        }
        let parent_id = preceding.issue_id.clone();
        if let EditMode::Creating(pending) = &mut self.mode {
            pending.pending_parent_id = Some(parent_id);
        }
        self.notify();
    }

    pub fn unindent_as_sibling(&mut self) {
        let EditMode::Creating(pending) = &mut self.mode else {
            return;
        };
        if pending.pending_parent_id.is_none() {
            return;
        }
        pending.pending_parent_id = None;
        self.notify();
    }

    // ── Moving ───────────────────────────────────────────────────────

    pub fn start_move_target(&mut self, operation: MoveOperation) {
        if !self.can_enter_edit() || self.selected.is_none() {
            return;
        }
        self.mode = EditMode::SelectingMoveTarget(operation);
        self.notify();
    }

    /// Reparent against the chosen target. Unknown targets and
    /// self-targets are silent no-ops; the mode survives a store failure.
    pub async fn confirm_move<S: IssueStore>(
        &mut self,
        target_id: &str,
        store: &S,
    ) -> Result<Option<AcceptOutcome>> {
        let EditMode::SelectingMoveTarget(operation) = &self.mode else {
            return Ok(None);
        };
        let operation = *operation;
        let Some(source_id) = self.selected_issue_id().map(str::to_owned) else {
            return Ok(None);
        };
        if source_id == target_id || !self.lines.iter().any(|l| l.issue_id == target_id) {
            return Ok(None);
        }

        match operation {
            MoveOperation::AsChildOf => store.reparent(&source_id, Some(target_id)).await?,
            MoveOperation::AsParentOf => store.reparent(target_id, Some(&source_id)).await?,
        }

        self.mode = EditMode::Viewing;
        self.notify();
        Ok(Some(AcceptOutcome::Moved { issue_id: source_id }))
    }

    // ── Search ───────────────────────────────────────────────────────

    /// Open the incremental search. Restarting mid-embed discards the
    /// embedded match cursor.
    pub fn start_search(&mut self) {
        if !self.is_viewing() {
            return;
        }
        if self.searching && self.term.is_empty() && !self.embedded && self.matches.is_empty() {
            // Already a fresh search; nothing would change.
            return;
        }
        self.reset_search_fields();
        self.searching = true;
        self.notify();
    }

    /// Recompute the match list for `term` (case-insensitive substring
    /// over titles). Ignored unless a search is being typed.
    pub fn update_search_term(&mut self, term: &str) {
        if !self.searching || self.term == term {
            return;
        }
        self.term = term.to_string();
        self.matches = if term.is_empty() {
            Vec::new()
        } else {
            let needle = term.to_lowercase();
            self.lines
                .iter()
                .enumerate()
                .filter(|(_, l)| l.title.to_lowercase().contains(&needle))
                .map(|(i, _)| i)
                .collect()
        };
        self.notify();
    }

    /// Commit the query: the cursor rejoins normal navigation while the
    /// match list stays available for cycling.
    pub fn embed_search(&mut self) {
        if !self.searching {
            return;
        }
        self.searching = false;
        self.embedded = true;
        if let Some(&first) = self.matches.first() {
            self.current_match = Some(0);
            self.selected = Some(first);
        } else {
            self.current_match = None;
        }
        self.notify();
    }

    fn cycle_match(&mut self, forward: bool) {
        if !self.embedded || self.matches.is_empty() {
            return;
        }
        let len = self.matches.len();
        let next = match (self.current_match, forward) {
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
            (None, true) => 0,
            (None, false) => len - 1,
        };
        let target = self.matches[next];
        if self.current_match == Some(next) && self.selected == Some(target) {
            return;
        }
        self.current_match = Some(next);
        self.selected = Some(target);
        self.notify();
    }

    pub fn move_to_next_match(&mut self) {
        self.cycle_match(true);
    }

    pub fn move_to_previous_match(&mut self) {
        self.cycle_match(false);
    }

    /// Reset all search sub-state; the selection stays where it is.
    pub fn clear_search(&mut self) {
        if self.search_is_default() {
            return;
        }
        self.reset_search_fields();
        self.notify();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::models::{Issue, IssueStatus, IssueType};

    fn line(id: &str, title: &str) -> IssueLine {
        IssueLine {
            issue_id: id.to_string(),
            title: title.to_string(),
            lane: 0,
            marker: Marker::Open,
            parent_lane: None,
            is_first_child: false,
            is_series_child: false,
            kind: IssueType::Task,
            status: IssueStatus::Open,
            agent_status: None,
        }
    }

    fn nav_with(lines: Vec<IssueLine>) -> NavigationState {
        let mut nav = NavigationState::new();
        nav.initialize(lines);
        nav
    }

    fn three_lines() -> Vec<IssueLine> {
        vec![line("a", "Alpha"), line("b", "Beta"), line("c", "Gamma")]
    }

    /// Store double that records calls and can be told to fail.
    #[derive(Default)]
    struct MockStore {
        calls: RefCell<Vec<String>>,
        fail: Cell<bool>,
    }

    impl MockStore {
        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        fn check(&self) -> Result<()> {
            if self.fail.get() {
                anyhow::bail!("store unavailable");
            }
            Ok(())
        }
    }

    impl IssueStore for MockStore {
        async fn create_issue(&self, input: CreateIssueInput) -> Result<Issue> {
            self.check()?;
            self.calls.borrow_mut().push(format!(
                "create:{}:parent={:?}:anchor={:?}:above={}",
                input.title, input.parent_id, input.hint.anchor_id, input.hint.above
            ));
            Ok(Issue {
                id: "fresh".to_string(),
                title: input.title,
                description: input.description,
                status: IssueStatus::Open,
                kind: IssueType::Task,
                execution_mode: Default::default(),
                agent_status: None,
                created_at: String::new(),
                updated_at: String::new(),
            })
        }

        async fn update_title(&self, id: &str, title: &str) -> Result<()> {
            self.check()?;
            self.calls.borrow_mut().push(format!("title:{id}:{title}"));
            Ok(())
        }

        async fn reparent(&self, id: &str, new_parent_id: Option<&str>) -> Result<()> {
            self.check()?;
            self.calls
                .borrow_mut()
                .push(format!("reparent:{id}:{new_parent_id:?}"));
            Ok(())
        }

        async fn update_kind(&self, id: &str, kind: IssueType) -> Result<()> {
            self.check()?;
            self.calls.borrow_mut().push(format!("kind:{id}:{kind}"));
            Ok(())
        }

        async fn update_status(&self, id: &str, status: IssueStatus) -> Result<()> {
            self.check()?;
            self.calls.borrow_mut().push(format!("status:{id}:{status}"));
            Ok(())
        }
    }

    // ── Initialize & selection ───────────────────────────────────────

    #[test]
    fn initialize_resets_everything() {
        let mut nav = nav_with(three_lines());
        nav.move_down();
        nav.start_search();
        nav.update_search_term("alp");

        nav.initialize(three_lines());
        assert_eq!(nav.selected_index(), None);
        assert!(nav.is_viewing());
        assert!(!nav.is_searching());
        assert!(nav.search_term().is_empty());
        assert!(nav.matching_indices().is_empty());
    }

    #[test]
    fn initialize_safe_on_empty_list() {
        let mut nav = NavigationState::new();
        nav.initialize(Vec::new());
        assert_eq!(nav.selected_index(), None);
        nav.move_down();
        nav.select_first_actionable();
        assert_eq!(nav.selected_index(), None);
    }

    #[test]
    fn select_first_actionable_prefers_actionable_marker() {
        let mut lines = three_lines();
        lines[1].marker = Marker::Actionable;
        let mut nav = nav_with(lines);

        nav.select_first_actionable();
        assert_eq!(nav.selected_index(), Some(1));
    }

    #[test]
    fn select_first_actionable_falls_back_to_first_line() {
        let mut nav = nav_with(three_lines());
        nav.select_first_actionable();
        assert_eq!(nav.selected_index(), Some(0));
    }

    #[test]
    fn select_issue_by_id() {
        let mut nav = nav_with(three_lines());
        nav.select_issue("c");
        assert_eq!(nav.selected_index(), Some(2));
        assert_eq!(nav.selected_issue_id(), Some("c"));
    }

    #[test]
    fn select_issue_unknown_id_is_noop() {
        let mut nav = nav_with(three_lines());
        nav.select_issue("b");
        let revision = nav.revision();

        nav.select_issue("nope");
        assert_eq!(nav.selected_index(), Some(1));
        assert_eq!(nav.revision(), revision, "no notification on a no-op");
    }

    // ── Movement ─────────────────────────────────────────────────────

    #[test]
    fn move_clamps_at_boundaries_without_wrapping() {
        let mut nav = nav_with(three_lines());
        nav.select_issue("a");

        nav.move_up();
        assert_eq!(nav.selected_index(), Some(0));

        nav.move_down();
        nav.move_down();
        assert_eq!(nav.selected_index(), Some(2));
        nav.move_down();
        assert_eq!(nav.selected_index(), Some(2));
    }

    #[test]
    fn move_from_no_selection_lands_on_first_line() {
        let mut nav = nav_with(three_lines());
        nav.move_down();
        assert_eq!(nav.selected_index(), Some(0));
    }

    #[test]
    fn move_ignored_while_editing() {
        let mut nav = nav_with(three_lines());
        nav.select_issue("b");
        nav.start_editing_at_end();

        nav.move_down();
        nav.move_up();
        assert_eq!(nav.selected_index(), Some(1));
    }

    #[test]
    fn move_ignored_while_typing_a_search() {
        let mut nav = nav_with(three_lines());
        nav.select_issue("a");
        nav.start_search();

        nav.move_down();
        assert_eq!(nav.selected_index(), Some(0));
    }

    #[test]
    fn move_allowed_while_search_is_embedded_and_walks_all_lines() {
        let mut nav = nav_with(three_lines());
        nav.start_search();
        nav.update_search_term("gamma");
        nav.embed_search();
        assert_eq!(nav.selected_index(), Some(2));

        // Walks line 1 even though it is not a match.
        nav.move_up();
        assert_eq!(nav.selected_index(), Some(1));
    }

    #[test]
    fn move_to_parent_jumps_forward_to_parent_lane() {
        let mut lines = three_lines();
        lines[0].lane = 1;
        lines[0].parent_lane = Some(0);
        lines[1].lane = 1;
        lines[2].lane = 0;
        let mut nav = nav_with(lines);

        nav.select_issue("a");
        nav.move_to_parent();
        assert_eq!(nav.selected_issue_id(), Some("c"));
    }

    #[test]
    fn move_to_parent_without_parent_is_noop() {
        let mut nav = nav_with(three_lines());
        nav.select_issue("b");
        nav.move_to_parent();
        assert_eq!(nav.selected_issue_id(), Some("b"));
    }

    #[test]
    fn move_to_child_jumps_backward() {
        let mut lines = three_lines();
        lines[0].lane = 1;
        lines[0].parent_lane = Some(0);
        lines[1].lane = 1;
        lines[2].lane = 0;
        let mut nav = nav_with(lines);

        nav.select_issue("c");
        nav.move_to_child();
        assert_eq!(nav.selected_issue_id(), Some("a"));
    }

    // ── Edit mode entry & guards ─────────────────────────────────────

    #[test]
    fn start_editing_seeds_pending_edit() {
        let mut nav = nav_with(three_lines());
        nav.select_issue("b");
        nav.start_editing_at_end();

        match nav.mode() {
            EditMode::Editing(pending) => {
                assert_eq!(pending.issue_id, "b");
                assert_eq!(pending.title, "Beta");
                assert_eq!(pending.original_title, "Beta");
                assert_eq!(pending.cursor, CursorPlacement::End);
            }
            other => panic!("expected Editing, got {other:?}"),
        }
    }

    #[test]
    fn start_replacing_clears_title_but_keeps_original() {
        let mut nav = nav_with(three_lines());
        nav.select_issue("a");
        nav.start_replacing_title();

        match nav.mode() {
            EditMode::Editing(pending) => {
                assert_eq!(pending.title, "");
                assert_eq!(pending.original_title, "Alpha");
                assert_eq!(pending.cursor, CursorPlacement::Replace);
            }
            other => panic!("expected Editing, got {other:?}"),
        }
    }

    #[test]
    fn edit_entry_requires_selection() {
        let mut nav = nav_with(three_lines());
        nav.start_editing_at_start();
        assert!(nav.is_viewing());
    }

    #[test]
    fn edit_entry_is_noop_while_creating() {
        let mut nav = nav_with(three_lines());
        nav.select_issue("a");
        nav.create_issue_below();

        nav.start_editing_at_start();
        assert!(matches!(nav.mode(), EditMode::Creating(_)));
    }

    #[test]
    fn update_edit_title_ignored_while_viewing() {
        let mut nav = nav_with(three_lines());
        nav.select_issue("a");
        let revision = nav.revision();

        nav.update_edit_title("ignored");
        assert!(nav.is_viewing());
        assert_eq!(nav.revision(), revision);
    }

    #[test]
    fn cancel_returns_to_viewing_and_preserves_selection() {
        let mut nav = nav_with(three_lines());
        nav.select_issue("b");
        nav.start_editing_at_end();
        nav.update_edit_title("half-typed");

        nav.cancel_edit();
        assert!(nav.is_viewing());
        assert_eq!(nav.selected_issue_id(), Some("b"));
    }

    #[test]
    fn cancel_also_clears_active_search() {
        let mut nav = nav_with(three_lines());
        nav.start_search();
        nav.update_search_term("alp");

        nav.cancel_edit();
        assert!(!nav.is_searching());
        assert!(nav.search_term().is_empty());
        assert!(nav.matching_indices().is_empty());
    }

    #[test]
    fn cancel_when_nothing_active_is_noop() {
        let mut nav = nav_with(three_lines());
        let revision = nav.revision();
        nav.cancel_edit();
        assert_eq!(nav.revision(), revision);
    }

    // ── Accept ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn accept_whitespace_title_blocks_and_skips_store() {
        let store = MockStore::default();
        let mut nav = nav_with(three_lines());
        nav.select_issue("a");
        nav.start_replacing_title();
        nav.update_edit_title("   ");
        let revision = nav.revision();

        let outcome = nav.accept_edit(&store).await.unwrap();
        assert_eq!(outcome, None);
        assert!(matches!(nav.mode(), EditMode::Editing(_)));
        assert!(store.calls().is_empty());
        assert_eq!(nav.revision(), revision);
    }

    #[tokio::test]
    async fn accept_edit_persists_trimmed_title() {
        let store = MockStore::default();
        let mut nav = nav_with(three_lines());
        nav.select_issue("b");
        nav.start_replacing_title();
        nav.update_edit_title("  New title  ");

        let outcome = nav.accept_edit(&store).await.unwrap();
        assert_eq!(
            outcome,
            Some(AcceptOutcome::Updated { issue_id: "b".to_string() })
        );
        assert!(nav.is_viewing());
        assert_eq!(store.calls(), ["title:b:New title"]);
    }

    #[tokio::test]
    async fn accept_failure_keeps_pending_edit() {
        let store = MockStore::default();
        store.fail.set(true);
        let mut nav = nav_with(three_lines());
        nav.select_issue("b");
        nav.start_editing_at_end();
        nav.update_edit_title("Edited");

        let result = nav.accept_edit(&store).await;
        assert!(result.is_err());
        match nav.mode() {
            EditMode::Editing(pending) => assert_eq!(pending.title, "Edited"),
            other => panic!("expected Editing, got {other:?}"),
        }

        // Retry once the store recovers.
        store.fail.set(false);
        let outcome = nav.accept_edit(&store).await.unwrap();
        assert_eq!(
            outcome,
            Some(AcceptOutcome::Updated { issue_id: "b".to_string() })
        );
    }

    #[tokio::test]
    async fn accept_while_viewing_is_noop() {
        let store = MockStore::default();
        let mut nav = nav_with(three_lines());
        nav.select_issue("a");

        let outcome = nav.accept_edit(&store).await.unwrap();
        assert_eq!(outcome, None);
        assert!(store.calls().is_empty());
    }

    // ── Creating ─────────────────────────────────────────────────────

    #[test]
    fn create_below_inserts_after_selection() {
        let mut nav = nav_with(three_lines());
        nav.select_issue("b");
        nav.create_issue_below();

        match nav.mode() {
            EditMode::Creating(pending) => {
                assert_eq!(pending.insert_at, 2);
                assert!(!pending.is_above);
                assert_eq!(pending.reference_issue_id.as_deref(), Some("b"));
                assert_eq!(pending.pending_parent_id, None);
            }
            other => panic!("expected Creating, got {other:?}"),
        }
    }

    #[test]
    fn create_above_inserts_at_selection() {
        let mut nav = nav_with(three_lines());
        nav.select_issue("b");
        nav.create_issue_above();

        match nav.mode() {
            EditMode::Creating(pending) => {
                assert_eq!(pending.insert_at, 1);
                assert!(pending.is_above);
                assert_eq!(pending.reference_issue_id.as_deref(), Some("b"));
            }
            other => panic!("expected Creating, got {other:?}"),
        }
    }

    #[test]
    fn create_on_empty_board_is_allowed() {
        let mut nav = nav_with(Vec::new());
        nav.create_issue_below();

        match nav.mode() {
            EditMode::Creating(pending) => {
                assert_eq!(pending.insert_at, 0);
                assert_eq!(pending.reference_issue_id, None);
            }
            other => panic!("expected Creating, got {other:?}"),
        }
    }

    #[test]
    fn indent_uses_line_preceding_insertion_point() {
        let mut nav = nav_with(three_lines());
        nav.select_issue("b");
        nav.create_issue_below();

        nav.indent_as_child();
        match nav.mode() {
            EditMode::Creating(pending) => {
                assert_eq!(pending.pending_parent_id.as_deref(), Some("b"));
            }
            other => panic!("expected Creating, got {other:?}"),
        }

        nav.unindent_as_sibling();
        match nav.mode() {
            EditMode::Creating(pending) => assert_eq!(pending.pending_parent_id, None),
            other => panic!("expected Creating, got {other:?}"),
        }
    }

    #[test]
    fn indent_above_first_line_is_noop() {
        let mut nav = nav_with(three_lines());
        nav.select_issue("a");
        nav.create_issue_above();
        let revision = nav.revision();

        nav.indent_as_child();
        match nav.mode() {
            EditMode::Creating(pending) => assert_eq!(pending.pending_parent_id, None),
            other => panic!("expected Creating, got {other:?}"),
        }
        assert_eq!(nav.revision(), revision);
    }

    #[tokio::test]
    async fn accept_creating_passes_parent_and_hint() {
        let store = MockStore::default();
        let mut nav = nav_with(three_lines());
        nav.select_issue("b");
        nav.create_issue_below();
        nav.indent_as_child();
        nav.update_edit_title("Child draft");

        let outcome = nav.accept_edit(&store).await.unwrap();
        assert_eq!(
            outcome,
            Some(AcceptOutcome::Created { issue_id: "fresh".to_string() })
        );
        assert!(nav.is_viewing());
        assert_eq!(
            store.calls(),
            ["create:Child draft:parent=Some(\"b\"):anchor=Some(\"b\"):above=false"]
        );
    }

    #[tokio::test]
    async fn accept_creating_with_empty_title_stays_in_creating() {
        let store = MockStore::default();
        let mut nav = nav_with(three_lines());
        nav.select_issue("a");
        nav.create_issue_below();

        let outcome = nav.accept_edit(&store).await.unwrap();
        assert_eq!(outcome, None);
        assert!(matches!(nav.mode(), EditMode::Creating(_)));
        assert!(store.calls().is_empty());
    }

    // ── Move target ──────────────────────────────────────────────────

    #[tokio::test]
    async fn confirm_move_as_child_reparents_selection_under_target() {
        let store = MockStore::default();
        let mut nav = nav_with(three_lines());
        nav.select_issue("a");
        nav.start_move_target(MoveOperation::AsChildOf);
        assert!(matches!(
            nav.mode(),
            EditMode::SelectingMoveTarget(MoveOperation::AsChildOf)
        ));

        let outcome = nav.confirm_move("c", &store).await.unwrap();
        assert_eq!(
            outcome,
            Some(AcceptOutcome::Moved { issue_id: "a".to_string() })
        );
        assert!(nav.is_viewing());
        assert_eq!(store.calls(), ["reparent:a:Some(\"c\")"]);
    }

    #[tokio::test]
    async fn confirm_move_as_parent_reparents_target_under_selection() {
        let store = MockStore::default();
        let mut nav = nav_with(three_lines());
        nav.select_issue("a");
        nav.start_move_target(MoveOperation::AsParentOf);

        nav.confirm_move("c", &store).await.unwrap();
        assert_eq!(store.calls(), ["reparent:c:Some(\"a\")"]);
    }

    #[tokio::test]
    async fn confirm_move_unknown_or_self_target_is_noop() {
        let store = MockStore::default();
        let mut nav = nav_with(three_lines());
        nav.select_issue("a");
        nav.start_move_target(MoveOperation::AsChildOf);

        assert_eq!(nav.confirm_move("ghost", &store).await.unwrap(), None);
        assert_eq!(nav.confirm_move("a", &store).await.unwrap(), None);
        assert!(matches!(nav.mode(), EditMode::SelectingMoveTarget(_)));
        assert!(store.calls().is_empty());
    }

    #[test]
    fn start_move_target_requires_selection() {
        let mut nav = nav_with(three_lines());
        nav.start_move_target(MoveOperation::AsChildOf);
        assert!(nav.is_viewing());
    }

    // ── Search ───────────────────────────────────────────────────────

    fn search_lines() -> Vec<IssueLine> {
        vec![
            line("a", "Fix authentication timeout"),
            line("b", "Add login screen"),
            line("c", "Review auth flow"),
            line("d", "Unrelated chore"),
        ]
    }

    #[test]
    fn update_search_term_matches_case_insensitive_substrings() {
        let mut nav = nav_with(search_lines());
        nav.start_search();
        nav.update_search_term("AUTH");
        assert_eq!(nav.matching_indices(), [0, 2]);

        nav.update_search_term("");
        assert!(nav.matching_indices().is_empty());
    }

    #[test]
    fn update_search_term_ignored_when_not_searching() {
        let mut nav = nav_with(search_lines());
        let revision = nav.revision();
        nav.update_search_term("auth");
        assert!(nav.matching_indices().is_empty());
        assert_eq!(nav.revision(), revision);
    }

    #[test]
    fn search_entry_ignored_while_editing() {
        let mut nav = nav_with(search_lines());
        nav.select_issue("a");
        nav.start_editing_at_end();

        nav.start_search();
        assert!(!nav.is_searching());
        assert!(matches!(nav.mode(), EditMode::Editing(_)));
    }

    #[test]
    fn embed_selects_first_match() {
        let mut nav = nav_with(search_lines());
        nav.select_issue("d");
        nav.start_search();
        nav.update_search_term("auth");
        nav.embed_search();

        assert!(!nav.is_searching());
        assert!(nav.is_search_embedded());
        assert_eq!(nav.selected_index(), Some(0));
        assert_eq!(nav.current_match_index(), Some(0));
    }

    #[test]
    fn embed_with_no_matches_leaves_selection_alone() {
        let mut nav = nav_with(search_lines());
        nav.select_issue("b");
        nav.start_search();
        nav.update_search_term("zzz");
        nav.embed_search();

        assert!(nav.is_search_embedded());
        assert_eq!(nav.selected_index(), Some(1));
        assert_eq!(nav.current_match_index(), None);
    }

    #[test]
    fn match_cycling_wraps_both_ways() {
        let mut nav = nav_with(search_lines());
        nav.start_search();
        nav.update_search_term("auth");
        nav.embed_search();

        nav.move_to_next_match();
        assert_eq!(nav.selected_index(), Some(2));
        nav.move_to_next_match();
        assert_eq!(nav.selected_index(), Some(0), "wraps past the last match");

        nav.move_to_previous_match();
        assert_eq!(nav.selected_index(), Some(2), "wraps before the first match");
    }

    #[test]
    fn match_cycling_ignored_unless_embedded() {
        let mut nav = nav_with(search_lines());
        nav.start_search();
        nav.update_search_term("auth");
        let revision = nav.revision();

        nav.move_to_next_match();
        assert_eq!(nav.revision(), revision);

        nav.embed_search();
        nav.update_search_term("ignored while embedded");
        assert_eq!(nav.search_term(), "auth");
    }

    #[test]
    fn restarting_search_discards_embedded_cursor() {
        let mut nav = nav_with(search_lines());
        nav.start_search();
        nav.update_search_term("auth");
        nav.embed_search();

        nav.start_search();
        assert!(nav.is_searching());
        assert!(!nav.is_search_embedded());
        assert!(nav.search_term().is_empty());
        assert_eq!(nav.current_match_index(), None);
    }

    #[test]
    fn clear_search_resets_state_but_not_selection() {
        let mut nav = nav_with(search_lines());
        nav.start_search();
        nav.update_search_term("auth");
        nav.embed_search();
        nav.move_to_next_match();

        nav.clear_search();
        assert!(!nav.is_searching());
        assert!(!nav.is_search_embedded());
        assert!(nav.search_term().is_empty());
        assert!(nav.matching_indices().is_empty());
        assert_eq!(nav.current_match_index(), None);
        assert_eq!(nav.selected_index(), Some(2));

        let revision = nav.revision();
        nav.clear_search();
        assert_eq!(nav.revision(), revision, "idempotent when nothing active");
    }

    // ── Notifications ────────────────────────────────────────────────

    #[test]
    fn listener_fires_once_per_mutation_and_never_on_noops() {
        let fired = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&fired);

        let mut nav = NavigationState::new();
        nav.set_on_change(Box::new(move |revision| sink.borrow_mut().push(revision)));

        nav.initialize(three_lines());
        nav.move_down(); // select 0
        nav.move_up(); // clamped: no-op
        nav.select_issue("ghost"); // no-op
        nav.move_down(); // select 1

        assert_eq!(fired.borrow().as_slice(), [1, 2, 3]);
    }
}
