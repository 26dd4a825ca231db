use std::io::Stdout;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::db::issue::get_max_updated_at;
use crate::db::{issue, link};
use crate::graph::line::{IssueLine, RenderLine};
use crate::graph::{compute_layout, place};
use crate::store::{IssueStore, SqliteStore};
use crate::tui::nav::{AcceptOutcome, EditMode, MoveOperation, NavigationState};
use crate::tui::{render, ui};

pub struct App {
    pub store: SqliteStore,
    runtime: tokio::runtime::Runtime,
    pub nav: NavigationState,
    pub lines: Vec<RenderLine>,
    pub running: bool,
    pub show_help: bool,
    pub status_message: Option<String>,
    /// First visible render row of the timeline viewport.
    pub scroll: usize,
    /// Candidate row while picking a move target.
    pub move_target_idx: usize,
    /// Character position of the caret inside the pending title.
    edit_cursor: usize,
    last_refresh: Instant,
    last_db_watermark: String,
}

impl App {
    pub fn new(store: SqliteStore) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let mut app = Self {
            store,
            runtime,
            nav: NavigationState::new(),
            lines: Vec::new(),
            running: true,
            show_help: false,
            status_message: None,
            scroll: 0,
            move_target_idx: 0,
            edit_cursor: 0,
            last_refresh: Instant::now(),
            last_db_watermark: String::new(),
        };
        app.refresh_data();
        app.nav.select_first_actionable();
        Ok(app)
    }

    pub fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        while self.running {
            if let Ok(size) = terminal.size() {
                // Header, borders, and footer chrome eat ~6 rows.
                self.ensure_selection_visible((size.height as usize).saturating_sub(6));
            }

            terminal.draw(|frame| ui::draw(frame, self))?;

            if event::poll(Duration::from_millis(42))?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.handle_key(key);
            }

            // Auto-refresh: poll the database for changes every ~1 second,
            // but never underneath an in-progress edit or search.
            if self.last_refresh.elapsed() >= Duration::from_secs(1) {
                self.check_for_db_changes();
            }
        }
        Ok(())
    }

    // ── Data loading ─────────────────────────────────────────────────

    /// Reload issues and links, re-run placement and layout, and
    /// re-initialize the cursor while keeping the selected issue.
    pub fn refresh_data(&mut self) {
        let issues = issue::list_issues(self.store.db(), None).unwrap_or_default();
        let links = link::list_links(self.store.db()).unwrap_or_default();
        let nodes = place(&issues, &links);
        self.lines = compute_layout(&nodes);

        let selected = self.nav.selected_issue_id().map(str::to_owned);
        let issue_lines: Vec<IssueLine> = self
            .lines
            .iter()
            .filter_map(RenderLine::as_issue)
            .cloned()
            .collect();
        self.nav.initialize(issue_lines);
        if let Some(id) = selected {
            self.nav.select_issue(&id);
        }

        self.last_db_watermark = get_max_updated_at(self.store.db()).unwrap_or_default();
        self.last_refresh = Instant::now();
    }

    fn check_for_db_changes(&mut self) {
        if !self.nav.is_viewing() || self.nav.is_searching() || self.nav.is_search_embedded() {
            self.last_refresh = Instant::now();
            return;
        }
        let watermark = get_max_updated_at(self.store.db()).unwrap_or_default();
        if watermark != self.last_db_watermark {
            self.refresh_data();
        } else {
            self.last_refresh = Instant::now();
        }
    }

    fn ensure_selection_visible(&mut self, viewport_rows: usize) {
        if viewport_rows == 0 {
            return;
        }
        let Some(issue_idx) = self.nav.selected_index() else {
            return;
        };
        let Some(row) = render::render_row_of_issue(&self.lines, issue_idx) else {
            return;
        };
        if row < self.scroll {
            self.scroll = row;
        } else if row >= self.scroll + viewport_rows {
            self.scroll = row + 1 - viewport_rows;
        }
    }

    // ── Key dispatch ─────────────────────────────────────────────────

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.status_message = None;

        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?')) {
                self.show_help = false;
            }
            return;
        }

        if self.nav.is_searching() {
            self.handle_search_key(key);
            return;
        }

        match self.nav.mode() {
            EditMode::Viewing => self.handle_viewing_key(key),
            EditMode::Editing(_) | EditMode::Creating(_) => self.handle_edit_key(key),
            EditMode::SelectingMoveTarget(_) => self.handle_move_target_key(key),
        }
    }

    fn handle_viewing_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.running = false,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Char('j') | KeyCode::Down => self.nav.move_down(),
            KeyCode::Char('k') | KeyCode::Up => self.nav.move_up(),
            KeyCode::Char('p') => self.nav.move_to_parent(),
            KeyCode::Char('c') => self.nav.move_to_child(),
            KeyCode::Char('w') => self.nav.select_first_actionable(),
            KeyCode::Char('i') => self.enter_edit(|nav| nav.start_editing_at_start()),
            KeyCode::Char('a') => self.enter_edit(|nav| nav.start_editing_at_end()),
            KeyCode::Char('r') => self.enter_edit(|nav| nav.start_replacing_title()),
            KeyCode::Char('o') => self.enter_edit(|nav| nav.create_issue_below()),
            KeyCode::Char('O') => self.enter_edit(|nav| nav.create_issue_above()),
            KeyCode::Char('t') => self.cycle_selected_kind(),
            KeyCode::Char('s') => self.cycle_selected_status(),
            KeyCode::Char('m') => self.start_move_target(MoveOperation::AsChildOf),
            KeyCode::Char('M') => self.start_move_target(MoveOperation::AsParentOf),
            KeyCode::Char('/') => self.nav.start_search(),
            KeyCode::Char('n') => self.nav.move_to_next_match(),
            KeyCode::Char('N') => self.nav.move_to_previous_match(),
            KeyCode::Esc => self.nav.clear_search(),
            _ => {}
        }
    }

    /// Enter an edit/create mode and seed the caret from the placement
    /// the mode starts with.
    fn enter_edit(&mut self, start: impl FnOnce(&mut NavigationState)) {
        start(&mut self.nav);
        self.edit_cursor = match self.nav.mode() {
            EditMode::Editing(pending) => match pending.cursor {
                crate::tui::nav::CursorPlacement::Start => 0,
                _ => pending.title.chars().count(),
            },
            EditMode::Creating(pending) => pending.title.chars().count(),
            _ => 0,
        };
    }

    fn pending_title(&self) -> Option<String> {
        match self.nav.mode() {
            EditMode::Editing(pending) => Some(pending.title.clone()),
            EditMode::Creating(pending) => Some(pending.title.clone()),
            _ => None,
        }
    }

    fn handle_edit_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.nav.cancel_edit(),
            KeyCode::Enter => self.accept_pending(),
            KeyCode::Tab => self.nav.indent_as_child(),
            KeyCode::BackTab => self.nav.unindent_as_sibling(),
            KeyCode::Backspace => {
                let Some(title) = self.pending_title() else {
                    return;
                };
                let mut chars: Vec<char> = title.chars().collect();
                let at = self.edit_cursor.min(chars.len());
                if at == 0 {
                    return;
                }
                chars.remove(at - 1);
                self.edit_cursor = at - 1;
                let updated: String = chars.into_iter().collect();
                self.nav.update_edit_title(&updated);
            }
            KeyCode::Char(c) => {
                let Some(title) = self.pending_title() else {
                    return;
                };
                let mut chars: Vec<char> = title.chars().collect();
                let at = self.edit_cursor.min(chars.len());
                chars.insert(at, c);
                self.edit_cursor = at + 1;
                let updated: String = chars.into_iter().collect();
                self.nav.update_edit_title(&updated);
            }
            _ => {}
        }
    }

    fn accept_pending(&mut self) {
        let result = self.runtime.block_on(self.nav.accept_edit(&self.store));
        match result {
            Ok(Some(outcome)) => {
                self.refresh_data();
                match outcome {
                    AcceptOutcome::Created { issue_id }
                    | AcceptOutcome::Updated { issue_id }
                    | AcceptOutcome::Moved { issue_id } => self.nav.select_issue(&issue_id),
                }
            }
            Ok(None) => {}
            Err(e) => self.status_message = Some(format!("save failed: {e}")),
        }
    }

    // ── Move target ──────────────────────────────────────────────────

    fn start_move_target(&mut self, operation: MoveOperation) {
        self.nav.start_move_target(operation);
        if matches!(self.nav.mode(), EditMode::SelectingMoveTarget(_)) {
            self.move_target_idx = self.nav.selected_index().unwrap_or(0);
        }
    }

    fn handle_move_target_key(&mut self, key: KeyEvent) {
        let count = self.nav.lines().len();
        match key.code {
            KeyCode::Esc => self.nav.cancel_edit(),
            KeyCode::Char('j') | KeyCode::Down if count > 0 => {
                self.move_target_idx = (self.move_target_idx + 1).min(count - 1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_target_idx = self.move_target_idx.saturating_sub(1);
            }
            KeyCode::Enter => {
                let Some(target_id) = self
                    .nav
                    .lines()
                    .get(self.move_target_idx)
                    .map(|l| l.issue_id.clone())
                else {
                    return;
                };
                let result = self
                    .runtime
                    .block_on(self.nav.confirm_move(&target_id, &self.store));
                match result {
                    Ok(Some(AcceptOutcome::Moved { issue_id })) => {
                        self.refresh_data();
                        self.nav.select_issue(&issue_id);
                    }
                    Ok(_) => {}
                    Err(e) => self.status_message = Some(format!("move failed: {e}")),
                }
            }
            _ => {}
        }
    }

    // ── Search ───────────────────────────────────────────────────────

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.nav.cancel_edit(),
            KeyCode::Enter => self.nav.embed_search(),
            KeyCode::Backspace => {
                let mut term = self.nav.search_term().to_string();
                term.pop();
                self.nav.update_search_term(&term);
            }
            KeyCode::Char(c) => {
                let term = format!("{}{c}", self.nav.search_term());
                self.nav.update_search_term(&term);
            }
            _ => {}
        }
    }

    // ── Type/status cycling ──────────────────────────────────────────

    fn cycle_selected_kind(&mut self) {
        let Some(line) = self.nav.selected_line() else {
            return;
        };
        let issue_id = line.issue_id.clone();
        let next = line.kind.cycle();
        let result = self.runtime.block_on(self.store.update_kind(&issue_id, next));
        match result {
            Ok(()) => {
                self.refresh_data();
                self.nav.select_issue(&issue_id);
            }
            Err(e) => self.status_message = Some(format!("update failed: {e}")),
        }
    }

    fn cycle_selected_status(&mut self) {
        let Some(line) = self.nav.selected_line() else {
            return;
        };
        let issue_id = line.issue_id.clone();
        let next = line.status.cycle();
        let result = self
            .runtime
            .block_on(self.store.update_status(&issue_id, next));
        match result {
            Ok(()) => {
                self.refresh_data();
                self.nav.select_issue(&issue_id);
            }
            Err(e) => self.status_message = Some(format!("update failed: {e}")),
        }
    }
}
