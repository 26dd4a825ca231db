mod app;
pub mod nav;
pub mod render;
mod theme;
mod ui;

pub use app::App;

use std::io::{Stdout, stdout};
use std::panic;

use anyhow::Result;
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::db::Database;
use crate::store::SqliteStore;

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(stdout(), LeaveAlternateScreen);
}

/// Enter raw mode + alternate screen, and make sure a panic anywhere in
/// the app restores the terminal before the message prints.
fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;

    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        restore_terminal();
        original_hook(info);
    }));

    Ok(Terminal::new(CrosstermBackend::new(stdout()))?)
}

pub fn run(db: Database) -> Result<()> {
    db.migrate()?;
    let store = SqliteStore::new(db);

    let mut terminal = init_terminal()?;
    let result = App::new(store).and_then(|mut app| app.run(&mut terminal));

    restore_terminal();
    let _ = panic::take_hook();
    result
}
