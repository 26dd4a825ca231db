use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::graph::line::Marker;
use crate::tui::app::App;
use crate::tui::nav::EditMode;
use crate::tui::{render, theme};

pub fn draw(frame: &mut Frame, app: &App) {
    // Fill the entire background
    let bg_block = Block::default().style(Style::default().bg(theme::BG));
    frame.render_widget(bg_block, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_header(frame, app, chunks[0]);
    draw_timeline(frame, app, chunks[1]);
    draw_footer(frame, app, chunks[2]);

    if app.show_help {
        draw_help_overlay(frame);
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let total = app.nav.lines().len();
    let actionable = app
        .nav
        .lines()
        .iter()
        .filter(|l| l.marker == Marker::Actionable)
        .count();
    let complete = app
        .nav
        .lines()
        .iter()
        .filter(|l| l.marker == Marker::Complete)
        .count();

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!("  {} ", theme::HEADER_ART),
            Style::default()
                .fg(theme::NEON_CYAN)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("│ ", Style::default().fg(theme::BORDER_DIM)),
        Span::styled(
            format!("{total} issues"),
            Style::default().fg(theme::NEON_MAGENTA),
        ),
        Span::styled(
            format!("  ◆ {actionable} actionable"),
            Style::default().fg(theme::NEON_CYAN),
        ),
        Span::styled(
            format!("  ● {complete} complete"),
            Style::default().fg(theme::NEON_GREEN),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme::panel_border(false))
            .style(Style::default().bg(theme::BG)),
    );
    frame.render_widget(header, area);
}

fn draw_timeline(frame: &mut Frame, app: &App, area: Rect) {
    let move_target = match app.nav.mode() {
        EditMode::SelectingMoveTarget(_) => Some(app.move_target_idx),
        _ => None,
    };
    let lines = render::build_timeline(&app.lines, &app.nav, move_target);

    let timeline = Paragraph::new(lines)
        .scroll((app.scroll as u16, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme::panel_border(true))
                .title(Span::styled(
                    " Timeline ",
                    Style::default()
                        .fg(theme::NEON_CYAN)
                        .add_modifier(Modifier::BOLD),
                ))
                .style(Style::default().bg(theme::BG)),
        );
    frame.render_widget(timeline, area);
}

fn footer_hint(app: &App) -> Line<'static> {
    if let Some(message) = &app.status_message {
        return Line::from(Span::styled(
            format!("  {message}"),
            Style::default().fg(theme::NEON_ORANGE),
        ));
    }

    if app.nav.is_searching() {
        return Line::from(vec![
            Span::styled("  /", Style::default().fg(theme::NEON_CYAN)),
            Span::styled(
                format!("{}▏", app.nav.search_term()),
                Style::default().fg(theme::TEXT_BRIGHT),
            ),
            Span::styled(
                format!("  {} matches — Enter: keep  Esc: cancel", app.nav.matching_indices().len()),
                Style::default().fg(theme::TEXT_DIM),
            ),
        ]);
    }

    if app.nav.is_search_embedded() {
        return Line::from(Span::styled(
            format!(
                "  [{}] {} matches — n/N: cycle  Esc: clear",
                app.nav.search_term(),
                app.nav.matching_indices().len()
            ),
            Style::default().fg(theme::TEXT_DIM),
        ));
    }

    let hint = match app.nav.mode() {
        EditMode::Viewing => {
            "  j/k: move  p/c: parent/child  i/a/r: edit  o/O: new  t/s: cycle  /: search  ?: help  q: quit"
        }
        EditMode::Editing(_) => "  Enter: save  Esc: cancel",
        EditMode::Creating(_) => "  Enter: create  Tab: indent  Shift-Tab: unindent  Esc: cancel",
        EditMode::SelectingMoveTarget(_) => "  j/k: pick target  Enter: move  Esc: cancel",
    };
    Line::from(Span::styled(
        hint.to_string(),
        Style::default().fg(theme::TEXT_DIM),
    ))
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let footer = Paragraph::new(footer_hint(app)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme::panel_border(false))
            .title(Span::styled(" Help ", Style::default().fg(theme::TEXT_DIM)))
            .style(Style::default().bg(theme::BG)),
    );
    frame.render_widget(footer, area);
}

fn draw_help_overlay(frame: &mut Frame) {
    let area = centered_rect(60, 70, frame.area());

    let entries = [
        ("j / k, ↓ / ↑", "move selection"),
        ("p / c", "jump to parent / child"),
        ("w", "select first actionable"),
        ("i / a", "edit title (start / end)"),
        ("r", "replace title"),
        ("o / O", "new issue below / above"),
        ("Tab / Shift-Tab", "indent / unindent draft"),
        ("m / M", "move as child of / parent of…"),
        ("t / s", "cycle type / status"),
        ("/", "search, Enter keeps the matches"),
        ("n / N", "next / previous match"),
        ("Esc", "cancel / clear"),
        ("q", "quit"),
    ];

    let mut lines = vec![Line::from("")];
    for (keys, what) in entries {
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {keys:<18}"),
                Style::default().fg(theme::NEON_CYAN),
            ),
            Span::styled(what.to_string(), Style::default().fg(theme::TEXT_DIM)),
        ]));
    }

    let help = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme::panel_border(true))
            .title(Span::styled(
                " Keys ",
                Style::default()
                    .fg(theme::NEON_CYAN)
                    .add_modifier(Modifier::BOLD),
            ))
            .style(Style::default().bg(theme::BG)),
    );

    frame.render_widget(Clear, area);
    frame.render_widget(help, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
