//! Paints the flattened render-line sequence as a git-log-style timeline.
//!
//! Every glyph here is derived from the `RenderLine` fields alone; no graph
//! topology is re-derived. Lane `c` occupies text column `2 * c` in the
//! gutter.

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::graph::line::{ConnectorLine, IssueLine, RenderLine};
use crate::tui::nav::{CursorPlacement, EditMode, NavigationState};
use crate::tui::theme;

const LANE_WIDTH: usize = 2;
const CURSOR_GLYPH: char = '▏';
const DRAFT_MARKER: &str = "◌";

fn lane_column(lane: usize) -> usize {
    lane * LANE_WIDTH
}

/// Gutter text for a connector row: children's lanes come down from above
/// and merge into the parent's lane.
fn connector_gutter(connector: &ConnectorLine) -> String {
    let parent = connector.parent_lane;
    let rightmost = connector
        .child_lanes
        .iter()
        .copied()
        .chain([parent])
        .max()
        .unwrap_or(parent);

    let width = lane_column(rightmost) + 1;
    let mut cells: Vec<char> = vec![' '; width];

    let span_start = lane_column(parent.min(*connector.child_lanes.first().unwrap_or(&parent)));
    let span_end = lane_column(rightmost);
    if span_end > span_start {
        for cell in cells.iter_mut().take(span_end).skip(span_start) {
            *cell = '─';
        }
    }

    for &lane in &connector.child_lanes {
        cells[lane_column(lane)] = match lane.cmp(&parent) {
            std::cmp::Ordering::Equal => '│',
            std::cmp::Ordering::Greater => '╯',
            std::cmp::Ordering::Less => '╰',
        };
    }

    // The parent cell joins whatever comes down from above with the lane
    // continuing below it.
    let straight = connector.child_lanes.contains(&parent);
    let has_left = connector.child_lanes.iter().any(|&l| l < parent);
    let has_right = connector.child_lanes.iter().any(|&l| l > parent);
    cells[lane_column(parent)] = match (straight, has_left, has_right) {
        (true, false, false) => '│',
        (true, false, true) => '├',
        (true, true, false) => '┤',
        (true, true, true) => '┼',
        (false, false, true) => '╭',
        (false, true, false) => '╮',
        (false, true, true) => '┬',
        (false, false, false) => '│',
    };

    cells.into_iter().collect()
}

/// Indentation preceding an issue row's marker.
fn issue_indent(line: &IssueLine) -> String {
    " ".repeat(lane_column(line.lane))
}

/// Where a draft row lands in the render sequence: right before the
/// `insert_at`-th issue line, or at the very end.
fn draft_render_position(lines: &[RenderLine], insert_at: usize) -> usize {
    let mut issues_seen = 0;
    for (render_idx, line) in lines.iter().enumerate() {
        if line.as_issue().is_some() {
            if issues_seen == insert_at {
                return render_idx;
            }
            issues_seen += 1;
        }
    }
    lines.len()
}

/// Render row occupied by the `issue_idx`-th issue line, for keeping the
/// selection inside the viewport.
pub fn render_row_of_issue(lines: &[RenderLine], issue_idx: usize) -> Option<usize> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.as_issue().is_some())
        .nth(issue_idx)
        .map(|(render_idx, _)| render_idx)
}

fn title_with_cursor(title: &str, cursor: CursorPlacement) -> String {
    match cursor {
        CursorPlacement::Start => format!("{CURSOR_GLYPH}{title}"),
        CursorPlacement::End | CursorPlacement::Replace => format!("{title}{CURSOR_GLYPH}"),
    }
}

fn issue_row(
    line: &IssueLine,
    selected: bool,
    targeted: bool,
    matched: bool,
    pending_title: Option<(String, CursorPlacement)>,
) -> Line<'static> {
    let mut spans = Vec::new();

    let (prefix, prefix_style) = if selected {
        (
            "▸ ",
            Style::default()
                .fg(theme::NEON_CYAN)
                .add_modifier(Modifier::BOLD),
        )
    } else if targeted {
        (
            "◎ ",
            Style::default()
                .fg(theme::NEON_MAGENTA)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        ("  ", Style::default().fg(theme::TEXT_DIM))
    };
    spans.push(Span::styled(prefix.to_string(), prefix_style));

    spans.push(Span::raw(issue_indent(line)));
    spans.push(Span::styled(
        theme::marker_symbol(line.marker).to_string(),
        theme::marker_style(line.marker),
    ));
    spans.push(Span::raw(" "));

    let mut title_style = if selected {
        Style::default().fg(theme::TEXT_BRIGHT)
    } else {
        Style::default().fg(theme::TEXT_DIM)
    };
    if matched {
        title_style = title_style
            .fg(theme::NEON_MAGENTA)
            .add_modifier(Modifier::UNDERLINED);
    }

    match pending_title {
        Some((title, cursor)) => {
            spans.push(Span::styled(
                title_with_cursor(&title, cursor),
                Style::default()
                    .fg(theme::TEXT_BRIGHT)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        None => {
            spans.push(Span::styled(line.title.clone(), title_style));
        }
    }

    let badge = theme::kind_badge(line.kind);
    if !badge.is_empty() {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(badge.to_string(), theme::kind_style(line.kind)));
    }
    if let Some(agent) = line.agent_status {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            theme::agent_badge(agent).to_string(),
            theme::agent_style(agent),
        ));
    }

    Line::from(spans)
}

fn draft_row(title: &str, indent_lane: usize) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            "▸ ".to_string(),
            Style::default()
                .fg(theme::NEON_CYAN)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" ".repeat(lane_column(indent_lane))),
        Span::styled(
            DRAFT_MARKER.to_string(),
            Style::default().fg(theme::NEON_CYAN),
        ),
        Span::raw(" "),
        Span::styled(
            format!("{title}{CURSOR_GLYPH}"),
            Style::default()
                .fg(theme::TEXT_BRIGHT)
                .add_modifier(Modifier::BOLD),
        ),
    ])
}

/// Build the full timeline, overlaying the pending edit or draft row from
/// the navigation state. `move_target` is the issue index the host is
/// hovering while picking a move target.
pub fn build_timeline(
    lines: &[RenderLine],
    nav: &NavigationState,
    move_target: Option<usize>,
) -> Vec<Line<'static>> {
    let mut draft: Option<(usize, Line<'static>)> = None;
    let mut editing: Option<(String, String, CursorPlacement)> = None;

    match nav.mode() {
        EditMode::Creating(pending) => {
            let indent_lane = pending
                .pending_parent_id
                .as_deref()
                .and_then(|id| nav.lines().iter().find(|l| l.issue_id == id))
                .map(|parent| parent.lane + 1)
                .or_else(|| {
                    pending
                        .reference_issue_id
                        .as_deref()
                        .and_then(|id| nav.lines().iter().find(|l| l.issue_id == id))
                        .map(|anchor| anchor.lane)
                })
                .unwrap_or(0);
            draft = Some((
                draft_render_position(lines, pending.insert_at),
                draft_row(&pending.title, indent_lane),
            ));
        }
        EditMode::Editing(pending) => {
            editing = Some((pending.issue_id.clone(), pending.title.clone(), pending.cursor));
        }
        _ => {}
    }

    let highlight_matches = nav.is_search_embedded() || !nav.search_term().is_empty();

    let mut out = Vec::with_capacity(lines.len() + 1);
    let mut issue_idx = 0;
    for (render_idx, line) in lines.iter().enumerate() {
        if let Some((at, row)) = &draft {
            if *at == render_idx {
                out.push(row.clone());
            }
        }
        match line {
            RenderLine::Issue(issue) => {
                let selected = nav.selected_index() == Some(issue_idx);
                let targeted = move_target == Some(issue_idx);
                let matched =
                    highlight_matches && nav.matching_indices().contains(&issue_idx);
                let pending = match &editing {
                    Some((id, title, cursor)) if *id == issue.issue_id => {
                        Some((title.clone(), *cursor))
                    }
                    _ => None,
                };
                out.push(issue_row(issue, selected, targeted, matched, pending));
                issue_idx += 1;
            }
            RenderLine::Connector(connector) => {
                out.push(Line::from(Span::styled(
                    format!("  {}", connector_gutter(connector)),
                    Style::default().fg(theme::GRAPH_DIM),
                )));
            }
            RenderLine::Separator => {
                out.push(Line::from(Span::styled(
                    "  · · ·".to_string(),
                    Style::default().fg(theme::BORDER_DIM),
                )));
            }
        }
    }
    if let Some((at, row)) = draft {
        if at >= lines.len() {
            out.push(row);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::line::{ConnectorShape, Marker};
    use crate::models::{IssueStatus, IssueType};

    fn connector(parent_lane: usize, child_lanes: &[usize], shape: ConnectorShape) -> ConnectorLine {
        ConnectorLine {
            parent_lane,
            child_lanes: child_lanes.to_vec(),
            shape,
        }
    }

    fn issue(id: &str, lane: usize) -> IssueLine {
        IssueLine {
            issue_id: id.to_string(),
            title: format!("Issue {id}"),
            lane,
            marker: Marker::Open,
            parent_lane: None,
            is_first_child: false,
            is_series_child: false,
            kind: IssueType::Task,
            status: IssueStatus::Open,
            agent_status: None,
        }
    }

    #[test]
    fn straight_connector_is_a_bare_vertical() {
        let gutter = connector_gutter(&connector(0, &[0], ConnectorShape::Straight));
        assert_eq!(gutter, "│");
    }

    #[test]
    fn elbow_connector_turns_into_the_parent_lane() {
        let gutter = connector_gutter(&connector(0, &[1], ConnectorShape::Elbow));
        assert_eq!(gutter, "╭─╯");
    }

    #[test]
    fn fan_in_merges_all_child_lanes() {
        let gutter = connector_gutter(&connector(0, &[0, 1], ConnectorShape::Elbow));
        assert_eq!(gutter, "├─╯");

        let wide = connector_gutter(&connector(0, &[0, 1, 2], ConnectorShape::Elbow));
        assert_eq!(wide, "├─╯─╯");
    }

    #[test]
    fn draft_position_counts_issue_lines_only() {
        let lines = vec![
            RenderLine::Issue(issue("a", 0)),
            RenderLine::Connector(connector(0, &[0], ConnectorShape::Straight)),
            RenderLine::Issue(issue("b", 0)),
        ];

        assert_eq!(draft_render_position(&lines, 0), 0);
        assert_eq!(draft_render_position(&lines, 1), 2);
        assert_eq!(draft_render_position(&lines, 2), 3);
    }

    #[test]
    fn render_row_lookup_skips_non_issue_lines() {
        let lines = vec![
            RenderLine::Issue(issue("a", 0)),
            RenderLine::Separator,
            RenderLine::Issue(issue("b", 0)),
        ];
        assert_eq!(render_row_of_issue(&lines, 0), Some(0));
        assert_eq!(render_row_of_issue(&lines, 1), Some(2));
        assert_eq!(render_row_of_issue(&lines, 2), None);
    }

    #[test]
    fn cursor_placement_positions_the_caret() {
        assert_eq!(
            title_with_cursor("abc", CursorPlacement::Start),
            format!("{CURSOR_GLYPH}abc")
        );
        assert_eq!(
            title_with_cursor("abc", CursorPlacement::End),
            format!("abc{CURSOR_GLYPH}")
        );
    }
}
