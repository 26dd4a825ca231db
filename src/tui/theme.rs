use ratatui::style::{Color, Modifier, Style};

use crate::graph::line::Marker;
use crate::models::{AgentStatus, IssueType};

// ── Color palette ──────────────────────────────────────────────────

pub const BG: Color = Color::Rgb(0x0a, 0x0a, 0x0f);
pub const NEON_CYAN: Color = Color::Rgb(0x00, 0xff, 0xf5);
pub const NEON_MAGENTA: Color = Color::Rgb(0xff, 0x00, 0xff);
pub const NEON_GREEN: Color = Color::Rgb(0x39, 0xff, 0x14);
pub const NEON_ORANGE: Color = Color::Rgb(0xff, 0x6e, 0x27);
pub const TEXT_DIM: Color = Color::Rgb(0xb0, 0xb0, 0xb0);
pub const TEXT_BRIGHT: Color = Color::Rgb(0xff, 0xff, 0xff);
pub const BORDER_DIM: Color = Color::Rgb(0x00, 0x5f, 0x5f);
pub const BORDER_BRIGHT: Color = Color::Rgb(0x00, 0xff, 0xf5);
pub const GRAPH_DIM: Color = Color::Rgb(0x44, 0x66, 0x66);

pub const HEADER_ART: &str = "◤ WAYPOINT ◢";

// ── Style presets ──────────────────────────────────────────────────

pub fn panel_border(focused: bool) -> Style {
    if focused {
        Style::default()
            .fg(BORDER_BRIGHT)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(BORDER_DIM)
    }
}

pub fn marker_symbol(marker: Marker) -> &'static str {
    match marker {
        Marker::Actionable => "◆",
        Marker::Open => "○",
        Marker::Complete => "●",
        Marker::Closed => "✕",
    }
}

pub fn marker_style(marker: Marker) -> Style {
    match marker {
        Marker::Actionable => Style::default().fg(NEON_CYAN).add_modifier(Modifier::BOLD),
        Marker::Open => Style::default().fg(TEXT_DIM),
        Marker::Complete => Style::default().fg(NEON_GREEN),
        Marker::Closed => Style::default().fg(TEXT_DIM),
    }
}

pub fn kind_badge(kind: IssueType) -> &'static str {
    match kind {
        IssueType::Task => "",
        IssueType::Bug => "[bug]",
        IssueType::Feature => "[feat]",
        IssueType::Chore => "[chore]",
    }
}

pub fn kind_style(kind: IssueType) -> Style {
    match kind {
        IssueType::Task => Style::default().fg(TEXT_DIM),
        IssueType::Bug => Style::default().fg(NEON_ORANGE),
        IssueType::Feature => Style::default().fg(NEON_MAGENTA),
        IssueType::Chore => Style::default().fg(TEXT_DIM),
    }
}

pub fn agent_badge(status: AgentStatus) -> &'static str {
    match status {
        AgentStatus::Running => "⟳ agent",
        AgentStatus::Waiting => "⏸ agent",
        AgentStatus::Failed => "⚠ agent",
    }
}

pub fn agent_style(status: AgentStatus) -> Style {
    match status {
        AgentStatus::Running => Style::default().fg(NEON_CYAN),
        AgentStatus::Waiting => Style::default().fg(NEON_ORANGE),
        AgentStatus::Failed => Style::default().fg(NEON_ORANGE).add_modifier(Modifier::BOLD),
    }
}
