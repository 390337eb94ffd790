use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};

use super::misc::{bold, colored};
use super::usage::{ALLOCATED, AVAILABLE, BLOCKED, OVERUSED, UNKNOWN_USE, USED};

/// Explains the symbols used in usage bars
pub fn legend(color: bool) -> Line<'static> {
    let entries = [
        (AVAILABLE, "free", Color::DarkGray),
        (ALLOCATED, "allocated", Color::Yellow),
        (USED, "in use", Color::Green),
        (OVERUSED, "overloaded", Color::Red),
        (UNKNOWN_USE, "load unknown", Color::LightMagenta),
        (BLOCKED, "not accepting jobs", Color::Reset),
    ];

    let mut spans = vec![Span::styled("Cores:", bold(color))];
    for (symbol, label, fg) in entries {
        spans.push(Span::raw(" ["));
        spans.push(Span::styled(
            symbol.to_string(),
            colored(color, Style::default().fg(fg)),
        ));
        spans.push(Span::raw(format!("] {}", label)));
    }

    Line::from(spans)
}
