use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// Returns `style` if colors are enabled, otherwise the default style
pub fn colored(color: bool, style: Style) -> Style {
    if color {
        style
    } else {
        Style::default()
    }
}

/// Style of borders and other decorations
pub fn dim(color: bool) -> Style {
    colored(color, Style::default().fg(Color::DarkGray))
}

/// Style of partition names and other titles
pub fn bold(color: bool) -> Style {
    colored(color, Style::default().add_modifier(Modifier::BOLD))
}

/// Pads `line` with spaces on both sides so that it is centered in `width` columns
pub fn center<'a>(mut line: Line<'a>, width: usize) -> Line<'a> {
    let remainder = width.saturating_sub(line.width());
    let left = remainder / 2;
    let right = remainder - left;

    if left > 0 {
        line.spans.insert(0, Span::raw(" ".repeat(left)));
    }

    if right > 0 {
        line.spans.push(Span::raw(" ".repeat(right)));
    }

    line
}

/// Right aligns text in `width` columns
pub fn right_align(text: &str, width: usize) -> String {
    format!("{:>width$}", text, width = width)
}

/// Left aligns text in `width` columns
pub fn left_align(text: &str, width: usize) -> String {
    format!("{:<width$}", text, width = width)
}

/// Text of a line without styles
pub fn plain_text(line: &Line) -> String {
    line.spans.iter().map(|span| span.content.as_ref()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center() {
        let line = center(Line::from("ab"), 6);
        assert_eq!(plain_text(&line), "  ab  ");

        let line = center(Line::from("ab"), 5);
        assert_eq!(plain_text(&line), " ab  ");

        let line = center(Line::from("abcdef"), 3);
        assert_eq!(plain_text(&line), "abcdef");
    }

    #[test]
    fn test_align() {
        assert_eq!(right_align("1.5", 5), "  1.5");
        assert_eq!(left_align("n1", 4), "n1  ");
        assert_eq!(left_align("node01", 4), "node01");
    }

    #[test]
    fn test_styles() {
        assert_eq!(dim(false), Style::default());
        assert_eq!(bold(true).add_modifier, Modifier::BOLD);
    }
}
