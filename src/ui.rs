use std::io::{self, IsTerminal, Write};

use crossterm::style::{Attribute, Color as CColor, ContentStyle, StyledContent};
use ratatui::{
    style::{Color, Modifier, Style},
    text::Line,
};

use crate::config::Config;
use crate::filter::Filter;
use crate::slurm::Cluster;
use crate::widgets::{legend, PartitionGrid};

/// Width used when the width of the terminal cannot be determined
pub const DEFAULT_WIDTH: u16 = 80;

/// Report of all selected partitions
#[derive(Debug)]
pub struct UI<'a> {
    cluster: &'a Cluster,
    filter: &'a Filter,
    config: &'a Config,
}

impl<'a> UI<'a> {
    pub fn new(cluster: &'a Cluster, filter: &'a Filter, config: &'a Config) -> Self {
        Self {
            cluster,
            filter,
            config,
        }
    }

    /// Renders the legend followed by one section per partition group
    pub fn render(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        if self.config.legend {
            lines.push(legend(self.config.color));
        }

        let partitions = self.cluster.partitions(self.filter);
        if partitions.is_empty() {
            log::warn!("no nodes found in the selected partitions");
        }

        for partition in &partitions {
            if !lines.is_empty() {
                lines.push(Line::default());
            }

            lines.extend(PartitionGrid::new(partition, self.cluster, self.filter, self.config).render());
        }

        lines
    }

    /// Writes the report to `out`
    pub fn draw<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write_lines(out, &self.render(), self.config.color)
    }
}

/// Writes lines, translating styles to ANSI escape codes if `color` is set
pub fn write_lines<W: Write>(out: &mut W, lines: &[Line], color: bool) -> io::Result<()> {
    for line in lines {
        for span in &line.spans {
            if color && span.style != Style::default() {
                write!(
                    out,
                    "{}",
                    StyledContent::new(content_style(span.style), span.content.as_ref())
                )?;
            } else {
                out.write_all(span.content.as_bytes())?;
            }
        }

        writeln!(out)?;
    }

    out.flush()
}

/// Returns the width of the terminal attached to stdout, or [`DEFAULT_WIDTH`]
pub fn terminal_width() -> u16 {
    match crossterm::terminal::size() {
        Ok((width, _)) if width > 0 => width,
        Ok(_) | Err(_) => {
            log::debug!("could not determine terminal width; using {}", DEFAULT_WIDTH);
            DEFAULT_WIDTH
        }
    }
}

/// Returns true if stdout is a terminal and colors have not been disabled via `NO_COLOR`
pub fn color_capable() -> bool {
    io::stdout().is_terminal() && std::env::var_os("NO_COLOR").map_or(true, |v| v.is_empty())
}

fn content_style(style: Style) -> ContentStyle {
    let mut result = ContentStyle::new();
    result.foreground_color = style.fg.map(crossterm_color);
    result.background_color = style.bg.map(crossterm_color);

    for (modifier, attribute) in [
        (Modifier::BOLD, Attribute::Bold),
        (Modifier::DIM, Attribute::Dim),
        (Modifier::REVERSED, Attribute::Reverse),
        (Modifier::UNDERLINED, Attribute::Underlined),
    ] {
        if style.add_modifier.contains(modifier) {
            result.attributes.set(attribute);
        }
    }

    result
}

fn crossterm_color(color: Color) -> CColor {
    match color {
        Color::Reset => CColor::Reset,
        Color::Black => CColor::Black,
        Color::Red => CColor::DarkRed,
        Color::Green => CColor::DarkGreen,
        Color::Yellow => CColor::DarkYellow,
        Color::Blue => CColor::DarkBlue,
        Color::Magenta => CColor::DarkMagenta,
        Color::Cyan => CColor::DarkCyan,
        Color::Gray => CColor::Grey,
        Color::DarkGray => CColor::DarkGrey,
        Color::LightRed => CColor::Red,
        Color::LightGreen => CColor::Green,
        Color::LightYellow => CColor::Yellow,
        Color::LightBlue => CColor::Blue,
        Color::LightMagenta => CColor::Magenta,
        Color::LightCyan => CColor::Cyan,
        Color::White => CColor::White,
        Color::Rgb(r, g, b) => CColor::Rgb { r, g, b },
        Color::Indexed(i) => CColor::AnsiValue(i),
    }
}
