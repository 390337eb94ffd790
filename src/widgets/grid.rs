use ratatui::{
    style::{Modifier, Style},
    symbols::line,
    text::{Line, Span},
};

use crate::config::Config;
use crate::filter::Filter;
use crate::slurm::{gib, Cluster, Partition};
use crate::utilities::rows;

use super::misc::{bold, center, colored, dim, left_align, right_align};
use super::usage::Usage;

/// Columns used by borders and padding around each cell
pub const CELL_DECORATION: usize = 3;

/// Walltimes that are not shown in headers
const UNLIMITED: [&str; 3] = ["infinite", "unlimited", "n/a"];

/// A single node in the grid
#[derive(Clone, Debug)]
pub struct Cell<'a> {
    pub line: Line<'a>,
    pub highlight: bool,
}

/// Number of columns of cells `cell_width` wide that fit in `width`, clamped to [1, cells].
/// Rows are `columns * (cell_width + CELL_DECORATION) + 1` wide, counting the closing border
pub fn columns(width: usize, cell_width: usize, cells: usize) -> usize {
    (width.saturating_sub(1) / (cell_width + CELL_DECORATION)).clamp(1, cells.max(1))
}

/// Pads `cells` with `filler` so that every column has the same number of rows
pub fn pad<T: Clone>(mut cells: Vec<T>, columns: usize, filler: T) -> Vec<T> {
    let columns = columns.max(1);
    cells.resize(rows(cells.len(), columns) * columns, filler);
    cells
}

/// Splits padded `cells` into rows, such that cells are listed top to bottom
/// before moving on to the next column
pub fn column_major<T>(cells: &[T], columns: usize) -> Vec<Vec<&T>> {
    let rows = rows(cells.len(), columns);

    (0..rows)
        .map(|row| cells.iter().skip(row).step_by(rows).collect())
        .collect()
}

/// Renders a partition as a header followed by a framed grid of nodes
pub struct PartitionGrid<'a> {
    partition: &'a Partition<'a>,
    cluster: &'a Cluster,
    filter: &'a Filter,
    config: &'a Config,
}

impl<'a> PartitionGrid<'a> {
    pub fn new(
        partition: &'a Partition<'a>,
        cluster: &'a Cluster,
        filter: &'a Filter,
        config: &'a Config,
    ) -> Self {
        Self {
            partition,
            cluster,
            filter,
            config,
        }
    }

    pub fn render(&self) -> Vec<Line<'static>> {
        let cells = self.cells();
        let cell_width = cells.iter().map(|cell| cell.line.width()).max().unwrap_or(0);
        let columns = columns(self.config.width as usize, cell_width, cells.len());

        log::debug!(
            "partition {}: {} nodes in {} columns of width {}",
            self.partition.group.partition,
            cells.len(),
            columns,
            cell_width
        );

        let cells = pad(
            cells.into_iter().map(Some).collect(),
            columns,
            None::<Cell>,
        );

        let mut lines = vec![self.header(), self.border(cell_width, columns, true)];
        for row in column_major(&cells, columns) {
            lines.push(self.row(&row, cell_width));
        }
        lines.push(self.border(cell_width, columns, false));

        lines
    }

    /// Formats each node as `<name> <available GiB> <usage>`
    fn cells(&self) -> Vec<Cell<'static>> {
        let color = self.config.color;
        let nodes = &self.partition.nodes;

        let usage: Vec<_> = nodes
            .iter()
            .map(|node| Usage::new(node, node.mem_available() == 0))
            .collect();
        let mem: Vec<_> = nodes
            .iter()
            .map(|node| format!("{:.1}", gib(node.mem_available())))
            .collect();

        let name_width = nodes.iter().map(|n| n.name.len()).max().unwrap_or(0);
        let mem_width = mem.iter().map(String::len).max().unwrap_or(0);
        let usage_width = usage
            .iter()
            .map(Usage::width)
            .max()
            .unwrap_or(0)
            .max(self.partition.group.cores);

        nodes
            .iter()
            .zip(usage)
            .zip(mem)
            .map(|((node, usage), mem)| {
                let highlight = self
                    .filter
                    .highlights(&node.name, self.cluster.jobs(&node.name));

                let name_style = if highlight {
                    Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
                } else {
                    Style::default().fg(usage.status.color())
                };

                let mut spans = vec![
                    Span::styled(
                        left_align(&node.name, name_width),
                        colored(color, name_style),
                    ),
                    Span::raw(" "),
                    Span::raw(right_align(&mem, mem_width)),
                    Span::raw(" "),
                ];
                spans.extend(center(usage.to_line(color), usage_width).spans);

                Cell {
                    line: Line::from(spans),
                    highlight,
                }
            })
            .collect()
    }

    fn header(&self) -> Line<'static> {
        let color = self.config.color;
        let partition = self.partition;
        let group = &partition.group;

        let mut name = group.partition.clone();
        if partition.default {
            name.push('*');
        }

        let mut spans = vec![Span::styled(
            name,
            if partition.default {
                bold(color)
            } else {
                Style::default()
            },
        )];

        if !self.config.short_header {
            let mut text = format!(
                ": {} node{} with {} cores, {:.1} GiB",
                partition.nodes.len(),
                if partition.nodes.len() == 1 { "" } else { "s" },
                group.cores,
                gib(group.mem)
            );

            if group.gpus > 0 {
                text.push_str(&format!(", {} GPUs", group.gpus));
            }

            if !UNLIMITED.contains(&partition.walltime.to_ascii_lowercase().as_str()) {
                text.push_str(&format!("; max walltime {}", partition.walltime));
            }

            spans.push(Span::raw(text));
        }

        Line::from(spans)
    }

    fn border(&self, cell_width: usize, columns: usize, top: bool) -> Line<'static> {
        let set = line::NORMAL;
        let (left, middle, right) = if top {
            (set.top_left, set.horizontal_down, set.top_right)
        } else {
            (set.bottom_left, set.horizontal_up, set.bottom_right)
        };

        let segment = set.horizontal.repeat(cell_width + CELL_DECORATION - 1);
        let text = format!(
            "{}{}{}",
            left,
            vec![segment; columns].join(middle),
            right
        );

        Line::from(Span::styled(text, dim(self.config.color)))
    }

    fn row(&self, cells: &[&Option<Cell<'static>>], cell_width: usize) -> Line<'static> {
        let color = self.config.color;
        let vertical = line::NORMAL.vertical;

        let mut spans = Vec::new();
        for cell in cells {
            spans.push(Span::styled(vertical, dim(color)));

            match cell {
                Some(cell) => {
                    // Without colors highlighted nodes are marked with a '>'
                    let marker = if cell.highlight && !color { ">" } else { " " };
                    spans.push(Span::raw(marker));
                    spans.extend(cell.line.spans.iter().cloned());

                    let padding = cell_width.saturating_sub(cell.line.width()) + 1;
                    spans.push(Span::raw(" ".repeat(padding)));
                }
                None => spans.push(Span::raw(" ".repeat(cell_width + 2))),
            }
        }
        spans.push(Span::styled(vertical, dim(color)));

        Line::from(spans)
    }
}
