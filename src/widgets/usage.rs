use std::fmt;

use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};

use super::misc::colored;
use crate::slurm::{Node, StateFlags};
use crate::utilities::round_half_up;

/// Core available for new jobs
pub const AVAILABLE: char = '.';
/// Core allocated to a job but not loaded
pub const ALLOCATED: char = '_';
/// Core allocated and loaded
pub const USED: char = 'O';
/// Load exceeds allocation by more than 50%
pub const OVERUSED: char = '!';
/// Core allocated on a node that does not report its load
pub const UNKNOWN_USE: char = '?';
/// Idle core on a node that does not accept new jobs
pub const BLOCKED: char = ' ';

/// Load above this fraction of allocated cores is considered overuse
const OVERUSE_THRESHOLD: f64 = 1.5;

/// Overall status of a node
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Unknown,
    Maintenance,
    Reserved,
    Down,
    /// All cores available
    Free,
    /// Some cores available
    Mixed,
    /// No cores available for new jobs
    Full,
}

impl Status {
    /// Label shown instead of a usage bar, for nodes that cannot run jobs
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Status::Unknown => Some("UNKNOWN"),
            Status::Maintenance => Some("MAINTENANCE"),
            Status::Reserved => Some("RESERVED"),
            Status::Down => Some("DOWN"),
            Status::Free | Status::Mixed | Status::Full => None,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Status::Unknown => Color::DarkGray,
            Status::Maintenance => Color::LightMagenta,
            Status::Reserved => Color::Cyan,
            Status::Down => Color::Red,
            Status::Free => Color::Green,
            Status::Mixed => Color::Yellow,
            Status::Full => Color::Reset,
        }
    }
}

/// How the load of a node compares to its allocated cores
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Load {
    Normal,
    Overuse,
    /// Load was not reported
    Unknown,
}

impl Load {
    pub fn symbol(&self) -> char {
        match self {
            Load::Normal => USED,
            Load::Overuse => OVERUSED,
            Load::Unknown => UNKNOWN_USE,
        }
    }

    fn color(&self) -> Color {
        match self {
            Load::Normal => Color::Green,
            Load::Overuse => Color::Red,
            Load::Unknown => Color::LightMagenta,
        }
    }
}

/// Per-core usage of a node
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Usage {
    pub status: Status,
    /// Cores available for new jobs
    pub available: usize,
    /// Cores allocated to jobs, but not loaded
    pub allocated: usize,
    /// Cores allocated to jobs and loaded
    pub used: usize,
    pub load: Load,
    /// Available cores cannot be allocated since the node does not accept jobs
    pub blocked: bool,
}

impl Usage {
    /// Classifies a node and splits its cores into available, allocated, and used.
    /// If `mem_exhausted` is set, all cores are considered allocated
    pub fn new(node: &Node, mem_exhausted: bool) -> Self {
        let flags = node.state.flags;
        let cores = &node.cores;

        let status = if cores.total == 0 || flags.contains(StateFlags::UNKNOWN) {
            Some(Status::Unknown)
        } else if flags.contains(StateFlags::MAINTENANCE) {
            Some(Status::Maintenance)
        } else if flags.contains(StateFlags::RESERVED) {
            Some(Status::Reserved)
        } else if flags.contains(StateFlags::DOWN)
            || (cores.in_use == 0 && flags.contains(StateFlags::NOT_ACCEPTING))
        {
            Some(Status::Down)
        } else {
            None
        };

        if let Some(status) = status {
            return Self {
                status,
                available: 0,
                allocated: 0,
                used: 0,
                load: Load::Unknown,
                blocked: false,
            };
        }

        let in_use = if mem_exhausted {
            cores.total
        } else {
            cores.in_use.min(cores.total)
        };

        let (loaded, load) = match node.load {
            Some(load) => {
                let overuse = load > OVERUSE_THRESHOLD * in_use as f64;
                (
                    round_half_up(load).min(in_use),
                    if overuse { Load::Overuse } else { Load::Normal },
                )
            }
            // Cores in use without a reported load are shown as unknown use
            None => (in_use, Load::Unknown),
        };

        let available = cores.total.saturating_sub(in_use);
        let blocked = !node.state.is_accepting();

        Self {
            status: if available == 0 || blocked {
                Status::Full
            } else if available == cores.total {
                Status::Free
            } else {
                Status::Mixed
            },
            available,
            allocated: in_use.saturating_sub(loaded),
            used: loaded,
            load,
            blocked,
        }
    }

    /// Width of the bar or label
    pub fn width(&self) -> usize {
        match self.status.label() {
            Some(label) => label.len(),
            None => self.available + self.allocated + self.used,
        }
    }

    pub fn to_line<'a>(&self, color: bool) -> Line<'a> {
        if let Some(label) = self.status.label() {
            return Line::from(Span::styled(label, style(color, self.status.color())));
        }

        let available = if self.blocked { BLOCKED } else { AVAILABLE };
        let segments = [
            (available, self.available, Color::DarkGray),
            (ALLOCATED, self.allocated, Color::Yellow),
            (self.load.symbol(), self.used, self.load.color()),
        ];

        Line::from(
            segments
                .into_iter()
                .filter(|(_, count, _)| *count > 0)
                .map(|(symbol, count, fg)| {
                    Span::styled(symbol.to_string().repeat(count), style(color, fg))
                })
                .collect::<Vec<_>>(),
        )
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for span in self.to_line(false).spans {
            f.write_str(&span.content)?;
        }

        Ok(())
    }
}

fn style(color: bool, fg: Color) -> Style {
    colored(color, Style::default().fg(fg))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::config::Config;
    use crate::slurm::Cluster;

    use super::*;

    fn node(cores: &str, load: &str, state: &str) -> Node {
        let line = format!(
            "n1 {} 8000 {} {} normal infinite (null) 0\n",
            cores, load, state
        );

        Node::parse(Cursor::new(line)).unwrap().remove(0)
    }

    fn usage(cores: &str, load: &str, state: &str) -> Usage {
        Usage::new(&node(cores, load, state), false)
    }

    fn bar(cores: &str, load: &str, state: &str) -> String {
        usage(cores, load, state).to_string()
    }

    #[test]
    fn test_sentinels() {
        assert_eq!(bar("0/0/0/0", "0.0", "idle"), "UNKNOWN");
        assert_eq!(bar("0/4/0/4", "0.0", "bogus"), "UNKNOWN");
        assert_eq!(bar("0/4/0/4", "0.0", "maint"), "MAINTENANCE");
        assert_eq!(bar("0/4/0/4", "0.0", "reserved"), "RESERVED");
        assert_eq!(bar("0/0/4/4", "0.0", "down*"), "DOWN");
        assert_eq!(bar("0/0/4/4", "0.0", "drained"), "DOWN");
        // Idle nodes not accepting jobs are considered down
        assert_eq!(bar("0/4/0/4", "0.0", "idle*"), "DOWN");
    }

    #[test]
    fn test_sentinel_priority() {
        assert_eq!(bar("0/4/0/4", "0.0", "maint+reserved"), "MAINTENANCE");
        assert_eq!(bar("0/4/0/4", "0.0", "reserved+drain"), "RESERVED");
        assert_eq!(bar("0/4/0/4", "0.0", "maint+bogus"), "UNKNOWN");
    }

    #[test]
    fn test_bars() {
        assert_eq!(bar("0/4/0/4", "2.0", "idle"), "....");
        assert_eq!(bar("4/0/0/4", "2.0", "allocated"), "__OO");
        assert_eq!(bar("2/2/0/4", "1.49", "mixed"), ".._O");
        assert_eq!(bar("2/2/0/4", "1.5", "mixed"), "..OO");
        assert_eq!(bar("2/2/0/4", "N/A", "mixed"), "..??");
        assert_eq!(bar("2/2/0/4", "0.0", "mixed"), "..__");
    }

    #[test]
    fn test_overuse() {
        let overused = usage("6/2/0/8", "10", "mixed");
        assert_eq!(overused.load, Load::Overuse);
        assert!(overused.used > 0);
        assert_eq!(overused.to_string(), "..!!!!!!");

        let normal = usage("6/2/0/8", "8", "mixed");
        assert_eq!(normal.load, Load::Normal);
        assert_eq!(normal.to_string(), "..OOOOOO");

        let partial = usage("6/2/0/8", "4.2", "mixed");
        assert_eq!(partial.to_string(), "..__OOOO");
    }

    #[test]
    fn test_unknown_load() {
        let usage = usage("3/1/0/4", "N/A", "mixed");
        assert_eq!(usage.load, Load::Unknown);
        assert_eq!(usage.used, 3);
        assert_eq!(usage.allocated, 0);
        assert_eq!(usage.to_string(), ".???");

        // Idle nodes have nothing to report
        assert_eq!(bar("0/4/0/4", "N/A", "idle"), "....");
    }

    #[test]
    fn test_not_accepting() {
        let usage = usage("2/2/0/4", "2.0", "draining");
        assert!(usage.blocked);
        assert_eq!(usage.status, Status::Full);
        assert_eq!(usage.to_string(), "  OO");
    }

    #[test]
    fn test_memory_exhausted() {
        let node = node("1/3/0/4", "1.0", "mixed");
        let usage = Usage::new(&node, true);

        assert_eq!(usage.available, 0);
        assert_eq!(usage.status, Status::Full);
        assert_eq!(usage.to_string(), "___O");
    }

    #[test]
    fn test_status() {
        assert_eq!(usage("0/4/0/4", "0", "idle").status, Status::Free);
        assert_eq!(usage("1/3/0/4", "0", "mixed").status, Status::Mixed);
        assert_eq!(usage("4/0/0/4", "0", "allocated").status, Status::Full);
    }

    #[test]
    fn test_bar_length() {
        for (cores, load, state) in [
            ("0/8/0/8", "0.0", "idle"),
            ("3/5/0/8", "7.7", "mixed"),
            ("8/0/0/8", "N/A", "allocated"),
            ("5/3/0/8", "100", "mixed*"),
            // Inconsistent input
            ("12/0/0/8", "3", "mixed"),
        ] {
            let usage = usage(cores, load, state);
            assert_eq!(usage.to_string().chars().count(), 8, "{cores} {load} {state}");
            assert_eq!(usage.width(), 8);
        }
    }

    #[test]
    fn test_colors() {
        let line = usage("2/2/0/4", "1.0", "mixed").to_line(true);
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[0].style.fg, Some(Color::DarkGray));
        assert_eq!(line.spans[2].style.fg, Some(Color::Green));

        let line = usage("2/2/0/4", "1.0", "mixed").to_line(false);
        assert!(line.spans.iter().all(|span| span.style == Style::default()));
    }

    #[test]
    fn test_fully_allocated_node() {
        let cluster = Cluster::parse(
            Cursor::new("n1 4/0/0/4 8000 2.0 idle normal* UNLIMITED (null) 0\n"),
            Cursor::new(""),
            &Default::default(),
            &Config::from_env(&Default::default(), |_| None).unwrap(),
        )
        .unwrap();

        let node = cluster.nodes.values().next().unwrap();
        assert_eq!(node.mem_available(), 0);

        let usage = Usage::new(node, node.mem_available() == 0);
        assert_eq!(usage.used, 2);
        assert_eq!(usage.allocated, 2);
        assert_eq!(usage.to_string(), "__OO");
    }
}
