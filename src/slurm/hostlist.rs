//! Expansion of Slurm's compressed hostlist notation, e.g. `node[01-03,07],login1`
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostlistError {
    /// Opening bracket without a matching closing bracket (or vice versa)
    Unbalanced(String),
    /// Range bounds that are not numbers, or a descending range
    InvalidRange(String),
    /// More than one bracket group in a single host name, e.g. `a[1-2]b[1-2]`
    Unsupported(String),
}

impl fmt::Display for HostlistError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HostlistError::Unbalanced(v) => write!(f, "unbalanced brackets in hostlist {:?}", v),
            HostlistError::InvalidRange(v) => write!(f, "invalid range in hostlist {:?}", v),
            HostlistError::Unsupported(v) => {
                write!(f, "multiple bracket groups are not supported: {:?}", v)
            }
        }
    }
}

impl std::error::Error for HostlistError {}

/// A numeric range `lo-hi`; single numbers are stored with `lo == hi`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Range {
    lo: u64,
    hi: u64,
    /// Zero-padded width, taken from the lower bound
    width: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Group<'a> {
    prefix: &'a str,
    /// Empty for a plain host name without brackets
    ranges: Vec<Range>,
}

impl Group<'_> {
    fn len(&self) -> usize {
        if self.ranges.is_empty() {
            1
        } else {
            self.ranges
                .iter()
                .map(|r| {
                    usize::try_from(r.hi - r.lo).map_or(usize::MAX, |n| n.saturating_add(1))
                })
                .fold(0, usize::saturating_add)
        }
    }
}

/// A validated hostlist. Expansion is lazy and may be repeated via [`Hostlist::iter`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hostlist<'a> {
    groups: Vec<Group<'a>>,
}

impl<'a> Hostlist<'a> {
    pub fn parse(value: &'a str) -> Result<Self, HostlistError> {
        let mut groups = Vec::new();
        for item in split_top_level(value)? {
            if !item.is_empty() {
                groups.push(parse_group(item)?);
            }
        }

        Ok(Self { groups })
    }

    pub fn iter(&self) -> Hosts<'_, 'a> {
        Hosts {
            groups: &self.groups,
            group: 0,
            range: 0,
            next: None,
        }
    }

    /// Number of host names produced by the expansion
    pub fn len(&self) -> usize {
        self.groups
            .iter()
            .map(Group::len)
            .fold(0, usize::saturating_add)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl<'h, 'a> IntoIterator for &'h Hostlist<'a> {
    type Item = String;
    type IntoIter = Hosts<'h, 'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the host names of a [`Hostlist`]
#[derive(Clone, Debug)]
pub struct Hosts<'h, 'a> {
    groups: &'h [Group<'a>],
    /// Index of the current group
    group: usize,
    /// Index of the current range within the group
    range: usize,
    /// Next value in the current range, if the range has been started
    next: Option<u64>,
}

impl Iterator for Hosts<'_, '_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let group = self.groups.get(self.group)?;
            if group.ranges.is_empty() {
                self.group += 1;
                return Some(group.prefix.to_string());
            }

            let Some(range) = group.ranges.get(self.range) else {
                self.group += 1;
                self.range = 0;
                continue;
            };

            let value = self.next.unwrap_or(range.lo);
            if value < range.hi {
                self.next = Some(value + 1);
            } else {
                self.next = None;
                self.range += 1;
            }

            return Some(format!(
                "{}{:0width$}",
                group.prefix,
                value,
                width = range.width
            ));
        }
    }
}

/// Expands a hostlist into a vector of host names
pub fn expand(value: &str) -> Result<Vec<String>, HostlistError> {
    Ok(Hostlist::parse(value)?.iter().collect())
}

/// Splits on commas that are not enclosed in brackets
fn split_top_level(value: &str) -> Result<Vec<&str>, HostlistError> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (idx, c) in value.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| HostlistError::Unbalanced(value.to_string()))?
            }
            ',' if depth == 0 => {
                items.push(value[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(HostlistError::Unbalanced(value.to_string()));
    }

    items.push(value[start..].trim());
    Ok(items)
}

fn parse_group(item: &str) -> Result<Group<'_>, HostlistError> {
    let Some((prefix, rest)) = item.split_once('[') else {
        if item.contains(']') {
            return Err(HostlistError::Unbalanced(item.to_string()));
        }

        return Ok(Group {
            prefix: item,
            ranges: Vec::new(),
        });
    };

    let (body, suffix) = rest
        .split_once(']')
        .ok_or_else(|| HostlistError::Unbalanced(item.to_string()))?;

    if !suffix.is_empty() || body.contains('[') {
        return Err(HostlistError::Unsupported(item.to_string()));
    }

    let mut ranges = Vec::new();
    for range in body.split(',') {
        ranges.push(parse_range(range.trim()).ok_or_else(|| {
            HostlistError::InvalidRange(item.to_string())
        })?);
    }

    Ok(Group { prefix, ranges })
}

fn parse_range(value: &str) -> Option<Range> {
    let (lo, hi) = value.split_once('-').unwrap_or((value, value));
    let digits = |v: &str| !v.is_empty() && v.bytes().all(|c| c.is_ascii_digit());
    if !digits(lo) || !digits(hi) {
        return None;
    }

    let range = Range {
        lo: lo.parse().ok()?,
        hi: hi.parse().ok()?,
        width: lo.len(),
    };

    (range.lo <= range.hi).then_some(range)
}
