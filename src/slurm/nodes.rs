use std::fmt;
use std::str::Split;

use color_eyre::eyre::{bail, Context};
use color_eyre::Result;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

use super::misc::{format_string, megabytes};
use super::state::NodeState;

/// Number of fields per line of `sinfo` output
pub const NODE_FIELDS: usize = 9;

/// Summarizes the state of cores on a node
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoreState {
    /// Cores allocated to jobs
    pub in_use: usize,
    pub idle: usize,
    /// Cores unavailable for other reasons (down, drained)
    pub unavailable: usize,
    pub total: usize,
}

impl<'de> Deserialize<'de> for CoreState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(CoreStateVisitor)
    }
}

struct CoreStateVisitor;

impl Visitor<'_> for CoreStateVisitor {
    type Value = CoreState;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string representing core states in the form '0/1/2/3'")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        fn parse_next<E>(s: &mut Split<char>) -> Result<usize, E>
        where
            E: de::Error,
        {
            let value = s
                .next()
                .ok_or_else(|| E::custom("number of cores not found"))?;

            value
                .parse::<usize>()
                .map_err(|_| E::custom(format!("{:?} is not a valid number of cores", value)))
        }

        let mut values: Split<char> = v.split('/');
        let state = CoreState {
            in_use: parse_next(&mut values)?,
            idle: parse_next(&mut values)?,
            unavailable: parse_next(&mut values)?,
            total: parse_next(&mut values)?,
        };

        if values.next().is_some() {
            return Err(E::custom(format!("too many values in core states {:?}", v)));
        }

        Ok(state)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionName {
    /// Name of the partition
    pub label: String,
    /// Indicates that `sinfo` marked this as the default partition
    pub default: bool,
}

impl PartitionName {
    /// Trims the trailing '*' indicating that a partition is the default partition
    pub fn from_str<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: &str = Deserialize::deserialize(deserializer)?;
        if value.trim_end_matches('*').is_empty() {
            return Err(de::Error::custom("empty partition name"));
        }

        Ok(Self {
            label: value.trim_end_matches('*').to_string(),
            default: value.ends_with('*'),
        })
    }
}

impl fmt::Display for PartitionName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.label, f)
    }
}

/// A node as listed in a single partition; nodes in several partitions
/// result in one `Node` per partition
#[derive(Clone, Debug, Deserialize)]
pub struct Node {
    pub name: String,
    pub cores: CoreState,
    /// Total memory in bytes
    #[serde(deserialize_with = "parse_mem")]
    pub mem: u64,
    /// CPU load; `None` if not reported or not a number
    #[serde(deserialize_with = "parse_load")]
    pub load: Option<f64>,
    #[serde(deserialize_with = "NodeState::from_str")]
    pub state: NodeState,
    #[serde(deserialize_with = "PartitionName::from_str")]
    pub partition: PartitionName,
    /// Maximum walltime of the partition, e.g. `infinite` or `7-00:00:00`
    pub walltime: String,
    /// Number of GPUs listed in GRES
    #[serde(deserialize_with = "parse_gres")]
    pub gpus: usize,
    /// Memory allocated to jobs in bytes
    #[serde(deserialize_with = "parse_mem")]
    pub mem_alloc: u64,
}

impl Node {
    /// Memory not allocated to jobs, in bytes. Fully allocated nodes report no
    /// available memory regardless of memory accounting
    pub fn mem_available(&self) -> u64 {
        if self.cores.in_use == self.cores.total {
            0
        } else {
            self.mem.saturating_sub(self.mem_alloc)
        }
    }

    /// Parses `sinfo` output; any malformed line is an error
    pub fn parse<R>(reader: R) -> Result<Vec<Node>>
    where
        R: std::io::Read,
    {
        let mut nodes = Vec::new();
        for (idx, record) in super::misc::reader(reader).records().enumerate() {
            let record = record.wrap_err("error while reading sinfo output")?;
            if record.len() != NODE_FIELDS {
                bail!(
                    "expected {} fields in line {} of sinfo output, found {}: {:?}",
                    NODE_FIELDS,
                    idx + 1,
                    record.len(),
                    record.iter().collect::<Vec<_>>().join(" ")
                );
            }

            let node: Node = record
                .deserialize(None)
                .wrap_err_with(|| format!("error while parsing line {} of sinfo output", idx + 1))?;

            nodes.push(node);
        }

        Ok(nodes)
    }
}

/// Generates parameter for the `--Format` command-line option for `sinfo`
pub fn sinfo_format() -> String {
    format_string(
        [
            "NodeList",
            "CPUsState",
            "Memory",
            "CPUsLoad",
            "StateLong",
            "Partition",
            "Time",
            "Gres",
            "AllocMem",
        ]
        .iter(),
    )
}

fn parse_mem<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value: &str = Deserialize::deserialize(deserializer)?;
    megabytes(value).map_err(|_| de::Error::custom(format!("invalid memory: {:?}", value)))
}

/// Load is reported as `N/A` for unresponsive nodes; any non-number is treated as unknown
fn parse_load<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: &str = Deserialize::deserialize(deserializer)?;

    Ok(value.parse::<f64>().ok().filter(|v| v.is_finite()))
}

fn parse_gres<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value: &str = Deserialize::deserialize(deserializer)?;
    parse_gpus(value).map_err(|err| de::Error::custom(format!("{:#}", err)))
}

/// Sums the GPU counts in a GRES string such as `gpu:a100:4(S:0-1),gpu:2`
fn parse_gpus(gres: &str) -> Result<usize> {
    let mut gpus = 0;
    for value in gres.split(',') {
        if let Some(value) = value.strip_prefix("gpu:") {
            // Strip socket affinity, e.g. `(S:0-1)`
            let (value, _) = value.split_once('(').unwrap_or((value, ""));
            let count = value.rsplit(':').next().unwrap_or(value);

            gpus += count
                .parse::<usize>()
                .wrap_err_with(|| format!("parsing GRES: {:?}", gres))?;
        }
    }

    Ok(gpus)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::slurm::StateFlags;

    use super::*;

    const GIB: u64 = 1024 * 1024 * 1024;

    #[test]
    fn test_parse_node() {
        let nodes = Node::parse(Cursor::new(
            "n1 4/0/0/4 8000 2.0 idle normal* UNLIMITED (null) 0\n",
        ))
        .unwrap();

        assert_eq!(nodes.len(), 1);
        let node = &nodes[0];
        assert_eq!(node.name, "n1");
        assert_eq!(
            node.cores,
            CoreState {
                in_use: 4,
                idle: 0,
                unavailable: 0,
                total: 4
            }
        );
        assert_eq!(node.mem, 8000 * 1024 * 1024);
        assert_eq!(node.load, Some(2.0));
        assert_eq!(node.state.flags, StateFlags::empty());
        assert_eq!(node.partition.label, "normal");
        assert!(node.partition.default);
        assert_eq!(node.walltime, "UNLIMITED");
        assert_eq!(node.gpus, 0);
        assert_eq!(node.mem_alloc, 0);
    }

    #[test]
    fn test_parse_multiple_lines() {
        let nodes = Node::parse(Cursor::new(
            "gpu1 8/24/0/32 257000 N/A mixed gpu 2-00:00:00 gpu:a100:4(S:0-1) 65536\n\
             gpu2 0/0/32/32 257000 0.01 drained* gpu 2-00:00:00 gpu:a100:4(S:0-1) 0\n",
        ))
        .unwrap();

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].load, None);
        assert_eq!(nodes[0].gpus, 4);
        assert_eq!(nodes[0].mem_alloc, 64 * GIB);
        assert!(!nodes[0].partition.default);
        assert!(nodes[1].state.flags.contains(StateFlags::DOWN));
        assert!(!nodes[1].state.is_accepting());
    }

    #[test]
    fn test_malformed_lines() {
        // Too few fields
        assert!(Node::parse(Cursor::new("n1 4/0/0/4 8000 2.0 idle normal UNLIMITED 0\n")).is_err());
        // Invalid core states
        assert!(
            Node::parse(Cursor::new("n1 4/0/4 8000 2.0 idle normal UNLIMITED (null) 0\n")).is_err()
        );
        // Invalid memory
        assert!(
            Node::parse(Cursor::new("n1 4/0/0/4 8G 2.0 idle normal UNLIMITED (null) 0\n")).is_err()
        );
    }

    #[test]
    fn test_unknown_load_is_not_an_error() {
        let nodes = Node::parse(Cursor::new(
            "n1 4/0/0/4 8000 bogus idle normal UNLIMITED (null) 0\n",
        ))
        .unwrap();

        assert_eq!(nodes[0].load, None);
    }

    #[test]
    fn test_mem_available() {
        let mut node = Node::parse(Cursor::new(
            "n1 2/2/0/4 8192 2.0 mixed normal UNLIMITED (null) 2048\n",
        ))
        .unwrap()
        .remove(0);

        assert_eq!(node.mem_available(), 6 * GIB);

        node.mem_alloc = 16 * GIB;
        assert_eq!(node.mem_available(), 0);

        node.mem_alloc = 0;
        node.cores.in_use = 4;
        assert_eq!(node.mem_available(), 0);
    }

    #[test]
    fn test_parse_gpus() {
        assert_eq!(parse_gpus("(null)").unwrap(), 0);
        assert_eq!(parse_gpus("gpu:2").unwrap(), 2);
        assert_eq!(parse_gpus("gpu:a100:4(S:0-1)").unwrap(), 4);
        assert_eq!(parse_gpus("gpu:a100:2,gpu:v100:1,tmpdisk:100").unwrap(), 3);
        assert!(parse_gpus("gpu:a100").is_err());
    }
}
