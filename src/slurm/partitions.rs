use super::nodes::Node;

/// Nodes within a partition sharing the same hardware
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionGroup {
    pub partition: String,
    pub cores: usize,
    /// Memory per node in bytes
    pub mem: u64,
    pub gpus: usize,
}

impl PartitionGroup {
    pub fn of(node: &Node) -> Self {
        Self {
            partition: node.partition.label.clone(),
            cores: node.cores.total,
            mem: node.mem,
            gpus: node.gpus,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Partition<'a> {
    pub group: PartitionGroup,
    /// Is this the default partition?
    pub default: bool,
    /// Maximum walltime of jobs in this partition
    pub walltime: &'a str,
    /// Nodes sorted by name
    pub nodes: Vec<&'a Node>,
}
