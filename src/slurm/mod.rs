mod hostlist;
mod jobs;
mod misc;
mod nodes;
mod partitions;
mod state;

use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;

pub use hostlist::{expand, Hostlist, HostlistError, Hosts};
pub use jobs::{Job, JobAggregate, JobMap, JobState};
pub use misc::{gib, parse_memory};
pub use nodes::{CoreState, Node, PartitionName};
pub use partitions::{Partition, PartitionGroup};
pub use state::{parse_state, NodeState, StateFlags};

use color_eyre::Result;

use crate::config::Config;
use crate::filter::Filter;
use crate::groups::UserGroups;

/// Nodes keyed by node name and partition name
type NodeMap = BTreeMap<(String, String), Node>;

/// Snapshot of the nodes and running jobs of a cluster
#[derive(Debug, Default)]
pub struct Cluster {
    pub nodes: NodeMap,
    pub jobs: JobMap,
    /// Name of the default partition, if any
    pub default_partition: Option<String>,
}

pub struct Slurm {}

impl Slurm {
    /// Queries `sinfo` and `squeue`, resolves the groups of users with running jobs,
    /// and combines the results
    pub fn collect(sinfo: &str, squeue: &str, config: &Config) -> Result<Cluster> {
        let nodes = misc::run(
            sinfo,
            &["--noheader", "--Node", "--Format", &nodes::sinfo_format()],
        )?;
        let jobs = misc::run(
            squeue,
            &[
                "--noheader",
                "--states=R",
                "--Format",
                &jobs::squeue_format(),
            ],
        )?;

        let nodes = Node::parse(Cursor::new(nodes))?;
        let jobs = Job::parse(Cursor::new(jobs))?;
        let groups = UserGroups::resolve(
            jobs.iter()
                .filter(|job| job.state == JobState::Running)
                .map(|job| job.user.as_str()),
        );

        Cluster::new(nodes, &jobs, &groups, config)
    }
}

impl Cluster {
    /// Parses `sinfo` and `squeue` output
    pub fn parse<N, J>(nodes: N, jobs: J, groups: &UserGroups, config: &Config) -> Result<Cluster>
    where
        N: std::io::Read,
        J: std::io::Read,
    {
        Self::new(Node::parse(nodes)?, &Job::parse(jobs)?, groups, config)
    }

    /// Combines parsed nodes and jobs
    pub fn new(
        nodes: Vec<Node>,
        jobs: &[Job],
        groups: &UserGroups,
        config: &Config,
    ) -> Result<Cluster> {
        let mut cluster = Cluster::default();
        for node in nodes {
            // The last partition marked as default wins
            if node.partition.default {
                cluster.default_partition = Some(node.partition.label.clone());
            }

            cluster
                .nodes
                .insert((node.name.clone(), node.partition.label.clone()), node);
        }

        if let Some(partition) = &config.default_partition {
            cluster.default_partition = Some(partition.clone());
        }

        cluster.jobs = JobMap::new(cluster.nodes.keys().map(|(name, _)| name.as_str()));
        for job in jobs {
            cluster.jobs.insert(job, groups)?;
        }

        log::debug!(
            "collected {} nodes in {} partitions with {} running jobs requesting {:.1} GiB",
            cluster.nodes.len(),
            cluster.partition_names().len(),
            cluster.jobs.jobs(),
            gib(cluster.jobs.iter().map(|(_, jobs)| jobs.mem_requested()).sum()),
        );

        Ok(cluster)
    }

    /// Returns the jobs running on `node`
    pub fn jobs(&self, node: &str) -> &JobAggregate {
        static EMPTY: JobAggregate = JobAggregate::EMPTY;

        self.jobs.get(node).unwrap_or(&EMPTY)
    }

    /// Groups included nodes by partition and hardware, with nodes sorted by name
    pub fn partitions(&self, filter: &Filter) -> Vec<Partition<'_>> {
        let mut groups: BTreeMap<PartitionGroup, Vec<&Node>> = BTreeMap::new();
        for node in self.nodes.values() {
            if filter.includes(&node.partition.label) {
                groups.entry(PartitionGroup::of(node)).or_default().push(node);
            }
        }

        groups
            .into_iter()
            .map(|(group, mut nodes)| {
                nodes.sort_by(|a, b| a.name.cmp(&b.name));
                let first: &Node = nodes[0];

                Partition {
                    default: self.default_partition.as_ref() == Some(&group.partition),
                    walltime: first.walltime.as_str(),
                    group,
                    nodes,
                }
            })
            .collect()
    }

    fn partition_names(&self) -> BTreeSet<&str> {
        self.nodes
            .keys()
            .map(|(_, partition)| partition.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Args;

    const NODES: &str = "\
n2 4/0/0/4 8000 2.0 idle normal* UNLIMITED (null) 0
n1 4/0/0/4 8000 2.0 idle normal* UNLIMITED (null) 0
n1 4/0/0/4 8000 2.0 idle debug 1:00:00 (null) 0
g1 8/24/0/32 257000 4.0 mixed gpu 2-00:00:00 gpu:4 65536
";

    const JOBS: &str = "\
7 R alice 4G n[1-2] normal proj1
8 R bob 1G g1 gpu proj2
";

    fn config() -> Config {
        Config::from_env(&Args::default(), |_| None).unwrap()
    }

    #[test]
    fn test_parse_cluster() {
        let cluster = Cluster::parse(
            Cursor::new(NODES),
            Cursor::new(JOBS),
            &UserGroups::default(),
            &config(),
        )
        .unwrap();

        assert_eq!(cluster.nodes.len(), 4);
        assert_eq!(cluster.default_partition.as_deref(), Some("normal"));
        assert!(cluster
            .nodes
            .contains_key(&("n1".to_string(), "debug".to_string())));
        assert!(cluster.jobs("n1").jobs.contains("7"));
        assert!(cluster.jobs("g1").users.contains("bob"));
        assert!(cluster.jobs("missing").is_empty());
    }

    #[test]
    fn test_groups_of_job_users() {
        let nodes = Node::parse(Cursor::new(NODES)).unwrap();
        let jobs = Job::parse(Cursor::new(JOBS)).unwrap();
        let groups = UserGroups::from_iter([("alice", vec!["physics", "staff"])]);

        let cluster = Cluster::new(nodes, &jobs, &groups, &config()).unwrap();
        assert!(cluster.jobs("n2").groups.contains("physics"));
        assert!(cluster.jobs("n2").groups.contains("staff"));
        // bob could not be resolved
        assert!(cluster.jobs("g1").groups.is_empty());

        let args = Args {
            group: vec!["staff".into()],
            ..Default::default()
        };
        let filter = Filter::new(&args, &config()).unwrap();
        assert!(filter.highlights("n1", cluster.jobs("n1")));
        assert!(!filter.highlights("g1", cluster.jobs("g1")));
    }

    #[test]
    fn test_last_default_partition_wins() {
        let nodes = "\
n1 4/0/0/4 8000 2.0 idle normal* UNLIMITED (null) 0
n2 4/0/0/4 8000 2.0 idle other* UNLIMITED (null) 0
";
        let cluster = Cluster::parse(
            Cursor::new(nodes),
            Cursor::new(""),
            &UserGroups::default(),
            &config(),
        )
        .unwrap();

        assert_eq!(cluster.default_partition.as_deref(), Some("other"));
    }

    #[test]
    fn test_default_partition_override() {
        let mut config = config();
        config.default_partition = Some("gpu".to_string());

        let cluster = Cluster::parse(
            Cursor::new(NODES),
            Cursor::new(""),
            &UserGroups::default(),
            &config,
        )
        .unwrap();

        assert_eq!(cluster.default_partition.as_deref(), Some("gpu"));
    }

    #[test]
    fn test_malformed_input_is_fatal() {
        let groups = UserGroups::default();
        assert!(Cluster::parse(
            Cursor::new("n1 4/0/0/4 8000 2.0 idle\n"),
            Cursor::new(""),
            &groups,
            &config()
        )
        .is_err());
        assert!(Cluster::parse(
            Cursor::new(NODES),
            Cursor::new("7 R alice\n"),
            &groups,
            &config()
        )
        .is_err());
    }

    #[test]
    fn test_partitions() {
        let cluster = Cluster::parse(
            Cursor::new(NODES),
            Cursor::new(JOBS),
            &UserGroups::default(),
            &config(),
        )
        .unwrap();

        let partitions = cluster.partitions(&Filter::default());
        let names: Vec<_> = partitions
            .iter()
            .map(|p| p.group.partition.as_str())
            .collect();
        assert_eq!(names, vec!["debug", "gpu", "normal"]);

        let normal = &partitions[2];
        assert!(normal.default);
        assert_eq!(normal.walltime, "UNLIMITED");
        assert_eq!(
            normal.nodes.iter().map(|n| n.name.as_str()).collect::<Vec<_>>(),
            vec!["n1", "n2"]
        );

        let gpu = &partitions[1];
        assert!(!gpu.default);
        assert_eq!(gpu.group.cores, 32);
        assert_eq!(gpu.group.gpus, 4);
    }

    #[test]
    fn test_partitions_split_by_hardware() {
        let nodes = "\
a1 0/4/0/4 8000 0.0 idle normal infinite (null) 0
b1 0/8/0/8 8000 0.0 idle normal infinite (null) 0
a2 0/4/0/4 8000 0.0 idle normal infinite (null) 0
";
        let cluster = Cluster::parse(
            Cursor::new(nodes),
            Cursor::new(""),
            &UserGroups::default(),
            &config(),
        )
        .unwrap();

        let partitions = cluster.partitions(&Filter::default());
        assert_eq!(partitions.len(), 2);
        assert_eq!(partitions[0].group.cores, 4);
        assert_eq!(partitions[0].nodes.len(), 2);
        assert_eq!(partitions[1].group.cores, 8);
    }
}
