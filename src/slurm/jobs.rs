use std::collections::{BTreeSet, HashMap};

use color_eyre::eyre::{bail, Context};
use color_eyre::Result;
use serde::{de, Deserialize, Deserializer};

use crate::groups::UserGroups;

use super::hostlist::{Hostlist, HostlistError};
use super::misc::{format_string, parse_memory};

/// Number of fields per line of `squeue` output
pub const JOB_FIELDS: usize = 7;

/// Compact job state codes reported by `squeue`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Suspended,
    Completing,
    Completed,
    Cancelled,
    Failed,
    Timeout,
    NodeFail,
    Other(String),
}

impl From<&str> for JobState {
    fn from(s: &str) -> Self {
        match s {
            "PD" => JobState::Pending,
            "R" => JobState::Running,
            "S" => JobState::Suspended,
            "CG" => JobState::Completing,
            "CD" => JobState::Completed,
            "CA" => JobState::Cancelled,
            "F" => JobState::Failed,
            "TO" => JobState::Timeout,
            "NF" => JobState::NodeFail,
            other => JobState::Other(other.to_string()),
        }
    }
}

impl JobState {
    fn from_str<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: &str = Deserialize::deserialize(deserializer)?;

        Ok(JobState::from(value))
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Job {
    /// ID of the job; array jobs use the form `1234_5`
    pub id: String,
    #[serde(deserialize_with = "JobState::from_str")]
    pub state: JobState,
    pub user: String,
    /// Memory requested by the job, in bytes
    #[serde(deserialize_with = "parse_job_mem")]
    pub mem: u64,
    /// Compressed list of nodes assigned to the job
    pub nodelist: String,
    pub partition: String,
    pub account: String,
}

impl Job {
    /// Parses `squeue` output; any malformed line is an error
    pub fn parse<R>(reader: R) -> Result<Vec<Job>>
    where
        R: std::io::Read,
    {
        let mut jobs = Vec::new();
        for (idx, record) in super::misc::reader(reader).records().enumerate() {
            let record = record.wrap_err("error while reading squeue output")?;
            if record.len() != JOB_FIELDS {
                bail!(
                    "expected {} fields in line {} of squeue output, found {}: {:?}",
                    JOB_FIELDS,
                    idx + 1,
                    record.len(),
                    record.iter().collect::<Vec<_>>().join(" ")
                );
            }

            let job: Job = record.deserialize(None).wrap_err_with(|| {
                format!("error while parsing line {} of squeue output", idx + 1)
            })?;

            jobs.push(job);
        }

        Ok(jobs)
    }
}

/// Jobs running on a single node
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JobAggregate {
    pub jobs: BTreeSet<String>,
    pub users: BTreeSet<String>,
    /// Memory requested by each job, in the order the jobs were listed
    pub mem: Vec<u64>,
    pub accounts: BTreeSet<String>,
    /// Groups of the users running jobs on the node
    pub groups: BTreeSet<String>,
}

impl JobAggregate {
    pub const EMPTY: JobAggregate = JobAggregate {
        jobs: BTreeSet::new(),
        users: BTreeSet::new(),
        mem: Vec::new(),
        accounts: BTreeSet::new(),
        groups: BTreeSet::new(),
    };

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Total memory requested by jobs on this node, in bytes
    pub fn mem_requested(&self) -> u64 {
        self.mem.iter().sum()
    }

    fn merge(&mut self, job: &Job, groups: Option<&BTreeSet<String>>) {
        self.jobs.insert(job.id.clone());
        self.users.insert(job.user.clone());
        self.mem.push(job.mem);
        self.accounts.insert(job.account.clone());
        if let Some(groups) = groups {
            self.groups.extend(groups.iter().cloned());
        }
    }
}

/// Running jobs by node name
#[derive(Clone, Debug, Default)]
pub struct JobMap {
    nodes: HashMap<String, JobAggregate>,
    /// Number of running jobs merged
    jobs: usize,
}

impl JobMap {
    /// Creates a map with an empty aggregate for every node
    pub fn new<'a, I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            nodes: nodes
                .into_iter()
                .map(|name| (name.to_string(), JobAggregate::default()))
                .collect(),
            jobs: 0,
        }
    }

    /// Merges a job into the aggregates of each of its nodes; jobs that are not
    /// running are ignored. Hostlists using unsupported notation are reported and
    /// the job skipped, all other hostlist errors are fatal
    pub fn insert(&mut self, job: &Job, groups: &UserGroups) -> Result<()> {
        if job.state != JobState::Running {
            return Ok(());
        }

        let hosts = match Hostlist::parse(&job.nodelist) {
            Ok(hosts) => hosts,
            Err(err @ HostlistError::Unsupported(_)) => {
                log::warn!("skipping job {}: {}", job.id, err);
                return Ok(());
            }
            Err(err) => {
                return Err(err).wrap_err_with(|| format!("parsing nodes of job {}", job.id))
            }
        };

        let groups = groups.get(&job.user);
        if groups.is_none() {
            log::debug!("no groups found for user {:?}", job.user);
        }

        for host in &hosts {
            self.nodes.entry(host).or_default().merge(job, groups);
        }

        self.jobs += 1;
        Ok(())
    }

    pub fn get(&self, node: &str) -> Option<&JobAggregate> {
        self.nodes.get(node)
    }

    /// Number of running jobs merged into the map
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &JobAggregate)> {
        self.nodes.iter()
    }
}

/// Generates parameter for the `--Format` command-line option for `squeue`
pub fn squeue_format() -> String {
    format_string(
        [
            "JobID",
            "StateCompact",
            "UserName",
            "MinMemory",
            "NodeList",
            "Partition",
            "Account",
        ]
        .iter(),
    )
}

fn parse_job_mem<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value: &str = Deserialize::deserialize(deserializer)?;
    parse_memory(value).map_err(|err| de::Error::custom(format!("{:#}", err)))
}
