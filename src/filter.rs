use std::collections::BTreeSet;

use color_eyre::eyre::Context;
use color_eyre::Result;
use regex::Regex;

use crate::args::Args;
use crate::config::Config;
use crate::slurm::JobAggregate;

#[derive(Debug, Default)]
pub struct Filter {
    /// Partitions to show; all partitions not ignored if empty
    partitions: BTreeSet<String>,
    /// Partitions hidden when `partitions` is empty
    ignore: Option<Regex>,
    /// Pattern matched against node names, job IDs, users, accounts, and groups
    search: Option<Regex>,
    users: BTreeSet<String>,
    accounts: BTreeSet<String>,
    groups: BTreeSet<String>,
}

impl Filter {
    pub fn new(args: &Args, config: &Config) -> Result<Self> {
        let search = args
            .search
            .as_deref()
            .map(|pattern| Regex::new(pattern).wrap_err("invalid search pattern"))
            .transpose()?;

        let mut users: BTreeSet<String> = args.user.iter().cloned().collect();
        if args.me {
            match std::env::var("USER") {
                Ok(user) => {
                    users.insert(user);
                }
                Err(_) => log::warn!("--me was given, but USER is not set"),
            }
        }

        Ok(Self {
            partitions: args.partition.iter().cloned().collect(),
            ignore: config.ignore_partitions.clone(),
            search,
            users,
            accounts: args.account.iter().cloned().collect(),
            groups: args.group.iter().cloned().collect(),
        })
    }

    /// Returns true if nodes in `partition` should be shown
    pub fn includes(&self, partition: &str) -> bool {
        if self.partitions.is_empty() {
            !self
                .ignore
                .as_ref()
                .is_some_and(|ignore| ignore.is_match(partition))
        } else {
            self.partitions.contains(partition)
        }
    }

    /// Returns true if the node should be highlighted
    pub fn highlights(&self, node: &str, jobs: &JobAggregate) -> bool {
        if let Some(search) = &self.search {
            let found = search.is_match(node)
                || jobs
                    .jobs
                    .iter()
                    .chain(&jobs.users)
                    .chain(&jobs.accounts)
                    .chain(&jobs.groups)
                    .any(|v| search.is_match(v));

            if found {
                return true;
            }
        }

        !self.users.is_disjoint(&jobs.users)
            || !self.accounts.is_disjoint(&jobs.accounts)
            || !self.groups.is_disjoint(&jobs.groups)
    }
}
