use std::io::{self, BufWriter};

use color_eyre::eyre::Context;
use color_eyre::Result;

use crate::args::Args;
use crate::config::Config;
use crate::filter::Filter;
use crate::slurm::{Cluster, Slurm};
use crate::ui::UI;

#[derive(Debug)]
pub struct App {
    /// Settings resolved from arguments and environment
    pub config: Config,
    /// Selected partitions and highlighted nodes
    pub filter: Filter,
    /// Slurm nodes and running jobs
    pub cluster: Cluster,
}

impl App {
    /// Constructs a new instance of [`App`], querying Slurm for the current state
    pub fn new(args: &Args) -> Result<Self> {
        let config = Config::new(args)?;
        let filter = Filter::new(args, &config)?;
        let cluster = Slurm::collect(&args.sinfo, &args.squeue, &config)?;

        Ok(Self {
            config,
            filter,
            cluster,
        })
    }

    /// Writes the report to stdout
    pub fn run(&self) -> Result<()> {
        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());

        UI::new(&self.cluster, &self.filter, &self.config)
            .draw(&mut out)
            .wrap_err("failed to write to stdout")
    }
}
