use color_eyre::eyre::Context;
use color_eyre::Result;
use regex::Regex;

use crate::args::Args;
use crate::ui;

/// Overrides the partition marked as default by `sinfo`
pub const DEFAULT_PARTITION_ENV: &str = "SLURMGRID_DEFAULT_PARTITION";
/// Regex matching partitions hidden unless explicitly requested
pub const IGNORE_PARTITIONS_ENV: &str = "SLURMGRID_IGNORE_PARTITIONS";
/// Enables short headers if set to a value other than `0`
pub const SHORT_HEADER_ENV: &str = "SLURMGRID_SHORT_HEADER";

/// Settings for a single run, resolved from command-line arguments and environment
#[derive(Debug)]
pub struct Config {
    /// Default partition; overrides the partition marked by `sinfo`
    pub default_partition: Option<String>,
    /// Partitions hidden when no partitions are explicitly selected
    pub ignore_partitions: Option<Regex>,
    /// Only show the partition name in headers
    pub short_header: bool,
    /// Print the legend before the report
    pub legend: bool,
    /// Output supports ANSI colors
    pub color: bool,
    /// Width of output in columns
    pub width: u16,
}

impl Config {
    pub fn new(args: &Args) -> Result<Self> {
        let mut config = Self::from_env(args, |key| std::env::var(key).ok())?;
        config.color = !args.no_color && ui::color_capable();
        config.width = args.width.unwrap_or_else(ui::terminal_width);

        Ok(config)
    }

    /// Resolves settings from arguments and environment variables provided by `var`.
    /// Colors are disabled and the default width is used
    pub fn from_env<F>(args: &Args, var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| var(key).filter(|v: &String| !v.is_empty());

        let ignore_partitions = var(IGNORE_PARTITIONS_ENV)
            .map(|pattern| {
                Regex::new(&pattern)
                    .wrap_err_with(|| format!("invalid regex in {}", IGNORE_PARTITIONS_ENV))
            })
            .transpose()?;

        Ok(Self {
            default_partition: var(DEFAULT_PARTITION_ENV),
            ignore_partitions,
            short_header: args.short || var(SHORT_HEADER_ENV).is_some_and(|v| v != "0"),
            legend: !args.no_legend,
            color: false,
            width: args.width.unwrap_or(ui::DEFAULT_WIDTH),
        })
    }
}
