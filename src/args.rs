use argh::FromArgs;

/// Overview of Slurm nodes and their utilization, grouped by partition
#[derive(FromArgs, Debug, Default)]
pub struct Args {
    /// only show this partition; may be repeated
    #[argh(option, short = 'p')]
    pub partition: Vec<String>,

    /// highlight nodes whose name, jobs, users, accounts, or groups match this regex
    #[argh(option, short = 's')]
    pub search: Option<String>,

    /// highlight nodes running jobs of this user; may be repeated
    #[argh(option, short = 'u')]
    pub user: Vec<String>,

    /// highlight nodes running jobs of the current user
    #[argh(switch)]
    pub me: bool,

    /// highlight nodes running jobs of this account; may be repeated
    #[argh(option, short = 'a')]
    pub account: Vec<String>,

    /// highlight nodes running jobs of users in this group; may be repeated
    #[argh(option, short = 'g')]
    pub group: Vec<String>,

    /// width of output in columns; defaults to the width of the terminal
    #[argh(option, short = 'w')]
    pub width: Option<u16>,

    /// disable colors
    #[argh(switch)]
    pub no_color: bool,

    /// do not print the legend
    #[argh(switch)]
    pub no_legend: bool,

    /// only show partition names in headers
    #[argh(switch)]
    pub short: bool,

    /// location of `sinfo` executable
    #[argh(option, default = "\"sinfo\".to_string()")]
    pub sinfo: String,

    /// location of `squeue` executable
    #[argh(option, default = "\"squeue\".to_string()")]
    pub squeue: String,

    /// print debug messages
    #[argh(switch)]
    pub verbose: bool,

    /// print version information
    #[argh(switch, short = 'v')]
    pub version: bool,
}
