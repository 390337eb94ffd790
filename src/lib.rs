/// Application.
pub mod app;
/// Command-line arguments
pub mod args;
/// Settings from arguments and environment
pub mod config;
/// Partition selection and node highlighting
pub mod filter;
/// Group memberships of users
pub mod groups;
/// Logging setup
pub mod logging;
/// Querying of Slurm state
pub mod slurm;
/// Report renderer
pub mod ui;
/// Misc. helper functions
pub mod utilities;
/// Custom widgets
pub mod widgets;
