//! Command-line interface definitions for the `skiff` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::{Parser, ValueEnum};

/// Top-level CLI for the `skiff` binary.
#[derive(Debug, Parser)]
#[command(
    name = "skiff",
    about = "Converge Vultr servers to a declared state",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Create, update, or delete a server to match the declared state.
    #[command(
        name = "server",
        about = "Create, update, or delete a server to match the declared state"
    )]
    Server(ServerCommand),
}

/// Desired end state for a server.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum StateArg {
    /// The server should exist with the declared attributes.
    Present,
    /// The server should not exist.
    Absent,
}

/// Arguments for the `skiff server` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct ServerCommand {
    /// Label of the server to converge.
    #[arg(long, value_name = "NAME")]
    pub(crate) name: String,
    /// Desired state for the server.
    #[arg(long, value_enum, default_value_t = StateArg::Present)]
    pub(crate) state: StateArg,
    /// Region name to deploy into (for example `Amsterdam`).
    ///
    /// Required when the state is `present` and the server does not exist
    /// yet. The name is resolved against the provider's region catalog and
    /// unknown names are rejected with a provider-specific error.
    #[arg(long, value_name = "REGION")]
    pub(crate) region: Option<String>,
    /// Operating system name (for example `CentOS 7 x64`).
    #[arg(long, value_name = "OS")]
    pub(crate) os: Option<String>,
    /// Plan name (for example `1024 MB RAM,25 GB SSD,1.00 TB BW`).
    #[arg(long, value_name = "PLAN")]
    pub(crate) plan: Option<String>,
    /// SSH key name to install on the server. Repeat for multiple keys.
    #[arg(long = "ssh-key", value_name = "KEY")]
    pub(crate) ssh_keys: Vec<String>,
    /// Startup script name to run on first boot.
    #[arg(long, value_name = "SCRIPT")]
    pub(crate) startup_script: Option<String>,
    /// Tag to apply to the server.
    #[arg(long, value_name = "TAG")]
    pub(crate) tag: Option<String>,
    /// Provide user-data inline (cloud-config YAML or script).
    #[arg(long, value_name = "USER_DATA", conflicts_with = "user_data_file")]
    pub(crate) user_data: Option<String>,
    /// Provide user-data from a local file.
    #[arg(long, value_name = "PATH", conflicts_with = "user_data")]
    pub(crate) user_data_file: Option<String>,
    /// Do not power on a stopped server after applying updates.
    #[arg(long)]
    pub(crate) no_start_on_update: bool,
    /// Report what would change without mutating anything.
    #[arg(long)]
    pub(crate) check: bool,
}
