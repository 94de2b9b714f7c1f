//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::store::view::ReadFilter;

#[derive(Debug, Parser)]
#[command(name = "notibox", version, about = "Live notification inbox client")]
pub struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Bearer token (overrides the configuration file)
    #[arg(long, env = "NOTIBOX_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Verbose diagnostics
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Read-state scope of list and bulk commands.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum FilterArg {
    #[default]
    All,
    Unread,
    Read,
}

impl From<FilterArg> for ReadFilter {
    fn from(value: FilterArg) -> Self {
        match value {
            FilterArg::All => ReadFilter::All,
            FilterArg::Unread => ReadFilter::Unread,
            FilterArg::Read => ReadFilter::Read,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Follow the live feed and print notifications as they arrive
    Watch,

    /// List notifications with filtering, search and paging
    List {
        #[arg(long, value_enum, default_value = "all")]
        filter: FilterArg,

        /// Case-insensitive substring match on title and message
        #[arg(long)]
        search: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Mark one notification as read
    MarkRead { id: String },

    /// Mark every unread notification in the selected scope as read
    MarkAllRead {
        #[arg(long, value_enum, default_value = "all")]
        filter: FilterArg,

        #[arg(long)]
        search: Option<String>,
    },

    /// Delete one notification (asks for confirmation)
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Delete every notification in the selected scope (asks for confirmation)
    Clear {
        #[arg(long, value_enum, default_value = "all")]
        filter: FilterArg,

        #[arg(long)]
        search: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}
