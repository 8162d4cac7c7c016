use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

use super::types::{OutputFormat, StripModeArg};

/// Batch mutation tools for a hierarchical content repository
#[derive(Parser, Debug)]
#[command(name = "contentops")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON snapshot backing the repository (defaults to the config value)
    #[arg(long, global = true, env = "CONTENTOPS_REPOSITORY", value_name = "PATH")]
    pub repository: Option<PathBuf>,

    /// Config file to use instead of .contentops/config.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Perform mutations as this user id instead of the configured admin
    #[arg(long, global = true, value_name = "USER_ID")]
    pub as_user: Option<u64>,

    /// Assume yes for all prompts
    #[arg(short = 'y', long = "yes", global = true, env = "CONTENTOPS_YES")]
    pub yes: bool,

    /// Output format for per-record results
    #[arg(long, global = true, value_enum, default_value = "summary")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Delete content objects with all their locations and subtrees
    Delete {
        /// Comma-separated content ids, e.g. "10,20,30"
        #[arg(value_name = "CONTENT_IDS")]
        content_ids: String,
    },

    /// Move subtrees under new parents, one row at a time
    Move {
        /// Delimited file with header `locationId,newParentLocationId`
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
    },

    /// Create a draft from the published version of each content and publish it
    Republish {
        /// Comma-separated content ids
        #[arg(value_name = "CONTENT_IDS")]
        content_ids: String,
    },

    /// Remove link elements from a rich-text field and republish
    StripLinks {
        /// Comma-separated content ids
        #[arg(value_name = "CONTENT_IDS")]
        content_ids: String,

        /// Rich-text field to clean (defaults to the config value)
        #[arg(long, value_name = "NAME")]
        field: Option<String>,

        /// How links are removed
        #[arg(long, value_enum)]
        mode: Option<StripModeArg>,

        /// Show what would change without creating drafts
        #[arg(long)]
        dry_run: bool,
    },

    /// List, add or remove role assignments of one user
    #[command(group(
        ArgGroup::new("action")
            .required(true)
            .multiple(true)
            .args(["list", "add", "remove"])
    ))]
    Roles {
        /// User whose roles are managed
        #[arg(value_name = "USER_ID")]
        user_id: u64,

        /// List the user's role assignments
        #[arg(short, long, conflicts_with_all = ["add", "remove"])]
        list: bool,

        /// Location ids to grant the configured role on, limited to their subtrees
        #[arg(short, long, value_name = "LOCATION_IDS")]
        add: Vec<String>,

        /// Role assignment ids to remove from the user
        #[arg(short, long, value_name = "ASSIGNMENT_IDS")]
        remove: Vec<String>,
    },

    /// Show version information
    Version,
}
