use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "funnel")]
#[command(about = "funnel - manage funnel templates and share links")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path (defaults to ~/.config/funnel/config.toml when present)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory for the cache, session and remote state (overrides config)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List templates visible to the current identity
    List,

    /// Show one template
    Show {
        /// Template id
        id: String,
    },

    /// Create or update a template from JSON
    Save {
        /// Template JSON, or @path to read it from a file
        template: String,
    },

    /// Delete a template from both stores
    Delete {
        /// Template id
        id: String,
    },

    /// Sign in and migrate cached templates
    SignIn {
        /// Owner identity
        owner: String,
    },

    /// Sign out; cached data stays on disk
    SignOut,

    /// Issue a share link for a template
    Share {
        /// Template id
        id: String,

        /// Days until the link expires (never, when omitted)
        #[arg(long)]
        days: Option<i64>,
    },

    /// List share links issued for a template
    Tokens {
        /// Template id
        id: String,
    },

    /// Check a share link and print its snapshot
    Validate {
        /// Token value
        token: String,
    },

    /// Copy the template behind a share link
    Redeem {
        /// Token value
        token: String,
    },

    /// Restore the steps of an empty copy
    Repair {
        /// Template id
        id: String,

        /// Token the copy was redeemed from
        #[arg(long)]
        token: Option<String>,
    },

    /// Report copies missing content relative to their source
    Audit,

    /// Show the usage history of a share link
    Usage {
        /// Token value
        token: String,
    },

    /// Permanently disable a share link
    Deactivate {
        /// Token value
        token: String,
    },
}
