//! CLI argument parsing using clap derive

use clap::{Parser, Subcommand};

/// pmrc - Inspect and edit layered package manager configuration
#[derive(Parser, Debug)]
#[command(name = "pmrc")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Set a value on the command line layer (repeatable)
    #[arg(long = "with", value_name = "KEY=VALUE", global = true)]
    pub with: Vec<String>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Print effective values
    ///
    /// Without keys, behaves like `list`.
    Get {
        /// Keys or flat names to print
        keys: Vec<String>,
    },

    /// Set values in a config file and save it
    ///
    /// Examples:
    ///   pmrc set loglevel=warn
    ///   pmrc set save-exact=true --location project
    Set {
        /// Assignments to apply
        #[arg(required = true, value_name = "KEY=VALUE")]
        pairs: Vec<String>,

        /// File to write: user, global or project
        #[arg(short = 'L', long)]
        location: Option<String>,
    },

    /// Remove keys from a config file and save it
    Delete {
        /// Keys to remove
        #[arg(required = true)]
        keys: Vec<String>,

        /// File to write: user, global or project
        #[arg(short = 'L', long)]
        location: Option<String>,
    },

    /// Show values set in each location
    List {
        /// Print the flattened view as JSON
        #[arg(long)]
        json: bool,

        /// Include default values
        #[arg(short, long)]
        long: bool,
    },

    /// Open a config file in the configured editor
    Edit {
        /// File to edit: user, global or project
        #[arg(short = 'L', long)]
        location: Option<String>,
    },

    /// Report auth settings in unsupported shapes
    Validate {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Repair auth settings reported by `validate`
    Fix,

    /// Print the environment passed to child processes
    Env,
}
