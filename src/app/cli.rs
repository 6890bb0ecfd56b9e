//! Command-Line Interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// a11y-mux - Accessibility event multiplexer and simulation harness
#[derive(Parser, Debug)]
#[command(name = "a11y-mux")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the multiplexer against a synthetic platform event feed
    Simulate {
        /// Number of accessibility events to feed
        #[arg(short, long)]
        events: Option<usize>,

        /// Number of logging delegates to register
        #[arg(short, long)]
        delegates: Option<usize>,

        /// Delay between synthetic events in milliseconds
        #[arg(long)]
        step_delay_ms: Option<u64>,
    },

    /// List the event kind names accepted by named callbacks
    Events,

    /// View or modify configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write a default config file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
