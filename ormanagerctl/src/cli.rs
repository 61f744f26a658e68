use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod student;

/// Students stored through ormanager
#[derive(Clone, Debug, Parser)]
#[command(version, infer_subcommands = true)]
pub struct Cli {
    #[clap(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity,

    /// Sets a custom config directory
    ///
    /// The default value is $ORMANAGER_CONFIG if it is set, or
    /// $XDG_CONFIG_HOME/ormanager otherwise
    #[arg(
        short = 'C',
        long,
        value_name = "DIR",
        global = true,
        help_heading = "Global options"
    )]
    pub config: Option<PathBuf>,

    /// Sets a custom data directory
    ///
    /// The default value is $ORMANAGER_DATA if it is set, or
    /// $XDG_DATA_HOME/ormanager otherwise
    #[arg(
        short = 'D',
        long,
        value_name = "DIR",
        global = true,
        help_heading = "Global options"
    )]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Student related commands
    #[command(subcommand)]
    Student(student::Command),
}
