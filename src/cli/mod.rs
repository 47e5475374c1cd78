//! CLI module - argument parsing and command dispatch

pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "cleaver",
    version,
    about = "Cut sheet management with a full audit trail"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a cleaver project in the current directory
    Init(commands::init::InitArgs),

    /// Processor cut configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCmd),

    /// Cut sheet operations
    #[command(subcommand)]
    Sheet(commands::sheet::SheetCmd),

    /// Produced packages
    #[command(subcommand)]
    Pkg(commands::pkg::PkgCmd),
}
