//! Command-line interface for techradar.
//!
//! This module provides the CLI structure for the `radar` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    BlipAddArgs, BlipCommand, BlipUpdateArgs, CompetencyCommand, ConfigCommand, LayoutCommand,
    ListCommand, QuadrantArg, RingArg, StatusArg, StatusCommand,
};

use crate::logging::Verbosity;

/// radar - Track technologies across rings and quadrants
///
/// Records where each technology sits on the radar, keeps the history of
/// its ring moves, and reports what changed within a lookback period.
#[derive(Debug, Parser)]
#[command(name = "radar")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add, edit, inspect or remove blips
    #[command(subcommand)]
    Blip(BlipCommand),

    /// List blips with their status
    List(ListCommand),

    /// Show status and ring counts
    Status(StatusCommand),

    /// Compute blip coordinates
    Layout(LayoutCommand),

    /// Manage competency areas
    #[command(subcommand)]
    Competency(CompetencyCommand),

    /// Fill an empty database with default content
    Seed,

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }
}
