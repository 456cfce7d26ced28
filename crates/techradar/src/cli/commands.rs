//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::blip::{BlipUpdate, NewBlip, Quadrant, Ring};
use crate::filter::BlipFilter;
use crate::status::BlipStatus;

/// Blip management commands.
#[derive(Debug, Subcommand)]
pub enum BlipCommand {
    /// Place a new blip on the radar
    Add(BlipAddArgs),

    /// Edit a blip; changing its ring records a transition
    Update(BlipUpdateArgs),

    /// Delete a blip and its history
    Delete {
        /// Blip id
        id: i64,
    },

    /// Show one blip with its history
    Show {
        /// Blip id
        id: i64,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the ring history of one blip
    History {
        /// Blip id
        id: i64,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Arguments for `blip add`.
#[derive(Debug, Args)]
pub struct BlipAddArgs {
    /// Blip name
    #[arg(short, long)]
    pub name: String,

    /// Quadrant to place the blip in
    #[arg(long, value_enum)]
    pub quadrant: QuadrantArg,

    /// Initial ring
    #[arg(short, long, value_enum)]
    pub ring: RingArg,

    /// Free-text description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Why the blip sits in its ring
    #[arg(long)]
    pub rationale: Option<String>,

    /// Linked competency area id
    #[arg(long, value_name = "ID")]
    pub competency_area: Option<i64>,
}

impl BlipAddArgs {
    /// Build the creation input.
    #[must_use]
    pub fn to_new_blip(&self) -> NewBlip {
        NewBlip {
            name: self.name.clone(),
            quadrant: self.quadrant.into(),
            ring: self.ring.into(),
            description: self.description.clone(),
            rationale: self.rationale.clone(),
            competency_area_id: self.competency_area,
        }
    }
}

/// Arguments for `blip update`.
#[derive(Debug, Args)]
pub struct BlipUpdateArgs {
    /// Blip id
    pub id: i64,

    /// New name
    #[arg(short, long)]
    pub name: Option<String>,

    /// New quadrant
    #[arg(long, value_enum)]
    pub quadrant: Option<QuadrantArg>,

    /// New ring
    #[arg(short, long, value_enum)]
    pub ring: Option<RingArg>,

    /// New description
    #[arg(short, long, conflicts_with = "clear_description")]
    pub description: Option<String>,

    /// Remove the description
    #[arg(long)]
    pub clear_description: bool,

    /// New rationale
    #[arg(long, conflicts_with = "clear_rationale")]
    pub rationale: Option<String>,

    /// Remove the rationale
    #[arg(long)]
    pub clear_rationale: bool,

    /// Link to a competency area
    #[arg(long, value_name = "ID", conflicts_with = "clear_competency_area")]
    pub competency_area: Option<i64>,

    /// Unlink the competency area
    #[arg(long)]
    pub clear_competency_area: bool,

    /// Note recorded with the ring transition
    #[arg(long)]
    pub note: Option<String>,
}

impl BlipUpdateArgs {
    /// Build the update input.
    #[must_use]
    pub fn to_update(&self) -> BlipUpdate {
        BlipUpdate {
            name: self.name.clone(),
            quadrant: self.quadrant.map(Into::into),
            ring: self.ring.map(Into::into),
            description: clearable(self.description.clone(), self.clear_description),
            rationale: clearable(self.rationale.clone(), self.clear_rationale),
            competency_area_id: clearable(self.competency_area, self.clear_competency_area),
            history_note: self.note.clone(),
        }
    }
}

fn clearable<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Filter by quadrant
    #[arg(long, value_enum)]
    pub quadrant: Option<QuadrantArg>,

    /// Filter by ring
    #[arg(short, long, value_enum)]
    pub ring: Option<RingArg>,

    /// Filter by status within the lookback period
    #[arg(short, long, value_enum)]
    pub status: Option<StatusArg>,

    /// Case-insensitive text in name or description
    #[arg(long)]
    pub search: Option<String>,

    /// Lookback period in days
    #[arg(short, long, value_name = "DAYS")]
    pub period: Option<u32>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

impl ListCommand {
    /// Build the filter described by the arguments.
    #[must_use]
    pub fn filter(&self) -> BlipFilter {
        BlipFilter {
            quadrant: self.quadrant.map(Into::into),
            ring: self.ring.map(Into::into),
            status: self.status.map(Into::into),
            search: self.search.clone(),
        }
    }
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Lookback period in days
    #[arg(short, long, value_name = "DAYS")]
    pub period: Option<u32>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Layout command arguments.
#[derive(Debug, Args)]
pub struct LayoutCommand {
    /// Lay out one quadrant as a half-arc instead of the full radar
    #[arg(long, value_enum)]
    pub quadrant: Option<QuadrantArg>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Competency area commands.
#[derive(Debug, Subcommand)]
pub enum CompetencyCommand {
    /// Add a competency area
    Add {
        /// Area name
        #[arg(short, long)]
        name: String,

        /// Grouping category
        #[arg(long)]
        category: Option<String>,

        /// Free-text description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// List competency areas
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Quadrant argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QuadrantArg {
    /// Network technology
    NetworkTechnology,
    /// Platforms and systems
    Platforms,
    /// Tools
    Tools,
    /// Methods and processes
    Methods,
}

impl From<QuadrantArg> for Quadrant {
    fn from(arg: QuadrantArg) -> Self {
        match arg {
            QuadrantArg::NetworkTechnology => Self::NetworkTechnology,
            QuadrantArg::Platforms => Self::Platforms,
            QuadrantArg::Tools => Self::Tools,
            QuadrantArg::Methods => Self::Methods,
        }
    }
}

/// Ring argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RingArg {
    /// Use it
    Adopt,
    /// Try it in real work
    Trial,
    /// Look into it
    Assess,
    /// Avoid or phase out
    Hold,
}

impl From<RingArg> for Ring {
    fn from(arg: RingArg) -> Self {
        match arg {
            RingArg::Adopt => Self::Adopt,
            RingArg::Trial => Self::Trial,
            RingArg::Assess => Self::Assess,
            RingArg::Hold => Self::Hold,
        }
    }
}

/// Status argument for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    /// Created within the period
    New,
    /// Moved toward adopt within the period
    MovedIn,
    /// Moved toward hold within the period
    MovedOut,
    /// No ring movement within the period
    Unchanged,
}

impl From<StatusArg> for BlipStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::New => Self::New,
            StatusArg::MovedIn => Self::MovedIn,
            StatusArg::MovedOut => Self::MovedOut,
            StatusArg::Unchanged => Self::Unchanged,
        }
    }
}
