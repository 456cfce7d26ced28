//! `techradar` - A technology radar engine with ring-transition history
//!
//! This library stores radar blips together with an append-only log of
//! their ring moves, classifies each blip's status over a lookback period,
//! and computes deterministic canvas positions for drawing the radar.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod blip;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod layout;
pub mod logging;
pub mod seed;
pub mod status;
pub mod storage;

pub use blip::{
    BlipRecord, BlipUpdate, CompetencyArea, HistoryEntry, NewBlip, Quadrant, RadarBlip, Ring,
};
pub use config::Config;
pub use error::{Error, Result};
pub use filter::BlipFilter;
pub use layout::{full_radar_layout, half_arc_layout, BlipPosition};
pub use logging::init_logging;
pub use status::{classify, classify_all, BlipStatus, Period, RingCounts, StatusCounts};
pub use storage::{Storage, StorageStats};
