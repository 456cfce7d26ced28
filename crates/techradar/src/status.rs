//! Time-windowed status classification.
//!
//! A blip's status is derived on every read from its creation time and ring
//! history against a caller-chosen lookback window. Nothing here is stored.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::blip::{BlipRecord, HistoryEntry, RadarBlip, Ring};
use crate::error::{Error, Result};

/// Lookback window in whole days. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Period(u32);

impl Period {
    /// Create a lookback window of `days` days.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `days` is zero.
    pub fn days(days: u32) -> Result<Self> {
        if days == 0 {
            return Err(Error::validation("period", "must be at least one day"));
        }
        Ok(Self(days))
    }

    /// Number of days in the window.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }

    /// Start of the window ending at `now`.
    ///
    /// Windows reaching past the earliest representable time start there.
    #[must_use]
    pub fn cutoff(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(Duration::days(i64::from(self.0)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl TryFrom<u32> for Period {
    type Error = Error;

    fn try_from(days: u32) -> Result<Self> {
        Self::days(days)
    }
}

impl From<Period> for u32 {
    fn from(period: Period) -> Self {
        period.0
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} days", self.0)
    }
}

/// Recent trajectory of a blip within a lookback window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlipStatus {
    /// Created inside the window.
    New,
    /// Latest in-window move was toward adopt.
    MovedIn,
    /// Latest in-window move was toward hold.
    MovedOut,
    /// No ring change inside the window.
    Unchanged,
}

impl BlipStatus {
    /// All statuses in display order.
    pub const ALL: [Self; 4] = [Self::New, Self::MovedIn, Self::MovedOut, Self::Unchanged];

    /// Stable machine key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::MovedIn => "moved-in",
            Self::MovedOut => "moved-out",
            Self::Unchanged => "unchanged",
        }
    }

    /// Direction implied by a single ring transition.
    #[must_use]
    pub fn of_transition(from: Ring, to: Ring) -> Self {
        match to.cmp(&from) {
            std::cmp::Ordering::Less => Self::MovedIn,
            std::cmp::Ordering::Greater => Self::MovedOut,
            std::cmp::Ordering::Equal => Self::Unchanged,
        }
    }
}

impl fmt::Display for BlipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify one blip against the window `period` ending at `now`.
///
/// A blip created inside the window is `New` regardless of its history.
/// Otherwise the latest in-window transition (by time, then id) decides
/// between `MovedIn` and `MovedOut`; without one the blip is `Unchanged`.
/// `history` may be in any order.
#[must_use]
pub fn classify(
    blip: &RadarBlip,
    history: &[HistoryEntry],
    period: Period,
    now: DateTime<Utc>,
) -> BlipStatus {
    let cutoff = period.cutoff(now);
    if blip.created_at >= cutoff {
        return BlipStatus::New;
    }

    history
        .iter()
        .filter(|h| h.created_at >= cutoff)
        .filter_map(|h| h.from_ring.map(|from| (h.order_key(), from, h.to_ring)))
        .max_by_key(|(key, _, _)| *key)
        .map_or(BlipStatus::Unchanged, |(_, from, to)| {
            BlipStatus::of_transition(from, to)
        })
}

/// Classify a blip record.
#[must_use]
pub fn classify_record(record: &BlipRecord, period: Period, now: DateTime<Utc>) -> BlipStatus {
    classify(&record.blip, &record.history, period, now)
}

/// Status of every blip, keyed by blip id.
pub type StatusMap = BTreeMap<i64, BlipStatus>;

/// Classify every record in `records`.
#[must_use]
pub fn classify_all(records: &[BlipRecord], period: Period, now: DateTime<Utc>) -> StatusMap {
    records
        .iter()
        .map(|r| (r.blip.id, classify_record(r, period, now)))
        .collect()
}

/// Number of blips per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    /// Blips created inside the window.
    pub new: usize,
    /// Blips that moved toward adopt.
    pub moved_in: usize,
    /// Blips that moved toward hold.
    pub moved_out: usize,
    /// Blips without an in-window ring change.
    pub unchanged: usize,
}

impl StatusCounts {
    /// Tally a status map.
    #[must_use]
    pub fn from_map(map: &StatusMap) -> Self {
        let mut counts = Self::default();
        for status in map.values() {
            match status {
                BlipStatus::New => counts.new += 1,
                BlipStatus::MovedIn => counts.moved_in += 1,
                BlipStatus::MovedOut => counts.moved_out += 1,
                BlipStatus::Unchanged => counts.unchanged += 1,
            }
        }
        counts
    }

    /// Count for one status.
    #[must_use]
    pub fn get(&self, status: BlipStatus) -> usize {
        match status {
            BlipStatus::New => self.new,
            BlipStatus::MovedIn => self.moved_in,
            BlipStatus::MovedOut => self.moved_out,
            BlipStatus::Unchanged => self.unchanged,
        }
    }

    /// Total number of classified blips.
    #[must_use]
    pub fn total(&self) -> usize {
        self.new + self.moved_in + self.moved_out + self.unchanged
    }
}

/// Number of blips per ring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingCounts {
    /// All blips.
    pub total: usize,
    /// Blips in adopt.
    pub adopt: usize,
    /// Blips in trial.
    pub trial: usize,
    /// Blips in assess.
    pub assess: usize,
    /// Blips in hold.
    pub hold: usize,
}

impl RingCounts {
    /// Tally the current ring of each blip.
    #[must_use]
    pub fn from_blips<'a>(blips: impl IntoIterator<Item = &'a RadarBlip>) -> Self {
        let mut counts = Self::default();
        for blip in blips {
            counts.total += 1;
            match blip.ring {
                Ring::Adopt => counts.adopt += 1,
                Ring::Trial => counts.trial += 1,
                Ring::Assess => counts.assess += 1,
                Ring::Hold => counts.hold += 1,
            }
        }
        counts
    }

    /// Count for one ring.
    #[must_use]
    pub fn get(&self, ring: Ring) -> usize {
        match ring {
            Ring::Adopt => self.adopt,
            Ring::Trial => self.trial,
            Ring::Assess => self.assess,
            Ring::Hold => self.hold,
        }
    }
}
