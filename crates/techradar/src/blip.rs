//! Core radar types.
//!
//! This module defines the closed quadrant and ring enumerations, the blip
//! record, its append-only ring history, and the input types accepted by
//! the blip store.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// One of the four fixed category groupings of the radar.
///
/// The declaration order is the quadrant index used by the layout engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Quadrant {
    /// Network technologies.
    NetworkTechnology,
    /// Platforms and systems.
    Platforms,
    /// Tools.
    Tools,
    /// Methods and processes.
    Methods,
}

impl Quadrant {
    /// All quadrants in index order.
    pub const ALL: [Self; 4] = [
        Self::NetworkTechnology,
        Self::Platforms,
        Self::Tools,
        Self::Methods,
    ];

    /// Position of this quadrant around the radar, `0..4`.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::NetworkTechnology => 0,
            Self::Platforms => 1,
            Self::Tools => 2,
            Self::Methods => 3,
        }
    }

    /// Stable machine key, as stored and serialized.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NetworkTechnology => "network-technology",
            Self::Platforms => "platforms",
            Self::Tools => "tools",
            Self::Methods => "methods",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::NetworkTechnology => "Network technology",
            Self::Platforms => "Platforms/systems",
            Self::Tools => "Tools",
            Self::Methods => "Methods/processes",
        }
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quadrant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|q| q.as_str() == key)
            .ok_or_else(|| Error::validation("quadrant", format!("unknown quadrant '{s}'")))
    }
}

/// One of the four ordered maturity stages.
///
/// Ordering follows the ring index: `Adopt < Trial < Assess < Hold`.
/// Moving to a lower ring means moving toward the centre of the radar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ring {
    /// Recommended; use this.
    Adopt,
    /// Being tried out, promising.
    Trial,
    /// Worth investigating.
    Assess,
    /// Wait, or being phased out.
    Hold,
}

impl Ring {
    /// All rings from the centre outwards.
    pub const ALL: [Self; 4] = [Self::Adopt, Self::Trial, Self::Assess, Self::Hold];

    /// Ordinal of this ring, `0` for adopt through `3` for hold.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Adopt => 0,
            Self::Trial => 1,
            Self::Assess => 2,
            Self::Hold => 3,
        }
    }

    /// Stable machine key, as stored and serialized.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Adopt => "adopt",
            Self::Trial => "trial",
            Self::Assess => "assess",
            Self::Hold => "hold",
        }
    }

    /// Short guidance text shown next to the ring.
    #[must_use]
    pub fn guidance(self) -> &'static str {
        match self {
            Self::Adopt => "Recommended, use this",
            Self::Trial => "Being tried out, promising",
            Self::Assess => "Worth investigating",
            Self::Hold => "Wait or phase out",
        }
    }
}

impl fmt::Display for Ring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ring {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == key)
            .ok_or_else(|| Error::validation("ring", format!("unknown ring '{s}'")))
    }
}

/// A competency area a blip may link to.
///
/// Owned elsewhere; the radar only resolves it by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetencyArea {
    /// Unique identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Optional classification tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Optional free-text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One tracked technology or practice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarBlip {
    /// Unique identifier, assigned by the store.
    pub id: i64,
    /// Display name, never blank.
    pub name: String,
    /// Category grouping.
    pub quadrant: Quadrant,
    /// Current maturity ring.
    pub ring: Ring,
    /// Optional description.
    pub description: Option<String>,
    /// Optional reason for the current ring.
    pub rationale: Option<String>,
    /// Optional link to a competency area.
    pub competency_area_id: Option<i64>,
    /// When the blip was created.
    pub created_at: DateTime<Utc>,
    /// When the blip was last modified.
    pub updated_at: DateTime<Utc>,
}

/// An immutable record of a ring transition.
///
/// The first entry of every blip has no `from_ring`; it records the
/// initial placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Unique identifier.
    pub id: i64,
    /// The owning blip.
    pub blip_id: i64,
    /// Ring left, or `None` for the creation entry.
    pub from_ring: Option<Ring>,
    /// Ring entered.
    pub to_ring: Ring,
    /// Optional explanation of the transition.
    pub note: Option<String>,
    /// When the transition happened.
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Whether this is the initial placement entry.
    #[must_use]
    pub fn is_creation(&self) -> bool {
        self.from_ring.is_none()
    }

    /// Sort key giving a total chronological order: time, then id.
    #[must_use]
    pub fn order_key(&self) -> (DateTime<Utc>, i64) {
        (self.created_at, self.id)
    }
}

/// A blip together with its history and linked competency area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlipRecord {
    /// The blip itself.
    #[serde(flatten)]
    pub blip: RadarBlip,
    /// Ring history, newest first.
    pub history: Vec<HistoryEntry>,
    /// The linked competency area, if any.
    pub competency_area: Option<CompetencyArea>,
}

impl BlipRecord {
    /// History sorted oldest first, independent of the stored order.
    #[must_use]
    pub fn chronological_history(&self) -> Vec<&HistoryEntry> {
        let mut entries: Vec<&HistoryEntry> = self.history.iter().collect();
        entries.sort_by_key(|h| h.order_key());
        entries
    }

    /// The most recent history entry.
    #[must_use]
    pub fn latest_entry(&self) -> Option<&HistoryEntry> {
        self.history.iter().max_by_key(|h| h.order_key())
    }
}

impl AsRef<RadarBlip> for RadarBlip {
    fn as_ref(&self) -> &RadarBlip {
        self
    }
}

impl AsRef<RadarBlip> for BlipRecord {
    fn as_ref(&self) -> &RadarBlip {
        &self.blip
    }
}

/// Input for creating a blip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBlip {
    /// Display name.
    pub name: String,
    /// Category grouping.
    pub quadrant: Quadrant,
    /// Initial ring.
    pub ring: Ring,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Optional reason for the ring.
    #[serde(default)]
    pub rationale: Option<String>,
    /// Optional competency area link.
    #[serde(default)]
    pub competency_area_id: Option<i64>,
}

impl NewBlip {
    /// Create input with the required fields only.
    #[must_use]
    pub fn new(name: impl Into<String>, quadrant: Quadrant, ring: Ring) -> Self {
        Self {
            name: name.into(),
            quadrant,
            ring,
            description: None,
            rationale: None,
            competency_area_id: None,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the rationale.
    #[must_use]
    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }

    /// Link a competency area.
    #[must_use]
    pub fn with_competency_area(mut self, id: i64) -> Self {
        self.competency_area_id = Some(id);
        self
    }

    /// Check the input for values the store must reject.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the name is blank.
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)
    }
}

/// Partial update of a blip.
///
/// `None` leaves a field unchanged. For the nullable fields the inner
/// `Option` distinguishes "set" from "clear": in JSON an explicit `null`
/// clears the field while an absent key leaves it alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlipUpdate {
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New quadrant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quadrant: Option<Quadrant>,
    /// New ring. A change appends a history entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ring: Option<Ring>,
    /// New description, or `Some(None)` to clear it.
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    /// New rationale, or `Some(None)` to clear it.
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub rationale: Option<Option<String>>,
    /// New competency area link, or `Some(None)` to unlink.
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub competency_area_id: Option<Option<i64>>,
    /// Note recorded on the history entry if the ring changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_note: Option<String>,
}

impl BlipUpdate {
    /// Update that only moves the blip to another ring.
    #[must_use]
    pub fn move_to(ring: Ring) -> Self {
        Self {
            ring: Some(ring),
            ..Self::default()
        }
    }

    /// Attach a history note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.history_note = Some(note.into());
        self
    }

    /// Check the input for values the store must reject.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a new name is given but blank.
    pub fn validate(&self) -> Result<()> {
        match &self.name {
            Some(name) => validate_name(name),
            None => Ok(()),
        }
    }

    /// Apply the field changes to a blip, leaving id and timestamps alone.
    pub fn apply_to(&self, blip: &mut RadarBlip) {
        if let Some(name) = &self.name {
            blip.name = name.trim().to_string();
        }
        if let Some(quadrant) = self.quadrant {
            blip.quadrant = quadrant;
        }
        if let Some(ring) = self.ring {
            blip.ring = ring;
        }
        if let Some(description) = &self.description {
            blip.description.clone_from(description);
        }
        if let Some(rationale) = &self.rationale {
            blip.rationale.clone_from(rationale);
        }
        if let Some(area) = self.competency_area_id {
            blip.competency_area_id = area;
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("name", "must not be empty"));
    }
    Ok(())
}

fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
