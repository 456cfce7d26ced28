//! Filtering of classified blip lists.

use serde::{Deserialize, Serialize};

use crate::blip::{BlipRecord, Quadrant, RadarBlip, Ring};
use crate::status::{BlipStatus, StatusMap};

/// Criteria for narrowing a blip list. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlipFilter {
    /// Only blips in this quadrant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quadrant: Option<Quadrant>,
    /// Only blips in this ring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ring: Option<Ring>,
    /// Only blips with this status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BlipStatus>,
    /// Case-insensitive substring of the name or description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl BlipFilter {
    /// Restrict to one quadrant.
    #[must_use]
    pub fn with_quadrant(mut self, quadrant: Quadrant) -> Self {
        self.quadrant = Some(quadrant);
        self
    }

    /// Restrict to one ring.
    #[must_use]
    pub fn with_ring(mut self, ring: Ring) -> Self {
        self.ring = Some(ring);
        self
    }

    /// Restrict to one status.
    #[must_use]
    pub fn with_status(mut self, status: BlipStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restrict to blips whose name or description contains `text`.
    #[must_use]
    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    /// Whether no criteria are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quadrant.is_none()
            && self.ring.is_none()
            && self.status.is_none()
            && self.search_term().is_none()
    }

    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    /// Check one blip. A status criterion never matches an unclassified blip.
    #[must_use]
    pub fn matches(&self, blip: &RadarBlip, status: Option<BlipStatus>) -> bool {
        if self.quadrant.is_some_and(|q| q != blip.quadrant) {
            return false;
        }
        if self.ring.is_some_and(|r| r != blip.ring) {
            return false;
        }
        if let Some(wanted) = self.status {
            if status != Some(wanted) {
                return false;
            }
        }
        match self.search_term() {
            Some(term) => {
                blip.name.to_lowercase().contains(&term)
                    || blip
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&term))
            }
            None => true,
        }
    }

    /// Keep the records that match, preserving order.
    #[must_use]
    pub fn apply<'a>(&self, records: &'a [BlipRecord], statuses: &StatusMap) -> Vec<&'a BlipRecord> {
        records
            .iter()
            .filter(|r| self.matches(&r.blip, statuses.get(&r.blip.id).copied()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn blip(id: i64, name: &str, quadrant: Quadrant, ring: Ring) -> RadarBlip {
        let now = Utc::now();
        RadarBlip {
            id,
            name: name.to_string(),
            quadrant,
            ring,
            description: None,
            rationale: None,
            competency_area_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn record(blip: RadarBlip) -> BlipRecord {
        BlipRecord {
            blip,
            history: Vec::new(),
            competency_area: None,
        }
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let filter = BlipFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches(&blip(1, "Docker", Quadrant::Tools, Ring::Adopt), None));
    }

    #[test]
    fn test_whitespace_search_is_empty() {
        assert!(BlipFilter::default().with_search("   ").is_empty());
    }

    #[test]
    fn test_quadrant_and_ring() {
        let filter = BlipFilter::default()
            .with_quadrant(Quadrant::Tools)
            .with_ring(Ring::Trial);
        assert!(filter.matches(&blip(1, "Ansible", Quadrant::Tools, Ring::Trial), None));
        assert!(!filter.matches(&blip(2, "Docker", Quadrant::Tools, Ring::Adopt), None));
        assert!(!filter.matches(&blip(3, "DevOps", Quadrant::Methods, Ring::Trial), None));
    }

    #[test]
    fn test_search_is_case_insensitive_over_description() {
        let mut b = blip(1, "GPON", Quadrant::NetworkTechnology, Ring::Adopt);
        b.description = Some("Gigabit Passive Optical Network".to_string());

        assert!(BlipFilter::default().with_search("gpon").matches(&b, None));
        assert!(BlipFilter::default().with_search("OPTICAL").matches(&b, None));
        assert!(!BlipFilter::default().with_search("wifi").matches(&b, None));
    }

    #[test]
    fn test_status_requires_classification() {
        let b = blip(1, "Netbox", Quadrant::Platforms, Ring::Trial);
        let filter = BlipFilter::default().with_status(BlipStatus::New);
        assert!(filter.matches(&b, Some(BlipStatus::New)));
        assert!(!filter.matches(&b, Some(BlipStatus::Unchanged)));
        assert!(!filter.matches(&b, None));
    }

    #[test]
    fn test_apply_preserves_order() {
        let records = vec![
            record(blip(3, "Zabbix", Quadrant::Platforms, Ring::Adopt)),
            record(blip(1, "Jira", Quadrant::Tools, Ring::Adopt)),
            record(blip(2, "Netbox", Quadrant::Platforms, Ring::Trial)),
        ];
        let mut statuses = StatusMap::new();
        statuses.insert(3, BlipStatus::MovedIn);
        statuses.insert(1, BlipStatus::MovedIn);
        statuses.insert(2, BlipStatus::Unchanged);

        let filter = BlipFilter::default().with_status(BlipStatus::MovedIn);
        let ids: Vec<i64> = filter
            .apply(&records, &statuses)
            .iter()
            .map(|r| r.blip.id)
            .collect();
        assert_eq!(ids, vec![3, 1]);
    }
}
