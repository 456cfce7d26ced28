//! Default radar content.
//!
//! Seeding fills an empty database with a starter set of competency areas
//! and blips. Each table is only seeded while it is empty, so running the
//! seed twice is harmless.

use chrono::Utc;
use tracing::info;

use crate::blip::{NewBlip, Quadrant, Ring};
use crate::error::Result;
use crate::storage::Storage;

/// Note recorded on the creation entry of seeded blips.
pub const SEED_NOTE: &str = "initial placement";

/// `(name, category, description)`
const COMPETENCY_AREAS: &[(&str, &str, &str)] = &[
    (
        "Fiber optics / GPON / XGS-PON",
        "network-technology",
        "Passive optical networks and fiber infrastructure",
    ),
    (
        "IP networks / routing / switching",
        "network-technology",
        "IP-based network infrastructure",
    ),
    (
        "DWDM / transport",
        "network-technology",
        "Wavelength multiplexing and transport networks",
    ),
    (
        "Provisioning and OSS/BSS",
        "platforms",
        "Operations and business support systems",
    ),
    (
        "Monitoring (NMS/EMS)",
        "platforms",
        "Network monitoring and element management",
    ),
    (
        "Project management",
        "methods",
        "Project planning, follow-up and delivery",
    ),
    (
        "Regulatory compliance",
        "regulatory",
        "Regulatory requirements and access obligations",
    ),
    (
        "HSE / quality",
        "methods",
        "Health, safety, environment and quality management",
    ),
    (
        "Customer installation",
        "network-technology",
        "Installation and hookup at the end customer",
    ),
];

/// `(name, quadrant, ring, description, rationale)`
const BLIPS: &[(&str, Quadrant, Ring, &str, &str)] = &[
    (
        "XGS-PON",
        Quadrant::NetworkTechnology,
        Ring::Adopt,
        "10G symmetric PON, next generation FTTH",
        "Standardized and available from several vendors",
    ),
    (
        "GPON",
        Quadrant::NetworkTechnology,
        Ring::Adopt,
        "Gigabit Passive Optical Network",
        "Well established backbone of the fiber network",
    ),
    (
        "25GS-PON",
        Quadrant::NetworkTechnology,
        Ring::Assess,
        "25G symmetric PON, future upgrade path",
        "Still being standardized",
    ),
    (
        "WiFi 7",
        Quadrant::NetworkTechnology,
        Ring::Trial,
        "IEEE 802.11be, next generation WiFi",
        "Relevant use cases for business customers",
    ),
    (
        "DWDM",
        Quadrant::NetworkTechnology,
        Ring::Adopt,
        "Dense Wavelength Division Multiplexing",
        "Critical for the transport network",
    ),
    (
        "Netbox",
        Quadrant::Platforms,
        Ring::Trial,
        "DCIM and IPAM for network documentation",
        "Replaces manual inventories",
    ),
    (
        "Zabbix",
        Quadrant::Platforms,
        Ring::Adopt,
        "Network monitoring",
        "Well established with good SNMP support",
    ),
    (
        "Docker",
        Quadrant::Tools,
        Ring::Adopt,
        "Application containerization",
        "Standard for deployment",
    ),
    (
        "Ansible",
        Quadrant::Tools,
        Ring::Trial,
        "Network configuration automation",
        "Being tested for configuration management of network equipment",
    ),
    (
        "Jira",
        Quadrant::Tools,
        Ring::Adopt,
        "Project and task tracking",
        "Used across the organization",
    ),
    (
        "Confluence",
        Quadrant::Tools,
        Ring::Adopt,
        "Documentation and knowledge sharing",
        "Standard documentation tool",
    ),
    (
        "ITIL",
        Quadrant::Methods,
        Ring::Assess,
        "IT service management framework",
        "Evaluating relevance for our processes",
    ),
    (
        "DevOps",
        Quadrant::Methods,
        Ring::Trial,
        "Culture and practice for continuous delivery",
        "Being introduced gradually in operations",
    ),
    (
        "Agile",
        Quadrant::Methods,
        Ring::Adopt,
        "Agile project methodology",
        "Used in project work",
    ),
];

/// What a seeding run inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Competency areas inserted.
    pub competency_areas: usize,
    /// Blips inserted.
    pub blips: usize,
}

impl SeedReport {
    /// Whether the run inserted nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.competency_areas == 0 && self.blips == 0
    }
}

/// Insert the default competency areas and blips into empty tables.
///
/// # Errors
///
/// Returns an error if any insert fails.
pub fn seed_defaults(storage: &mut Storage) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    if storage.list_competency_areas()?.is_empty() {
        for (name, category, description) in COMPETENCY_AREAS {
            storage.create_competency_area(name, Some(category), Some(description))?;
            report.competency_areas += 1;
        }
        info!("Seeded {} competency areas", report.competency_areas);
    }

    if storage.count()? == 0 {
        let now = Utc::now();
        for (name, quadrant, ring, description, rationale) in BLIPS {
            let input = NewBlip::new(*name, *quadrant, *ring)
                .with_description(*description)
                .with_rationale(*rationale);
            storage.create_with_note(&input, SEED_NOTE, now)?;
            report.blips += 1;
        }
        info!("Seeded {} radar blips", report.blips);
    }

    Ok(report)
}
