//! `SQLite` schema definitions for techradar.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the competency areas table.
pub const CREATE_COMPETENCY_AREAS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS competency_areas (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    category TEXT,
    description TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to create the radar blips table.
pub const CREATE_BLIPS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS radar_blips (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    quadrant TEXT NOT NULL,
    ring TEXT NOT NULL,
    description TEXT,
    rationale TEXT,
    competency_area_id INTEGER REFERENCES competency_areas(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to create the append-only ring history table.
pub const CREATE_HISTORY_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS radar_blip_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    blip_id INTEGER NOT NULL REFERENCES radar_blips(id) ON DELETE CASCADE,
    from_ring TEXT,
    to_ring TEXT NOT NULL,
    note TEXT,
    created_at TEXT NOT NULL
)
";

/// SQL statement to create an index on history by blip and time.
pub const CREATE_HISTORY_BLIP_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_history_blip_created
ON radar_blip_history(blip_id, created_at DESC)
";

/// SQL statement to create an index on `updated_at` for listing.
pub const CREATE_BLIPS_UPDATED_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_blips_updated ON radar_blips(updated_at DESC)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_COMPETENCY_AREAS_TABLE,
    CREATE_BLIPS_TABLE,
    CREATE_HISTORY_TABLE,
    CREATE_HISTORY_BLIP_INDEX,
    CREATE_BLIPS_UPDATED_INDEX,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.is_empty());
        }
    }

    #[test]
    fn test_history_cascades_from_blips() {
        assert!(CREATE_HISTORY_TABLE.contains("REFERENCES radar_blips(id) ON DELETE CASCADE"));
        assert!(CREATE_HISTORY_TABLE.contains("from_ring TEXT,"));
        assert!(CREATE_HISTORY_TABLE.contains("to_ring TEXT NOT NULL"));
    }

    #[test]
    fn test_blips_reference_competency_areas() {
        assert!(CREATE_BLIPS_TABLE.contains("REFERENCES competency_areas(id)"));
        assert!(CREATE_BLIPS_TABLE.contains("name TEXT NOT NULL"));
        assert!(CREATE_BLIPS_TABLE.contains("ring TEXT NOT NULL"));
    }

    #[test]
    fn test_tables_created_before_dependents() {
        let pos = |needle: &str| {
            SCHEMA_STATEMENTS
                .iter()
                .position(|s| s.contains(needle))
                .unwrap()
        };
        assert!(pos("TABLE IF NOT EXISTS competency_areas") < pos("TABLE IF NOT EXISTS radar_blips"));
        assert!(pos("TABLE IF NOT EXISTS radar_blips") < pos("TABLE IF NOT EXISTS radar_blip_history"));
    }
}
