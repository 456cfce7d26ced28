//! Storage layer for techradar.
//!
//! This module provides `SQLite`-based persistent storage for radar blips and
//! their ring history. Every mutation runs in a single transaction, so a blip
//! and the history entry describing its ring are always written together.

pub mod migrations;
pub mod schema;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info, warn};

use crate::blip::{
    BlipRecord, BlipUpdate, CompetencyArea, HistoryEntry, NewBlip, Quadrant, RadarBlip, Ring,
};
use crate::error::{Error, Result};

/// Note recorded on the history entry written when a blip is created.
pub const CREATION_NOTE: &str = "created";

const BLIP_COLUMNS: &str = "id, name, quadrant, ring, description, rationale, \
                            competency_area_id, created_at, updated_at";

const HISTORY_COLUMNS: &str = "id, blip_id, from_ring, to_ring, note, created_at";

const AREA_COLUMNS: &str = "id, name, category, description";

/// Storage engine for radar blips.
///
/// Provides persistent storage using `SQLite` with support for:
/// - Blip creation with its initial history entry
/// - Updates that log ring transitions
/// - Cascading deletes of blips and their history
/// - Competency area lookups
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // WAL lets readers proceed while a mutation is in flight
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    // === Competency areas ===

    /// Insert a competency area.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name, or an error if the
    /// database operation fails.
    pub fn create_competency_area(
        &self,
        name: &str,
        category: Option<&str>,
        description: Option<&str>,
    ) -> Result<CompetencyArea> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("name", "must not be empty"));
        }

        let now = format_timestamp(Utc::now());
        self.conn.execute(
            r"
            INSERT INTO competency_areas (name, category, description, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            ",
            params![name, category, description, now],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted competency area {} ({})", id, name);
        Ok(CompetencyArea {
            id,
            name: name.to_string(),
            category: category.map(str::to_string),
            description: description.map(str::to_string),
        })
    }

    /// Get a competency area by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CompetencyAreaNotFound`] if no area has this id, or
    /// an error if the database operation fails.
    pub fn get_competency_area(&self, id: i64) -> Result<CompetencyArea> {
        fetch_area(&self.conn, id)?.ok_or(Error::CompetencyAreaNotFound { id })
    }

    /// List all competency areas ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_competency_areas(&self) -> Result<Vec<CompetencyArea>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {AREA_COLUMNS} FROM competency_areas ORDER BY name, id"
        ))?;
        let areas = stmt
            .query_map([], row_to_area)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(areas)
    }

    // === Blips ===

    /// Create a blip and its initial history entry.
    ///
    /// # Errors
    ///
    /// Returns a validation error for invalid input, or an error if the
    /// database operation fails. Nothing is written on error.
    pub fn create(&mut self, input: &NewBlip) -> Result<RadarBlip> {
        self.create_at(input, Utc::now())
    }

    /// Create a blip as of the given time.
    ///
    /// The blip row and its creation entry (`from_ring` empty, note
    /// [`CREATION_NOTE`]) are committed together or not at all.
    ///
    /// # Errors
    ///
    /// Returns a validation error for invalid input, or an error if the
    /// database operation fails. Nothing is written on error.
    pub fn create_at(&mut self, input: &NewBlip, at: DateTime<Utc>) -> Result<RadarBlip> {
        self.create_with_note(input, CREATION_NOTE, at)
    }

    /// Create a blip whose creation entry carries a custom note.
    pub(crate) fn create_with_note(
        &mut self,
        input: &NewBlip,
        note: &str,
        at: DateTime<Utc>,
    ) -> Result<RadarBlip> {
        input.validate()?;

        let tx = self.conn.transaction()?;
        if let Some(area) = input.competency_area_id {
            ensure_area_exists(&tx, area)?;
        }

        let name = input.name.trim();
        let stamp = format_timestamp(at);
        tx.execute(
            r"
            INSERT INTO radar_blips
                (name, quadrant, ring, description, rationale, competency_area_id,
                 created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            ",
            params![
                name,
                input.quadrant,
                input.ring,
                input.description,
                input.rationale,
                input.competency_area_id,
                stamp,
            ],
        )?;
        let id = tx.last_insert_rowid();
        append_history(&tx, id, None, input.ring, Some(note), &stamp)?;
        tx.commit()?;

        info!(
            "Created blip {} '{}' in {} / {}",
            id, name, input.quadrant, input.ring
        );
        Ok(RadarBlip {
            id,
            name: name.to_string(),
            quadrant: input.quadrant,
            ring: input.ring,
            description: input.description.clone(),
            rationale: input.rationale.clone(),
            competency_area_id: input.competency_area_id,
            created_at: at,
            updated_at: at,
        })
    }

    /// Update a blip, logging a ring transition if the ring changes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BlipNotFound`] if the blip does not exist, a
    /// validation error for invalid input, or an error if the database
    /// operation fails. Nothing is written on error.
    pub fn update(&mut self, id: i64, update: &BlipUpdate) -> Result<RadarBlip> {
        self.update_at(id, update, Utc::now())
    }

    /// Update a blip as of the given time.
    ///
    /// The field update and the history entry for a ring change are
    /// committed together. Updates that leave the ring as it was append no
    /// history, whatever else they change. A ring change dated before the
    /// blip's newest history entry is rejected, so the newest entry always
    /// matches the current ring.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BlipNotFound`] if the blip does not exist, a
    /// validation error for invalid input, or an error if the database
    /// operation fails. Nothing is written on error.
    pub fn update_at(
        &mut self,
        id: i64,
        update: &BlipUpdate,
        at: DateTime<Utc>,
    ) -> Result<RadarBlip> {
        update.validate()?;

        let tx = self.conn.transaction()?;
        let mut blip = fetch_blip(&tx, id)?.ok_or(Error::BlipNotFound { id })?;
        if let Some(Some(area)) = update.competency_area_id {
            ensure_area_exists(&tx, area)?;
        }

        let prior_ring = blip.ring;
        update.apply_to(&mut blip);
        if blip.ring != prior_ring {
            if let Some(latest) = latest_history_time(&tx, id)? {
                if at < latest {
                    return Err(Error::validation(
                        "at",
                        format!("ring change at {at} precedes the latest history entry ({latest})"),
                    ));
                }
            }
        }
        blip.updated_at = at;

        let stamp = format_timestamp(at);
        tx.execute(
            r"
            UPDATE radar_blips
            SET name = ?1, quadrant = ?2, ring = ?3, description = ?4, rationale = ?5,
                competency_area_id = ?6, updated_at = ?7
            WHERE id = ?8
            ",
            params![
                blip.name,
                blip.quadrant,
                blip.ring,
                blip.description,
                blip.rationale,
                blip.competency_area_id,
                stamp,
                id,
            ],
        )?;

        if blip.ring != prior_ring {
            append_history(
                &tx,
                id,
                Some(prior_ring),
                blip.ring,
                update.history_note.as_deref(),
                &stamp,
            )?;
        }
        tx.commit()?;

        if blip.ring == prior_ring {
            info!("Updated blip {} '{}'", id, blip.name);
        } else {
            info!(
                "Updated blip {} '{}', moved {} -> {}",
                id, blip.name, prior_ring, blip.ring
            );
        }
        Ok(blip)
    }

    /// Delete a blip and all of its history.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BlipNotFound`] if the blip does not exist, or an
    /// error if the database operation fails.
    pub fn delete(&mut self, id: i64) -> Result<RadarBlip> {
        let tx = self.conn.transaction()?;
        let blip = fetch_blip(&tx, id)?.ok_or(Error::BlipNotFound { id })?;
        tx.execute("DELETE FROM radar_blips WHERE id = ?1", [id])?;
        tx.commit()?;

        info!("Deleted blip {} '{}'", id, blip.name);
        Ok(blip)
    }

    /// Get a blip with its history (newest first) and competency area.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BlipNotFound`] if the blip does not exist, or an
    /// error if the database operation fails.
    pub fn get(&self, id: i64) -> Result<BlipRecord> {
        // One read transaction so the blip and its history come from the same snapshot
        let tx = self.conn.unchecked_transaction()?;
        let blip = fetch_blip(&tx, id)?.ok_or(Error::BlipNotFound { id })?;
        let history = fetch_history(&tx, id)?;
        let competency_area = match blip.competency_area_id {
            Some(area) => fetch_area(&tx, area)?,
            None => None,
        };
        tx.finish()?;

        Ok(BlipRecord {
            blip,
            history,
            competency_area,
        })
    }

    /// Get the history of one blip, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BlipNotFound`] if the blip does not exist, or an
    /// error if the database operation fails.
    pub fn history(&self, id: i64) -> Result<Vec<HistoryEntry>> {
        let tx = self.conn.unchecked_transaction()?;
        if fetch_blip(&tx, id)?.is_none() {
            return Err(Error::BlipNotFound { id });
        }
        let history = fetch_history(&tx, id)?;
        tx.finish()?;
        Ok(history)
    }

    /// List all blips, most recently updated first, each with its history.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list(&self) -> Result<Vec<BlipRecord>> {
        let tx = self.conn.unchecked_transaction()?;

        let blips = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {BLIP_COLUMNS} FROM radar_blips ORDER BY updated_at DESC, id DESC"
            ))?;
            let rows = stmt
                .query_map([], row_to_blip)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };

        let mut history: HashMap<i64, Vec<HistoryEntry>> = HashMap::new();
        {
            let mut stmt = tx.prepare(&format!(
                "SELECT {HISTORY_COLUMNS} FROM radar_blip_history \
                 ORDER BY created_at DESC, id DESC"
            ))?;
            for entry in stmt.query_map([], row_to_history)? {
                let entry = entry?;
                history.entry(entry.blip_id).or_default().push(entry);
            }
        }

        let areas: HashMap<i64, CompetencyArea> = {
            let mut stmt = tx.prepare(&format!("SELECT {AREA_COLUMNS} FROM competency_areas"))?;
            let rows = stmt
                .query_map([], row_to_area)?
                .map(|area| area.map(|a| (a.id, a)))
                .collect::<std::result::Result<HashMap<_, _>, _>>()?;
            rows
        };
        tx.finish()?;

        debug!("Listed {} blips", blips.len());
        Ok(blips
            .into_iter()
            .map(|blip| {
                let history = history.remove(&blip.id).unwrap_or_default();
                if history.is_empty() {
                    warn!("Blip {} has no history entries", blip.id);
                }
                BlipRecord {
                    history,
                    competency_area: blip
                        .competency_area_id
                        .and_then(|a| areas.get(&a).cloned()),
                    blip,
                }
            })
            .collect())
    }

    /// Count total blips in storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM radar_blips", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Check the history invariants of every stored blip.
    ///
    /// Each blip must have at least one history entry, only its oldest
    /// entry may lack a `from_ring`, and its newest entry's `to_ring` must
    /// equal its current ring.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] describing the first violation found, or
    /// an error if the database operation fails.
    pub fn verify_invariants(&self) -> Result<()> {
        for record in self.list()? {
            let id = record.blip.id;
            let history = record.chronological_history();
            let (first, rest) = history
                .split_first()
                .ok_or_else(|| Error::internal(format!("blip {id} has no history")))?;
            if !first.is_creation() {
                return Err(Error::internal(format!(
                    "blip {id} history does not start with a creation entry"
                )));
            }
            if rest.iter().any(|h| h.is_creation()) {
                return Err(Error::internal(format!(
                    "blip {id} has more than one creation entry"
                )));
            }
            let last = rest.last().unwrap_or(first);
            if last.to_ring != record.blip.ring {
                return Err(Error::internal(format!(
                    "blip {id} is in {} but its latest history entry says {}",
                    record.blip.ring, last.to_ring
                )));
            }
        }
        Ok(())
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let total_blips = self.count()?;
        let total_history_entries: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM radar_blip_history", [], |row| {
                    row.get(0)
                })?;
        let total_competency_areas: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM competency_areas", [], |row| row.get(0))?;

        let last_updated: Option<String> = self
            .conn
            .query_row(
                "SELECT updated_at FROM radar_blips ORDER BY updated_at DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        let last_updated = last_updated
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_blips,
            total_history_entries,
            total_competency_areas,
            last_updated,
            db_size_bytes,
        })
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Total number of blips stored.
    pub total_blips: i64,
    /// Total number of history entries across all blips.
    pub total_history_entries: i64,
    /// Total number of competency areas.
    pub total_competency_areas: i64,
    /// Most recent blip modification.
    pub last_updated: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

/// Format a timestamp so that lexical order equals chronological order.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn append_history(
    conn: &Connection,
    blip_id: i64,
    from_ring: Option<Ring>,
    to_ring: Ring,
    note: Option<&str>,
    stamp: &str,
) -> Result<i64> {
    conn.execute(
        r"
        INSERT INTO radar_blip_history (blip_id, from_ring, to_ring, note, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ",
        params![blip_id, from_ring, to_ring, note, stamp],
    )?;
    Ok(conn.last_insert_rowid())
}

fn latest_history_time(conn: &Connection, blip_id: i64) -> Result<Option<DateTime<Utc>>> {
    let latest: Option<String> = conn.query_row(
        "SELECT MAX(created_at) FROM radar_blip_history WHERE blip_id = ?1",
        [blip_id],
        |row| row.get(0),
    )?;
    latest
        .map(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| Error::internal(format!("bad history timestamp {raw:?}: {e}")))
        })
        .transpose()
}

fn ensure_area_exists(conn: &Connection, id: i64) -> Result<()> {
    if fetch_area(conn, id)?.is_none() {
        return Err(Error::validation(
            "competencyAreaId",
            format!("competency area {id} does not exist"),
        ));
    }
    Ok(())
}

fn fetch_blip(conn: &Connection, id: i64) -> Result<Option<RadarBlip>> {
    let blip = conn
        .query_row(
            &format!("SELECT {BLIP_COLUMNS} FROM radar_blips WHERE id = ?1"),
            [id],
            row_to_blip,
        )
        .optional()?;
    Ok(blip)
}

fn fetch_history(conn: &Connection, blip_id: i64) -> Result<Vec<HistoryEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {HISTORY_COLUMNS} FROM radar_blip_history WHERE blip_id = ?1 \
         ORDER BY created_at DESC, id DESC"
    ))?;
    let history = stmt
        .query_map([blip_id], row_to_history)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(history)
}

fn fetch_area(conn: &Connection, id: i64) -> Result<Option<CompetencyArea>> {
    let area = conn
        .query_row(
            &format!("SELECT {AREA_COLUMNS} FROM competency_areas WHERE id = ?1"),
            [id],
            row_to_area,
        )
        .optional()?;
    Ok(area)
}

fn row_to_blip(row: &Row) -> rusqlite::Result<RadarBlip> {
    Ok(RadarBlip {
        id: row.get(0)?,
        name: row.get(1)?,
        quadrant: row.get(2)?,
        ring: row.get(3)?,
        description: row.get(4)?,
        rationale: row.get(5)?,
        competency_area_id: row.get(6)?,
        created_at: parse_timestamp(row, 7)?,
        updated_at: parse_timestamp(row, 8)?,
    })
}

fn row_to_history(row: &Row) -> rusqlite::Result<HistoryEntry> {
    Ok(HistoryEntry {
        id: row.get(0)?,
        blip_id: row.get(1)?,
        from_ring: row.get(2)?,
        to_ring: row.get(3)?,
        note: row.get(4)?,
        created_at: parse_timestamp(row, 5)?,
    })
}

fn row_to_area(row: &Row) -> rusqlite::Result<CompetencyArea> {
    Ok(CompetencyArea {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        description: row.get(3)?,
    })
}

impl ToSql for Ring {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Ring {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: Error| FromSqlError::Other(e.to_string().into()))
    }
}

impl ToSql for Quadrant {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Quadrant {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: Error| FromSqlError::Other(e.to_string().into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{classify_record, BlipStatus, Period};
    use chrono::Duration;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    fn new_blip(name: &str, ring: Ring) -> NewBlip {
        NewBlip::new(name, Quadrant::Tools, ring)
    }

    fn history_count(storage: &Storage, blip_id: i64) -> i64 {
        storage
            .conn
            .query_row(
                "SELECT COUNT(*) FROM radar_blip_history WHERE blip_id = ?1",
                [blip_id],
                |row| row.get(0),
            )
            .unwrap()
    }

    #[test]
    fn test_open_in_memory() {
        let storage = Storage::open_in_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_create_writes_creation_entry() {
        let mut storage = create_test_storage();
        let blip = storage
            .create(&new_blip("Docker", Ring::Adopt).with_description("Containers"))
            .unwrap();

        let record = storage.get(blip.id).unwrap();
        assert_eq!(record.blip, blip);
        assert_eq!(record.history.len(), 1);

        let entry = &record.history[0];
        assert!(entry.is_creation());
        assert_eq!(entry.to_ring, Ring::Adopt);
        assert_eq!(entry.note.as_deref(), Some(CREATION_NOTE));
        assert_eq!(entry.created_at, blip.created_at);
    }

    #[test]
    fn test_create_trims_name() {
        let mut storage = create_test_storage();
        let blip = storage.create(&new_blip("  Ansible  ", Ring::Trial)).unwrap();
        assert_eq!(blip.name, "Ansible");
        assert_eq!(storage.get(blip.id).unwrap().blip.name, "Ansible");
    }

    #[test]
    fn test_create_rejects_blank_name() {
        let mut storage = create_test_storage();
        let err = storage.create(&new_blip("  ", Ring::Trial)).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(storage.count().unwrap(), 0);
    }

    #[test]
    fn test_create_rejects_unknown_competency_area() {
        let mut storage = create_test_storage();
        let err = storage
            .create(&new_blip("Zabbix", Ring::Adopt).with_competency_area(99))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(storage.count().unwrap(), 0);
    }

    #[test]
    fn test_ring_change_appends_history() {
        let mut storage = create_test_storage();
        let blip = storage.create(&new_blip("Netbox", Ring::Assess)).unwrap();

        let updated = storage
            .update(blip.id, &BlipUpdate::move_to(Ring::Trial).with_note("pilot ok"))
            .unwrap();
        assert_eq!(updated.ring, Ring::Trial);

        let history = storage.history(blip.id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].from_ring, Some(Ring::Assess));
        assert_eq!(history[0].to_ring, Ring::Trial);
        assert_eq!(history[0].note.as_deref(), Some("pilot ok"));
        assert!(history[1].is_creation());
    }

    #[test]
    fn test_same_ring_update_appends_nothing() {
        let mut storage = create_test_storage();
        let blip = storage.create(&new_blip("Jira", Ring::Adopt)).unwrap();

        let update = BlipUpdate {
            ring: Some(Ring::Adopt),
            name: Some("Jira Cloud".to_string()),
            rationale: Some(Some("Used everywhere".to_string())),
            history_note: Some("ignored".to_string()),
            ..BlipUpdate::default()
        };
        let updated = storage.update(blip.id, &update).unwrap();

        assert_eq!(updated.name, "Jira Cloud");
        assert_eq!(updated.rationale.as_deref(), Some("Used everywhere"));
        assert_eq!(history_count(&storage, blip.id), 1);
    }

    #[test]
    fn test_update_clears_optional_fields() {
        let mut storage = create_test_storage();
        let area = storage
            .create_competency_area("Automation", Some("Tools"), None)
            .unwrap();
        let blip = storage
            .create(
                &new_blip("Ansible", Ring::Trial)
                    .with_description("Config management")
                    .with_competency_area(area.id),
            )
            .unwrap();

        let update = BlipUpdate {
            description: Some(None),
            competency_area_id: Some(None),
            ..BlipUpdate::default()
        };
        storage.update(blip.id, &update).unwrap();

        let record = storage.get(blip.id).unwrap();
        assert!(record.blip.description.is_none());
        assert!(record.blip.competency_area_id.is_none());
        assert!(record.competency_area.is_none());
    }

    #[test]
    fn test_backdated_ring_change_rejected() {
        let mut storage = create_test_storage();
        let now = Utc::now();
        let blip = storage
            .create_at(&new_blip("Backdated", Ring::Assess), now - Duration::days(10))
            .unwrap();
        storage
            .update_at(blip.id, &BlipUpdate::move_to(Ring::Trial), now - Duration::days(2))
            .unwrap();

        let err = storage
            .update_at(blip.id, &BlipUpdate::move_to(Ring::Adopt), now - Duration::days(5))
            .unwrap_err();
        assert!(err.is_validation());

        let record = storage.get(blip.id).unwrap();
        assert_eq!(record.blip.ring, Ring::Trial);
        assert_eq!(record.history.len(), 2);
        storage.verify_invariants().unwrap();

        // Field-only edits carry no history and may be backdated.
        let rename = BlipUpdate {
            name: Some("Renamed".to_string()),
            ..BlipUpdate::default()
        };
        storage
            .update_at(blip.id, &rename, now - Duration::days(5))
            .unwrap();
        storage
            .update_at(blip.id, &BlipUpdate::move_to(Ring::Adopt), now - Duration::days(2))
            .unwrap();
        storage.verify_invariants().unwrap();
    }

    #[test]
    fn test_update_not_found() {
        let mut storage = create_test_storage();
        let err = storage
            .update(404, &BlipUpdate::move_to(Ring::Hold))
            .unwrap_err();
        assert!(matches!(err, Error::BlipNotFound { id: 404 }));
    }

    #[test]
    fn test_update_rejects_blank_name_without_writing() {
        let mut storage = create_test_storage();
        let blip = storage.create(&new_blip("Docker", Ring::Adopt)).unwrap();

        let update = BlipUpdate {
            name: Some(" ".to_string()),
            ring: Some(Ring::Hold),
            ..BlipUpdate::default()
        };
        assert!(storage.update(blip.id, &update).unwrap_err().is_validation());

        let record = storage.get(blip.id).unwrap();
        assert_eq!(record.blip.ring, Ring::Adopt);
        assert_eq!(record.history.len(), 1);
    }

    #[test]
    fn test_failed_history_append_rolls_back_update() {
        let mut storage = create_test_storage();
        let blip = storage.create(&new_blip("GPON", Ring::Trial)).unwrap();

        storage
            .conn
            .execute_batch(
                r"
                CREATE TRIGGER fail_transition BEFORE INSERT ON radar_blip_history
                WHEN NEW.from_ring IS NOT NULL
                BEGIN SELECT RAISE(ABORT, 'history append failed'); END;
                ",
            )
            .unwrap();

        let update = BlipUpdate {
            name: Some("GPON v2".to_string()),
            ring: Some(Ring::Adopt),
            ..BlipUpdate::default()
        };
        let err = storage.update(blip.id, &update).unwrap_err();
        assert!(err.is_storage());

        let record = storage.get(blip.id).unwrap();
        assert_eq!(record.blip.ring, Ring::Trial);
        assert_eq!(record.blip.name, "GPON");
        assert_eq!(record.blip.updated_at, blip.updated_at);
        assert_eq!(record.history.len(), 1);
        storage.verify_invariants().unwrap();
    }

    #[test]
    fn test_failed_creation_entry_rolls_back_create() {
        let mut storage = create_test_storage();
        storage
            .conn
            .execute_batch(
                r"
                CREATE TRIGGER fail_history BEFORE INSERT ON radar_blip_history
                BEGIN SELECT RAISE(ABORT, 'history append failed'); END;
                ",
            )
            .unwrap();

        let err = storage.create(&new_blip("DWDM", Ring::Adopt)).unwrap_err();
        assert!(err.is_storage());
        assert_eq!(storage.count().unwrap(), 0);
    }

    #[test]
    fn test_delete_cascades_history() {
        let mut storage = create_test_storage();
        let keep = storage.create(&new_blip("Keep", Ring::Adopt)).unwrap();
        let gone = storage.create(&new_blip("Gone", Ring::Hold)).unwrap();
        storage
            .update(gone.id, &BlipUpdate::move_to(Ring::Assess))
            .unwrap();
        assert_eq!(history_count(&storage, gone.id), 2);

        let deleted = storage.delete(gone.id).unwrap();
        assert_eq!(deleted.name, "Gone");
        assert_eq!(history_count(&storage, gone.id), 0);

        let records = storage.list().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].blip.id, keep.id);
        assert!(records
            .iter()
            .flat_map(|r| &r.history)
            .all(|h| h.blip_id != gone.id));
        assert!(matches!(
            storage.get(gone.id).unwrap_err(),
            Error::BlipNotFound { .. }
        ));
    }

    #[test]
    fn test_delete_not_found() {
        let mut storage = create_test_storage();
        assert!(storage.delete(99999).unwrap_err().is_not_found());
    }

    #[test]
    fn test_history_not_found() {
        let storage = create_test_storage();
        assert!(storage.history(5).unwrap_err().is_not_found());
    }

    #[test]
    fn test_list_orders_by_updated_desc() {
        let mut storage = create_test_storage();
        let now = Utc::now();
        let a = storage
            .create_at(&new_blip("A", Ring::Adopt), now - Duration::days(3))
            .unwrap();
        let b = storage
            .create_at(&new_blip("B", Ring::Adopt), now - Duration::days(2))
            .unwrap();
        storage
            .update_at(a.id, &BlipUpdate::move_to(Ring::Trial), now)
            .unwrap();

        let ids: Vec<i64> = storage.list().unwrap().iter().map(|r| r.blip.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[test]
    fn test_list_includes_history_and_area() {
        let mut storage = create_test_storage();
        let area = storage
            .create_competency_area("Fiber optics", Some("network-technology"), None)
            .unwrap();
        let blip = storage
            .create(&new_blip("XGS-PON", Ring::Assess).with_competency_area(area.id))
            .unwrap();
        storage
            .update(blip.id, &BlipUpdate::move_to(Ring::Adopt))
            .unwrap();

        let records = storage.list().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].history.len(), 2);
        assert_eq!(records[0].competency_area.as_ref(), Some(&area));
    }

    #[test]
    fn test_history_newest_first() {
        let mut storage = create_test_storage();
        let now = Utc::now();
        let blip = storage
            .create_at(&new_blip("Agile", Ring::Hold), now - Duration::days(30))
            .unwrap();
        storage
            .update_at(
                blip.id,
                &BlipUpdate::move_to(Ring::Assess),
                now - Duration::days(20),
            )
            .unwrap();
        storage
            .update_at(
                blip.id,
                &BlipUpdate::move_to(Ring::Trial),
                now - Duration::days(10),
            )
            .unwrap();

        let history = storage.history(blip.id).unwrap();
        let rings: Vec<Ring> = history.iter().map(|h| h.to_ring).collect();
        assert_eq!(rings, vec![Ring::Trial, Ring::Assess, Ring::Hold]);
    }

    #[test]
    fn test_invariants_hold_after_mixed_updates() {
        let mut storage = create_test_storage();
        let a = storage.create(&new_blip("A", Ring::Hold)).unwrap();
        let b = storage.create(&new_blip("B", Ring::Trial)).unwrap();

        for ring in [Ring::Assess, Ring::Assess, Ring::Trial, Ring::Adopt, Ring::Hold] {
            storage.update(a.id, &BlipUpdate::move_to(ring)).unwrap();
        }
        storage
            .update(
                b.id,
                &BlipUpdate {
                    quadrant: Some(Quadrant::Methods),
                    ..BlipUpdate::default()
                },
            )
            .unwrap();

        storage.verify_invariants().unwrap();
        assert_eq!(history_count(&storage, a.id), 5);
        assert_eq!(history_count(&storage, b.id), 1);

        let record = storage.get(a.id).unwrap();
        let chronological = record.chronological_history();
        assert_eq!(chronological.last().unwrap().to_ring, record.blip.ring);
        assert!(chronological[1..].iter().all(|h| !h.is_creation()));
    }

    #[test]
    fn test_verify_invariants_detects_drift() {
        let mut storage = create_test_storage();
        let blip = storage.create(&new_blip("Drift", Ring::Trial)).unwrap();
        storage
            .conn
            .execute(
                "UPDATE radar_blips SET ring = 'hold' WHERE id = ?1",
                [blip.id],
            )
            .unwrap();

        let err = storage.verify_invariants().unwrap_err();
        assert!(err.to_string().contains("latest history entry"));
    }

    #[test]
    fn test_stored_history_classifies() {
        let mut storage = create_test_storage();
        let now = Utc::now();
        let blip = storage
            .create_at(&new_blip("Radar", Ring::Assess), now - Duration::days(100))
            .unwrap();
        storage
            .update_at(
                blip.id,
                &BlipUpdate::move_to(Ring::Trial),
                now - Duration::days(40),
            )
            .unwrap();
        storage
            .update_at(
                blip.id,
                &BlipUpdate::move_to(Ring::Adopt),
                now - Duration::days(10),
            )
            .unwrap();

        let record = storage.get(blip.id).unwrap();
        assert_eq!(
            classify_record(&record, Period::days(90).unwrap(), now),
            BlipStatus::MovedIn
        );
        assert_eq!(
            classify_record(&record, Period::days(5).unwrap(), now),
            BlipStatus::Unchanged
        );
    }

    #[test]
    fn test_timestamps_round_trip() {
        let mut storage = create_test_storage();
        let at = DateTime::parse_from_rfc3339("2024-03-01T12:30:45.123456Z")
            .unwrap()
            .with_timezone(&Utc);
        let blip = storage.create_at(&new_blip("Time", Ring::Hold), at).unwrap();
        let record = storage.get(blip.id).unwrap();
        assert_eq!(record.blip.created_at, at);
        assert_eq!(record.history[0].created_at, at);
    }

    #[test]
    fn test_competency_areas() {
        let storage = create_test_storage();
        let b = storage
            .create_competency_area("Project management", Some("methods"), Some("Planning"))
            .unwrap();
        let a = storage
            .create_competency_area("DWDM / transport", None, None)
            .unwrap();

        assert_eq!(storage.get_competency_area(b.id).unwrap(), b);
        let names: Vec<String> = storage
            .list_competency_areas()
            .unwrap()
            .into_iter()
            .map(|area| area.name)
            .collect();
        assert_eq!(names, vec![a.name, b.name]);
        assert!(storage.get_competency_area(42).unwrap_err().is_not_found());
        assert!(storage
            .create_competency_area("", None, None)
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_stats() {
        let mut storage = create_test_storage();
        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_blips, 0);
        assert!(stats.last_updated.is_none());

        let blip = storage.create(&new_blip("One", Ring::Trial)).unwrap();
        storage
            .update(blip.id, &BlipUpdate::move_to(Ring::Adopt))
            .unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_blips, 1);
        assert_eq!(stats.total_history_entries, 2);
        assert_eq!(stats.total_competency_areas, 0);
        assert!(stats.last_updated.is_some());
        assert_eq!(stats.db_size_bytes, 0);
    }

    #[test]
    fn test_open_file_based_persists() {
        let db_path = std::env::temp_dir().join(format!(
            "techradar_test_{}.db",
            std::process::id()
        ));

        {
            let mut storage = Storage::open(&db_path).unwrap();
            storage.create(&new_blip("Persisted", Ring::Adopt)).unwrap();
            assert_eq!(storage.path(), db_path);
        }

        let storage = Storage::open(&db_path).unwrap();
        let records = storage.list().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].history.len(), 1);
        assert!(storage.stats().unwrap().db_size_bytes > 0);

        drop(storage);
        let _ = std::fs::remove_file(&db_path);
        let _ = std::fs::remove_file(db_path.with_extension("db-wal"));
        let _ = std::fs::remove_file(db_path.with_extension("db-shm"));
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let nested_path = std::env::temp_dir().join(format!(
            "techradar_test_{}/nested/radar.db",
            std::process::id()
        ));
        if let Some(parent) = nested_path.parent() {
            let _ = std::fs::remove_dir_all(parent);
        }

        let storage = Storage::open(&nested_path).unwrap();
        assert!(nested_path.exists());

        drop(storage);
        if let Some(root) = nested_path.parent().and_then(Path::parent) {
            let _ = std::fs::remove_dir_all(root);
        }
    }

    #[test]
    fn test_unknown_ring_in_database_is_an_error() {
        let storage = create_test_storage();
        storage
            .conn
            .execute(
                "INSERT INTO radar_blips (name, quadrant, ring, created_at, updated_at) \
                 VALUES ('Bad', 'tools', 'later', '2024-01-01T00:00:00.000000Z', \
                 '2024-01-01T00:00:00.000000Z')",
                [],
            )
            .unwrap();

        assert!(storage.list().unwrap_err().is_storage());
    }
}
