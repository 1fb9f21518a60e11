//! Location cache and position-estimate log backed by SQLite.
//!
//! Access-point locations are insert-only: the first coordinate recorded for
//! a BSSID is authoritative and later inserts for the same key are no-ops.
//! Position estimates are an append-only log.

use crate::bssid::Bssid;
use crate::geo::Coordinate;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

/// Optional descriptive columns carried by area-search results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryMetadata {
    pub last_update: Option<String>,
    pub road: Option<String>,
    pub channel: Option<i64>,
    pub house_number: Option<String>,
}

/// A cached access-point location.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub bssid: Bssid,
    pub position: Coordinate,
    pub metadata: EntryMetadata,
}

impl CacheEntry {
    /// Entry with no metadata, as produced by single-BSSID resolution.
    pub fn bare(bssid: Bssid, position: Coordinate) -> Self {
        Self {
            bssid,
            position,
            metadata: EntryMetadata::default(),
        }
    }
}

/// One row of the position-estimate log.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionEstimate {
    pub scan_id: i64,
    pub timestamp: DateTime<Utc>,
    pub position: Coordinate,
}

/// SQLite-backed location store.
///
/// # Schema
/// ```sql
/// CREATE TABLE ap_locations (
///     bssid TEXT PRIMARY KEY,          -- canonical uppercase form
///     lat REAL NOT NULL,
///     lon REAL NOT NULL,
///     lastupdt TEXT,
///     road TEXT,
///     channel INTEGER,
///     housenumber TEXT
/// );
/// CREATE TABLE position_estimates (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     scan_id INTEGER NOT NULL,
///     timestamp TEXT NOT NULL,          -- RFC 3339
///     est_lat REAL NOT NULL,
///     est_lon REAL NOT NULL
/// );
/// ```
///
/// # Thread Safety
/// - Connection is wrapped in Mutex for safe concurrent access
/// - Insert-if-absent atomicity comes from the PRIMARY KEY constraint, so
///   concurrent writers racing on the same BSSID cannot overwrite each other
pub struct LocationStore {
    conn: Mutex<Connection>,
}

impl LocationStore {
    /// Creates or opens a location store.
    ///
    /// # Arguments
    /// * `db_path` - Path to SQLite database file (":memory:" for tests)
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path).context("Failed to open database")?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS ap_locations (
                bssid TEXT PRIMARY KEY,
                lat REAL NOT NULL,
                lon REAL NOT NULL,
                lastupdt TEXT,
                road TEXT,
                channel INTEGER,
                housenumber TEXT
            )
            "#,
            [],
        )
        .context("Failed to create ap_locations table")?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS position_estimates (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                scan_id INTEGER NOT NULL,
                timestamp TEXT NOT NULL,
                est_lat REAL NOT NULL,
                est_lon REAL NOT NULL
            )
            "#,
            [],
        )
        .context("Failed to create position_estimates table")?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_estimates_timestamp ON position_estimates(timestamp)",
            [],
        )
        .context("Failed to create index")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Looks up the cached location for a BSSID.
    ///
    /// # Returns
    /// * `Ok(Some(Coordinate))` - Cached location found
    /// * `Ok(None)` - BSSID not in the cache (not an error)
    /// * `Err` - If the database operation fails
    pub fn lookup(&self, bssid: &Bssid) -> Result<Option<Coordinate>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT lat, lon FROM ap_locations WHERE bssid = ?1")
            .context("Failed to prepare lookup")?;

        let mut rows = stmt
            .query(params![bssid.as_str()])
            .context("Failed to execute lookup")?;

        if let Some(row) = rows.next().context("Failed to read row")? {
            Ok(Some(Coordinate {
                lat: row.get(0)?,
                lon: row.get(1)?,
            }))
        } else {
            Ok(None)
        }
    }

    /// Inserts a location unless the BSSID already has one.
    ///
    /// The first recorded location wins; a repeated insert with a different
    /// coordinate leaves the existing row untouched.
    ///
    /// # Returns
    /// * `Ok(true)` - This call created the row
    /// * `Ok(false)` - The BSSID was already present
    /// * `Err` - If the database operation fails
    pub fn insert_if_absent(&self, entry: &CacheEntry) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let inserted = conn
            .execute(
                r#"
                INSERT OR IGNORE INTO ap_locations
                    (bssid, lat, lon, lastupdt, road, channel, housenumber)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    entry.bssid.as_str(),
                    entry.position.lat,
                    entry.position.lon,
                    entry.metadata.last_update,
                    entry.metadata.road,
                    entry.metadata.channel,
                    entry.metadata.house_number,
                ],
            )
            .context("Failed to insert location")?;

        Ok(inserted > 0)
    }

    /// Inserts a batch of locations, skipping BSSIDs already present.
    ///
    /// Runs in a single transaction: a storage error rolls the whole batch
    /// back and is reported rather than leaving part of it behind silently.
    ///
    /// # Returns
    /// * `Ok(count)` - Number of rows this call actually created
    pub fn bulk_insert_if_absent(&self, entries: &[CacheEntry]) -> Result<usize> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().context("Failed to begin transaction")?;

        let mut inserted = 0;
        for entry in entries {
            let changed = tx
                .execute(
                    r#"
                    INSERT OR IGNORE INTO ap_locations
                        (bssid, lat, lon, lastupdt, road, channel, housenumber)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    "#,
                    params![
                        entry.bssid.as_str(),
                        entry.position.lat,
                        entry.position.lon,
                        entry.metadata.last_update,
                        entry.metadata.road,
                        entry.metadata.channel,
                        entry.metadata.house_number,
                    ],
                )
                .context("Failed to insert location batch")?;
            inserted += changed;
        }

        tx.commit().context("Failed to commit location batch")?;
        Ok(inserted)
    }

    /// Appends a position estimate to the log.
    pub fn append_estimate(
        &self,
        scan_id: i64,
        timestamp: DateTime<Utc>,
        position: Coordinate,
    ) -> Result<()> {
        self.conn
            .lock()
            .unwrap()
            .execute(
                r#"
                INSERT INTO position_estimates (scan_id, timestamp, est_lat, est_lon)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![
                    scan_id,
                    timestamp.to_rfc3339(),
                    position.lat,
                    position.lon
                ],
            )
            .context("Failed to append estimate")?;

        Ok(())
    }

    /// Returns estimates newer than `cutoff`, oldest first.
    pub fn estimates_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<PositionEstimate>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                r#"
                SELECT scan_id, timestamp, est_lat, est_lon
                FROM position_estimates
                WHERE timestamp > ?1
                ORDER BY timestamp
                "#,
            )
            .context("Failed to prepare estimates query")?;

        let estimates = stmt
            .query_map(params![cutoff.to_rfc3339()], |row| {
                let timestamp: String = row.get(1)?;
                Ok((
                    row.get::<_, i64>(0)?,
                    timestamp,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                ))
            })
            .context("Failed to execute estimates query")?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read results")?;

        estimates
            .into_iter()
            .map(|(scan_id, timestamp, lat, lon)| {
                let timestamp = DateTime::parse_from_rfc3339(&timestamp)
                    .map(|dt| dt.with_timezone(&Utc))
                    .context("Failed to parse estimate timestamp")?;
                Ok(PositionEstimate {
                    scan_id,
                    timestamp,
                    position: Coordinate { lat, lon },
                })
            })
            .collect()
    }
}
