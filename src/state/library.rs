use chrono::{TimeZone, Utc};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::data::{PropertyRecord, RecordFilter, RecordOrder};
use super::image_list::{self, ParsedImages};
use crate::error::Result;

/// Read/write access to listing rows, as far as reconciliation needs it.
pub trait RecordStore {
    /// Records matching `filter`, in the filter's order.
    fn records(&self, filter: &RecordFilter) -> Result<Vec<PropertyRecord>>;

    /// Replace the whole image list of one record.
    fn update_images(&mut self, id: i64, images: &[String]) -> Result<()>;
}

/// The Library manages the SQLite catalog of property listings.
/// Only the columns reconciliation touches are modelled here.
pub struct Library {
    conn: Connection,
    db_path: PathBuf,
}

impl Library {
    /// Open (or create) the catalog at `db_path` and make sure the schema exists.
    pub fn open(db_path: &Path) -> Result<Self> {
        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;

        println!("📁 Catalog opened at: {}", db_path.display());

        let library = Library {
            conn,
            db_path: db_path.to_path_buf(),
        };
        library.init_schema()?;

        Ok(library)
    }

    /// Throwaway catalog, used by tests.
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let library = Library {
            conn: Connection::open_in_memory()?,
            db_path: PathBuf::from(":memory:"),
        };
        library.init_schema()?;
        Ok(library)
    }

    /// Create the properties table and its index if they don't exist.
    fn init_schema(&self) -> Result<()> {
        // created_at is epoch milliseconds; images is a JSON array of paths
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS properties (
                id              INTEGER PRIMARY KEY,
                title           TEXT NOT NULL DEFAULT '',
                created_at      INTEGER NOT NULL,
                images          TEXT
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_properties_created_at
             ON properties(created_at)",
            [],
        )?;

        debug!(path = %self.db_path.display(), "catalog schema ready");

        Ok(())
    }

    /// Get the path to the database file
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    /// Get a count of listings in the catalog
    pub fn property_count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM properties", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Insert a listing with a raw `images` value, stored exactly as given.
    #[cfg(test)]
    pub fn insert_property(
        &self,
        id: i64,
        title: &str,
        created_at: chrono::DateTime<Utc>,
        images: Option<&str>,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO properties (id, title, created_at, images) VALUES (?1, ?2, ?3, ?4)",
            params![id, title, created_at.timestamp_millis(), images],
        )?;
        Ok(())
    }

    /// Raw stored `images` value of one listing.
    #[cfg(test)]
    pub fn stored_images(&self, id: i64) -> Result<Option<String>> {
        let images = self.conn.query_row(
            "SELECT images FROM properties WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(images)
    }
}

impl RecordStore for Library {
    fn records(&self, filter: &RecordFilter) -> Result<Vec<PropertyRecord>> {
        let order_by = match filter.order {
            RecordOrder::Id => "id ASC",
            RecordOrder::CreatedAt => "created_at ASC, id ASC",
        };
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, title, created_at, images FROM properties
             WHERE id >= ?1
             ORDER BY {}",
            order_by
        ))?;

        let rows = stmt.query_map(params![filter.min_id.unwrap_or(i64::MIN)], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, title, created_at_ms, raw_images) = row?;

            let Some(created_at) = Utc.timestamp_millis_opt(created_at_ms).single() else {
                warn!(id, created_at_ms, "listing has an out-of-range created_at, skipped");
                continue;
            };

            let (images, repaired) = match image_list::parse_image_list(raw_images.as_deref()) {
                ParsedImages::Clean(images) => (images, false),
                ParsedImages::Repaired(images) => {
                    debug!(id, raw = ?raw_images, "repaired malformed images value");
                    (images, true)
                }
                ParsedImages::Unreadable => {
                    warn!(id, raw = ?raw_images, "unreadable images value, treating as empty");
                    (Vec::new(), true)
                }
            };

            let record = PropertyRecord {
                id,
                title,
                created_at,
                images,
                repaired,
            };
            if filter.matches(&record) {
                records.push(record);
            }
        }

        Ok(records)
    }

    fn update_images(&mut self, id: i64, images: &[String]) -> Result<()> {
        let json = image_list::to_json(images)?;
        let changed = self.conn.execute(
            "UPDATE properties SET images = ?1 WHERE id = ?2",
            params![json, id],
        )?;
        if changed == 0 {
            return Err(rusqlite::Error::QueryReturnedNoRows.into());
        }
        Ok(())
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("db_path", &self.db_path)
            .finish()
    }
}
