/// Shared data structures
///
/// These structs represent the data model that flows between
/// the asset scan, the catalog and the reconciler.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Represents a single image file found on disk
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    /// Filename only (e.g., "property-1700000000000-482913.jpg")
    pub filename: String,
    /// Where the file was found
    pub path: PathBuf,
    /// Upload instant embedded in the filename, if it follows the convention
    pub timestamp: Option<DateTime<Utc>>,
    /// Size on disk in bytes
    pub size_bytes: u64,
    /// False when header probing found the file undecodable
    pub readable: bool,
}

impl ImageFile {
    /// Zero-byte and undecodable files never count as present.
    pub fn is_usable(&self) -> bool {
        self.size_bytes > 0 && self.readable
    }
}

/// Represents a single listing row in the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRecord {
    /// Unique database ID
    pub id: i64,
    /// Listing title, only used in log lines
    pub title: String,
    /// Creation instant, the anchor for proximity matching
    pub created_at: DateTime<Utc>,
    /// Image references, primary photo first
    pub images: Vec<String>,
    /// The stored value was not a clean JSON array and needs rewriting
    pub repaired: bool,
}

/// Which records the record scan returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Only records whose image list is empty after parsing
    pub only_empty: bool,
    /// Only records with `id >= min_id`
    pub min_id: Option<i64>,
    pub order: RecordOrder,
}

impl RecordFilter {
    pub fn matches(&self, record: &PropertyRecord) -> bool {
        if self.only_empty && !record.images.is_empty() {
            return false;
        }
        match self.min_id {
            Some(min_id) => record.id >= min_id,
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOrder {
    #[default]
    Id,
    CreatedAt,
}
