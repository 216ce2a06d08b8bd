/// Mapping manifest
///
/// Known-good image lists for specific listings, kept in a reviewable JSON
/// file instead of in code:
///
/// ```json
/// [
///   { "id": 12, "images": ["property-1700000000000-1.jpg"], "note": "restored from backup" }
/// ]
/// ```
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestEntry {
    pub id: i64,
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Image lists keyed by listing id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: BTreeMap<i64, Vec<String>>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Manifest(format!("cannot read {}: {}", path.display(), e)))?;
        let entries: Vec<ManifestEntry> = serde_json::from_str(&text)
            .map_err(|e| Error::Manifest(format!("cannot parse {}: {}", path.display(), e)))?;
        Self::from_entries(entries)
    }

    /// Each id may appear once.
    pub fn from_entries(entries: Vec<ManifestEntry>) -> Result<Self> {
        let mut manifest = Manifest::default();
        for entry in entries {
            if manifest.entries.insert(entry.id, entry.images).is_some() {
                return Err(Error::Manifest(format!(
                    "listing {} appears more than once",
                    entry.id
                )));
            }
        }
        Ok(manifest)
    }

    pub fn get(&self, id: i64) -> Option<&[String]> {
        self.entries.get(&id).map(Vec::as_slice)
    }

    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
