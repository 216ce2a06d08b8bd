/// Run configuration
///
/// Every knob the old per-script constants used to hard-code lives here.
/// Values come from an optional JSON file; missing fields fall back to
/// the defaults below and CLI flags override the result.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::state::data::RecordOrder;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// SQLite catalog holding the `properties` table
    pub database: PathBuf,
    /// Directory that `/uploads/<category>/` is served from
    pub serving_dir: PathBuf,
    /// Extra directories scanned for images that still have to be copied
    /// into `serving_dir` before they can be referenced
    pub staging_dirs: Vec<PathBuf>,
    /// Path segment used in canonical references (`/uploads/<category>/x.jpg`)
    pub category: String,
    /// Descend into subdirectories of each root
    pub recursive: bool,
    /// Open each image header and treat undecodable files as corrupt
    pub probe_headers: bool,
    /// Records with fewer valid images than this get backfilled
    pub min_images: usize,
    /// Upper bound on files assigned to one record in one run
    pub max_backfill: usize,
    /// Proximity window around `created_at`, in minutes
    pub window_minutes: i64,
    /// Order records are reconciled in
    pub order: RecordOrder,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database_path(),
            serving_dir: PathBuf::from("uploads/properties"),
            staging_dirs: Vec::new(),
            category: "properties".to_string(),
            recursive: false,
            probe_headers: false,
            min_images: 1,
            max_backfill: 3,
            window_minutes: 120,
            order: RecordOrder::Id,
        }
    }
}

impl Config {
    /// Load the config file if one is given, otherwise use defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("cannot read {}: {}", path.display(), e))
                })?;
                serde_json::from_str(&text).map_err(|e| {
                    Error::Config(format!("cannot parse {}: {}", path.display(), e))
                })?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.category.is_empty() || self.category.contains(['/', '\\']) {
            return Err(Error::Config(format!(
                "category must be a single path segment, got {:?}",
                self.category
            )));
        }
        if self.window_minutes < 0 {
            return Err(Error::Config(format!(
                "window_minutes must not be negative, got {}",
                self.window_minutes
            )));
        }
        if chrono::Duration::try_minutes(self.window_minutes).is_none() {
            return Err(Error::Config(format!(
                "window_minutes is out of range, got {}",
                self.window_minutes
            )));
        }
        if self.min_images > 0 && self.max_backfill == 0 {
            return Err(Error::Config(
                "max_backfill must be at least 1 when min_images is set".to_string(),
            ));
        }
        Ok(())
    }

    /// Serving directory first, then staging roots in configured order.
    /// Earlier roots win when the same filename exists twice, unless the
    /// earlier file is empty or corrupt.
    pub fn asset_roots(&self) -> Vec<PathBuf> {
        let mut roots = Vec::with_capacity(1 + self.staging_dirs.len());
        roots.push(self.serving_dir.clone());
        roots.extend(self.staging_dirs.iter().cloned());
        roots
    }

    /// Unbounded when `window_minutes` is out of range; `validate` rejects that.
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::try_minutes(self.window_minutes).unwrap_or(chrono::Duration::MAX)
    }
}

/// Get the path where the catalog is stored by default:
/// - Linux: ~/.local/share/listing-images/listings.db
/// - macOS: ~/Library/Application Support/listing-images/listings.db
/// - Windows: %APPDATA%\listing-images\listings.db
fn default_database_path() -> PathBuf {
    let mut path = dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    path.push("listing-images");
    path.push("listings.db");
    path
}
