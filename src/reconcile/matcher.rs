/// Backfill selection
///
/// Picks replacement files for a record from the pool of files nobody has
/// claimed yet. Files whose embedded timestamp lies inside the window around
/// the record's creation time go first, closest first. Only when those run
/// out do the fallbacks apply: nearest timestamped files regardless of the
/// window, then untimestamped files in listing order.
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashSet;

use crate::assets::scanner::AssetInventory;
use crate::state::data::ImageFile;

/// Filenames claimed by some record during the current run
#[derive(Debug, Clone, Default)]
pub struct UsedFiles {
    claimed: HashSet<String>,
}

impl UsedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the file was already claimed.
    pub fn claim(&mut self, filename: &str) -> bool {
        self.claimed.insert(filename.to_string())
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.claimed.contains(filename)
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}

/// Which policy produced a backfilled file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackfillSource {
    /// Timestamp within the window
    Proximity,
    /// Timestamped, outside the window, nearest first
    Nearest,
    /// No timestamp, listing order
    Sequential,
}

impl std::fmt::Display for BackfillSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackfillSource::Proximity => write!(f, "proximity"),
            BackfillSource::Nearest => write!(f, "nearest"),
            BackfillSource::Sequential => write!(f, "sequential"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Backfill<'a> {
    pub file: &'a ImageFile,
    pub source: BackfillSource,
}

/// Select and claim up to `count` unused files for a record created at `anchor`.
pub fn select_backfill<'a>(
    inventory: &'a AssetInventory,
    anchor: DateTime<Utc>,
    count: usize,
    window: Duration,
    used: &mut UsedFiles,
) -> Vec<Backfill<'a>> {
    if count == 0 {
        return Vec::new();
    }

    let window_ms = window.num_milliseconds();
    let mut timed = Vec::new();
    let mut untimed = Vec::new();

    for file in inventory.files() {
        if !file.is_usable() || used.contains(&file.filename) {
            continue;
        }
        match file.timestamp {
            Some(ts) => timed.push(((ts - anchor).num_milliseconds().abs(), file)),
            None => untimed.push(file),
        }
    }

    // Stable sort: equal distances keep listing order
    timed.sort_by_key(|(distance, _)| *distance);

    let ranked = timed
        .into_iter()
        .map(|(distance, file)| {
            let source = if distance <= window_ms {
                BackfillSource::Proximity
            } else {
                BackfillSource::Nearest
            };
            Backfill { file, source }
        })
        .chain(untimed.into_iter().map(|file| Backfill {
            file,
            source: BackfillSource::Sequential,
        }));

    let mut selected = Vec::with_capacity(count);
    for candidate in ranked {
        if selected.len() == count {
            break;
        }
        if used.claim(&candidate.file.filename) {
            selected.push(candidate);
        }
    }

    selected
}
