/// Run reports
///
/// One `RecordReport` per reconciled listing plus run-level totals. Printed
/// as progress lines while the run goes, optionally written out as JSON.
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::Path;

use super::matcher::BackfillSource;
use crate::error::Result;

/// Why a stored reference was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardReason {
    /// No file with that name in the inventory
    Missing,
    /// Zero-byte file
    Empty,
    /// Header does not decode
    Corrupt,
    /// Same file already kept for this listing
    Duplicate,
    /// No filename could be extracted from the reference
    Malformed,
}

impl std::fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscardReason::Missing => write!(f, "missing"),
            DiscardReason::Empty => write!(f, "empty file"),
            DiscardReason::Corrupt => write!(f, "corrupt file"),
            DiscardReason::Duplicate => write!(f, "duplicate"),
            DiscardReason::Malformed => write!(f, "malformed reference"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discarded {
    pub reference: String,
    pub reason: DiscardReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Added {
    pub filename: String,
    pub source: BackfillSource,
}

/// What happened to the stored row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordStatus {
    /// Stored list already correct, nothing written
    Unchanged,
    Updated,
    /// Dry run: the row would have been rewritten
    WouldUpdate,
    /// Copy or write failed; the row keeps its old value
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordReport {
    pub id: i64,
    pub title: String,
    /// References validated: the stored list, or the manifest list when one applies
    pub before: usize,
    pub after: usize,
    pub discarded: Vec<Discarded>,
    pub backfilled: Vec<Added>,
    /// Listing images came from the manifest rather than the stored row
    pub from_manifest: bool,
    pub images: Vec<String>,
    #[serde(flatten)]
    pub status: RecordStatus,
}

impl RecordReport {
    pub fn discarded_count(&self) -> usize {
        self.discarded.len()
    }

    pub fn backfilled_count(&self) -> usize {
        self.backfilled.len()
    }

    /// One progress line, in the same shape for every status.
    pub fn progress_line(&self) -> String {
        let icon = match self.status {
            RecordStatus::Unchanged => "✔️ ",
            RecordStatus::Updated => "✅",
            RecordStatus::WouldUpdate => "📝",
            RecordStatus::Failed { .. } => "❌",
        };
        format!(
            "{} #{} {}: {} → {} images (discarded {}, backfilled {})",
            icon,
            self.id,
            self.title,
            self.before,
            self.after,
            self.discarded_count(),
            self.backfilled_count()
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunTotals {
    pub records: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub discarded: usize,
    pub backfilled: usize,
    /// Listings still below the minimum after backfill
    pub short: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub inventory_files: usize,
    pub min_images: usize,
    pub records: Vec<RecordReport>,
}

impl RunReport {
    pub fn totals(&self) -> RunTotals {
        let mut totals = RunTotals {
            records: self.records.len(),
            ..RunTotals::default()
        };
        for record in &self.records {
            match record.status {
                RecordStatus::Updated | RecordStatus::WouldUpdate => totals.updated += 1,
                RecordStatus::Unchanged => totals.unchanged += 1,
                RecordStatus::Failed { .. } => totals.failed += 1,
            }
            totals.discarded += record.discarded_count();
            totals.backfilled += record.backfilled_count();
            if record.after < self.min_images {
                totals.short += 1;
            }
        }
        totals
    }

    #[cfg(test)]
    pub fn record(&self, id: i64) -> Option<&RecordReport> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
