/// Staged files
///
/// Images found under a staging root are only referenceable once a copy
/// exists in the serving directory. A copy counts as done when the target
/// exists with the source's exact size.
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::scanner::AssetInventory;
use crate::error::{Error, Result};
use crate::state::data::ImageFile;

/// What committing one file to the serving directory did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The file already lives in (or has a verified copy in) the serving directory
    AlreadyServed,
    /// The file was copied and the copy verified
    Copied,
    /// Dry run: the file would have been copied
    WouldCopy,
}

/// Counters for a `migrate` pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    pub copied: usize,
    pub already_served: usize,
    pub skipped_unusable: usize,
    pub failed: usize,
}

/// Where `file` lives once served.
pub fn served_path(serving_dir: &Path, file: &ImageFile) -> PathBuf {
    serving_dir.join(&file.filename)
}

/// Make sure `file` is present in `serving_dir`, copying and verifying it if needed.
pub fn commit(file: &ImageFile, serving_dir: &Path, dry_run: bool) -> Result<CommitOutcome> {
    let target = served_path(serving_dir, file);
    if file.path == target {
        return Ok(CommitOutcome::AlreadyServed);
    }

    if let Ok(metadata) = fs::metadata(&target) {
        if metadata.is_file() && metadata.len() == file.size_bytes {
            return Ok(CommitOutcome::AlreadyServed);
        }
        warn!(
            target = %target.display(),
            found = metadata.len(),
            expected = file.size_bytes,
            "serving copy differs from staged file, overwriting"
        );
    }

    if dry_run {
        return Ok(CommitOutcome::WouldCopy);
    }

    fs::create_dir_all(serving_dir)?;
    fs::copy(&file.path, &target)?;

    let found = fs::metadata(&target)?.len();
    if found != file.size_bytes {
        // Don't leave a half-written file where the site would serve it
        if let Err(e) = fs::remove_file(&target) {
            warn!(target = %target.display(), error = %e, "could not remove bad copy");
        }
        return Err(Error::CopyVerification {
            src: file.path.clone(),
            dst: target,
            expected: file.size_bytes,
            found,
        });
    }

    debug!(src = %file.path.display(), dst = %target.display(), "copied staged file");
    Ok(CommitOutcome::Copied)
}

/// Copy every usable staged file into the serving directory.
pub fn migrate(inventory: &AssetInventory, serving_dir: &Path, dry_run: bool) -> MigrationSummary {
    let mut summary = MigrationSummary::default();

    for file in inventory.files() {
        if !file.is_usable() {
            summary.skipped_unusable += 1;
            continue;
        }
        match commit(file, serving_dir, dry_run) {
            Ok(CommitOutcome::AlreadyServed) => summary.already_served += 1,
            Ok(CommitOutcome::Copied) => {
                summary.copied += 1;
                println!("📦 Copied {}", file.filename);
            }
            Ok(CommitOutcome::WouldCopy) => {
                summary.copied += 1;
                println!("📦 Would copy {}", file.filename);
            }
            Err(e) => {
                summary.failed += 1;
                warn!(filename = %file.filename, error = %e, "copy failed");
            }
        }
    }

    summary
}
