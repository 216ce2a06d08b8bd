/// Asset scan
///
/// Lists the image files under each configured root and turns them into an
/// inventory keyed by filename. Nothing on disk is modified.
use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::state::data::ImageFile;

/// Extensions the upload form accepts
const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Options for one scan
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Descend into subdirectories instead of listing direct children only
    pub recursive: bool,
    /// Open each file and check that its header decodes
    pub probe_headers: bool,
}

/// Image files present at scan time, in listing order
#[derive(Debug, Clone, Default)]
pub struct AssetInventory {
    files: Vec<ImageFile>,
    by_name: HashMap<String, usize>,
}

impl AssetInventory {
    /// Build an inventory; the first file with a given name wins, unless it
    /// is unusable and a later one is not.
    pub fn from_files(files: impl IntoIterator<Item = ImageFile>) -> Self {
        let mut inventory = AssetInventory::default();
        for file in files {
            if let Some(&index) = inventory.by_name.get(&file.filename) {
                let earlier = &mut inventory.files[index];
                if !earlier.is_usable() && file.is_usable() {
                    debug!(
                        filename = %file.filename,
                        broken = %earlier.path.display(),
                        path = %file.path.display(),
                        "unusable file replaced by a later copy"
                    );
                    *earlier = file;
                } else {
                    debug!(
                        filename = %file.filename,
                        path = %file.path.display(),
                        "duplicate filename shadowed by an earlier root"
                    );
                }
                continue;
            }
            inventory
                .by_name
                .insert(file.filename.clone(), inventory.files.len());
            inventory.files.push(file);
        }
        inventory
    }

    pub fn get(&self, filename: &str) -> Option<&ImageFile> {
        self.by_name.get(filename).map(|&i| &self.files[i])
    }

    pub fn files(&self) -> &[ImageFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn usable_count(&self) -> usize {
        self.files.iter().filter(|f| f.is_usable()).count()
    }

    pub fn timestamped_count(&self) -> usize {
        self.files.iter().filter(|f| f.timestamp.is_some()).count()
    }
}

/// Scan every root in order. Missing roots contribute nothing.
pub fn scan_roots(roots: &[PathBuf], options: ScanOptions) -> AssetInventory {
    let files = roots
        .iter()
        .flat_map(|root| scan_root(root, options))
        .collect::<Vec<_>>();
    AssetInventory::from_files(files)
}

/// List the image files under one root, in directory-listing order.
pub fn scan_root(root: &Path, options: ScanOptions) -> Vec<ImageFile> {
    if !root.is_dir() {
        warn!(root = %root.display(), "asset directory not found, treating as empty");
        return Vec::new();
    }

    println!("🔍 Scanning folder: {}", root.display());

    let mut walker = WalkDir::new(root).min_depth(1).follow_links(true);
    if !options.recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker.into_iter() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };

        // Only process files (not directories)
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !has_image_extension(path) {
            continue;
        }

        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            warn!(path = %path.display(), "skipping non UTF-8 filename");
            continue;
        };

        let size_bytes = match entry.metadata() {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot stat file, skipping");
                continue;
            }
        };

        let readable = !options.probe_headers || size_bytes == 0 || header_decodes(path);
        if !readable {
            debug!(path = %path.display(), "header does not decode, marking corrupt");
        }

        files.push(ImageFile {
            filename: filename.to_string(),
            path: path.to_path_buf(),
            timestamp: extract_timestamp(filename),
            size_bytes,
            readable,
        });
    }

    files
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

fn header_decodes(path: &Path) -> bool {
    image::ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map(|reader| reader.into_dimensions().is_ok())
        .unwrap_or(false)
}

fn timestamp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // 13 digits of epoch milliseconds, as written by the upload handler
    // ("property-1700000000000-482913.jpg")
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:^|[-_.])(\d{13})(?:[-_.]|$)").expect("timestamp pattern is valid")
    })
}

/// Upload instant embedded in a filename, if it follows the convention.
pub fn extract_timestamp(filename: &str) -> Option<DateTime<Utc>> {
    let stem = Path::new(filename).file_stem()?.to_str()?;
    let digits = timestamp_pattern().captures(stem)?.get(1)?.as_str();
    let millis: i64 = digits.parse().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}
