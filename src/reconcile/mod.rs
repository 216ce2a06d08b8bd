/// Reconciliation
///
/// Aligns each listing's stored image references with the files that are
/// actually on disk:
/// - References are resolved by filename against the asset inventory and
///   rewritten to `/uploads/<category>/<filename>`
/// - Missing, empty, corrupt and duplicate references are dropped
/// - Listings left below the minimum are backfilled (matcher.rs)
/// - Staged files are copied into the serving directory before the row is
///   updated, and the row is only updated when its list actually changed
///
/// Failures on one listing are reported and the run moves on.
pub mod manifest;
pub mod matcher;
pub mod report;

use chrono::{Duration, Utc};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::assets::scanner::AssetInventory;
use crate::assets::staging::{self, CommitOutcome};
use crate::config::Config;
use crate::error::Result;
use crate::state::data::{ImageFile, PropertyRecord, RecordFilter};
use crate::state::library::RecordStore;
use manifest::Manifest;
use matcher::{select_backfill, UsedFiles};
use report::{Added, DiscardReason, Discarded, RecordReport, RecordStatus, RunReport};

/// Knobs for one reconciliation run
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    pub min_images: usize,
    pub max_backfill: usize,
    pub window: Duration,
    pub serving_dir: PathBuf,
    pub category: String,
    pub dry_run: bool,
}

impl ReconcileOptions {
    pub fn from_config(config: &Config, dry_run: bool) -> Self {
        Self {
            min_images: config.min_images,
            max_backfill: config.max_backfill,
            window: config.window(),
            serving_dir: config.serving_dir.clone(),
            category: config.category.clone(),
            dry_run,
        }
    }

    fn canonical_path(&self, filename: &str) -> String {
        format!("/uploads/{}/{}", self.category, filename)
    }
}

/// Filename part of a stored reference.
///
/// Handles `/uploads/properties/a.jpg`, `uploads\properties\a.jpg`,
/// `https://host/uploads/a.jpg?v=2` and plain `a.jpg`.
pub fn reference_filename(reference: &str) -> Option<&str> {
    let without_query = reference.split(['?', '#']).next().unwrap_or_default();
    without_query
        .trim()
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

/// A listing as loaded, with the list that is actually stored for it
struct Candidate {
    record: PropertyRecord,
    stored: Vec<String>,
    from_manifest: bool,
}

impl Candidate {
    fn from_stored(record: PropertyRecord) -> Self {
        Self {
            stored: record.images.clone(),
            record,
            from_manifest: false,
        }
    }
}

/// A listing after validation, before backfill
struct Plan<'a> {
    record: PropertyRecord,
    stored: Vec<String>,
    from_manifest: bool,
    valid: Vec<&'a ImageFile>,
    discarded: Vec<Discarded>,
}

pub struct Reconciler<'a> {
    inventory: &'a AssetInventory,
    options: ReconcileOptions,
}

impl<'a> Reconciler<'a> {
    pub fn new(inventory: &'a AssetInventory, options: ReconcileOptions) -> Self {
        Self { inventory, options }
    }

    /// Reconcile every record matching `filter`.
    ///
    /// Only a failure to read the records is fatal; per-listing copy and
    /// write errors end up in the report.
    pub fn run<S: RecordStore>(
        &self,
        store: &mut S,
        filter: &RecordFilter,
        manifest: Option<&Manifest>,
    ) -> Result<RunReport> {
        let started_at = Utc::now();

        let mut candidates: Vec<Candidate> = store
            .records(filter)?
            .into_iter()
            .map(Candidate::from_stored)
            .collect();
        if let Some(manifest) = manifest {
            apply_manifest(&mut candidates, manifest);
        }

        let mut used = UsedFiles::new();
        let plans: Vec<Plan<'a>> = candidates
            .into_iter()
            .map(|candidate| self.validate(candidate))
            .collect();

        // Everything a listing keeps is off limits for backfill, including
        // listings outside the filter
        for plan in &plans {
            for file in &plan.valid {
                used.claim(&file.filename);
            }
        }
        if filter.only_empty || filter.min_id.is_some() {
            self.claim_unfiltered(store, &mut used)?;
        }
        debug!(claimed = used.len(), "files referenced before backfill");

        let mut reports = Vec::with_capacity(plans.len());
        for plan in plans {
            let report = self.finish(store, plan, &mut used);
            println!("{}", report.progress_line());
            reports.push(report);
        }

        Ok(RunReport {
            started_at,
            finished_at: Utc::now(),
            dry_run: self.options.dry_run,
            inventory_files: self.inventory.len(),
            min_images: self.options.min_images,
            records: reports,
        })
    }

    /// Claim the files kept by listings the filter left out.
    fn claim_unfiltered<S: RecordStore>(&self, store: &S, used: &mut UsedFiles) -> Result<()> {
        for record in store.records(&RecordFilter::default())? {
            for reference in &record.images {
                let usable = reference_filename(reference)
                    .and_then(|name| self.inventory.get(name))
                    .filter(|file| file.is_usable());
                if let Some(file) = usable {
                    used.claim(&file.filename);
                }
            }
        }
        Ok(())
    }

    /// Split a listing's references into kept files and discarded references.
    fn validate(&self, candidate: Candidate) -> Plan<'a> {
        let Candidate {
            record,
            stored,
            from_manifest,
        } = candidate;
        let mut valid: Vec<&'a ImageFile> = Vec::new();
        let mut seen = HashSet::new();
        let mut discarded = Vec::new();

        for reference in &record.images {
            let outcome = match reference_filename(reference) {
                None => Err(DiscardReason::Malformed),
                Some(name) => match self.inventory.get(name) {
                    None => Err(DiscardReason::Missing),
                    Some(file) if file.size_bytes == 0 => Err(DiscardReason::Empty),
                    Some(file) if !file.readable => Err(DiscardReason::Corrupt),
                    Some(file) if !seen.insert(file.filename.as_str()) => {
                        Err(DiscardReason::Duplicate)
                    }
                    Some(file) => Ok(file),
                },
            };

            match outcome {
                Ok(file) => valid.push(file),
                Err(reason) => {
                    println!(
                        "🗑️  #{} {}: discarded {} ({})",
                        record.id, record.title, reference, reason
                    );
                    discarded.push(Discarded {
                        reference: reference.clone(),
                        reason,
                    });
                }
            }
        }

        Plan {
            record,
            stored,
            from_manifest,
            valid,
            discarded,
        }
    }

    /// Backfill, copy and persist one listing.
    fn finish<S: RecordStore>(&self, store: &mut S, plan: Plan<'a>, used: &mut UsedFiles) -> RecordReport {
        let Plan {
            record,
            stored,
            from_manifest,
            mut valid,
            discarded,
        } = plan;

        let mut backfilled = Vec::new();
        if valid.len() < self.options.min_images {
            let wanted = (self.options.min_images - valid.len()).min(self.options.max_backfill);
            let picks = select_backfill(
                self.inventory,
                record.created_at,
                wanted,
                self.options.window,
                used,
            );
            if picks.len() < wanted {
                warn!(
                    id = record.id,
                    wanted,
                    found = picks.len(),
                    "not enough unused images to reach the minimum"
                );
            }
            for pick in picks {
                info!(
                    id = record.id,
                    filename = %pick.file.filename,
                    source = %pick.source,
                    "backfilled"
                );
                backfilled.push(Added {
                    filename: pick.file.filename.clone(),
                    source: pick.source,
                });
                valid.push(pick.file);
            }
        }

        let images: Vec<String> = valid
            .iter()
            .map(|file| self.options.canonical_path(&file.filename))
            .collect();

        // Staged files get copied even when the stored list is already right
        let status = match self.commit_files(record.id, &valid) {
            Err(error) => RecordStatus::Failed { error },
            Ok(()) if images == stored && !record.repaired => RecordStatus::Unchanged,
            Ok(()) if self.options.dry_run => RecordStatus::WouldUpdate,
            Ok(()) => match store.update_images(record.id, &images) {
                Ok(()) => RecordStatus::Updated,
                Err(e) => {
                    error!(id = record.id, error = %e, "failed to update listing images");
                    RecordStatus::Failed {
                        error: e.to_string(),
                    }
                }
            },
        };

        RecordReport {
            id: record.id,
            before: record.images.len(),
            title: record.title,
            after: images.len(),
            discarded,
            backfilled,
            from_manifest,
            images,
            status,
        }
    }

    /// Make sure every file the listing will reference is in the serving directory.
    fn commit_files(&self, id: i64, files: &[&ImageFile]) -> std::result::Result<(), String> {
        for file in files {
            match staging::commit(file, &self.options.serving_dir, self.options.dry_run) {
                Ok(CommitOutcome::Copied) => println!("📦 #{} copied {}", id, file.filename),
                Ok(CommitOutcome::WouldCopy) => println!("📦 #{} would copy {}", id, file.filename),
                Ok(CommitOutcome::AlreadyServed) => {}
                Err(e) => {
                    error!(id, filename = %file.filename, error = %e, "copy failed, listing left untouched");
                    return Err(e.to_string());
                }
            }
        }
        Ok(())
    }
}

/// Swap in manifest lists, keeping each listing's stored list for comparison.
fn apply_manifest(candidates: &mut [Candidate], manifest: &Manifest) {
    let mut matched = HashSet::new();
    for candidate in candidates.iter_mut() {
        if let Some(images) = manifest.get(candidate.record.id) {
            candidate.record.images = images.to_vec();
            candidate.from_manifest = true;
            matched.insert(candidate.record.id);
        }
    }
    for id in manifest.ids().filter(|id| !matched.contains(id)) {
        warn!(id, "manifest entry matches no selected listing");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::state::library::Library;
    use chrono::{DateTime, TimeZone};
    use super::manifest::ManifestEntry;
    use super::matcher::BackfillSource;
    use std::path::Path;

    const T0: i64 = 1_700_000_000_000;
    const MINUTE: i64 = 60_000;
    const SERVING: &str = "/srv/uploads/properties";

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    fn served(name: &str, ms: Option<i64>) -> ImageFile {
        ImageFile {
            filename: name.to_string(),
            path: Path::new(SERVING).join(name),
            timestamp: ms.map(at),
            size_bytes: 1024,
            readable: true,
        }
    }

    fn options(min_images: usize) -> ReconcileOptions {
        ReconcileOptions {
            min_images,
            max_backfill: 3,
            window: Duration::hours(2),
            serving_dir: PathBuf::from(SERVING),
            category: "properties".to_string(),
            dry_run: false,
        }
    }

    fn record(id: i64, created_ms: i64, images: &[&str]) -> PropertyRecord {
        PropertyRecord {
            id,
            title: format!("Listing {}", id),
            created_at: at(created_ms),
            images: images.iter().map(|s| s.to_string()).collect(),
            repaired: false,
        }
    }

    /// Listing store kept in memory; ids in `failing` reject writes
    #[derive(Default)]
    struct MemoryStore {
        records: Vec<PropertyRecord>,
        failing: HashSet<i64>,
        writes: Vec<i64>,
    }

    impl RecordStore for MemoryStore {
        fn records(&self, filter: &RecordFilter) -> Result<Vec<PropertyRecord>> {
            let mut records: Vec<PropertyRecord> = self
                .records
                .iter()
                .filter(|r| filter.matches(r))
                .cloned()
                .collect();
            records.sort_by_key(|r| r.id);
            Ok(records)
        }

        fn update_images(&mut self, id: i64, images: &[String]) -> Result<()> {
            if self.failing.contains(&id) {
                return Err(Error::Io(std::io::Error::other("database is locked")));
            }
            let record = self
                .records
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| Error::Io(std::io::Error::other("no such listing")))?;
            record.images = images.to_vec();
            self.writes.push(id);
            Ok(())
        }
    }

    #[test]
    fn test_reference_filename() {
        assert_eq!(reference_filename("/uploads/properties/a.jpg"), Some("a.jpg"));
        assert_eq!(reference_filename("uploads\\properties\\a.jpg"), Some("a.jpg"));
        assert_eq!(reference_filename("https://cdn.example.com/uploads/a.jpg?v=2"), Some("a.jpg"));
        assert_eq!(reference_filename(" a.jpg "), Some("a.jpg"));
        assert_eq!(reference_filename("/uploads/properties/"), None);
        assert_eq!(reference_filename(""), None);
    }

    #[test]
    fn test_missing_reference_is_replaced_by_closest_file() {
        let inventory = AssetInventory::from_files(vec![
            served("a.jpg", Some(T0)),
            served("b.jpg", Some(T0 + 30 * MINUTE)),
            served("c.jpg", None),
        ]);
        let mut store = MemoryStore {
            records: vec![record(1, T0, &["missing.jpg"])],
            ..MemoryStore::default()
        };

        let report = Reconciler::new(&inventory, options(1))
            .run(&mut store, &RecordFilter::default(), None)
            .unwrap();

        let result = report.record(1).unwrap();
        assert_eq!(result.images, vec!["/uploads/properties/a.jpg".to_string()]);
        assert_eq!(result.before, 1);
        assert_eq!(result.after, 1);
        assert_eq!(result.discarded_count(), 1);
        assert_eq!(result.discarded[0].reason, DiscardReason::Missing);
        assert_eq!(result.backfilled_count(), 1);
        assert_eq!(result.backfilled[0].source, BackfillSource::Proximity);
        assert_eq!(result.status, RecordStatus::Updated);
        assert_eq!(store.records[0].images, result.images);
    }

    #[test]
    fn test_second_run_is_a_no_op() {
        let inventory = AssetInventory::from_files(vec![
            served("a.jpg", Some(T0)),
            served("b.jpg", None),
            served("c.jpg", None),
        ]);
        let mut library = Library::open_in_memory().unwrap();
        library
            .insert_property(1, "Villa", at(T0), Some("['uploads/properties/a.jpg', 'gone.jpg']"))
            .unwrap();
        library.insert_property(2, "Flat", at(T0), None).unwrap();

        let reconciler = Reconciler::new(&inventory, options(2));
        let first = reconciler.run(&mut library, &RecordFilter::default(), None).unwrap();
        assert_eq!(first.totals().updated, 2);

        let second = reconciler.run(&mut library, &RecordFilter::default(), None).unwrap();
        for result in &second.records {
            assert_eq!(result.status, RecordStatus::Unchanged);
            assert_eq!(result.before, result.after);
            assert_eq!(result.discarded_count(), 0);
            assert_eq!(result.backfilled_count(), 0);
        }
        assert_eq!(
            library.stored_images(1).unwrap().as_deref(),
            Some(r#"["/uploads/properties/a.jpg","/uploads/properties/b.jpg"]"#)
        );
    }

    #[test]
    fn test_repaired_value_is_rewritten_once() {
        let inventory = AssetInventory::from_files(vec![served("a.jpg", Some(T0))]);
        let mut library = Library::open_in_memory().unwrap();
        library
            .insert_property(1, "Villa", at(T0), Some("['/uploads/properties/a.jpg']"))
            .unwrap();
        library
            .insert_property(2, "Flat", at(T0 + 600 * MINUTE), Some("{broken"))
            .unwrap();

        let reconciler = Reconciler::new(&inventory, options(1));
        let first = reconciler.run(&mut library, &RecordFilter::default(), None).unwrap();
        assert_eq!(first.record(1).unwrap().status, RecordStatus::Updated);
        assert_eq!(first.record(1).unwrap().discarded_count(), 0);
        assert_eq!(first.record(2).unwrap().status, RecordStatus::Updated);
        assert_eq!(
            library.stored_images(1).unwrap().as_deref(),
            Some(r#"["/uploads/properties/a.jpg"]"#)
        );
        assert_eq!(library.stored_images(2).unwrap().as_deref(), Some("[]"));

        let second = reconciler.run(&mut library, &RecordFilter::default(), None).unwrap();
        assert_eq!(second.totals().updated, 0);
        assert_eq!(second.totals().unchanged, 2);
    }

    #[test]
    fn test_results_only_reference_inventory_files() {
        let mut empty = served("empty.jpg", Some(T0));
        empty.size_bytes = 0;
        let mut corrupt = served("corrupt.jpg", Some(T0));
        corrupt.readable = false;
        let inventory = AssetInventory::from_files(vec![
            empty,
            corrupt,
            served("good.jpg", Some(T0)),
            served("spare.jpg", None),
        ]);
        let mut store = MemoryStore {
            records: vec![
                record(1, T0, &["empty.jpg", "corrupt.jpg", "good.jpg", "good.jpg", ""]),
                record(2, T0, &["nope.png"]),
            ],
            ..MemoryStore::default()
        };

        let report = Reconciler::new(&inventory, options(1))
            .run(&mut store, &RecordFilter::default(), None)
            .unwrap();

        let reasons: Vec<DiscardReason> =
            report.record(1).unwrap().discarded.iter().map(|d| d.reason).collect();
        assert_eq!(
            reasons,
            vec![
                DiscardReason::Empty,
                DiscardReason::Corrupt,
                DiscardReason::Duplicate,
                DiscardReason::Malformed,
            ]
        );
        for stored in &store.records {
            for path in &stored.images {
                let name = reference_filename(path).unwrap();
                assert!(inventory.get(name).is_some_and(|f| f.is_usable()), "{}", path);
            }
        }
        assert_eq!(store.records[1].images, vec!["/uploads/properties/spare.jpg".to_string()]);
    }

    #[test]
    fn test_backfills_are_disjoint_and_skip_kept_files() {
        let inventory = AssetInventory::from_files(
            (0..8).map(|i| served(&format!("img-{}.jpg", i), Some(T0 + i * MINUTE))),
        );
        let mut store = MemoryStore {
            records: vec![
                record(1, T0, &[]),
                record(2, T0, &[]),
                record(3, T0, &["img-0.jpg"]),
                record(4, T0, &[]),
            ],
            ..MemoryStore::default()
        };

        let report = Reconciler::new(&inventory, options(2))
            .run(&mut store, &RecordFilter::default(), None)
            .unwrap();

        let mut seen = HashSet::new();
        for result in &report.records {
            for added in &result.backfilled {
                assert!(seen.insert(added.filename.clone()), "{} assigned twice", added.filename);
                assert_ne!(added.filename, "img-0.jpg");
            }
        }
        // Eight files, one kept by listing 3: 2 + 2 + 1 + 2
        assert_eq!(seen.len(), 7);
        assert_eq!(report.totals().short, 0);
    }

    #[test]
    fn test_backfill_respects_cap() {
        let inventory = AssetInventory::from_files(
            (0..6).map(|i| served(&format!("img-{}.jpg", i), Some(T0 + i * MINUTE))),
        );
        let mut store = MemoryStore {
            records: vec![record(1, T0, &[])],
            ..MemoryStore::default()
        };

        let report = Reconciler::new(&inventory, options(5))
            .run(&mut store, &RecordFilter::default(), None)
            .unwrap();

        assert_eq!(report.record(1).unwrap().after, 3);
        assert_eq!(report.totals().short, 1);
    }

    #[test]
    fn test_failed_write_does_not_stop_the_batch() {
        let inventory = AssetInventory::from_files(vec![
            served("a.jpg", Some(T0)),
            served("b.jpg", Some(T0)),
        ]);
        let mut store = MemoryStore {
            records: vec![record(1, T0, &[]), record(2, T0, &[])],
            failing: HashSet::from([1]),
            ..MemoryStore::default()
        };

        let report = Reconciler::new(&inventory, options(1))
            .run(&mut store, &RecordFilter::default(), None)
            .unwrap();

        assert!(matches!(report.record(1).unwrap().status, RecordStatus::Failed { .. }));
        assert_eq!(report.record(2).unwrap().status, RecordStatus::Updated);
        assert_eq!(store.writes, vec![2]);
        assert!(store.records[0].images.is_empty());
        assert_eq!(report.totals().failed, 1);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let inventory = AssetInventory::from_files(vec![served("a.jpg", Some(T0))]);
        let mut store = MemoryStore {
            records: vec![record(1, T0, &["gone.jpg"])],
            ..MemoryStore::default()
        };
        let options = ReconcileOptions {
            dry_run: true,
            ..options(1)
        };

        let report = Reconciler::new(&inventory, options)
            .run(&mut store, &RecordFilter::default(), None)
            .unwrap();

        assert_eq!(report.record(1).unwrap().status, RecordStatus::WouldUpdate);
        assert!(store.writes.is_empty());
        assert_eq!(store.records[0].images, vec!["gone.jpg".to_string()]);
    }

    #[test]
    fn test_filtered_run_leaves_other_listings_files_alone() {
        let inventory = AssetInventory::from_files(vec![
            served("kept.jpg", Some(T0)),
            served("free.jpg", Some(T0 + 90 * MINUTE)),
        ]);
        let mut store = MemoryStore {
            records: vec![record(1, T0, &["kept.jpg"]), record(2, T0, &[])],
            ..MemoryStore::default()
        };
        let filter = RecordFilter {
            only_empty: true,
            ..RecordFilter::default()
        };

        let report = Reconciler::new(&inventory, options(1))
            .run(&mut store, &filter, None)
            .unwrap();

        assert_eq!(report.records.len(), 1);
        assert_eq!(
            report.record(2).unwrap().images,
            vec!["/uploads/properties/free.jpg".to_string()]
        );
    }

    #[test]
    fn test_manifest_lists_replace_stored_lists() {
        let inventory = AssetInventory::from_files(vec![
            served("front.jpg", None),
            served("garden.jpg", None),
            served("other.jpg", None),
        ]);
        let mut store = MemoryStore {
            records: vec![record(1, T0, &["stale.jpg"]), record(2, T0, &["other.jpg"])],
            ..MemoryStore::default()
        };
        let manifest = Manifest::from_entries(vec![
            ManifestEntry {
                id: 1,
                images: vec!["garden.jpg".into(), "lost.jpg".into(), "front.jpg".into()],
                note: None,
            },
            ManifestEntry { id: 9, images: vec!["front.jpg".into()], note: None },
        ])
        .unwrap();

        let report = Reconciler::new(&inventory, options(1))
            .run(&mut store, &RecordFilter::default(), Some(&manifest))
            .unwrap();

        let result = report.record(1).unwrap();
        assert!(result.from_manifest);
        assert_eq!(result.before, 3);
        assert_eq!(
            result.before - result.discarded_count() + result.backfilled_count(),
            result.after
        );
        assert_eq!(
            result.images,
            vec![
                "/uploads/properties/garden.jpg".to_string(),
                "/uploads/properties/front.jpg".to_string(),
            ]
        );
        assert_eq!(result.discarded[0].reference, "lost.jpg");
        assert!(!report.record(2).unwrap().from_manifest);
    }

    #[test]
    fn test_staged_file_is_copied_before_update() {
        let serving = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        std::fs::write(staging.path().join("1700000000000.jpg"), b"jpeg bytes").unwrap();

        let roots = vec![serving.path().to_path_buf(), staging.path().to_path_buf()];
        let inventory = crate::assets::scanner::scan_roots(&roots, Default::default());
        let mut store = MemoryStore {
            records: vec![record(1, T0, &[])],
            ..MemoryStore::default()
        };
        let options = ReconcileOptions {
            serving_dir: serving.path().to_path_buf(),
            ..options(1)
        };

        let report = Reconciler::new(&inventory, options)
            .run(&mut store, &RecordFilter::default(), None)
            .unwrap();

        assert_eq!(report.record(1).unwrap().status, RecordStatus::Updated);
        assert!(serving.path().join("1700000000000.jpg").exists());
        assert_eq!(
            store.records[0].images,
            vec!["/uploads/properties/1700000000000.jpg".to_string()]
        );
    }

    #[test]
    fn test_good_staged_copy_replaces_empty_served_file() {
        let serving = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        std::fs::write(serving.path().join("a.jpg"), b"").unwrap();
        std::fs::write(staging.path().join("a.jpg"), b"pixels").unwrap();

        let roots = vec![serving.path().to_path_buf(), staging.path().to_path_buf()];
        let inventory = crate::assets::scanner::scan_roots(&roots, Default::default());
        let mut store = MemoryStore {
            records: vec![record(1, T0, &["/uploads/properties/a.jpg"])],
            ..MemoryStore::default()
        };
        let options = ReconcileOptions {
            serving_dir: serving.path().to_path_buf(),
            ..options(1)
        };

        let report = Reconciler::new(&inventory, options)
            .run(&mut store, &RecordFilter::default(), None)
            .unwrap();

        let result = report.record(1).unwrap();
        assert_eq!(result.discarded_count(), 0);
        assert_eq!(result.images, vec!["/uploads/properties/a.jpg".to_string()]);
        assert_eq!(result.status, RecordStatus::Unchanged);
        assert_eq!(std::fs::read(serving.path().join("a.jpg")).unwrap(), b"pixels");
    }
}
