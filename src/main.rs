use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod assets;
mod config;
mod error;
mod reconcile;
mod state;

use assets::scanner::{scan_roots, AssetInventory, ScanOptions};
use assets::staging;
use config::Config;
use error::Result;
use reconcile::manifest::Manifest;
use reconcile::{ReconcileOptions, Reconciler};
use state::data::RecordFilter;
use state::library::Library;

#[derive(Parser)]
#[command(author, version, about = "Reconcile listing image references with uploaded files", long_about = None)]
struct Cli {
    /// JSON config file (defaults apply to anything it leaves out)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Catalog database, overriding the config
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Defaults to `reconcile`
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Drop dead image references, backfill short listings and save the result
    Reconcile(ReconcileArgs),

    /// List the image inventory found in the serving and staging directories
    Scan,

    /// Copy staged images into the serving directory
    Migrate {
        /// report what would be copied without copying
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Args, Default)]
struct ReconcileArgs {
    /// compute everything but leave files and the catalog untouched
    #[arg(long)]
    dry_run: bool,

    /// only listings that currently have no images
    #[arg(long)]
    only_empty: bool,

    /// only listings with id >= N
    #[arg(long, value_name = "N")]
    min_id: Option<i64>,

    /// JSON manifest of known image lists per listing id
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// write the run report as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "run aborted");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database = database;
    }

    let inventory = scan(&config);

    match cli.command.unwrap_or(Commands::Reconcile(ReconcileArgs::default())) {
        Commands::Reconcile(args) => reconcile(&config, &inventory, args),
        Commands::Scan => {
            print_inventory(&inventory);
            Ok(())
        }
        Commands::Migrate { dry_run } => {
            let summary = staging::migrate(&inventory, &config.serving_dir, dry_run);
            println!(
                "✅ Migration complete: {} copied, {} already served, {} unusable, {} failed",
                summary.copied, summary.already_served, summary.skipped_unusable, summary.failed
            );
            Ok(())
        }
    }
}

fn scan(config: &Config) -> AssetInventory {
    let options = ScanOptions {
        recursive: config.recursive,
        probe_headers: config.probe_headers,
    };
    let inventory = scan_roots(&config.asset_roots(), options);
    println!(
        "🖼️  Found {} images ({} usable, {} with timestamps)",
        inventory.len(),
        inventory.usable_count(),
        inventory.timestamped_count()
    );
    inventory
}

fn reconcile(config: &Config, inventory: &AssetInventory, args: ReconcileArgs) -> Result<()> {
    let mut library = Library::open(&config.database)?;
    println!(
        "🏠 {} listings in {}",
        library.property_count()?,
        library.path().display()
    );

    let manifest = args.manifest.as_deref().map(Manifest::load).transpose()?;
    if let Some(manifest) = &manifest {
        println!("📋 Manifest covers {} listings", manifest.len());
    }

    let filter = RecordFilter {
        only_empty: args.only_empty,
        min_id: args.min_id,
        order: config.order,
    };
    let options = ReconcileOptions::from_config(config, args.dry_run);

    let report = Reconciler::new(inventory, options).run(&mut library, &filter, manifest.as_ref())?;

    let totals = report.totals();
    println!(
        "📊 Reconcile summary: {} listings, {} {}, {} unchanged, {} failed",
        totals.records,
        totals.updated,
        if report.dry_run { "would update" } else { "updated" },
        totals.unchanged,
        totals.failed
    );
    println!(
        "   {} references discarded, {} images backfilled, {} listings still below {}",
        totals.discarded, totals.backfilled, totals.short, config.min_images
    );

    if let Some(path) = &args.report {
        report.write_json(path)?;
        println!("💾 Report written to {}", path.display());
    }

    Ok(())
}

fn print_inventory(inventory: &AssetInventory) {
    for file in inventory.files() {
        let timestamp = file
            .timestamp
            .map(|ts| ts.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        let flag = if file.size_bytes == 0 {
            "  (empty)"
        } else if !file.readable {
            "  (corrupt)"
        } else {
            ""
        };
        println!(
            "{:<48} {:>10}  {}  {}{}",
            file.filename,
            file.size_bytes,
            timestamp,
            file.path.display(),
            flag
        );
    }
}
