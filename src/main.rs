use anyhow::{anyhow, Context, Result};
use catalog_groom::config::{apply_config, default_config, load_config, write_config};
use catalog_groom::report::{format_bytes, render_summary};
use catalog_groom::{export, purge, trim_by_count, trim_by_size, Catalog, ExportMode, ExportRequest, GroomOutcome};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Command, ExportArgs, RootArgs, StatusArgs, TrimArgs};

/// Machine-readable status emitted by `status --json`.
#[derive(Debug, Serialize)]
struct StatusSummary {
    root: String,
    valid: bool,
    full_backups: Option<usize>,
    differential_backups: Option<usize>,
    size_bytes: Option<u64>,
    last_run_number: Option<u64>,
    last_full_run_number: Option<u64>,
    last_run_size_bytes: Option<u64>,
    last_full_run_size_bytes: Option<u64>,
    last_run_size_percent: Option<f64>,
}

fn main() -> Result<()> {
    init_tracing();
    let args = RootArgs::parse();

    match args.command {
        Command::Status(args) => cmd_status(args),
        Command::Report(args) => {
            print!("{}", render_summary(&Catalog::load(args.catalog)));
            Ok(())
        }
        Command::Trim(args) => cmd_trim(args),
        Command::Purge(args) => {
            let mut catalog = Catalog::load(args.catalog);
            let outcome = purge(&mut catalog).context("purge catalog")?;
            print_outcome(&outcome);
            Ok(())
        }
        Command::Export(args) => cmd_export(args),
        Command::RepairPaths(args) => {
            let mut catalog = Catalog::load(args.catalog);
            let changed = catalog.repair_paths().context("repair catalog paths")?;
            println!("Rewrote {changed} run paths under {}", catalog.root().display());
            Ok(())
        }
        Command::Orphans(args) => {
            let catalog = Catalog::load(args.catalog);
            let orphans = catalog
                .orphan_directories()
                .ok_or_else(|| anyhow!("{} is not a readable catalog", catalog.root().display()))?;
            for dir in orphans {
                println!("{}", dir.display());
            }
            Ok(())
        }
        Command::Groom(args) => {
            let config = load_config(&args.config)?;
            let mut catalog = Catalog::load(args.catalog.catalog);
            let outcome = apply_config(&mut catalog, &config)?;
            print_outcome(&outcome);
            Ok(())
        }
        Command::InitConfig(args) => {
            if args.out.exists() && !args.force {
                return Err(anyhow!(
                    "{} already exists (use --force to overwrite)",
                    args.out.display()
                ));
            }
            write_config(&args.out, &default_config())?;
            println!("Wrote default policy to {}", args.out.display());
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_status(args: StatusArgs) -> Result<()> {
    let catalog = Catalog::load(args.catalog.catalog);
    if !args.json {
        print!("{}", render_summary(&catalog));
        return Ok(());
    }
    let summary = StatusSummary {
        root: catalog.root().display().to_string(),
        valid: catalog.is_valid(),
        full_backups: catalog.full_backup_count(),
        differential_backups: catalog.differential_backup_count(),
        size_bytes: catalog.size_bytes(),
        last_run_number: catalog.last_run().map(|run| run.directory_number),
        last_full_run_number: catalog.last_full_run().map(|run| run.directory_number),
        last_run_size_bytes: catalog.last_run_size_bytes(),
        last_full_run_size_bytes: catalog.last_full_run_size_bytes(),
        last_run_size_percent: catalog.last_run_size_percent(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_trim(args: TrimArgs) -> Result<()> {
    let mut catalog = Catalog::load(args.catalog.catalog);
    let outcome = match (args.count, args.size) {
        (Some(count), None) => trim_by_count(&mut catalog, count, args.ignore_errors)
            .with_context(|| format!("trim {} to {count} full backups", catalog.root().display()))?,
        (None, Some(size)) => trim_by_size(&mut catalog, size, args.ignore_errors).with_context(|| {
            format!("trim {} to {}", catalog.root().display(), format_bytes(size))
        })?,
        _ => return Err(anyhow!("exactly one of --count or --size is required")),
    };
    print_outcome(&outcome);
    Ok(())
}

fn cmd_export(args: ExportArgs) -> Result<()> {
    let catalog = Catalog::load(args.catalog.catalog);
    let request = ExportRequest {
        destination: args.destination,
        name: args.name,
        mode: ExportMode::from_counts(args.include_oldest, args.exclude_newest)?,
        ignore_errors: args.ignore_errors,
        no_compression: args.no_compression,
        rewrite_paths: args.rewrite_paths,
    };
    let outcome = export(&catalog, &request).context("export catalog")?;
    println!(
        "Exported {} runs to {}",
        outcome.exported.len(),
        outcome.written.display()
    );
    Ok(())
}

fn print_outcome(outcome: &GroomOutcome) {
    if outcome.removed.is_empty() {
        println!("Nothing to remove.");
        return;
    }
    println!("Removed {} runs:", outcome.removed.len());
    for number in outcome.removed_numbers() {
        println!("  #{number}");
    }
}
