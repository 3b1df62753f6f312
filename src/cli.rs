//! CLI argument parsing for catalog grooming.
//!
//! The CLI is intentionally thin: it maps flags onto typed engine calls and
//! leaves policy to the library.
use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "cgroom",
    version,
    about = "Retention grooming and archival export for backup catalogs",
    after_help = "Examples:\n  cgroom status --catalog /backups/farm --json\n  cgroom trim --catalog /backups/farm --count 2\n  cgroom trim --catalog /backups/farm --size 500GB\n  cgroom export --catalog /backups/farm --destination /mnt/offsite --name farm-2026 --exclude-newest 1\n  cgroom groom --catalog /backups/farm --config groom.json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Status(StatusArgs),
    Report(CatalogArgs),
    Trim(TrimArgs),
    Purge(CatalogArgs),
    Export(ExportArgs),
    RepairPaths(CatalogArgs),
    Orphans(CatalogArgs),
    Groom(GroomArgs),
    InitConfig(InitConfigArgs),
}

/// Catalog selection shared by every command.
#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Catalog root containing the index document and run directories
    #[arg(long, value_name = "DIR")]
    pub catalog: PathBuf,
}

/// Status command inputs.
#[derive(Parser, Debug)]
#[command(about = "Summarize catalog statistics")]
pub struct StatusArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

/// Trim command inputs; exactly one of count or size.
#[derive(Parser, Debug)]
#[command(about = "Delete the oldest backup chains by count or by size")]
pub struct TrimArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Number of Full backups to retain
    #[arg(long, value_name = "N", conflicts_with = "size", required_unless_present = "size")]
    pub count: Option<usize>,

    /// Maximum catalog size (e.g. 750GB); oldest chains go first
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub size: Option<u64>,

    /// Count Full backups that reported errors as retention anchors
    #[arg(long)]
    pub ignore_errors: bool,
}

/// Export command inputs.
#[derive(Parser, Debug)]
#[command(about = "Copy backups into an archive directory or zip file")]
pub struct ExportArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Existing directory that receives the export
    #[arg(long, value_name = "DIR")]
    pub destination: PathBuf,

    /// Subdirectory name, or zip base name when compressing
    #[arg(long, value_name = "NAME")]
    pub name: String,

    /// Export only the N oldest Full backup chains
    #[arg(long, value_name = "N", conflicts_with = "exclude_newest")]
    pub include_oldest: Option<usize>,

    /// Export everything except the N newest Full backup chains
    #[arg(long, value_name = "N", conflicts_with = "include_oldest")]
    pub exclude_newest: Option<usize>,

    /// Export runs that reported errors and their dependents
    #[arg(long)]
    pub ignore_errors: bool,

    /// Copy loose directories instead of writing a zip archive
    #[arg(long)]
    pub no_compression: bool,

    /// Rewrite run paths in the exported index to the export location
    #[arg(long)]
    pub rewrite_paths: bool,
}

/// Groom command inputs.
#[derive(Parser, Debug)]
#[command(about = "Apply the retention rule from a policy file")]
pub struct GroomArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Policy file (groom.json)
    #[arg(long, value_name = "PATH")]
    pub config: PathBuf,
}

/// Init-config command inputs.
#[derive(Parser, Debug)]
#[command(about = "Write a default policy file")]
pub struct InitConfigArgs {
    /// Output path for the policy file
    #[arg(long, value_name = "PATH")]
    pub out: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Parse a byte size with an optional binary suffix (`B`, `KB`, `MB`, `GB`,
/// `TB`).
pub fn parse_size(raw: &str) -> Result<u64> {
    let trimmed = raw.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, suffix) = trimmed.split_at(split);
    if digits.is_empty() {
        return Err(anyhow!("invalid size {raw:?}: expected a number"));
    }
    let value: u64 = digits
        .parse()
        .map_err(|err| anyhow!("invalid size {raw:?}: {err}"))?;
    let multiplier: u64 = match suffix.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1 << 10,
        "MB" | "M" => 1 << 20,
        "GB" | "G" => 1 << 30,
        "TB" | "T" => 1 << 40,
        other => return Err(anyhow!("invalid size {raw:?}: unknown unit {other:?}")),
    };
    value
        .checked_mul(multiplier)
        .ok_or_else(|| anyhow!("invalid size {raw:?}: too large"))
}
