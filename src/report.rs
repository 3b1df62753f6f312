//! Plain-text catalog summary used as a notification body.
//!
//! Rendering never fails: anything the catalog cannot answer prints as
//! `unknown`. Delivery is left to the caller.
use crate::catalog::Catalog;
use crate::index::RunEntry;
use std::fmt::Write;

const UNKNOWN: &str = "unknown";

/// Render the summary for `catalog` from its current snapshot.
pub fn render_summary(catalog: &Catalog) -> String {
    let mut out = String::new();
    push_line(&mut out, &format!("Backup catalog: {}", catalog.root().display()));
    push_line(
        &mut out,
        &format!("Valid: {}", if catalog.is_valid() { "yes" } else { "no" }),
    );
    push_line(
        &mut out,
        &format!("Full backups: {}", display_opt(catalog.full_backup_count())),
    );
    push_line(
        &mut out,
        &format!(
            "Differential backups: {}",
            display_opt(catalog.differential_backup_count())
        ),
    );
    push_line(
        &mut out,
        &format!(
            "Catalog size: {}",
            catalog.size_bytes().map_or_else(|| UNKNOWN.to_string(), format_bytes)
        ),
    );

    out.push('\n');
    render_run(&mut out, "Last backup", catalog.last_run());
    push_line(
        &mut out,
        &format!(
            "  Size: {}",
            catalog
                .last_run_size_bytes()
                .map_or_else(|| UNKNOWN.to_string(), format_bytes)
        ),
    );
    push_line(
        &mut out,
        &format!(
            "  Size vs last full: {}",
            catalog
                .last_run_size_percent()
                .map_or_else(|| UNKNOWN.to_string(), |pct| format!("{pct:.1}%"))
        ),
    );

    out.push('\n');
    render_run(&mut out, "Last full backup", catalog.last_full_run());
    push_line(
        &mut out,
        &format!(
            "  Size: {}",
            catalog
                .last_full_run_size_bytes()
                .map_or_else(|| UNKNOWN.to_string(), format_bytes)
        ),
    );
    out
}

fn render_run(out: &mut String, title: &str, run: Option<&RunEntry>) {
    let Some(run) = run else {
        push_line(out, &format!("{title}: {UNKNOWN}"));
        return;
    };
    push_line(out, &format!("{title}: #{}", run.directory_number));
    push_line(
        out,
        &format!(
            "  Method: {}",
            run.method.map_or(UNKNOWN, |method| method.as_str())
        ),
    );
    push_line(out, &format!("  Started: {}", text_or_unknown(run.start_time.as_deref())));
    push_line(out, &format!("  Finished: {}", text_or_unknown(run.finish_time.as_deref())));
    push_line(
        out,
        &format!("  Requested by: {}", text_or_unknown(run.requested_by.as_deref())),
    );
    push_line(
        out,
        &format!("  Top component: {}", text_or_unknown(run.top_component.as_deref())),
    );
    push_line(
        out,
        &format!(
            "  Errors: {}  Warnings: {}",
            run.error_count, run.warning_count
        ),
    );
}

/// Render a byte count with a binary unit suffix.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}

fn display_opt(value: Option<usize>) -> String {
    value.map_or_else(|| UNKNOWN.to_string(), |v| v.to_string())
}

fn text_or_unknown(value: Option<&str>) -> &str {
    value.unwrap_or(UNKNOWN)
}

fn push_line(out: &mut String, line: &str) {
    let _ = writeln!(out, "{line}");
}
