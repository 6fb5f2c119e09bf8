use std::fmt::Write;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use pinion_cache::Cache;

use crate::commands::{ExitStatus, human_readable_bytes};
use crate::printer::Printer;

/// Clear the cache, including downloaded archives and persisted hashes.
pub(crate) fn clean(cache: &Cache, printer: Printer) -> Result<ExitStatus> {
    writeln!(
        printer.stderr(),
        "Clearing cache at: {}",
        cache.root().display().cyan()
    )?;

    let summary = cache
        .clear()
        .with_context(|| format!("Failed to clear cache at: {}", cache.root().display()))?;

    match (summary.num_files, summary.num_dirs) {
        (0, 0) => write!(printer.stderr(), "No cache entries found")?,
        (0, 1) => write!(printer.stderr(), "Removed 1 directory")?,
        (0, num_dirs) => write!(printer.stderr(), "Removed {num_dirs} directories")?,
        (1, _) => write!(printer.stderr(), "Removed 1 file")?,
        (num_files, _) => write!(printer.stderr(), "Removed {num_files} files")?,
    }

    if summary.total_bytes > 0 {
        let bytes = if summary.total_bytes < 1024 {
            format!("{}B", summary.total_bytes)
        } else {
            let (bytes, unit) = human_readable_bytes(summary.total_bytes);
            format!("{bytes:.1}{unit}")
        };
        write!(printer.stderr(), " ({})", bytes.green())?;
    }
    writeln!(printer.stderr())?;

    Ok(ExitStatus::Success)
}
