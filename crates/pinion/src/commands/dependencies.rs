use std::fmt::Write;

use anyhow::Result;
use owo_colors::OwoColorize;

use pinion_cache::Cache;
use pinion_pypi_types::Requirement;
use pinion_repository::FastPathOutcome;

use crate::commands::{ExitStatus, RepositorySettings, parse_requirement};
use crate::printer::Printer;

/// Print the direct dependencies of a pinned or editable requirement.
pub(crate) async fn dependencies(
    requirement: &str,
    settings: RepositorySettings,
    cache: Cache,
    printer: Printer,
) -> Result<ExitStatus> {
    let requirement = parse_requirement(requirement)?;
    let mut repository = settings.build(cache).await?;

    let sources = repository.lookup_dependencies(&requirement).await?;
    if missed_fast_path(&requirement, &sources.fast) {
        writeln!(
            printer.stderr(),
            "{}",
            "The index's JSON API didn't report dependencies, using the artifact's metadata only"
                .dimmed()
        )?;
    }

    let dependencies = sources.merged();
    if dependencies.is_empty() {
        writeln!(
            printer.stderr(),
            "{} has no dependencies",
            requirement.cyan()
        )?;
    }
    for dependency in dependencies {
        writeln!(printer.stdout(), "{dependency}")?;
    }

    Ok(ExitStatus::Success)
}

/// Whether the JSON API was asked about a release and had no answer. Editables are never
/// looked up there.
fn missed_fast_path(requirement: &Requirement, outcome: &FastPathOutcome) -> bool {
    requirement.is_pinned() && matches!(outcome, FastPathOutcome::Unavailable)
}
