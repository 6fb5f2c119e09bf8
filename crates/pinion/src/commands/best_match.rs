use std::fmt::Write;

use anyhow::Result;

use pinion_cache::Cache;

use crate::commands::{ExitStatus, RepositorySettings, parse_requirement};
use crate::printer::Printer;

/// Print the best version that satisfies a requirement, as a pinned requirement.
pub(crate) async fn best_match(
    requirement: &str,
    prereleases: Option<bool>,
    settings: RepositorySettings,
    cache: Cache,
    printer: Printer,
) -> Result<ExitStatus> {
    let requirement = parse_requirement(requirement)?;
    let mut repository = settings.build(cache).await?;

    let best = repository
        .find_best_match(&requirement, prereleases)
        .await?;
    writeln!(printer.stdout(), "{best}")?;

    Ok(ExitStatus::Success)
}
