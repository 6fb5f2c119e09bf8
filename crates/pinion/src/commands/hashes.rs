use std::fmt::Write;

use anyhow::Result;

use pinion_cache::Cache;

use crate::commands::{ExitStatus, RepositorySettings, parse_requirement};
use crate::printer::Printer;

/// Print `--hash` options for every artifact of a pinned requirement.
///
/// With `all_platforms`, artifacts that can't be installed on this platform are included.
pub(crate) async fn hashes(
    requirement: &str,
    all_platforms: bool,
    settings: RepositorySettings,
    cache: Cache,
    printer: Printer,
) -> Result<ExitStatus> {
    let requirement = parse_requirement(requirement)?;
    let mut repository = settings.build(cache).await?;

    let hashes = if all_platforms {
        repository
            .allow_all_artifacts()
            .get_hashes(&requirement)
            .await?
    } else {
        repository.get_hashes(&requirement).await?
    };

    for hash in hashes {
        writeln!(printer.stdout(), "--hash={hash}")?;
    }

    Ok(ExitStatus::Success)
}
