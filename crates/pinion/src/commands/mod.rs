use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result};
use tracing::debug;

use pinion_cache::Cache;
use pinion_client::{RegistryClient, RegistryClientBuilder};
use pinion_extract::ArchiveExtractor;
use pinion_platform_tags::{Platform, Tags};
use pinion_pypi_types::{HashAlgorithm, IndexUrls, Requirement};
use pinion_repository::{PackageRepository, RepositoryOptions, TargetPython};

pub(crate) use best_match::best_match;
pub(crate) use clean::clean;
pub(crate) use dependencies::dependencies;
pub(crate) use hashes::hashes;

mod best_match;
mod clean;
mod dependencies;
mod hashes;

#[derive(Copy, Clone)]
pub(crate) enum ExitStatus {
    /// The command succeeded.
    Success,

    /// The command failed due to an error in the user input.
    Failure,

    /// The command failed with an unexpected error.
    Error,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => Self::from(0),
            ExitStatus::Failure => Self::from(1),
            ExitStatus::Error => Self::from(2),
        }
    }
}

/// The repository used by the commands: the configured indexes, and metadata extraction from
/// downloaded archives.
pub(crate) type Repository = PackageRepository<RegistryClient, ArchiveExtractor>;

/// How to build a [`Repository`].
#[derive(Debug, Clone)]
pub(crate) struct RepositorySettings {
    pub(crate) index_urls: IndexUrls,
    pub(crate) python_version: Option<String>,
    pub(crate) use_json: bool,
    pub(crate) favorite_hash: HashAlgorithm,
}

impl RepositorySettings {
    pub(crate) async fn build(self, cache: Cache) -> Result<Repository> {
        let target_python = match self.python_version {
            Some(version) => TargetPython::from_str(&version)?,
            None => TargetPython::from_env().await?,
        };
        let platform = Platform::current()?;
        let tags = Tags::from_env(&platform, target_python.major_minor(), "cpython")?;
        debug!(
            "Targeting Python {} on {platform:?}",
            target_python.version()
        );

        let client = RegistryClientBuilder::new()
            .index_urls(self.index_urls)
            .build()?;
        let extractor = ArchiveExtractor::new(client.client().clone());
        let options = RepositoryOptions::new(target_python, tags)
            .with_use_json(self.use_json)
            .with_favorite_hash(self.favorite_hash);

        Ok(PackageRepository::new(client, extractor, options, cache)?)
    }
}

/// Parse a requirement given on the command line.
pub(crate) fn parse_requirement(given: &str) -> Result<Requirement> {
    Requirement::from_str(given).with_context(|| format!("Invalid requirement: `{given}`"))
}

/// Returns `true` if the error was caused by the user's input rather than by the environment,
/// e.g. when no version satisfies a requirement.
pub(crate) fn is_user_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<pinion_repository::Error>(),
            Some(
                pinion_repository::Error::NoCandidateFound(_)
                    | pinion_repository::Error::Unpinned(_)
            )
        ) || cause
            .downcast_ref::<pinion_pypi_types::RequirementError>()
            .is_some()
    })
}

/// Formats a number of bytes into a human readable SI-prefixed size, e.g. `(1.5, "MiB")`.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn human_readable_bytes(bytes: u64) -> (f32, &'static str) {
    static UNITS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];
    let bytes = bytes as f32;
    let i = ((bytes.log2() / 10.0) as usize).min(UNITS.len() - 1);
    (bytes / 1024_f32.powi(i as i32), UNITS[i])
}
