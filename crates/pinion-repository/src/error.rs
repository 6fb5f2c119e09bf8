use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use itertools::Itertools;
use thiserror::Error;

use pep440_rs::VersionParseError;
use pinion_normalize::PackageName;
use pinion_pypi_types::{IndexUrl, Location, Requirement};

use crate::Candidate;

#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "Hashes and dependencies can only be looked up for pinned (`==`) or editable requirements, but `{0}` is neither"
    )]
    Unpinned(Box<Requirement>),

    #[error(transparent)]
    NoCandidateFound(Box<NoCandidateFound>),

    #[error("Failed to fetch the files of `{0}` from the index")]
    Index(PackageName, #[source] anyhow::Error),

    #[error("Failed to extract the metadata of `{0}`")]
    Extract(Box<Requirement>, #[source] anyhow::Error),

    #[error("Failed to fetch `{0}`")]
    Fetch(Location, #[source] anyhow::Error),

    #[error("Failed to hash `{0}`")]
    Hash(Location, #[source] std::io::Error),

    #[error("Failed to access the cache")]
    Cache(#[source] std::io::Error),

    #[error(
        "No Python interpreter found in `PATH` (tried `python3` and `python`); set `PINION_PYTHON_VERSION` to choose a target version"
    )]
    PythonNotFound,

    #[error("Failed to query the Python interpreter at `{}`", _0.display())]
    PythonQuery(PathBuf, #[source] std::io::Error),

    #[error("Invalid Python version: `{0}`")]
    PythonVersion(String, #[source] VersionParseError),
}

/// No version of a package satisfies a requirement.
///
/// Carries every candidate that was found (before any filtering) and the indexes that were
/// searched, for diagnostics.
#[derive(Debug, Clone)]
pub struct NoCandidateFound {
    pub requirement: Requirement,
    pub candidates: Vec<Candidate>,
    pub index_urls: Vec<IndexUrl>,
}

impl Display for NoCandidateFound {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let available = self
            .candidates
            .iter()
            .map(|candidate| &candidate.version)
            .sorted()
            .dedup()
            .join(", ");
        if self.requirement.specifier.is_empty() {
            write!(f, "No version of {} found", self.requirement.name)?;
        } else {
            write!(
                f,
                "No version of {} matches {}",
                self.requirement.name, self.requirement.specifier
            )?;
        }
        if available.is_empty() {
            write!(f, " (no versions available)")
        } else {
            write!(f, " (available: {available})")
        }
    }
}

impl std::error::Error for NoCandidateFound {}
