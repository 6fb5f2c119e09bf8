use std::fmt::{Display, Formatter};

use pep440_rs::{Version, VersionSpecifiers};

use pinion_distribution_filename::{BuildTag, DistFilename};
use pinion_normalize::PackageName;
use pinion_platform_tags::TagPriority;
use pinion_pypi_types::Location;

/// How strongly an artifact is preferred among the artifacts of one version.
///
/// Source distributions rank below every wheel; wheels rank by the priority of their most
/// specific compatible tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArtifactPriority {
    SourceDist,
    Wheel(TagPriority),
}

/// One artifact published for a package at a version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: PackageName,
    pub version: Version,
    pub location: Location,
    /// The interpreter versions the artifact supports, if the index declared them.
    pub requires_python: Option<VersionSpecifiers>,
    pub filename: DistFilename,
    pub priority: ArtifactPriority,
    pub yanked: bool,
}

impl Candidate {
    /// The key candidates are ordered by: version, then wheel build tag, then artifact priority.
    pub fn rank(&self) -> (&Version, Option<&BuildTag>, ArtifactPriority) {
        (&self.version, self.filename.build_tag(), self.priority)
    }

    /// Returns `true` if the candidate can be installed on `python_version`.
    pub fn supports_python(&self, python_version: &Version) -> bool {
        self.requires_python
            .as_ref()
            .is_none_or(|requires_python| requires_python.contains(python_version))
    }
}

impl Display for Candidate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.name, self.version, self.filename)
    }
}
