pub use candidate::{ArtifactPriority, Candidate};
pub use compatibility::{AllowAllArtifacts, CompatibilityPolicy};
pub use dependencies::{DependencySources, FastPathOutcome};
pub use error::{Error, NoCandidateFound};
pub use options::RepositoryOptions;
pub use prerelease::matching_versions;
pub use python::TargetPython;
pub use repository::PackageRepository;

mod candidate;
mod compatibility;
mod dependencies;
mod error;
mod hashes;
mod options;
mod prerelease;
mod python;
mod repository;
