//! Avoid cyclic crate dependencies between the repository adapter, the index client and the
//! metadata extractor.
//!
//! The adapter only knows about an index and an extractor through the traits in this crate, so
//! that either can be replaced, e.g. by an in-memory fake in tests:
//!
//! ```text
//!              ┌────────────────┐
//!              │pinion          │
//!              └───────▲────────┘
//!                      │
//!              ┌───────┴─────────┐
//!              │pinion-repository│
//!              └───────▲─────────┘
//!                      │
//!         ┌────────────┼───────────────┐
//! ┌───────┴───────┐    │     ┌─────────┴──────┐
//! │pinion-client  │    │     │pinion-extract  │
//! └───────▲───────┘    │     └────────▲───────┘
//!         │    ┌───────┴────────┐     │
//!         └────┤pinion-types    ├─────┘
//!              └────────────────┘
//! ```

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use pep440_rs::{Version, VersionSpecifiers};
use tokio::io::AsyncRead;

use pinion_normalize::PackageName;
use pinion_pypi_types::{File, IndexUrl, IndexUrls, Location, Requirement, RequiresTxt};

/// A reader over the bytes of an artifact.
///
/// For remote artifacts the reader owns the response, so dropping it releases the connection.
pub type ArtifactReader = Pin<Box<dyn AsyncRead + Send>>;

/// A file listed on an index's project page.
#[derive(Debug, Clone)]
pub struct IndexFile {
    /// The index that listed the file.
    pub index: IndexUrl,
    pub file: File,
    /// The file's URL, resolved against the project page and carrying the index-provided hash
    /// in its fragment.
    pub location: Location,
}

/// A source of package files and their metadata, e.g. a PyPI-compatible registry.
pub trait PackageIndex {
    /// The indexes that are searched, in order.
    fn index_urls(&self) -> &IndexUrls;

    /// All files published for a package on the first index that knows it, or none if no index
    /// knows it.
    fn simple<'a>(
        &'a self,
        name: &'a PackageName,
    ) -> impl Future<Output = anyhow::Result<Vec<IndexFile>>> + 'a;

    /// The declared dependencies of one release from the index's structured metadata API.
    ///
    /// Returns `None` if the index doesn't offer such an API, or doesn't know the release's
    /// dependencies.
    fn project_metadata<'a>(
        &'a self,
        name: &'a PackageName,
        version: &'a Version,
    ) -> impl Future<Output = anyhow::Result<Option<Vec<Requirement>>>> + 'a;

    /// Open an artifact for streaming.
    fn fetch<'a>(
        &'a self,
        location: &'a Location,
    ) -> impl Future<Output = anyhow::Result<ArtifactReader>> + 'a;
}

/// Everything a [`MetadataExtractor`] needs to materialize one artifact.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionRequest<'a> {
    /// The pinned (or editable) requirement being inspected.
    pub requirement: &'a Requirement,
    /// The artifact, checkout or project directory to inspect.
    pub location: &'a Location,
    /// A scratch directory, removed after the extraction.
    pub build_dir: &'a Path,
    /// The directory for version control checkouts.
    pub source_dir: &'a Path,
    /// Where to download archives to, or `None` if the location is used in place.
    pub download_dir: Option<&'a Path>,
    /// Where to download wheels to.
    pub wheel_download_dir: &'a Path,
}

/// The metadata of the distribution an editable requirement was materialized into.
#[derive(Debug, Clone)]
pub struct DistributionMetadata {
    pub name: PackageName,
    pub version: Version,
    /// The separately recorded setup-time dependencies (`*.egg-info/requires.txt`), if any.
    pub requires_txt: Option<RequiresTxt>,
}

/// What a [`MetadataExtractor`] learned about an artifact.
#[derive(Debug, Clone, Default)]
pub struct ExtractedMetadata {
    /// The direct dependencies of the distribution.
    pub dependencies: Vec<Requirement>,
    /// The interpreter constraint of the whole package (`Requires-Python`).
    pub requires_python: Option<VersionSpecifiers>,
    /// For editable requirements, the metadata of the materialized distribution.
    pub distribution: Option<DistributionMetadata>,
}

/// Materializes a located artifact and reports its declared dependencies.
pub trait MetadataExtractor {
    fn extract<'a>(
        &'a self,
        request: ExtractionRequest<'a>,
    ) -> impl Future<Output = anyhow::Result<ExtractedMetadata>> + 'a;
}
