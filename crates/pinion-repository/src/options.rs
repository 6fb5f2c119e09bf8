use pinion_platform_tags::Tags;
use pinion_pypi_types::HashAlgorithm;

use crate::TargetPython;

/// Settings for a [`crate::PackageRepository`].
#[derive(Debug, Clone)]
pub struct RepositoryOptions {
    /// The interpreter version that candidates must support.
    pub target_python: TargetPython,
    /// The wheel tags that are installable on the target.
    pub tags: Tags,
    /// Ask the index's JSON API for dependencies, in addition to extracting them.
    pub use_json: bool,
    /// The digest used when hashing artifacts.
    pub favorite_hash: HashAlgorithm,
}

impl RepositoryOptions {
    pub fn new(target_python: TargetPython, tags: Tags) -> Self {
        Self {
            target_python,
            tags,
            use_json: false,
            favorite_hash: HashAlgorithm::default(),
        }
    }

    #[must_use]
    pub fn with_use_json(mut self, use_json: bool) -> Self {
        self.use_json = use_json;
        self
    }

    #[must_use]
    pub fn with_favorite_hash(mut self, favorite_hash: HashAlgorithm) -> Self {
        self.favorite_hash = favorite_hash;
        self
    }
}
