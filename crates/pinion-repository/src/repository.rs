use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use tracing::{debug, instrument, trace};

use pep440_rs::Version;
use pinion_cache::{Cache, HashStore, Removal, Workspace};
use pinion_distribution_filename::DistFilename;
use pinion_normalize::PackageName;
use pinion_pypi_types::{Requirement, RequirementKey, RequirementSource};
use pinion_types::{IndexFile, MetadataExtractor, PackageIndex};

use crate::dependencies::FastPathOutcome;
use crate::{
    AllowAllArtifacts, Candidate, CompatibilityPolicy, Error, NoCandidateFound,
    RepositoryOptions, matching_versions,
};

/// Answers questions about packages for a resolver: which version best satisfies a requirement,
/// what that version depends on, and which hashes verify its artifacts.
///
/// Candidate lists and dependency lists are memoized for the lifetime of the repository (or
/// until [`PackageRepository::reset`]). Every operation takes `&mut self`, so a repository is
/// used from one logical thread of control at a time.
pub struct PackageRepository<I, E> {
    pub(crate) index: I,
    pub(crate) extractor: E,
    pub(crate) options: RepositoryOptions,
    pub(crate) cache: Cache,
    pub(crate) workspace: Workspace,
    pub(crate) hash_store: HashStore,
    pub(crate) policy: CompatibilityPolicy,
    pub(crate) candidates: FxHashMap<PackageName, Vec<Candidate>>,
    pub(crate) dependencies: FxHashMap<RequirementKey, Vec<Requirement>>,
    pub(crate) json_dependencies: FxHashMap<RequirementKey, FastPathOutcome>,
}

impl<I: PackageIndex, E: MetadataExtractor> PackageRepository<I, E> {
    pub fn new(
        index: I,
        extractor: E,
        options: RepositoryOptions,
        cache: Cache,
    ) -> Result<Self, Error> {
        let workspace = Workspace::new(&cache).map_err(Error::Cache)?;
        let hash_store = HashStore::new(&cache);
        let policy = CompatibilityPolicy::Tags(options.tags.clone());
        Ok(Self {
            index,
            extractor,
            options,
            cache,
            workspace,
            hash_store,
            policy,
            candidates: FxHashMap::default(),
            dependencies: FxHashMap::default(),
            json_dependencies: FxHashMap::default(),
        })
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    pub fn options(&self) -> &RepositoryOptions {
        &self.options
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// The compatibility policy currently in effect.
    pub fn policy(&self) -> &CompatibilityPolicy {
        &self.policy
    }

    /// Treat every artifact as installable until the returned guard is dropped.
    pub fn allow_all_artifacts(&mut self) -> AllowAllArtifacts<'_, I, E> {
        AllowAllArtifacts::new(self)
    }

    /// All installable artifacts of a package, across versions.
    ///
    /// The index is queried once per package; later calls return the memoized list.
    #[instrument(skip_all, fields(name = %name))]
    pub async fn find_all_candidates(
        &mut self,
        name: &PackageName,
    ) -> Result<Vec<Candidate>, Error> {
        if let Some(candidates) = self.candidates.get(name) {
            return Ok(candidates.clone());
        }

        let files = self
            .index
            .simple(name)
            .await
            .map_err(|err| Error::Index(name.clone(), err))?;
        let candidates: Vec<Candidate> = files
            .into_iter()
            .filter_map(|file| self.candidate(name, file))
            .collect();
        debug!("Found {} candidates for {name}", candidates.len());

        self.candidates.insert(name.clone(), candidates.clone());
        Ok(candidates)
    }

    /// Turn an index file into a candidate, unless its name doesn't parse or the compatibility
    /// policy rejects it.
    fn candidate(&self, name: &PackageName, file: IndexFile) -> Option<Candidate> {
        let Some(filename) = DistFilename::try_from_filename(&file.file.filename, name) else {
            debug!("Skipping file with unexpected name: {}", file.file.filename);
            return None;
        };
        let Some(priority) = self.policy.priority(&filename) else {
            trace!("Skipping incompatible wheel: {filename}");
            return None;
        };
        let requires_python = match file.file.requires_python {
            Some(Ok(requires_python)) => Some(requires_python),
            Some(Err(err)) => {
                debug!("Ignoring invalid `requires-python` of {filename}: {err}");
                None
            }
            None => None,
        };
        Some(Candidate {
            name: name.clone(),
            version: filename.version().clone(),
            location: file.location,
            requires_python,
            yanked: file
                .file
                .yanked
                .as_ref()
                .is_some_and(|yanked| yanked.is_yanked()),
            filename,
            priority,
        })
    }

    /// Pin a requirement to the best version that satisfies it.
    ///
    /// Candidates that don't support the target interpreter are ignored. Editable and direct URL
    /// requirements are returned unchanged. The result is a new requirement carrying the
    /// input's extras, marker and constraint flag.
    #[instrument(skip_all, fields(requirement = %requirement))]
    pub async fn find_best_match(
        &mut self,
        requirement: &Requirement,
        prereleases: Option<bool>,
    ) -> Result<Requirement, Error> {
        if !matches!(requirement.source, RequirementSource::Registry) {
            return Ok(requirement.clone());
        }

        let candidates = self.find_all_candidates(&requirement.name).await?;

        // The best artifact of each version that supports the target interpreter.
        let python_version = self.options.target_python.version();
        let mut by_version: BTreeMap<&Version, &Candidate> = BTreeMap::new();
        for candidate in &candidates {
            if !candidate.supports_python(python_version) {
                trace!("Skipping {candidate}: requires Python {:?}", candidate.requires_python);
                continue;
            }
            by_version
                .entry(&candidate.version)
                .and_modify(|best| {
                    if candidate.rank() > best.rank() {
                        *best = candidate;
                    }
                })
                .or_insert(candidate);
        }

        let matching =
            matching_versions(&requirement.specifier, by_version.keys().copied(), prereleases);
        let Some(best) = matching
            .into_iter()
            .filter_map(|version| by_version.get(version).copied())
            .max_by(|a, b| a.rank().cmp(&b.rank()))
        else {
            return Err(self.no_candidate_found(requirement, candidates.clone()));
        };

        debug!("Selected {best} for {requirement}");
        Ok(requirement.pin(best.version.clone()))
    }

    pub(crate) fn no_candidate_found(
        &self,
        requirement: &Requirement,
        candidates: Vec<Candidate>,
    ) -> Error {
        Error::NoCandidateFound(Box::new(NoCandidateFound {
            requirement: requirement.clone(),
            candidates,
            index_urls: self.index.index_urls().iter().cloned().collect(),
        }))
    }

    /// Forget every memoized candidate and dependency list, and start over with fresh scratch
    /// directories.
    pub fn reset(&mut self) -> Result<(), Error> {
        self.candidates.clear();
        self.dependencies.clear();
        self.json_dependencies.clear();
        self.workspace.reset().map_err(Error::Cache)
    }

    /// Remove the downloaded archives.
    pub fn clear_caches(&mut self) -> Result<Removal, Error> {
        self.workspace.clear_downloads().map_err(Error::Cache)
    }
}
