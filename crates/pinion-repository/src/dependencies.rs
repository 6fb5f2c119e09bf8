use itertools::Itertools;
use tracing::{debug, instrument};

use pep440_rs::{Operator, VersionSpecifiers};
use pinion_pypi_types::{Location, Requirement};
use pinion_types::{ExtractionRequest, MetadataExtractor, PackageIndex};

use crate::{Error, PackageRepository};

/// The outcome of asking the index's structured metadata API for a release's dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FastPathOutcome {
    /// The fast path is turned off.
    Disabled,
    /// The index couldn't answer, e.g. it has no JSON API, the request failed, or the release
    /// didn't declare its dependencies.
    Unavailable,
    /// The dependencies the index reported, excluding those that only apply to extras.
    Found(Vec<Requirement>),
}

/// The dependencies of a release, as reported by each source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySources {
    /// What the index's metadata API reported.
    pub fast: FastPathOutcome,
    /// What the extractor found in the artifact itself.
    pub authoritative: Vec<Requirement>,
}

impl DependencySources {
    /// The union of both sources, fast path first, without duplicates.
    ///
    /// Requirements on the same package that differ in extras or markers are kept as separate
    /// entries.
    pub fn merged(self) -> Vec<Requirement> {
        let fast = match self.fast {
            FastPathOutcome::Found(requirements) => requirements,
            FastPathOutcome::Disabled | FastPathOutcome::Unavailable => Vec::new(),
        };
        fast.into_iter().chain(self.authoritative).unique().collect()
    }
}

impl<I: PackageIndex, E: MetadataExtractor> PackageRepository<I, E> {
    /// The direct dependencies of a pinned or editable requirement, from every enabled source.
    #[instrument(skip_all, fields(requirement = %requirement))]
    pub async fn get_dependencies(
        &mut self,
        requirement: &Requirement,
    ) -> Result<Vec<Requirement>, Error> {
        Ok(self.lookup_dependencies(requirement).await?.merged())
    }

    /// The direct dependencies of a pinned or editable requirement, tagged by source.
    pub async fn lookup_dependencies(
        &mut self,
        requirement: &Requirement,
    ) -> Result<DependencySources, Error> {
        ensure_pinned(requirement)?;
        let fast = if self.options.use_json {
            self.get_json_dependencies(requirement).await
        } else {
            FastPathOutcome::Disabled
        };
        let authoritative = self.get_legacy_dependencies(requirement).await?;
        Ok(DependencySources {
            fast,
            authoritative,
        })
    }

    /// Ask the index's JSON API for the dependencies of a pinned release.
    ///
    /// Never fails: any problem is logged and reported as [`FastPathOutcome::Unavailable`].
    pub async fn get_json_dependencies(&mut self, requirement: &Requirement) -> FastPathOutcome {
        if !self.index.index_urls().includes_pypi() {
            return FastPathOutcome::Unavailable;
        }

        let key = requirement.key();
        if let Some(outcome) = self.json_dependencies.get(&key) {
            return outcome.clone();
        }

        let outcome = match requirement.pinned_version() {
            None => FastPathOutcome::Unavailable,
            Some(version) => {
                match self
                    .index
                    .project_metadata(&requirement.name, version)
                    .await
                {
                    Ok(Some(requirements)) => FastPathOutcome::Found(
                        requirements
                            .into_iter()
                            .filter(|requirement| !requirement.marker_mentions_extra())
                            .collect(),
                    ),
                    Ok(None) => {
                        debug!("The index has no dependency metadata for {requirement}");
                        FastPathOutcome::Unavailable
                    }
                    Err(err) => {
                        debug!("Failed to fetch dependency metadata for {requirement}: {err:#}");
                        FastPathOutcome::Unavailable
                    }
                }
            }
        };

        self.json_dependencies.insert(key, outcome.clone());
        outcome
    }

    /// The direct dependencies of a pinned or editable requirement, as reported by the
    /// extractor.
    #[instrument(skip_all, fields(requirement = %requirement))]
    pub async fn get_legacy_dependencies(
        &mut self,
        requirement: &Requirement,
    ) -> Result<Vec<Requirement>, Error> {
        ensure_pinned(requirement)?;

        let key = requirement.key();
        if let Some(dependencies) = self.dependencies.get(&key) {
            return Ok(dependencies.clone());
        }

        let location = self.locate(requirement).await?;

        // Local project directories and checkouts are used in place.
        let in_place = (requirement.is_editable()
            && location.to_file_path().is_some_and(|path| path.is_dir()))
            || location.is_vcs();
        let download_dir = if in_place {
            None
        } else {
            Some(
                self.workspace
                    .download_dir()
                    .map_err(Error::Cache)?
                    .to_path_buf(),
            )
        };
        let wheel_download_dir = self
            .workspace
            .wheel_download_dir()
            .map_err(Error::Cache)?
            .to_path_buf();

        // Scratch space for this extraction only, removed when dropped.
        let build_dir = tempfile::tempdir_in(self.workspace.build_dir()).map_err(Error::Cache)?;

        let extracted = self
            .extractor
            .extract(ExtractionRequest {
                requirement,
                location: &location,
                build_dir: build_dir.path(),
                source_dir: self.workspace.source_dir(),
                download_dir: download_dir.as_deref(),
                wheel_download_dir: &wheel_download_dir,
            })
            .await
            .map_err(|err| Error::Extract(Box::new(requirement.clone()), err))?;
        drop(build_dir);

        let mut dependencies = extracted.dependencies;

        // An editable is materialized first, so its own metadata is the source of truth for
        // what it is and what it needs at setup time.
        let mut subject = requirement.clone();
        if requirement.is_editable() {
            if let Some(distribution) = extracted.distribution {
                debug!(
                    "Editable {requirement} is {} {}",
                    distribution.name, distribution.version
                );
                subject = Requirement {
                    name: distribution.name,
                    ..requirement.clone()
                }
                .pin(distribution.version);
                if let Some(requires_txt) = &distribution.requires_txt {
                    for dependency in requires_txt.unconditional_requirements() {
                        if !dependencies.contains(&dependency) {
                            dependencies.push(dependency);
                        }
                    }
                }
            }
        }

        // A package-wide interpreter constraint stands in for the whole dependency list.
        if let Some(requires_python) = extracted
            .requires_python
            .as_ref()
            .and_then(python_marker)
        {
            debug!("{requirement} requires Python {requires_python}");
            dependencies = vec![subject.and_marker(&requires_python)];
        }

        self.dependencies.insert(key, dependencies.clone());
        Ok(dependencies)
    }

    /// Where to find the artifact of a pinned or editable requirement.
    ///
    /// For registry requirements, this is the best artifact of the pinned version.
    async fn locate(&mut self, requirement: &Requirement) -> Result<Location, Error> {
        if let Some(location) = requirement.location() {
            return Ok(location.clone());
        }

        let candidates = self.find_all_candidates(&requirement.name).await?;
        candidates
            .iter()
            .filter(|candidate| requirement.specifier.contains(&candidate.version))
            .max_by(|a, b| a.rank().cmp(&b.rank()))
            .map(|candidate| candidate.location.clone())
            .ok_or_else(|| self.no_candidate_found(requirement, candidates.clone()))
    }
}

/// Reject requirements that aren't pinned to one version and aren't editable.
pub(crate) fn ensure_pinned(requirement: &Requirement) -> Result<(), Error> {
    if requirement.is_editable() || requirement.is_pinned() {
        Ok(())
    } else {
        Err(Error::Unpinned(Box::new(requirement.clone())))
    }
}

/// Express a `Requires-Python` constraint as an environment marker, e.g. `>=3.8, <4` becomes
/// `python_full_version >= '3.8' and python_full_version < '4'`.
///
/// Returns `None` for an empty constraint.
fn python_marker(requires_python: &VersionSpecifiers) -> Option<String> {
    if requires_python.is_empty() {
        return None;
    }
    Some(
        requires_python
            .iter()
            .map(|specifier| {
                let star = matches!(
                    specifier.operator(),
                    Operator::EqualStar | Operator::NotEqualStar
                );
                format!(
                    "python_full_version {} '{}{}'",
                    specifier.operator(),
                    specifier.version(),
                    if star { ".*" } else { "" }
                )
            })
            .join(" and "),
    )
}
