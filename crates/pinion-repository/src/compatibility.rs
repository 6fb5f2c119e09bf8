use std::ops::{Deref, DerefMut};

use rustc_hash::FxHashMap;

use pinion_distribution_filename::DistFilename;
use pinion_normalize::PackageName;
use pinion_platform_tags::{TagCompatibility, TagPriority, Tags};

use crate::{ArtifactPriority, Candidate, PackageRepository};

/// The rule deciding which artifacts are installable and how they rank.
#[derive(Debug, Clone)]
pub enum CompatibilityPolicy {
    /// Wheels must match one of the tags; source distributions are always allowed.
    Tags(Tags),
    /// Every artifact is allowed, and all wheels rank equally.
    AllowAll,
}

impl CompatibilityPolicy {
    /// The priority of the artifact, or `None` if it can't be installed.
    pub fn priority(&self, filename: &DistFilename) -> Option<ArtifactPriority> {
        let DistFilename::WheelFilename(wheel) = filename else {
            return Some(ArtifactPriority::SourceDist);
        };
        match self {
            Self::AllowAll => Some(ArtifactPriority::Wheel(TagPriority::UNIFORM)),
            Self::Tags(tags) => match wheel.compatibility(tags) {
                TagCompatibility::Compatible(priority) => Some(ArtifactPriority::Wheel(priority)),
                TagCompatibility::Incompatible(_) => None,
            },
        }
    }
}

/// A scope in which a [`PackageRepository`] treats every artifact as installable, e.g. to
/// collect the hashes of a release for all platforms.
///
/// Entering the scope switches the repository to [`CompatibilityPolicy::AllowAll`] and sets the
/// candidate cache aside, since its contents were filtered under the previous policy. Dropping
/// the guard restores both, on every exit path.
pub struct AllowAllArtifacts<'a, I, E> {
    repository: &'a mut PackageRepository<I, E>,
    policy: Option<CompatibilityPolicy>,
    candidates: Option<FxHashMap<PackageName, Vec<Candidate>>>,
}

impl<'a, I, E> AllowAllArtifacts<'a, I, E> {
    pub(crate) fn new(repository: &'a mut PackageRepository<I, E>) -> Self {
        let policy = std::mem::replace(&mut repository.policy, CompatibilityPolicy::AllowAll);
        let candidates = std::mem::take(&mut repository.candidates);
        Self {
            repository,
            policy: Some(policy),
            candidates: Some(candidates),
        }
    }
}

impl<I, E> Deref for AllowAllArtifacts<'_, I, E> {
    type Target = PackageRepository<I, E>;

    fn deref(&self) -> &Self::Target {
        self.repository
    }
}

impl<I, E> DerefMut for AllowAllArtifacts<'_, I, E> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.repository
    }
}

impl<I, E> Drop for AllowAllArtifacts<'_, I, E> {
    fn drop(&mut self) {
        if let Some(policy) = self.policy.take() {
            self.repository.policy = policy;
        }
        if let Some(candidates) = self.candidates.take() {
            self.repository.candidates = candidates;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn priorities() {
        let name = PackageName::from_str("foo").unwrap();
        let wheel = DistFilename::try_from_filename("foo-1.0-cp312-cp312-win_amd64.whl", &name)
            .unwrap();
        let sdist = DistFilename::try_from_filename("foo-1.0.tar.gz", &name).unwrap();
        let tags = CompatibilityPolicy::Tags(Tags::new(vec![(
            "py3".to_string(),
            "none".to_string(),
            "any".to_string(),
        )]));

        assert_eq!(tags.priority(&wheel), None);
        assert_eq!(tags.priority(&sdist), Some(ArtifactPriority::SourceDist));
        assert_eq!(
            CompatibilityPolicy::AllowAll.priority(&wheel),
            Some(ArtifactPriority::Wheel(TagPriority::UNIFORM))
        );
    }
}
