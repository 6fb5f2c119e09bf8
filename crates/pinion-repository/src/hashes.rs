use std::collections::BTreeSet;

use itertools::Itertools;
use tracing::{debug, instrument};

use pinion_pypi_types::{Location, Requirement};
use pinion_types::{MetadataExtractor, PackageIndex};

use crate::dependencies::ensure_pinned;
use crate::{Error, PackageRepository, matching_versions};

impl<I: PackageIndex, E: MetadataExtractor> PackageRepository<I, E> {
    /// The hashes of every artifact published under the version a pinned requirement selects,
    /// formatted as `algorithm:hexdigest`.
    ///
    /// Editable requirements have no artifacts to verify, so they yield an empty set.
    #[instrument(skip_all, fields(requirement = %requirement))]
    pub async fn get_hashes(
        &mut self,
        requirement: &Requirement,
    ) -> Result<BTreeSet<String>, Error> {
        if requirement.is_editable() {
            return Ok(BTreeSet::new());
        }
        ensure_pinned(requirement)?;

        let candidates = self.find_all_candidates(&requirement.name).await?;
        let versions = candidates
            .iter()
            .map(|candidate| &candidate.version)
            .unique()
            .collect::<Vec<_>>();
        let Some(version) = matching_versions(&requirement.specifier, versions, None)
            .into_iter()
            .next()
            .cloned()
        else {
            return Err(self.no_candidate_found(requirement, candidates));
        };

        let mut hashes = BTreeSet::new();
        for candidate in candidates.iter().filter(|candidate| candidate.version == version) {
            hashes.insert(self.get_hash(&candidate.location).await?);
        }
        debug!("Found {} hashes for {requirement}", hashes.len());
        Ok(hashes)
    }

    /// The hash of the artifact at `location`, formatted as `algorithm:hexdigest`.
    ///
    /// Locations that carry a hash in their fragment identify immutable artifacts, so their
    /// hashes are persisted in the cache, keyed by the configured algorithm and the full URL, and
    /// computed at most once per algorithm. Other locations are hashed on every call.
    pub async fn get_hash(&mut self, location: &Location) -> Result<String, Error> {
        if location.hash().is_none() {
            return self.compute(location).await;
        }

        let algorithm = self.options.favorite_hash;
        let key = format!("{algorithm} {}", location.url());
        if let Some(hash) = self.hash_store.get(&key) {
            if hash.starts_with(&format!("{algorithm}:")) {
                return Ok(hash);
            }
            debug!("Ignoring cached hash in another algorithm: {hash}");
        }

        let hash = self.compute(location).await?;
        self.hash_store.insert(&key, &hash).map_err(Error::Cache)?;
        Ok(hash)
    }

    /// Stream the artifact at `location` through the configured digest.
    async fn compute(&self, location: &Location) -> Result<String, Error> {
        debug!("Hashing {}", location.url());
        let reader = self
            .index
            .fetch(location)
            .await
            .map_err(|err| Error::Fetch(location.clone(), err))?;
        let digest = pinion_client::hash_reader(reader, self.options.favorite_hash)
            .await
            .map_err(|err| Error::Hash(location.clone(), err))?;
        Ok(digest.to_string())
    }
}
