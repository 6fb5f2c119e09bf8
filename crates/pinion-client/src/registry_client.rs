use std::str::FromStr;
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{ClientBuilder, Response, StatusCode};
use reqwest_middleware::ClientWithMiddleware;
use reqwest_retry::RetryTransientMiddleware;
use reqwest_retry::policies::ExponentialBackoff;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use pep440_rs::Version;
use pinion_normalize::PackageName;
use pinion_pypi_types::{
    IndexUrls, Location, ProjectJson, ReleaseJson, Requirement, SimpleJson,
};
use pinion_types::{ArtifactReader, IndexFile, PackageIndex};

use crate::{Error, open_local_or_remote_file};

/// The media type of the PEP 691 JSON simple API.
const SIMPLE_JSON_MEDIA_TYPE: &str = "application/vnd.pypi.simple.v1+json";

/// The root of PyPI's JSON API.
const PYPI_JSON_API: &str = "https://pypi.org/pypi/";

/// The default number of retries for transient request failures.
pub const DEFAULT_RETRIES: u32 = 3;

/// A builder for a [`RegistryClient`].
#[derive(Debug, Clone)]
pub struct RegistryClientBuilder {
    index_urls: IndexUrls,
    json_api_url: Option<Url>,
    retries: u32,
    timeout: Duration,
}

impl Default for RegistryClientBuilder {
    fn default() -> Self {
        Self {
            index_urls: IndexUrls::default(),
            json_api_url: None,
            retries: DEFAULT_RETRIES,
            timeout: Duration::from_secs(60 * 5),
        }
    }
}

impl RegistryClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn index_urls(mut self, index_urls: IndexUrls) -> Self {
        self.index_urls = index_urls;
        self
    }

    /// Use a JSON API at `url` (in the shape of `https://pypi.org/pypi/`) for release metadata.
    ///
    /// By default, PyPI's JSON API is used if PyPI is one of the configured indexes.
    #[must_use]
    pub fn json_api_url(mut self, url: Url) -> Self {
        self.json_api_url = Some(url);
        self
    }

    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<RegistryClient, Error> {
        let client_raw = ClientBuilder::new()
            .user_agent(concat!("pinion/", env!("CARGO_PKG_VERSION")))
            .pool_max_idle_per_host(20)
            .timeout(self.timeout)
            .build()?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(self.retries);
        let retry_strategy = RetryTransientMiddleware::new_with_policy(retry_policy);
        let client = reqwest_middleware::ClientBuilder::new(client_raw)
            .with(retry_strategy)
            .build();

        let json_api_url = match self.json_api_url {
            Some(url) => Some(url),
            None if self.index_urls.includes_pypi() => Some(Url::parse(PYPI_JSON_API)?),
            None => None,
        };

        Ok(RegistryClient {
            index_urls: self.index_urls,
            json_api_url,
            client,
        })
    }
}

/// A client for fetching packages from a PyPI-compatible index.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    index_urls: IndexUrls,
    /// The root of the JSON API, if one is available for the configured indexes.
    json_api_url: Option<Url>,
    client: ClientWithMiddleware,
}

impl RegistryClient {
    /// The underlying HTTP client, with retries.
    pub fn client(&self) -> &ClientWithMiddleware {
        &self.client
    }

    /// Fetch the files of a package from the simple API.
    ///
    /// "simple" here refers to [PEP 503 – Simple Repository API](https://peps.python.org/pep-0503/)
    /// in its JSON form, [PEP 691](https://peps.python.org/pep-0691/). The indexes are tried in
    /// order and the first one that knows the package wins.
    pub async fn simple(&self, package_name: &PackageName) -> Result<Vec<IndexFile>, Error> {
        if self.index_urls.no_index() {
            return Err(Error::NoIndex(package_name.to_string()));
        }

        for index in self.index_urls.iter() {
            let mut url: Url = (**index).clone();
            url.path_segments_mut()
                .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
                .pop_if_empty()
                .push(package_name.as_ref())
                .push("");

            trace!("Fetching metadata for {package_name} from {url}");

            let response = self
                .client
                .get(url.clone())
                .header(ACCEPT, SIMPLE_JSON_MEDIA_TYPE)
                .send()
                .await?;
            if response.status() == StatusCode::NOT_FOUND {
                debug!("Package {package_name} not found on {index}");
                continue;
            }
            let response = response.error_for_status()?;

            // Relative file URLs are relative to the page after redirects.
            let base = response.url().clone();
            let simple: SimpleJson = parse_json(response, url).await?;

            let files = simple
                .files
                .into_iter()
                .filter_map(|file| {
                    let hash = file.hashes.strongest();
                    match Location::from_index_file(&base, &file.url, hash.as_ref()) {
                        Ok(location) => Some(IndexFile {
                            index: index.clone(),
                            file,
                            location,
                        }),
                        Err(err) => {
                            debug!("Skipping file with invalid URL `{}`: {err}", file.url);
                            None
                        }
                    }
                })
                .collect();
            return Ok(files);
        }

        Err(Error::PackageNotFound(package_name.to_string()))
    }

    /// Fetch a project from the JSON API, or `None` if the API isn't available or doesn't know
    /// the project.
    pub async fn project_json(
        &self,
        package_name: &PackageName,
    ) -> Result<Option<ProjectJson>, Error> {
        let Some(api) = &self.json_api_url else {
            return Ok(None);
        };
        let url = api.join(&format!("{package_name}/json"))?;
        self.get_json(url).await
    }

    /// Fetch one release from the JSON API, or `None` if the API isn't available or doesn't know
    /// the release.
    pub async fn release_json(
        &self,
        package_name: &PackageName,
        version: &str,
    ) -> Result<Option<ReleaseJson>, Error> {
        let Some(api) = &self.json_api_url else {
            return Ok(None);
        };
        let url = api.join(&format!("{package_name}/{version}/json"))?;
        self.get_json(url).await
    }

    /// The declared dependencies of a release according to the JSON API.
    ///
    /// The project's releases are searched for the one equal to `version`, so that e.g. `1.0`
    /// finds a release published as `1.0.0`. Entries that aren't valid requirements are skipped.
    pub async fn requires_dist(
        &self,
        package_name: &PackageName,
        version: &Version,
    ) -> Result<Option<Vec<Requirement>>, Error> {
        let Some(project) = self.project_json(package_name).await? else {
            return Ok(None);
        };
        let Some(release) = project
            .releases
            .keys()
            .find(|release| Version::from_str(release).is_ok_and(|release| release == *version))
        else {
            debug!("No release of {package_name} matches {version} in the JSON API");
            return Ok(None);
        };
        let Some(release) = self.release_json(package_name, release).await? else {
            return Ok(None);
        };
        let Some(requires_dist) = release.info.requires_dist else {
            return Ok(None);
        };
        let requirements = requires_dist
            .iter()
            .filter_map(|requirement| match Requirement::from_str(requirement) {
                Ok(requirement) => Some(requirement),
                Err(err) => {
                    debug!("Skipping invalid dependency of {package_name}: {err}");
                    None
                }
            })
            .collect();
        Ok(Some(requirements))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, Error> {
        trace!("Fetching {url}");
        let response = self.client.get(url.clone()).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response.error_for_status()?;
        parse_json(response, url).await.map(Some)
    }

    /// Stream an artifact from the local filesystem or the network.
    pub async fn open(&self, location: &Location) -> Result<ArtifactReader, Error> {
        open_local_or_remote_file(location, &self.client).await
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response, url: Url) -> Result<T, Error> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(bytes.as_ref()).map_err(|err| Error::from_json_err(err, url))
}

impl PackageIndex for RegistryClient {
    fn index_urls(&self) -> &IndexUrls {
        &self.index_urls
    }

    async fn simple<'a>(&'a self, name: &'a PackageName) -> anyhow::Result<Vec<IndexFile>> {
        match Self::simple(self, name).await {
            Ok(files) => Ok(files),
            Err(Error::PackageNotFound(_)) => {
                debug!("No index knows {name}");
                Ok(Vec::new())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn project_metadata<'a>(
        &'a self,
        name: &'a PackageName,
        version: &'a Version,
    ) -> anyhow::Result<Option<Vec<Requirement>>> {
        Ok(self.requires_dist(name, version).await?)
    }

    async fn fetch<'a>(&'a self, location: &'a Location) -> anyhow::Result<ArtifactReader> {
        Ok(self.open(location).await?)
    }
}
