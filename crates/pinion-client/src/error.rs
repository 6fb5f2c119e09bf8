use std::path::PathBuf;

use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum Error {
    /// An invalid URL was provided.
    #[error(transparent)]
    UrlParse(#[from] url::ParseError),

    /// The package was not found on any of the configured indexes.
    ///
    /// Make sure the package name is spelled correctly and that you've configured the right
    /// indexes to fetch it from.
    #[error("Package `{0}` was not found in the registry")]
    PackageNotFound(String),

    /// The package was requested with `--no-index` set.
    #[error("Package `{0}` was requested, but no index is configured")]
    NoIndex(String),

    /// A generic request error happened while making a request. Refer to the error message for
    /// more details.
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    /// A generic request middleware error happened while making a request. Refer to the error
    /// message for more details.
    #[error(transparent)]
    RequestMiddleware(#[from] reqwest_middleware::Error),

    #[error("Received some unexpected JSON from {url}")]
    BadJson {
        #[source]
        source: serde_json::Error,
        url: Url,
    },

    #[error("Expected a file, but `{}` is a directory", _0.display())]
    Directory(PathBuf),

    #[error("Not a valid local file URL: `{0}`")]
    InvalidFileUrl(Url),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn from_json_err(err: serde_json::Error, url: Url) -> Self {
        Self::BadJson { source: err, url }
    }
}
