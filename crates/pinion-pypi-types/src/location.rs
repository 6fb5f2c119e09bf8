use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

use url::Url;

use crate::{HashAlgorithm, HashDigest};

/// Where an artifact can be fetched from: a remote URL, a `file://` path, or a version control
/// URL such as `git+https://...`.
///
/// The fragment may carry the artifact's expected hash, e.g. `#sha256=...`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location(Url);

impl Location {
    pub fn new(url: Url) -> Self {
        Self(url)
    }

    /// Resolve a (possibly relative) file URL from an index page against the page's URL, and
    /// record the index-provided hash in the fragment if the URL doesn't already carry one.
    pub fn from_index_file(
        base: &Url,
        url: &str,
        hash: Option<&HashDigest>,
    ) -> Result<Self, url::ParseError> {
        let mut url = base.join(url)?;
        if url.fragment().is_none() {
            if let Some(hash) = hash {
                url.set_fragment(Some(&format!("{}={}", hash.algorithm, hash.digest)));
            }
        }
        Ok(Self(url))
    }

    pub fn url(&self) -> &Url {
        &self.0
    }

    /// The hash embedded in the fragment, if any.
    pub fn hash(&self) -> Option<HashDigest> {
        let fragment = self.0.fragment()?;
        fragment.split('&').find_map(|pair| {
            let (algorithm, digest) = pair.split_once('=')?;
            let algorithm = HashAlgorithm::from_str(algorithm).ok()?;
            if digest.is_empty() || !digest.bytes().all(|byte| byte.is_ascii_hexdigit()) {
                return None;
            }
            Some(HashDigest::new(algorithm, digest.to_ascii_lowercase()))
        })
    }

    /// The location without its fragment.
    pub fn url_without_fragment(&self) -> Url {
        let mut url = self.0.clone();
        url.set_fragment(None);
        url
    }

    /// The last path segment, e.g. `foo-1.0-py3-none-any.whl`.
    pub fn filename(&self) -> Option<&str> {
        self.0
            .path_segments()
            .and_then(Iterator::last)
            .filter(|segment| !segment.is_empty())
    }

    /// The `egg` fragment of a legacy URL, e.g. `#egg=foo`.
    pub fn egg_fragment(&self) -> Option<&str> {
        self.0
            .fragment()?
            .split('&')
            .find_map(|pair| pair.strip_prefix("egg="))
            .filter(|egg| !egg.is_empty())
    }

    /// Returns `true` for `file://` locations.
    pub fn is_file(&self) -> bool {
        self.0.scheme() == "file"
    }

    /// The local path of a `file://` location.
    pub fn to_file_path(&self) -> Option<PathBuf> {
        if self.is_file() {
            self.0.to_file_path().ok()
        } else {
            None
        }
    }

    /// Returns `true` for version control URLs, e.g. `git+https://...`.
    pub fn is_vcs(&self) -> bool {
        let scheme = self.0.scheme();
        ["git+", "hg+", "svn+", "bzr+"]
            .iter()
            .any(|prefix| scheme.starts_with(prefix))
    }
}

impl From<Url> for Location {
    fn from(url: Url) -> Self {
        Self(url)
    }
}

impl FromStr for Location {
    type Err = url::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Url::parse(s).map(Self)
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}
