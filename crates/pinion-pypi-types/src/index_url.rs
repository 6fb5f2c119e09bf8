use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::str::FromStr;
use std::sync::LazyLock;

use url::Url;

static PYPI_URL: LazyLock<Url> =
    LazyLock::new(|| Url::parse("https://pypi.org/simple").expect("the PyPI URL is valid"));

/// The URL of an index, newtype'd to avoid mixing it with file URLs.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub enum IndexUrl {
    Pypi,
    Url(Url),
}

impl IndexUrl {
    /// Returns `true` if this is the default PyPI index, which also serves the JSON API.
    pub fn is_pypi(&self) -> bool {
        match self {
            Self::Pypi => true,
            Self::Url(url) => url.host_str() == Some("pypi.org"),
        }
    }
}

impl FromStr for IndexUrl {
    type Err = url::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(s)?;
        if url == *PYPI_URL {
            Ok(Self::Pypi)
        } else {
            Ok(Self::Url(url))
        }
    }
}

impl From<Url> for IndexUrl {
    fn from(url: Url) -> Self {
        Self::Url(url)
    }
}

impl Display for IndexUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&**self, f)
    }
}

impl Deref for IndexUrl {
    type Target = Url;

    fn deref(&self) -> &Self::Target {
        match &self {
            Self::Pypi => &PYPI_URL,
            Self::Url(url) => url,
        }
    }
}

/// The index URLs to use for fetching packages: the primary index plus any extra indexes, in
/// search order.
#[derive(Debug, Clone)]
pub struct IndexUrls {
    index: Option<IndexUrl>,
    extra_index: Vec<IndexUrl>,
}

impl Default for IndexUrls {
    /// Just PyPI.
    fn default() -> Self {
        Self {
            index: Some(IndexUrl::Pypi),
            extra_index: Vec::new(),
        }
    }
}

impl IndexUrls {
    /// Determine the index URLs to use for fetching packages.
    pub fn from_args(index: Option<IndexUrl>, extra_index: Vec<IndexUrl>, no_index: bool) -> Self {
        if no_index {
            Self {
                index: None,
                extra_index: Vec::new(),
            }
        } else {
            Self {
                index: Some(index.unwrap_or(IndexUrl::Pypi)),
                extra_index,
            }
        }
    }

    /// Iterate over the configured indexes, primary first.
    pub fn iter(&self) -> impl Iterator<Item = &IndexUrl> {
        self.index.iter().chain(self.extra_index.iter())
    }

    /// Returns `true` if no index is configured.
    pub fn no_index(&self) -> bool {
        self.index.is_none() && self.extra_index.is_empty()
    }

    /// Returns `true` if PyPI is one of the configured indexes.
    pub fn includes_pypi(&self) -> bool {
        self.iter().any(IndexUrl::is_pypi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pypi_detection() {
        assert_eq!(
            IndexUrl::from_str("https://pypi.org/simple").unwrap(),
            IndexUrl::Pypi
        );
        let mirror = IndexUrl::from_str("https://mirror.example.com/simple").unwrap();
        assert!(!mirror.is_pypi());

        let urls = IndexUrls::from_args(Some(mirror.clone()), vec![], false);
        assert!(!urls.includes_pypi());
        let urls = IndexUrls::from_args(Some(mirror), vec![IndexUrl::Pypi], false);
        assert!(urls.includes_pypi());
        assert_eq!(urls.iter().count(), 2);
    }

    #[test]
    fn no_index() {
        let urls = IndexUrls::from_args(None, vec![IndexUrl::Pypi], true);
        assert!(urls.no_index());
        assert!(!urls.includes_pypi());
    }
}
