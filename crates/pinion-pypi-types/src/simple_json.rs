use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use pep440_rs::{VersionSpecifiers, VersionSpecifiersParseError};

use crate::{HashAlgorithm, HashDigest, LenientVersionSpecifiers};

/// The project detail response of the PEP 691 JSON simple API.
#[derive(Debug, Clone, Deserialize)]
pub struct SimpleJson {
    pub files: Vec<File>,
}

/// A single (remote) file belonging to a package, either a wheel or a source distribution.
///
/// <https://peps.python.org/pep-0691/#project-detail>
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct File {
    pub filename: String,
    #[serde(default)]
    pub hashes: Hashes,
    /// There are a number of invalid specifiers on PyPI, so we first try to parse them according
    /// to PEP 440, then with fixups for common problems. If that still fails, the parse error is
    /// kept and the file is treated as having no Python constraint.
    #[serde(default, deserialize_with = "deserialize_version_specifiers_lenient")]
    pub requires_python: Option<Result<VersionSpecifiers, VersionSpecifiersParseError>>,
    pub size: Option<u64>,
    pub url: String,
    pub yanked: Option<Yanked>,
}

fn deserialize_version_specifiers_lenient<'de, D>(
    deserializer: D,
) -> Result<Option<Result<VersionSpecifiers, VersionSpecifiersParseError>>, D::Error>
where
    D: Deserializer<'de>,
{
    let maybe_string: Option<String> = Option::deserialize(deserializer)?;
    let Some(string) = maybe_string.filter(|string| !string.trim().is_empty()) else {
        return Ok(None);
    };
    Ok(Some(
        LenientVersionSpecifiers::from_str(&string).map(Into::into),
    ))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Yanked {
    Bool(bool),
    Reason(String),
}

impl Yanked {
    pub fn is_yanked(&self) -> bool {
        match self {
            Self::Bool(is_yanked) => *is_yanked,
            Self::Reason(_) => true,
        }
    }
}

/// A dictionary mapping a hash name to a hex encoded digest of the file.
///
/// PEP 691 allows multiple hashes; the strongest one we support is used.
#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize)]
pub struct Hashes {
    pub md5: Option<String>,
    pub sha256: Option<String>,
    pub sha384: Option<String>,
    pub sha512: Option<String>,
}

impl Hashes {
    /// The strongest digest in the set, if any.
    pub fn strongest(&self) -> Option<HashDigest> {
        [
            (HashAlgorithm::Sha512, &self.sha512),
            (HashAlgorithm::Sha384, &self.sha384),
            (HashAlgorithm::Sha256, &self.sha256),
            (HashAlgorithm::Md5, &self.md5),
        ]
        .into_iter()
        .find_map(|(algorithm, digest)| {
            digest
                .as_deref()
                .map(|digest| HashDigest::new(algorithm, digest.to_ascii_lowercase()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_project_detail() {
        let response = r#"
        {
            "meta": {"api-version": "1.0"},
            "name": "foo",
            "files": [
                {
                    "filename": "foo-1.0-py3-none-any.whl",
                    "hashes": {"sha256": "ABC123"},
                    "requires-python": ">=3.8",
                    "url": "https://files.example.com/foo-1.0-py3-none-any.whl",
                    "yanked": false
                },
                {
                    "filename": "foo-0.9.tar.gz",
                    "hashes": {},
                    "requires-python": ">=3.6.*",
                    "url": "../../files/foo-0.9.tar.gz",
                    "yanked": "broken metadata"
                },
                {
                    "filename": "foo-0.8.tar.gz",
                    "url": "foo-0.8.tar.gz"
                }
            ]
        }
        "#;
        let simple: SimpleJson = serde_json::from_str(response).unwrap();
        assert_eq!(simple.files.len(), 3);

        let wheel = &simple.files[0];
        assert_eq!(wheel.hashes.strongest().unwrap().to_string(), "sha256:abc123");
        assert!(matches!(wheel.requires_python, Some(Ok(_))));
        assert!(!wheel.yanked.as_ref().unwrap().is_yanked());

        let sdist = &simple.files[1];
        assert!(sdist.hashes.strongest().is_none());
        assert!(matches!(sdist.requires_python, Some(Ok(_))));
        assert!(sdist.yanked.as_ref().unwrap().is_yanked());

        assert!(simple.files[2].requires_python.is_none());
    }
}
