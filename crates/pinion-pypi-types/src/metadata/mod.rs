use std::str::FromStr;

use mailparse::{MailHeaderMap, MailParseError};
use thiserror::Error;

use pep440_rs::{Version, VersionParseError, VersionSpecifiers, VersionSpecifiersParseError};
use pinion_normalize::{InvalidNameError, PackageName};

use crate::{LenientVersionSpecifiers, Requirement, RequirementError};

pub use requires_txt::{RequiresTxt, RequiresTxtSection};

mod requires_txt;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error(transparent)]
    MailParse(#[from] MailParseError),
    #[error("Metadata field {0} not found")]
    FieldNotFound(&'static str),
    #[error("Invalid version: {0}")]
    Pep440VersionError(#[source] VersionParseError),
    #[error(transparent)]
    Pep440Error(#[from] VersionSpecifiersParseError),
    #[error(transparent)]
    Requirement(#[from] RequirementError),
    #[error(transparent)]
    InvalidName(#[from] InvalidNameError),
    #[error("Invalid `Metadata-Version` field: {0}")]
    InvalidMetadataVersion(String),
    #[error("Reading metadata from `PKG-INFO` requires Metadata 2.2 or later (found: {0})")]
    UnsupportedMetadataVersion(String),
    #[error("The following field was marked as dynamic: {0}")]
    DynamicField(&'static str),
}

/// The subset of the core metadata needed to determine a distribution's dependencies.
///
/// See: <https://packaging.python.org/specifications/core-metadata/>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub name: PackageName,
    pub version: Version,
    pub requires_dist: Vec<Requirement>,
    pub requires_python: Option<VersionSpecifiers>,
}

impl Metadata {
    /// Parse the metadata from a `METADATA` file, as included in a built distribution, or from
    /// the `PKG-INFO` file of an `.egg-info` directory.
    pub fn parse_metadata(content: &[u8]) -> Result<Self, MetadataError> {
        let headers = Headers::parse(content)?;
        Self::from_headers(&headers)
    }

    /// Read the metadata from a source distribution's `PKG-INFO` file, if it uses Metadata 2.2
    /// or later _and_ none of the dependency fields are marked as dynamic.
    pub fn parse_pkg_info(content: &[u8]) -> Result<Self, MetadataError> {
        let headers = Headers::parse(content)?;

        let metadata_version = headers
            .get_first_value("Metadata-Version")
            .ok_or(MetadataError::FieldNotFound("Metadata-Version"))?;
        let (major, minor) = parse_version(&metadata_version)?;
        if (major, minor) < (2, 2) || (major, minor) >= (3, 0) {
            return Err(MetadataError::UnsupportedMetadataVersion(metadata_version));
        }

        for field in headers.get_all_values("Dynamic") {
            match field.as_str() {
                "Requires-Python" => return Err(MetadataError::DynamicField("Requires-Python")),
                "Requires-Dist" => return Err(MetadataError::DynamicField("Requires-Dist")),
                _ => (),
            }
        }

        Self::from_headers(&headers)
    }

    fn from_headers(headers: &Headers) -> Result<Self, MetadataError> {
        let name = PackageName::new(
            &headers
                .get_first_value("Name")
                .ok_or(MetadataError::FieldNotFound("Name"))?,
        )?;
        let version = Version::from_str(
            &headers
                .get_first_value("Version")
                .ok_or(MetadataError::FieldNotFound("Version"))?,
        )
        .map_err(MetadataError::Pep440VersionError)?;
        let requires_dist = headers
            .get_all_values("Requires-Dist")
            .map(|requires_dist| Requirement::from_str(&requires_dist))
            .collect::<Result<Vec<_>, _>>()?;
        let requires_python = headers
            .get_first_value("Requires-Python")
            .map(|requires_python| LenientVersionSpecifiers::from_str(&requires_python))
            .transpose()?
            .map(VersionSpecifiers::from);

        Ok(Self {
            name,
            version,
            requires_dist,
            requires_python,
        })
    }
}

/// The headers of a distribution metadata file.
struct Headers<'a> {
    headers: Vec<mailparse::MailHeader<'a>>,
}

impl<'a> Headers<'a> {
    fn parse(content: &'a [u8]) -> Result<Self, MailParseError> {
        let (headers, _) = mailparse::parse_headers(content)?;
        Ok(Self { headers })
    }

    /// Return the first value associated with the header with the given name.
    fn get_first_value(&self, name: &str) -> Option<String> {
        self.headers
            .get_first_header(name)
            .map(|header| header.get_value())
            .filter(|value| value != "UNKNOWN")
    }

    /// Return all values associated with the header with the given name.
    fn get_all_values(&self, name: &str) -> impl Iterator<Item = String> {
        self.headers
            .get_all_values(name)
            .into_iter()
            .filter(|value| value != "UNKNOWN")
    }
}

/// Parse a `Metadata-Version` field into a (major, minor) tuple.
fn parse_version(metadata_version: &str) -> Result<(u8, u8), MetadataError> {
    let invalid = || MetadataError::InvalidMetadataVersion(metadata_version.to_string());
    let (major, minor) = metadata_version.split_once('.').ok_or_else(invalid)?;
    let major = major.parse::<u8>().map_err(|_| invalid())?;
    let minor = minor.parse::<u8>().map_err(|_| invalid())?;
    Ok((major, minor))
}
