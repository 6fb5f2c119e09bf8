use std::fmt::{Display, Formatter};
use std::str::FromStr;

use thiserror::Error;

use pep440_rs::{Version, VersionParseError};
use pinion_normalize::{InvalidNameError, PackageName};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceDistExtension {
    Zip,
    TarGz,
    TarBz2,
}

impl SourceDistExtension {
    /// Split a filename into its stem and source distribution extension.
    pub fn from_filename(filename: &str) -> Option<(&str, Self)> {
        if let Some(stem) = filename.strip_suffix(".zip") {
            return Some((stem, Self::Zip));
        }
        if let Some(stem) = filename.strip_suffix(".tar.gz") {
            return Some((stem, Self::TarGz));
        }
        if let Some(stem) = filename.strip_suffix(".tar.bz2") {
            return Some((stem, Self::TarBz2));
        }
        None
    }
}

impl Display for SourceDistExtension {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Zip => f.write_str("zip"),
            Self::TarGz => f.write_str("tar.gz"),
            Self::TarBz2 => f.write_str("tar.bz2"),
        }
    }
}

/// A normalized source distribution filename, e.g. `foo-lib-1.2.3.tar.gz`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceDistFilename {
    pub name: PackageName,
    pub version: Version,
    pub extension: SourceDistExtension,
}

impl SourceDistFilename {
    /// No `FromStr` impl since we need to know the package name to be able to reasonably parse
    /// these (consider e.g. `a-1-1.zip`).
    pub fn parse(
        filename: &str,
        package_name: &PackageName,
    ) -> Result<Self, SourceDistFilenameError> {
        let Some((stem, extension)) = SourceDistExtension::from_filename(filename) else {
            return Err(SourceDistFilenameError::InvalidExtension(
                filename.to_string(),
            ));
        };

        let name_len = package_name.as_ref().len();
        let (Some(name), Some(version)) = (stem.get(..name_len), stem.get(name_len + 1..)) else {
            return Err(SourceDistFilenameError::InvalidFilename {
                filename: filename.to_string(),
                package_name: package_name.to_string(),
            });
        };
        if version.is_empty() || !stem[name_len..].starts_with('-') {
            return Err(SourceDistFilenameError::InvalidFilename {
                filename: filename.to_string(),
                package_name: package_name.to_string(),
            });
        }

        let actual_name = PackageName::from_str(name).map_err(|err| {
            SourceDistFilenameError::InvalidPackageName(filename.to_string(), err)
        })?;
        if &actual_name != package_name {
            return Err(SourceDistFilenameError::InvalidFilename {
                filename: filename.to_string(),
                package_name: package_name.to_string(),
            });
        }

        let version = Version::from_str(version)
            .map_err(|err| SourceDistFilenameError::InvalidVersion(filename.to_string(), err))?;

        Ok(Self {
            name: actual_name,
            version,
            extension,
        })
    }
}

impl Display for SourceDistFilename {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}.{}", self.name, self.version, self.extension)
    }
}

#[derive(Error, Debug)]
pub enum SourceDistFilenameError {
    #[error("Source distribution name {filename} doesn't start with package name {package_name}")]
    InvalidFilename {
        filename: String,
        package_name: String,
    },
    #[error("Source distribution filenames must end with .zip, .tar.gz or .tar.bz2, not {0}")]
    InvalidExtension(String),
    #[error("Source distribution filename {0} has an invalid version")]
    InvalidVersion(String, #[source] VersionParseError),
    #[error("Source distribution filename {0} has an invalid package name")]
    InvalidPackageName(String, #[source] InvalidNameError),
}
