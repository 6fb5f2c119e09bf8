use std::fmt::{Display, Formatter};

use pep440_rs::Version;
use pinion_normalize::PackageName;

pub use build_tag::{BuildTag, BuildTagError};
pub use source_dist::{SourceDistExtension, SourceDistFilename, SourceDistFilenameError};
pub use wheel::{WheelFilename, WheelFilenameError};

mod build_tag;
mod source_dist;
mod wheel;

/// A parsed filename of a file published on an index.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DistFilename {
    SourceDistFilename(SourceDistFilename),
    WheelFilename(WheelFilename),
}

impl DistFilename {
    /// Parse a filename as wheel or source dist name.
    ///
    /// Returns `None` for files that are neither, or whose name does not belong to the package.
    pub fn try_from_filename(filename: &str, package_name: &PackageName) -> Option<Self> {
        if filename.ends_with(".whl") {
            let wheel = filename.parse::<WheelFilename>().ok()?;
            (&wheel.name == package_name).then_some(Self::WheelFilename(wheel))
        } else {
            SourceDistFilename::parse(filename, package_name)
                .ok()
                .map(Self::SourceDistFilename)
        }
    }

    pub fn name(&self) -> &PackageName {
        match self {
            Self::SourceDistFilename(filename) => &filename.name,
            Self::WheelFilename(filename) => &filename.name,
        }
    }

    pub fn version(&self) -> &Version {
        match self {
            Self::SourceDistFilename(filename) => &filename.version,
            Self::WheelFilename(filename) => &filename.version,
        }
    }

    /// Returns the wheel build tag, if any.
    pub fn build_tag(&self) -> Option<&BuildTag> {
        match self {
            Self::SourceDistFilename(_) => None,
            Self::WheelFilename(filename) => filename.build_tag.as_ref(),
        }
    }
}

impl Display for DistFilename {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceDistFilename(filename) => Display::fmt(filename, f),
            Self::WheelFilename(filename) => Display::fmt(filename, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_by_extension() {
        let name = PackageName::new("foo").unwrap();
        assert!(matches!(
            DistFilename::try_from_filename("foo-1.0-py3-none-any.whl", &name),
            Some(DistFilename::WheelFilename(_))
        ));
        assert!(matches!(
            DistFilename::try_from_filename("foo-1.0.tar.gz", &name),
            Some(DistFilename::SourceDistFilename(_))
        ));
        assert!(DistFilename::try_from_filename("foo-1.0.exe", &name).is_none());
        assert!(DistFilename::try_from_filename("bar-1.0-py3-none-any.whl", &name).is_none());
    }
}
