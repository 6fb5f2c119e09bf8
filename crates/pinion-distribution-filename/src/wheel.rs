use std::fmt::{Display, Formatter};
use std::str::FromStr;

use thiserror::Error;
use url::Url;

use pep440_rs::{Version, VersionParseError};
use pinion_normalize::{InvalidNameError, PackageName};
use pinion_platform_tags::{TagCompatibility, Tags};

use crate::{BuildTag, BuildTagError};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct WheelFilename {
    pub name: PackageName,
    pub version: Version,
    pub build_tag: Option<BuildTag>,
    pub python_tag: Vec<String>,
    pub abi_tag: Vec<String>,
    pub platform_tag: Vec<String>,
}

impl FromStr for WheelFilename {
    type Err = WheelFilenameError;

    fn from_str(filename: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| {
            WheelFilenameError::InvalidWheelFileName(filename.to_string(), reason.to_string())
        };

        let basename = filename
            .strip_suffix(".whl")
            .ok_or_else(|| invalid("Must end with .whl"))?;

        // `{name}-{version}(-{build tag})?-{python tag}-{abi tag}-{platform tag}`
        let parts: Vec<&str> = basename.split('-').collect();
        let (name, version, build_tag, python_tag, abi_tag, platform_tag) = match parts[..] {
            [name, version, python_tag, abi_tag, platform_tag] => {
                (name, version, None, python_tag, abi_tag, platform_tag)
            }
            [name, version, build_tag, python_tag, abi_tag, platform_tag] => (
                name,
                version,
                Some(build_tag),
                python_tag,
                abi_tag,
                platform_tag,
            ),
            [_] => return Err(invalid("Must have a version")),
            [_, _] => return Err(invalid("Must have a Python tag")),
            [_, _, _] => return Err(invalid("Must have an ABI tag")),
            [_, _, _, _] => return Err(invalid("Must have a platform tag")),
            _ => return Err(invalid("Must have 5 or 6 components, but has more")),
        };

        let name = PackageName::from_str(name)
            .map_err(|err| WheelFilenameError::InvalidPackageName(filename.to_string(), err))?;
        let version = Version::from_str(version)
            .map_err(|err| WheelFilenameError::InvalidVersion(filename.to_string(), err))?;
        let build_tag = build_tag
            .map(|build_tag| {
                BuildTag::from_str(build_tag)
                    .map_err(|err| WheelFilenameError::InvalidBuildTag(filename.to_string(), err))
            })
            .transpose()?;

        Ok(Self {
            name,
            version,
            build_tag,
            python_tag: python_tag.split('.').map(String::from).collect(),
            abi_tag: abi_tag.split('.').map(String::from).collect(),
            platform_tag: platform_tag.split('.').map(String::from).collect(),
        })
    }
}

impl Display for WheelFilename {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.name.as_dist_info_name(), self.version)?;
        if let Some(build_tag) = &self.build_tag {
            write!(f, "-{build_tag}")?;
        }
        write!(f, "-{}.whl", self.get_tag())
    }
}

impl WheelFilename {
    /// Return the [`TagCompatibility`] of the wheel with the given tags.
    pub fn compatibility(&self, compatible_tags: &Tags) -> TagCompatibility {
        compatible_tags.compatibility(&self.python_tag, &self.abi_tag, &self.platform_tag)
    }

    /// Get the tag for this wheel.
    pub fn get_tag(&self) -> String {
        format!(
            "{}-{}-{}",
            self.python_tag.join("."),
            self.abi_tag.join("."),
            self.platform_tag.join(".")
        )
    }
}

impl TryFrom<&Url> for WheelFilename {
    type Error = WheelFilenameError;

    fn try_from(url: &Url) -> Result<Self, Self::Error> {
        let filename = url
            .path_segments()
            .and_then(Iterator::last)
            .filter(|filename| !filename.is_empty())
            .ok_or_else(|| {
                WheelFilenameError::InvalidWheelFileName(
                    url.to_string(),
                    "URL must contain a filename".to_string(),
                )
            })?;
        Self::from_str(filename)
    }
}

#[derive(Error, Debug)]
pub enum WheelFilenameError {
    #[error("The wheel filename \"{0}\" is invalid: {1}")]
    InvalidWheelFileName(String, String),
    #[error("The wheel filename \"{0}\" has an invalid version part")]
    InvalidVersion(String, #[source] VersionParseError),
    #[error("The wheel filename \"{0}\" has an invalid package name")]
    InvalidPackageName(String, #[source] InvalidNameError),
    #[error("The wheel filename \"{0}\" has an invalid build tag")]
    InvalidBuildTag(String, #[source] BuildTagError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn err_not_whl_extension() {
        let err = WheelFilename::from_str("foo.rs").unwrap_err();
        insta::assert_snapshot!(err, @r#"The wheel filename "foo.rs" is invalid: Must end with .whl"#);
    }

    #[test]
    fn err_missing_parts() {
        let err = WheelFilename::from_str("foo-1.2.3.whl").unwrap_err();
        insta::assert_snapshot!(err, @r#"The wheel filename "foo-1.2.3.whl" is invalid: Must have a Python tag"#);
        let err = WheelFilename::from_str("foo-1.2.3-py3-none.whl").unwrap_err();
        insta::assert_snapshot!(err, @r#"The wheel filename "foo-1.2.3-py3-none.whl" is invalid: Must have a platform tag"#);
    }

    #[test]
    fn err_too_many_parts() {
        let err = WheelFilename::from_str("foo-1.2.3-202206090410-py3-none-any-whoops.whl")
            .unwrap_err();
        insta::assert_snapshot!(err, @r#"The wheel filename "foo-1.2.3-202206090410-py3-none-any-whoops.whl" is invalid: Must have 5 or 6 components, but has more"#);
    }

    #[test]
    fn err_invalid_version() {
        let err = WheelFilename::from_str("foo-x.y.z-py3-none-any.whl").unwrap_err();
        insta::assert_snapshot!(err, @r#"The wheel filename "foo-x.y.z-py3-none-any.whl" has an invalid version part"#);
    }

    #[test]
    fn ok_single_tags() {
        let filename = WheelFilename::from_str("foo-1.2.3-py3-none-any.whl").unwrap();
        assert_eq!(filename.name.as_ref(), "foo");
        assert_eq!(filename.version, Version::from_str("1.2.3").unwrap());
        assert_eq!(filename.build_tag, None);
        assert_eq!(filename.python_tag, vec!["py3"]);
        assert_eq!(filename.abi_tag, vec!["none"]);
        assert_eq!(filename.platform_tag, vec!["any"]);
    }

    #[test]
    fn ok_build_tag_and_compressed_tags() {
        let filename =
            WheelFilename::from_str("foo_bar-1.2.3-202206090410-py2.py3-none-any.whl").unwrap();
        assert_eq!(filename.name.as_ref(), "foo-bar");
        assert_eq!(
            filename.build_tag,
            Some(BuildTag::from_str("202206090410").unwrap())
        );
        assert_eq!(filename.python_tag, vec!["py2", "py3"]);
        assert_eq!(
            filename.to_string(),
            "foo_bar-1.2.3-202206090410-py2.py3-none-any.whl"
        );
    }

    #[test]
    fn from_url() {
        let url = Url::parse(
            "https://files.example.com/packages/foo-1.0-cp312-cp312-manylinux_2_17_x86_64.whl#sha256=ab",
        )
        .unwrap();
        let filename = WheelFilename::try_from(&url).unwrap();
        assert_eq!(filename.platform_tag, vec!["manylinux_2_17_x86_64"]);
    }
}
