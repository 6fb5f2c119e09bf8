use std::fmt::{Display, Formatter};
use std::path::Path;
use std::str::FromStr;

use itertools::Itertools;
use pep440_rs::{Operator, Version, VersionSpecifier, VersionSpecifiers};
use pep508_rs::{MarkerTree, Pep508Error, VerbatimUrl, VersionOrUrl};
use thiserror::Error;
use url::Url;

use pinion_normalize::{ExtraName, InvalidNameError, PackageName};

use crate::Location;

#[derive(Debug, Error)]
pub enum RequirementError {
    #[error("Failed to parse requirement: `{given}`")]
    Pep508 {
        given: String,
        #[source]
        err: Box<Pep508Error<VerbatimUrl>>,
    },
    #[error("Failed to parse marker: `{given}`")]
    Marker {
        given: String,
        #[source]
        err: Box<Pep508Error<VerbatimUrl>>,
    },
    #[error(transparent)]
    InvalidName(#[from] InvalidNameError),
    #[error("Failed to parse editable URL: `{0}`")]
    EditableUrl(String, #[source] url::ParseError),
    #[error("Failed to resolve editable path: `{0}`")]
    EditablePath(String, #[source] std::io::Error),
    #[error("Unable to infer a package name for the editable `{0}`; add an `#egg=<name>` fragment")]
    EditableName(String),
}

/// Where a requirement is satisfied from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RequirementSource {
    /// Any artifact on the configured indexes that satisfies the version specifiers.
    Registry,
    /// A direct URL to an archive or a version control repository, e.g. `foo @ https://...`.
    Url(Location),
    /// A local project directory or version control checkout, installed in development mode.
    Editable(Location),
}

/// A requirement on a Python package: a name plus version, extras, marker and source
/// constraints.
///
/// Extras are kept sorted and deduplicated, and markers are stored in their normalized string
/// form, so that two equivalent requirements compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Requirement {
    pub name: PackageName,
    pub extras: Vec<ExtraName>,
    pub specifier: VersionSpecifiers,
    pub marker: Option<String>,
    pub source: RequirementSource,
    /// Whether the requirement only constrains the resolution rather than requesting the
    /// package. Not part of the requirement's identity.
    pub constraint: bool,
}

/// The identity of a [`Requirement`], used as a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequirementKey {
    name: PackageName,
    specifier: String,
    extras: Vec<ExtraName>,
    marker: Option<String>,
    source: RequirementSource,
}

impl Requirement {
    /// Returns `true` for editable requirements.
    pub fn is_editable(&self) -> bool {
        matches!(self.source, RequirementSource::Editable(_))
    }

    /// Returns the version if the requirement is pinned to exactly one version with `==` or
    /// `===`. Wildcards such as `==1.0.*` don't pin.
    pub fn pinned_version(&self) -> Option<&Version> {
        let [specifier] = &self.specifier[..] else {
            return None;
        };
        match specifier.operator() {
            Operator::Equal | Operator::ExactEqual => Some(specifier.version()),
            _ => None,
        }
    }

    /// Returns `true` if the requirement is pinned to exactly one version.
    pub fn is_pinned(&self) -> bool {
        self.pinned_version().is_some()
    }

    /// The location of a direct URL or editable requirement.
    pub fn location(&self) -> Option<&Location> {
        match &self.source {
            RequirementSource::Registry => None,
            RequirementSource::Url(location) | RequirementSource::Editable(location) => {
                Some(location)
            }
        }
    }

    /// Create a new requirement pinned to `version`, keeping this requirement's extras, marker
    /// and constraint flag.
    pub fn pin(&self, version: Version) -> Self {
        Self {
            name: self.name.clone(),
            extras: self.extras.clone(),
            specifier: VersionSpecifiers::from(VersionSpecifier::equals_version(version)),
            marker: self.marker.clone(),
            source: RequirementSource::Registry,
            constraint: self.constraint,
        }
    }

    /// Combine the requirement's marker with an additional marker, using `and`.
    #[must_use]
    pub fn and_marker(mut self, marker: &str) -> Self {
        self.marker = Some(match self.marker.take() {
            Some(existing) => format!("({existing}) and ({marker})"),
            None => marker.to_string(),
        });
        self
    }

    /// Returns `true` if the marker refers to an extra, e.g. `extra == "socks"`.
    pub fn marker_mentions_extra(&self) -> bool {
        self.marker
            .as_deref()
            .is_some_and(|marker| marker.contains("extra"))
    }

    /// The identity of the requirement, ignoring the constraint flag.
    pub fn key(&self) -> RequirementKey {
        RequirementKey {
            name: self.name.clone(),
            specifier: self.specifier.to_string(),
            extras: self.extras.clone(),
            marker: self.marker.clone(),
            source: self.source.clone(),
        }
    }

    fn parse_editable(given: &str) -> Result<Self, RequirementError> {
        let location = if given.contains("://") {
            Location::new(
                Url::parse(given)
                    .map_err(|err| RequirementError::EditableUrl(given.to_string(), err))?,
            )
        } else {
            let path = std::path::absolute(Path::new(given))
                .map_err(|err| RequirementError::EditablePath(given.to_string(), err))?;
            let url = Url::from_directory_path(&path).map_err(|()| {
                RequirementError::EditablePath(
                    given.to_string(),
                    std::io::Error::other("path is not absolute"),
                )
            })?;
            Location::new(url)
        };

        let name = match location.egg_fragment() {
            Some(egg) => egg.to_string(),
            None => infer_project_name(&location)
                .ok_or_else(|| RequirementError::EditableName(given.to_string()))?,
        };

        Ok(Self {
            name: PackageName::new(&name)?,
            extras: Vec::new(),
            specifier: VersionSpecifiers::empty(),
            marker: None,
            source: RequirementSource::Editable(location),
            constraint: false,
        })
    }
}

/// Guess the project name from the last path segment of a directory or repository URL, e.g.
/// `flask` for `git+https://github.com/pallets/flask.git@2.0`.
fn infer_project_name(location: &Location) -> Option<String> {
    let segment = location
        .url()
        .path_segments()?
        .rev()
        .find(|segment| !segment.is_empty())?;
    let segment = segment.split('@').next().unwrap_or(segment);
    let segment = segment.strip_suffix(".git").unwrap_or(segment);
    (!segment.is_empty()).then(|| segment.to_string())
}

/// Parse a PEP 508 marker into its normalized string form. Returns `None` for markers that are
/// always true.
pub(crate) fn normalize_marker(marker: &str) -> Result<Option<String>, RequirementError> {
    let tree = MarkerTree::from_str(marker).map_err(|err| RequirementError::Marker {
        given: marker.to_string(),
        err: Box::new(err),
    })?;
    Ok(tree.try_to_string())
}

impl FromStr for Requirement {
    type Err = RequirementError;

    /// Parse a PEP 508 requirement, or an editable given as `-e <path or URL>`.
    fn from_str(given: &str) -> Result<Self, Self::Err> {
        let given = given.trim();
        if let Some(editable) = given
            .strip_prefix("-e ")
            .or_else(|| given.strip_prefix("--editable "))
        {
            return Self::parse_editable(editable.trim());
        }

        let requirement = pep508_rs::Requirement::<VerbatimUrl>::from_str(given).map_err(|err| {
            RequirementError::Pep508 {
                given: given.to_string(),
                err: Box::new(err),
            }
        })?;

        let name = PackageName::new(&requirement.name.to_string())?;
        let mut extras = requirement
            .extras
            .iter()
            .map(|extra| ExtraName::new(&extra.to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        extras.sort();
        extras.dedup();

        let (specifier, source) = match requirement.version_or_url {
            None => (VersionSpecifiers::empty(), RequirementSource::Registry),
            Some(VersionOrUrl::VersionSpecifier(specifier)) => {
                (specifier, RequirementSource::Registry)
            }
            Some(VersionOrUrl::Url(url)) => (
                VersionSpecifiers::empty(),
                RequirementSource::Url(Location::new(url.to_url())),
            ),
        };

        Ok(Self {
            name,
            extras,
            specifier,
            marker: requirement.marker.try_to_string(),
            source,
            constraint: false,
        })
    }
}

impl Display for Requirement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let RequirementSource::Editable(location) = &self.source {
            return write!(f, "-e {location}");
        }
        write!(f, "{}", self.name)?;
        if !self.extras.is_empty() {
            write!(f, "[{}]", self.extras.iter().join(","))?;
        }
        match &self.source {
            RequirementSource::Url(location) => {
                write!(f, " @ {location}")?;
                if let Some(marker) = &self.marker {
                    write!(f, " ; {marker}")?;
                }
            }
            _ => {
                write!(f, "{}", self.specifier.iter().join(","))?;
                if let Some(marker) = &self.marker {
                    write!(f, "; {marker}")?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinned() {
        for pinned in ["foo==1.0", "foo===1.0", "foo[bar]==2.0.0rc1; python_version >= '3.8'"] {
            assert!(Requirement::from_str(pinned).unwrap().is_pinned(), "{pinned}");
        }
        for unpinned in ["foo", "foo>=1.0", "foo==1.0.*", "foo==1.0,<2", "foo!=1.0"] {
            assert!(!Requirement::from_str(unpinned).unwrap().is_pinned(), "{unpinned}");
        }
    }

    #[test]
    fn display() {
        let requirement = Requirement::from_str("Foo_Bar[b,a,a] >=1.0,<2.0").unwrap();
        assert_eq!(requirement.name.as_ref(), "foo-bar");
        assert_eq!(requirement.extras.len(), 2);
        insta::assert_snapshot!(requirement, @"foo-bar[a,b]>=1.0,<2.0");

        let requirement = Requirement::from_str("foo==1.0; sys_platform == 'linux'").unwrap();
        let marker = requirement.marker.clone().unwrap();
        assert!(marker.contains("sys_platform"));
        assert_eq!(requirement.to_string(), format!("foo==1.0; {marker}"));

        let requirement =
            Requirement::from_str("foo @ https://files.example.com/foo-1.0.tar.gz").unwrap();
        insta::assert_snapshot!(requirement, @"foo @ https://files.example.com/foo-1.0.tar.gz");
        assert!(!requirement.is_pinned());
        assert!(requirement.location().is_some_and(|location| !location.is_vcs()));
    }

    #[test]
    fn pin_keeps_extras_marker_and_constraint() {
        let mut requirement =
            Requirement::from_str("foo[bar]>=1.0; sys_platform == 'linux'").unwrap();
        requirement.constraint = true;
        let pinned = requirement.pin(Version::from_str("1.5").unwrap());
        assert_eq!(pinned.pinned_version(), Some(&Version::from_str("1.5").unwrap()));
        assert_eq!(pinned.extras, requirement.extras);
        assert_eq!(pinned.marker, requirement.marker);
        assert!(pinned.constraint);
        assert!(!requirement.is_pinned());
    }

    #[test]
    fn key_ignores_constraint() {
        let requirement = Requirement::from_str("foo==1.0").unwrap();
        let mut constraint = requirement.clone();
        constraint.constraint = true;
        assert_eq!(requirement.key(), constraint.key());
        assert_ne!(
            requirement.key(),
            Requirement::from_str("foo[bar]==1.0").unwrap().key()
        );
    }

    #[test]
    fn editable() {
        let requirement =
            Requirement::from_str("-e git+https://github.com/pallets/flask.git@2.0").unwrap();
        assert!(requirement.is_editable());
        assert!(requirement.location().is_some_and(Location::is_vcs));
        assert_eq!(requirement.name.as_ref(), "flask");

        let requirement =
            Requirement::from_str("-e git+https://example.com/repo.git#egg=My_Project").unwrap();
        assert_eq!(requirement.name.as_ref(), "my-project");

        let requirement = Requirement::from_str("--editable ./projects/demo").unwrap();
        assert!(requirement.is_editable());
        assert!(!requirement.location().unwrap().is_vcs());
        assert_eq!(requirement.name.as_ref(), "demo");
        assert!(requirement.location().unwrap().is_file());
    }

    #[test]
    fn and_marker() {
        let requirement = Requirement::from_str("foo; os_name == 'nt'").unwrap();
        let existing = requirement.marker.clone().unwrap();
        let requirement = requirement.and_marker("python_full_version >= '3.8'");
        assert_eq!(
            requirement.marker,
            Some(format!("({existing}) and (python_full_version >= '3.8')"))
        );

        let requirement = Requirement::from_str("foo")
            .unwrap()
            .and_marker("python_full_version >= '3.8'");
        assert_eq!(
            requirement.marker.as_deref(),
            Some("python_full_version >= '3.8'")
        );
    }

    #[test]
    fn invalid() {
        let err = Requirement::from_str("foo >= ").unwrap_err();
        insta::assert_snapshot!(err, @"Failed to parse requirement: `foo >=`");
    }
}
