use std::cmp;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::sync::Arc;

use rustc_hash::FxHashMap;

pub use platform::{Arch, Os, Platform};

mod platform;

#[derive(Debug, thiserror::Error)]
pub enum TagsError {
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),
    #[error("Unsupported implementation: {0}")]
    UnsupportedImplementation(String),
    #[error("Unknown implementation: {0}")]
    UnknownImplementation(String),
}

#[derive(Debug, Eq, Ord, PartialEq, PartialOrd, Clone, Copy)]
pub enum IncompatibleTag {
    Invalid,
    Python,
    Abi,
    Platform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagCompatibility {
    Incompatible(IncompatibleTag),
    Compatible(TagPriority),
}

impl Ord for TagCompatibility {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        match (self, other) {
            (Self::Compatible(p_self), Self::Compatible(p_other)) => p_self.cmp(p_other),
            (Self::Incompatible(_), Self::Compatible(_)) => cmp::Ordering::Less,
            (Self::Compatible(_), Self::Incompatible(_)) => cmp::Ordering::Greater,
            (Self::Incompatible(t_self), Self::Incompatible(t_other)) => t_self.cmp(t_other),
        }
    }
}

impl PartialOrd for TagCompatibility {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl TagCompatibility {
    pub fn is_compatible(&self) -> bool {
        matches!(self, Self::Compatible(_))
    }
}

/// A set of compatible tags for a given Python version and platform.
///
/// Its principal function is to determine whether the tags for a particular wheel are
/// compatible with the target environment, and how strongly that wheel should be preferred
/// over other compatible wheels.
#[derive(Debug, Clone)]
pub struct Tags {
    /// python_tag |--> abi_tag |--> platform_tag |--> priority
    #[allow(clippy::type_complexity)]
    map: Arc<FxHashMap<String, FxHashMap<String, FxHashMap<String, TagPriority>>>>,
}

impl Tags {
    /// Create a new set of tags.
    ///
    /// Tags that appear earlier in the vector are given higher priority than tags that appear
    /// later.
    pub fn new(tags: Vec<(String, String, String)>) -> Self {
        let mut map = FxHashMap::default();
        for (index, (py, abi, platform)) in tags.into_iter().rev().enumerate() {
            map.entry(py)
                .or_insert_with(FxHashMap::default)
                .entry(abi)
                .or_insert_with(FxHashMap::default)
                .entry(platform)
                .or_insert(TagPriority::from_index(index));
        }
        Self { map: Arc::new(map) }
    }

    /// Returns the compatible tags for the given Python implementation (e.g., `cpython`), Python
    /// version and platform.
    pub fn from_env(
        platform: &Platform,
        python_version: (u8, u8),
        implementation_name: &str,
    ) -> Result<Self, TagsError> {
        let implementation = Implementation::from_str(implementation_name)?;
        let platform_tags = compatible_tags(platform);

        let mut tags = Vec::with_capacity(5 * platform_tags.len());

        // 1. This exact interpreter ABI.
        for platform_tag in &platform_tags {
            tags.push((
                implementation.language_tag(python_version),
                implementation.abi_tag(python_version),
                platform_tag.clone(),
            ));
        }
        // 2. The stable ABI, for every minor version back to 3.2.
        if matches!(implementation, Implementation::CPython) {
            for minor in (2..=python_version.1).rev() {
                for platform_tag in &platform_tags {
                    tags.push((
                        implementation.language_tag((python_version.0, minor)),
                        "abi3".to_string(),
                        platform_tag.clone(),
                    ));
                }
            }
        }
        // 3. No ABI, but platform specific.
        for platform_tag in &platform_tags {
            tags.push((
                implementation.language_tag(python_version),
                "none".to_string(),
                platform_tag.clone(),
            ));
        }
        for minor in (0..=python_version.1).rev() {
            for platform_tag in &platform_tags {
                tags.push((
                    format!("py{}{}", python_version.0, minor),
                    "none".to_string(),
                    platform_tag.clone(),
                ));
            }
        }
        for platform_tag in &platform_tags {
            tags.push((
                format!("py{}", python_version.0),
                "none".to_string(),
                platform_tag.clone(),
            ));
        }
        // 4. Pure Python.
        tags.push((
            implementation.language_tag(python_version),
            "none".to_string(),
            "any".to_string(),
        ));
        tags.push((
            format!("py{}", python_version.0),
            "none".to_string(),
            "any".to_string(),
        ));
        for minor in (0..=python_version.1).rev() {
            tags.push((
                format!("py{}{}", python_version.0, minor),
                "none".to_string(),
                "any".to_string(),
            ));
        }
        Ok(Self::new(tags))
    }

    /// Returns the [`TagCompatibility`] of the given tags.
    ///
    /// If compatible, includes the score of the most-compatible platform tag.
    /// If incompatible, includes the tag part which was a closest match.
    pub fn compatibility(
        &self,
        wheel_python_tags: &[String],
        wheel_abi_tags: &[String],
        wheel_platform_tags: &[String],
    ) -> TagCompatibility {
        let mut max_compatibility = TagCompatibility::Incompatible(IncompatibleTag::Invalid);

        for wheel_py in wheel_python_tags {
            let Some(abis) = self.map.get(wheel_py) else {
                max_compatibility =
                    max_compatibility.max(TagCompatibility::Incompatible(IncompatibleTag::Python));
                continue;
            };
            for wheel_abi in wheel_abi_tags {
                let Some(platforms) = abis.get(wheel_abi) else {
                    max_compatibility =
                        max_compatibility.max(TagCompatibility::Incompatible(IncompatibleTag::Abi));
                    continue;
                };
                for wheel_platform in wheel_platform_tags {
                    let compatibility = match platforms.get(wheel_platform) {
                        Some(priority) => TagCompatibility::Compatible(*priority),
                        None => TagCompatibility::Incompatible(IncompatibleTag::Platform),
                    };
                    max_compatibility = max_compatibility.max(compatibility);
                }
            }
        }
        max_compatibility
    }
}

/// The priority of a platform tag.
///
/// A wrapper around [`NonZeroU32`]. Higher values indicate higher priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TagPriority(NonZeroU32);

impl TagPriority {
    /// The priority given to every wheel when compatibility checks are disabled.
    pub const UNIFORM: Self = Self(NonZeroU32::MIN);

    fn from_index(index: usize) -> Self {
        let priority = u32::try_from(index)
            .ok()
            .and_then(|index| index.checked_add(1))
            .and_then(NonZeroU32::new)
            .unwrap_or(NonZeroU32::MAX);
        Self(priority)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Implementation {
    CPython,
    PyPy,
}

impl Implementation {
    /// Returns the "language implementation and version tag" for the current implementation and
    /// Python version (e.g., `cp39` or `pp37`).
    pub fn language_tag(self, python_version: (u8, u8)) -> String {
        match self {
            // Ex) `cp39`
            Self::CPython => format!("cp{}{}", python_version.0, python_version.1),
            // Ex) `pp39`
            Self::PyPy => format!("pp{}{}", python_version.0, python_version.1),
        }
    }

    pub fn abi_tag(self, python_version: (u8, u8)) -> String {
        match self {
            // Ex) `cp37m`, `cp39`
            Self::CPython => {
                if python_version.1 <= 7 {
                    format!("cp{}{}m", python_version.0, python_version.1)
                } else {
                    format!("cp{}{}", python_version.0, python_version.1)
                }
            }
            // Ex) `pypy39_pp73`
            Self::PyPy => format!("pypy{}{}_pp73", python_version.0, python_version.1),
        }
    }
}

impl FromStr for Implementation {
    type Err = TagsError;

    fn from_str(s: &str) -> Result<Self, TagsError> {
        match s {
            "cpython" => Ok(Self::CPython),
            "pypy" => Ok(Self::PyPy),
            "ironpython" | "jython" => Err(TagsError::UnsupportedImplementation(s.to_string())),
            _ => Err(TagsError::UnknownImplementation(s.to_string())),
        }
    }
}

/// Returns the compatible platform tags for a [`Platform`], most specific first (e.g.,
/// `manylinux_2_17_x86_64`, `macosx_11_0_arm64`, or `win_amd64`).
fn compatible_tags(platform: &Platform) -> Vec<String> {
    let arch = platform.arch();

    match platform.os() {
        Os::Manylinux { major, minor } => {
            let oldest = arch.minimum_manylinux_minor();
            let mut platform_tags = Vec::new();
            for minor in (oldest..=*minor).rev() {
                platform_tags.push(format!("manylinux_{major}_{minor}_{arch}"));
                match minor {
                    17 => platform_tags.push(format!("manylinux2014_{arch}")),
                    12 => platform_tags.push(format!("manylinux2010_{arch}")),
                    5 => platform_tags.push(format!("manylinux1_{arch}")),
                    _ => {}
                }
            }
            platform_tags.push(format!("linux_{arch}"));
            platform_tags
        }
        Os::Musllinux { major, minor } => {
            let mut platform_tags: Vec<String> = (1..=*minor)
                .rev()
                .map(|minor| format!("musllinux_{major}_{minor}_{arch}"))
                .collect();
            platform_tags.push(format!("linux_{arch}"));
            platform_tags
        }
        Os::Macos { major, minor } => {
            let binary_format = match arch {
                Arch::Aarch64 => "arm64".to_string(),
                arch => arch.to_string(),
            };
            let mut platform_tags = Vec::new();
            if *major >= 11 {
                // Since macOS 11, the major version bumps yearly.
                for major in (11..=*major).rev() {
                    platform_tags.push(format!("macosx_{major}_0_{binary_format}"));
                    platform_tags.push(format!("macosx_{major}_0_universal2"));
                }
                if matches!(arch, Arch::X86_64) {
                    for minor in (4..=16).rev() {
                        platform_tags.push(format!("macosx_10_{minor}_{binary_format}"));
                        platform_tags.push(format!("macosx_10_{minor}_universal2"));
                    }
                } else {
                    for minor in (4..=16).rev() {
                        platform_tags.push(format!("macosx_10_{minor}_universal2"));
                    }
                }
            } else {
                for minor in (4..=*minor).rev() {
                    platform_tags.push(format!("macosx_{major}_{minor}_{binary_format}"));
                    platform_tags.push(format!("macosx_{major}_{minor}_universal2"));
                }
            }
            platform_tags
        }
        Os::Windows => match arch {
            Arch::X86 => vec!["win32".to_string()],
            Arch::X86_64 => vec!["win_amd64".to_string()],
            Arch::Aarch64 => vec!["win_arm64".to_string()],
        },
    }
}
