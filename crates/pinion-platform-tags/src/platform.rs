//! The target platform (operating system and architecture) that wheels are matched against.

use std::fmt;

use crate::TagsError;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Platform {
    os: Os,
    arch: Arch,
}

impl Platform {
    /// Create a new platform from the given operating system and architecture.
    pub const fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Return the platform of the running process.
    ///
    /// The operating system version is not probed: Linux assumes `manylinux_2_17` (glibc 2.17)
    /// and macOS assumes 11.0, the oldest baselines still served by most binary wheels.
    pub fn current() -> Result<Self, TagsError> {
        let arch = match std::env::consts::ARCH {
            "x86_64" => Arch::X86_64,
            "aarch64" => Arch::Aarch64,
            "x86" => Arch::X86,
            arch => return Err(TagsError::UnsupportedPlatform(arch.to_string())),
        };
        let os = match std::env::consts::OS {
            "linux" if cfg!(target_env = "musl") => Os::Musllinux { major: 1, minor: 2 },
            "linux" => Os::Manylinux {
                major: 2,
                minor: 17,
            },
            "macos" => Os::Macos {
                major: 11,
                minor: 0,
            },
            "windows" => Os::Windows,
            os => return Err(TagsError::UnsupportedPlatform(os.to_string())),
        };
        Ok(Self { os, arch })
    }

    /// Return the platform's operating system.
    pub fn os(&self) -> &Os {
        &self.os
    }

    /// Return the platform's architecture.
    pub fn arch(&self) -> Arch {
        self.arch
    }
}

/// All supported operating systems.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Os {
    Manylinux { major: u16, minor: u16 },
    Musllinux { major: u16, minor: u16 },
    Windows,
    Macos { major: u16, minor: u16 },
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::Manylinux { .. } => write!(f, "Manylinux"),
            Self::Musllinux { .. } => write!(f, "Musllinux"),
            Self::Windows => write!(f, "Windows"),
            Self::Macos { .. } => write!(f, "MacOS"),
        }
    }
}

/// All supported CPU architectures.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Arch {
    Aarch64,
    X86,
    X86_64,
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::Aarch64 => write!(f, "aarch64"),
            Self::X86 => write!(f, "i686"),
            Self::X86_64 => write!(f, "x86_64"),
        }
    }
}

impl Arch {
    /// Returns the oldest `manylinux` minor version for this architecture.
    pub(crate) fn minimum_manylinux_minor(self) -> u16 {
        match self {
            // manylinux2014
            Self::Aarch64 => 17,
            // manylinux1
            Self::X86 | Self::X86_64 => 5,
        }
    }
}
