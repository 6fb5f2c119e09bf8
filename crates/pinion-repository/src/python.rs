use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use pep440_rs::Version;
use pinion_static::EnvVars;

use crate::Error;

/// Prints the full version of the interpreter, e.g. `3.12.1`.
const VERSION_QUERY: &str = "import platform; print(platform.python_version())";

/// The version of the interpreter the resolution targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPython {
    version: Version,
}

impl TargetPython {
    pub fn new(version: Version) -> Self {
        Self { version }
    }

    /// Use the version in `PINION_PYTHON_VERSION` if set, or else the version of the first
    /// `python3` or `python` in `PATH`.
    pub async fn from_env() -> Result<Self, Error> {
        if let Some(target) = Self::from_override() {
            return target;
        }

        let python = which::which("python3")
            .or_else(|_| which::which("python"))
            .map_err(|_| Error::PythonNotFound)?;
        Self::query(&python).await
    }

    /// The version requested through `PINION_PYTHON_VERSION`, if any.
    fn from_override() -> Option<Result<Self, Error>> {
        std::env::var(EnvVars::PINION_PYTHON_VERSION)
            .ok()
            .filter(|version| !version.trim().is_empty())
            .map(|version| Self::from_str(&version))
    }

    /// Ask the interpreter at `python` for its version.
    async fn query(python: &Path) -> Result<Self, Error> {
        debug!("Querying Python version of {}", python.display());
        let output = tokio::process::Command::new(python)
            .args(["-c", VERSION_QUERY])
            .output()
            .await
            .map_err(|err| Error::PythonQuery(python.to_path_buf(), err))?;
        if !output.status.success() {
            return Err(Error::PythonQuery(
                python.to_path_buf(),
                std::io::Error::other(format!(
                    "{}\n{}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                )),
            ));
        }
        Self::from_str(String::from_utf8_lossy(&output.stdout).trim())
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// The major and minor version, e.g. `(3, 12)`, as used in wheel tags.
    pub fn major_minor(&self) -> (u8, u8) {
        let release = self.version.release();
        let component = |index: usize| {
            release
                .get(index)
                .and_then(|component| u8::try_from(*component).ok())
                .unwrap_or(0)
        };
        (component(0), component(1))
    }
}

impl FromStr for TargetPython {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let version = Version::from_str(s.trim())
            .map_err(|err| Error::PythonVersion(s.to_string(), err))?;
        Ok(Self::new(version))
    }
}
