use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs_err as fs;
use tempfile::{TempDir, tempdir};

#[cfg(feature = "clap")]
pub use crate::cli::CacheArgs;
pub use crate::hash_store::HashStore;
pub use crate::removal::{Removal, rm_rf};
pub use crate::workspace::Workspace;

#[cfg(feature = "clap")]
mod cli;
mod hash_store;
mod removal;
mod workspace;

/// A file within a cache bucket, which may or may not exist yet.
#[derive(Debug, Clone)]
pub struct CacheEntry(PathBuf);

impl CacheEntry {
    /// Create a new [`CacheEntry`] from a directory and a file name.
    pub fn new(dir: impl Into<PathBuf>, file: impl AsRef<Path>) -> Self {
        Self(dir.into().join(file))
    }

    /// Return the path to the [`CacheEntry`].
    #[inline]
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Return the cache entry's parent directory.
    #[inline]
    pub fn dir(&self) -> &Path {
        self.0.parent().unwrap_or(&self.0)
    }
}

/// The main cache abstraction.
#[derive(Debug, Clone)]
pub struct Cache {
    /// The cache directory.
    root: PathBuf,
    /// A temporary cache directory, if the user requested `--no-cache`.
    ///
    /// Held so the directory lives for the length of the operation and is removed afterwards.
    _temp_dir_drop: Option<Arc<TempDir>>,
}

impl Cache {
    /// A persistent cache directory at `root`.
    pub fn from_path(root: impl Into<PathBuf>) -> Result<Self, io::Error> {
        Ok(Self {
            root: Self::init(root)?,
            _temp_dir_drop: None,
        })
    }

    /// Create a temporary cache directory.
    pub fn temp() -> Result<Self, io::Error> {
        let temp_dir = tempdir()?;
        Ok(Self {
            root: Self::init(temp_dir.path())?,
            _temp_dir_drop: Some(Arc::new(temp_dir)),
        })
    }

    /// Return the root of the cache.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The folder for a specific cache bucket.
    pub fn bucket(&self, cache_bucket: CacheBucket) -> PathBuf {
        self.root.join(cache_bucket.to_str())
    }

    /// Initialize a directory for use as a cache.
    fn init(root: impl Into<PathBuf>) -> Result<PathBuf, io::Error> {
        let root = root.into();

        fs::create_dir_all(&root)?;

        // Mark the directory as a cache for backup tools.
        let tag_path = root.join("CACHEDIR.TAG");
        if !tag_path.exists() {
            let mut file = fs::File::create(tag_path)?;
            file.write_all(
                b"Signature: 8a477f597d28d172789f06886806bc55\n\
                  # This file is a cache directory tag created by pinion.\n",
            )?;
        }

        // Keep the cache out of version control.
        let gitignore_path = root.join(".gitignore");
        if !gitignore_path.exists() {
            let mut file = fs::File::create(gitignore_path)?;
            file.write_all(b"*")?;
        }

        fs::canonicalize(root)
    }

    /// Clear the cache, removing all entries.
    pub fn clear(&self) -> Result<Removal, io::Error> {
        rm_rf(&self.root)
    }
}

/// The different kinds of data in the cache are stored in different buckets, which are
/// subdirectories of the cache root.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum CacheBucket {
    /// Artifact hashes, keyed by the digest algorithm and the full artifact URL including its
    /// hash fragment.
    ///
    /// Cache structure: `hash-cache-v0/<first two chars>/<sha256(key)>`.
    Hashes,
    /// Source archives downloaded while extracting metadata.
    Downloads,
    /// Wheels downloaded while extracting metadata.
    WheelDownloads,
}

impl CacheBucket {
    fn to_str(self) -> &'static str {
        match self {
            Self::Hashes => "hash-cache-v0",
            Self::Downloads => "pkgs",
            Self::WheelDownloads => "wheels",
        }
    }
}
