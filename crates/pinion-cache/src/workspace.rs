use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::{Cache, CacheBucket, Removal, rm_rf};

/// Scratch space for metadata extraction: a build directory and a source directory that live as
/// long as the workspace, plus the shared download directories in the cache.
///
/// The scratch directories are created inside the cache root and removed when the workspace is
/// dropped or reset.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    build_dir: TempDir,
    source_dir: TempDir,
    download_dir: PathBuf,
    wheel_download_dir: PathBuf,
}

impl Workspace {
    pub fn new(cache: &Cache) -> io::Result<Self> {
        let root = cache.root().to_path_buf();
        Ok(Self {
            build_dir: tempfile::Builder::new().prefix("build-").tempdir_in(&root)?,
            source_dir: tempfile::Builder::new().prefix("source-").tempdir_in(&root)?,
            download_dir: cache.bucket(CacheBucket::Downloads),
            wheel_download_dir: cache.bucket(CacheBucket::WheelDownloads),
            root,
        })
    }

    /// The directory that artifacts are unpacked and built in.
    pub fn build_dir(&self) -> &Path {
        self.build_dir.path()
    }

    /// The directory that version control checkouts are placed in.
    pub fn source_dir(&self) -> &Path {
        self.source_dir.path()
    }

    /// The shared directory for downloaded archives, created if absent.
    pub fn download_dir(&self) -> io::Result<&Path> {
        fs_err::create_dir_all(&self.download_dir)?;
        Ok(&self.download_dir)
    }

    /// The shared directory for downloaded wheels, created if absent.
    pub fn wheel_download_dir(&self) -> io::Result<&Path> {
        fs_err::create_dir_all(&self.wheel_download_dir)?;
        Ok(&self.wheel_download_dir)
    }

    /// Discard the build and source directories and start over with fresh, empty ones.
    pub fn reset(&mut self) -> io::Result<()> {
        let build_dir = tempfile::Builder::new()
            .prefix("build-")
            .tempdir_in(&self.root)?;
        let source_dir = tempfile::Builder::new()
            .prefix("source-")
            .tempdir_in(&self.root)?;
        let previous = [
            std::mem::replace(&mut self.build_dir, build_dir),
            std::mem::replace(&mut self.source_dir, source_dir),
        ];
        for dir in previous {
            let path = dir.path().to_path_buf();
            // The directory may already have been removed by an extraction that cleaned up.
            if let Err(err) = dir.close() {
                if err.kind() != io::ErrorKind::NotFound {
                    return Err(err);
                }
                debug!("Scratch directory already removed: {}", path.display());
            }
        }
        Ok(())
    }

    /// Remove the shared download directories.
    pub fn clear_downloads(&self) -> io::Result<Removal> {
        let mut removal = rm_rf(&self.download_dir)?;
        removal += rm_rf(&self.wheel_download_dir)?;
        Ok(removal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_replaces_scratch_dirs() {
        let cache = Cache::temp().unwrap();
        let mut workspace = Workspace::new(&cache).unwrap();
        let build_dir = workspace.build_dir().to_path_buf();
        let source_dir = workspace.source_dir().to_path_buf();
        fs_err::write(build_dir.join("leftover"), "x").unwrap();

        workspace.reset().unwrap();
        assert!(!build_dir.exists());
        assert!(!source_dir.exists());
        assert!(workspace.build_dir().is_dir());
        assert!(workspace.source_dir().is_dir());
        assert!(workspace.build_dir().starts_with(cache.root()));
    }

    #[test]
    fn reset_tolerates_removed_dirs() {
        let cache = Cache::temp().unwrap();
        let mut workspace = Workspace::new(&cache).unwrap();
        fs_err::remove_dir_all(workspace.build_dir()).unwrap();
        workspace.reset().unwrap();
        assert!(workspace.build_dir().is_dir());
    }

    #[test]
    fn downloads_are_created_and_cleared() {
        let cache = Cache::temp().unwrap();
        let workspace = Workspace::new(&cache).unwrap();
        let downloads = workspace.download_dir().unwrap().to_path_buf();
        fs_err::write(downloads.join("foo-1.0.tar.gz"), "abc").unwrap();
        let wheels = workspace.wheel_download_dir().unwrap().to_path_buf();
        assert!(wheels.is_dir());

        let removal = workspace.clear_downloads().unwrap();
        assert_eq!(removal.num_files, 1);
        assert!(!downloads.exists());
        assert!(!wheels.exists());

        // Removing again is not an error.
        assert_eq!(workspace.clear_downloads().unwrap(), Removal::default());
    }
}
