//! Recursive removal with a summary of what was removed, in the manner of `cargo clean`.

use std::io;
use std::path::Path;

/// Remove a file or directory and all its contents, returning a [`Removal`] with the number of
/// files and directories removed, along with a total byte count.
///
/// A path that doesn't exist is not an error.
pub fn rm_rf(path: impl AsRef<Path>) -> io::Result<Removal> {
    let mut removal = Removal::default();
    removal.rm_rf(path.as_ref())?;
    Ok(removal)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Removal {
    /// The number of files removed.
    pub num_files: u64,
    /// The number of directories removed.
    pub num_dirs: u64,
    /// The total number of bytes removed.
    pub total_bytes: u64,
}

impl Removal {
    fn rm_rf(&mut self, path: &Path) -> io::Result<()> {
        let metadata = match fs_err::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err),
        };

        if !metadata.is_dir() {
            self.num_files += 1;
            self.total_bytes += metadata.len();
            return remove_file(path);
        }

        for entry in walkdir::WalkDir::new(path).contents_first(true) {
            let entry = match entry {
                Ok(entry) => entry,
                // Removed concurrently.
                Err(err) if err.io_error().map(io::Error::kind) == Some(io::ErrorKind::NotFound) => {
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            if entry.file_type().is_dir() {
                self.num_dirs += 1;
                match fs_err::remove_dir_all(entry.path()) {
                    Ok(()) => {}
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                    Err(err) => return Err(err),
                }
            } else {
                self.num_files += 1;
                if let Ok(metadata) = entry.metadata() {
                    self.total_bytes += metadata.len();
                }
                remove_file(entry.path())?;
            }
        }

        Ok(())
    }
}

impl std::ops::AddAssign for Removal {
    fn add_assign(&mut self, other: Self) {
        self.num_files += other.num_files;
        self.num_dirs += other.num_dirs;
        self.total_bytes += other.total_bytes;
    }
}

/// Like [`fs_err::remove_file`], but clears the read-only flag and retries if the first attempt
/// is denied, and ignores files that are already gone.
fn remove_file(path: &Path) -> io::Result<()> {
    fn set_not_readonly(path: &Path) -> io::Result<bool> {
        let mut perms = fs_err::metadata(path)?.permissions();
        if !perms.readonly() {
            return Ok(false);
        }
        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(false);
        fs_err::set_permissions(path, perms)?;
        Ok(true)
    }

    match fs_err::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err)
            if err.kind() == io::ErrorKind::PermissionDenied
                && set_not_readonly(path).unwrap_or(false) =>
        {
            fs_err::remove_file(path)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_removed_entries() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("tree");
        fs_err::create_dir_all(root.join("nested")).unwrap();
        fs_err::write(root.join("a.txt"), "abc").unwrap();
        fs_err::write(root.join("nested").join("b.txt"), "de").unwrap();

        let removal = rm_rf(&root).unwrap();
        assert_eq!(removal.num_files, 2);
        assert_eq!(removal.num_dirs, 2);
        assert_eq!(removal.total_bytes, 5);
        assert!(!root.exists());

        assert_eq!(rm_rf(&root).unwrap(), Removal::default());
    }
}
