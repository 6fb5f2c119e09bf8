use std::io;
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::Error;

/// Unzip a `.zip` archive into the target directory.
pub(crate) fn unzip_archive<R: io::Read + io::Seek>(reader: R, target: &Path) -> Result<(), Error> {
    let mut archive = ZipArchive::new(reader)?;
    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;

        // Skip entries that would escape the target directory.
        let Some(file_path) = file.enclosed_name() else {
            continue;
        };

        let path = target.join(file_path);
        if file.is_dir() {
            fs_err::create_dir_all(path)?;
            continue;
        }
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let mut outfile = fs_err::File::create(&path)?;
        io::copy(&mut file, &mut outfile)?;

        #[cfg(unix)]
        {
            use std::fs::Permissions;
            use std::os::unix::fs::PermissionsExt;

            if let Some(mode) = file.unix_mode() {
                fs_err::set_permissions(&path, Permissions::from_mode(mode))?;
            }
        }
    }
    Ok(())
}

/// Extract a `.zip` or `.tar.gz` archive into the target directory.
pub(crate) fn extract_archive(source: &Path, target: &Path) -> Result<(), Error> {
    let filename = source
        .file_name()
        .map(|filename| filename.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    if filename.ends_with(".zip") {
        return unzip_archive(fs_err::File::open(source)?, target);
    }

    if filename.ends_with(".tar.gz") || filename.ends_with(".tgz") {
        let mut archive =
            tar::Archive::new(flate2::read::GzDecoder::new(fs_err::File::open(source)?));
        // https://github.com/alexcrichton/tar-rs/issues/349
        archive.set_preserve_mtime(false);
        archive.unpack(target)?;
        return Ok(());
    }

    Err(Error::UnsupportedArchive(source.to_path_buf()))
}

/// Extract a source distribution into the target directory.
///
/// Returns the path to the top-level directory of the source distribution.
pub(crate) fn extract_source(source: &Path, target: &Path) -> Result<PathBuf, Error> {
    extract_archive(source, target)?;

    // > A .tar.gz source distribution (sdist) contains a single top-level directory called
    // > `{name}-{version}` (e.g. foo-1.0), containing the source files of the package.
    let top_level = fs_err::read_dir(target)?.collect::<io::Result<Vec<fs_err::DirEntry>>>()?;
    let [root] = top_level.as_slice() else {
        return Err(Error::InvalidArchive(
            top_level
                .iter()
                .map(|entry| entry.file_name().to_string_lossy().to_string())
                .collect(),
        ));
    };
    Ok(root.path())
}
