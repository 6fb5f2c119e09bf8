use std::path::{Path, PathBuf};

use tracing::debug;

use pinion_pypi_types::{Metadata, RequiresTxt};

use crate::Error;

/// The metadata setuptools records in a project's `.egg-info` directory.
#[derive(Debug)]
pub(crate) struct EggInfo {
    pub(crate) metadata: Metadata,
    pub(crate) requires_txt: Option<RequiresTxt>,
}

/// Find the `.egg-info` directory of a project, either at its root or under `src/`.
pub(crate) fn find_egg_info(project: &Path) -> Result<Option<PathBuf>, Error> {
    for dir in [project.to_path_buf(), project.join("src")] {
        if !dir.is_dir() {
            continue;
        }
        let mut candidates = fs_err::read_dir(&dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_dir()
                    && path
                        .extension()
                        .is_some_and(|extension| extension == "egg-info")
                    && path.join("PKG-INFO").is_file()
            })
            .collect::<Vec<_>>();
        candidates.sort();
        if let Some(egg_info) = candidates.into_iter().next() {
            return Ok(Some(egg_info));
        }
    }
    Ok(None)
}

/// Read `PKG-INFO` and `requires.txt` from an `.egg-info` directory.
pub(crate) fn read_egg_info(egg_info: &Path) -> Result<EggInfo, Error> {
    debug!("Reading metadata from: {}", egg_info.display());
    let pkg_info = egg_info.join("PKG-INFO");
    let metadata = Metadata::parse_metadata(&fs_err::read(&pkg_info)?)
        .map_err(|err| Error::Metadata(pkg_info.display().to_string(), err))?;

    let requires_txt = match fs_err::read_to_string(egg_info.join("requires.txt")) {
        Ok(contents) => Some(RequiresTxt::parse(&contents)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => return Err(err.into()),
    };

    Ok(EggInfo {
        metadata,
        requires_txt,
    })
}
