//! A [`MetadataExtractor`] that reads dependency metadata without building anything.
//!
//! Wheels are read from their `.dist-info/METADATA`. Source distributions are unpacked and read
//! from a static `PKG-INFO` (Metadata 2.2 or later), falling back to an `.egg-info` directory
//! shipped in the archive. Project directories, e.g. editable requirements, are read from their
//! `.egg-info` directory.

use std::path::{Path, PathBuf};

use reqwest_middleware::ClientWithMiddleware;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};
use url::Url;

use pinion_client::open_local_or_remote_file;
use pinion_distribution_filename::WheelFilenameError;
use pinion_pypi_types::{Location, Metadata, MetadataError};
use pinion_types::{DistributionMetadata, ExtractedMetadata, ExtractionRequest, MetadataExtractor};

use crate::egg_info::{find_egg_info, read_egg_info};

mod archive;
mod egg_info;
mod wheel;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Client(#[from] pinion_client::Error),
    #[error(transparent)]
    WheelFilename(#[from] WheelFilenameError),
    #[error("Failed to parse metadata from `{0}`")]
    Metadata(String, #[source] MetadataError),
    #[error("Invalid wheel `{0}`: {1}")]
    InvalidWheel(String, String),
    #[error("Unsupported archive type: {}", _0.display())]
    UnsupportedArchive(PathBuf),
    #[error(
        "The top level of the archive must only contain a single directory, but it contains: {0:?}"
    )]
    InvalidArchive(Vec<String>),
    #[error("No static metadata found in `{}`; building distributions is not supported", _0.display())]
    MissingMetadata(PathBuf),
    #[error("Version control checkouts are not supported: {0}")]
    UnsupportedVcs(Url),
    #[error("Unable to determine a filename for: {0}")]
    MissingFilename(Url),
    #[error("Failed to run a blocking task")]
    Join(#[from] tokio::task::JoinError),
}

/// Reads metadata from archives and project directories, downloading remote archives first.
#[derive(Debug, Clone)]
pub struct ArchiveExtractor {
    client: ClientWithMiddleware,
}

impl ArchiveExtractor {
    pub fn new(client: ClientWithMiddleware) -> Self {
        Self { client }
    }

    /// Read the metadata of the artifact, checkout or directory in the request.
    #[instrument(skip_all, fields(location = %request.location))]
    pub async fn extract_metadata(
        &self,
        request: ExtractionRequest<'_>,
    ) -> Result<ExtractedMetadata, Error> {
        let location = request.location;
        if location.is_vcs() {
            return Err(Error::UnsupportedVcs(location.url().clone()));
        }

        // A project directory, e.g. an editable.
        if let Some(path) = location.to_file_path().filter(|path| path.is_dir()) {
            return read_project(&path);
        }

        let filename = location
            .filename()
            .ok_or_else(|| Error::MissingFilename(location.url().clone()))?
            .to_string();
        let is_wheel = filename.to_ascii_lowercase().ends_with(".whl");

        let path = match location.to_file_path() {
            Some(path) => path,
            None => {
                let target = if is_wheel {
                    request.wheel_download_dir
                } else {
                    request.download_dir.unwrap_or(request.build_dir)
                };
                self.download(location, &filename, target).await?
            }
        };

        if is_wheel {
            let metadata =
                tokio::task::spawn_blocking(move || wheel::read_wheel_metadata(&path)).await??;
            return Ok(ExtractedMetadata {
                dependencies: metadata.requires_dist,
                requires_python: metadata.requires_python,
                distribution: None,
            });
        }

        let build_dir = request.build_dir.to_path_buf();
        tokio::task::spawn_blocking(move || read_source_dist(&path, &build_dir)).await?
    }

    /// Download a remote artifact into `target`, reusing an earlier download of the same file.
    async fn download(
        &self,
        location: &Location,
        filename: &str,
        target: &Path,
    ) -> Result<PathBuf, Error> {
        let path = target.join(filename);
        if path.is_file() {
            debug!("Using previously downloaded artifact: {}", path.display());
            return Ok(path);
        }

        debug!("Downloading: {location}");
        fs_err::tokio::create_dir_all(target).await?;
        let mut reader = open_local_or_remote_file(location, &self.client).await?;

        // Download to a temporary file first, so that an interrupted download is never reused.
        let temp_file = tempfile::NamedTempFile::new_in(target)?;
        let mut writer = tokio::fs::File::from_std(temp_file.reopen()?);
        tokio::io::copy(&mut reader, &mut writer).await?;
        writer.flush().await?;
        temp_file.persist(&path).map_err(|err| err.error)?;

        Ok(path)
    }
}

impl MetadataExtractor for ArchiveExtractor {
    async fn extract<'a>(
        &'a self,
        request: ExtractionRequest<'a>,
    ) -> anyhow::Result<ExtractedMetadata> {
        Ok(self.extract_metadata(request).await?)
    }
}

/// Read the metadata of a project directory from its `.egg-info`, or from a `PKG-INFO` at its
/// root.
fn read_project(project: &Path) -> Result<ExtractedMetadata, Error> {
    if let Some(egg_info) = find_egg_info(project)? {
        let egg_info = read_egg_info(&egg_info)?;
        return Ok(ExtractedMetadata {
            dependencies: egg_info.metadata.requires_dist,
            requires_python: egg_info.metadata.requires_python,
            distribution: Some(DistributionMetadata {
                name: egg_info.metadata.name,
                version: egg_info.metadata.version,
                requires_txt: egg_info.requires_txt,
            }),
        });
    }

    let pkg_info = project.join("PKG-INFO");
    if pkg_info.is_file() {
        let metadata = Metadata::parse_metadata(&fs_err::read(&pkg_info)?)
            .map_err(|err| Error::Metadata(pkg_info.display().to_string(), err))?;
        return Ok(ExtractedMetadata {
            dependencies: metadata.requires_dist,
            requires_python: metadata.requires_python,
            distribution: Some(DistributionMetadata {
                name: metadata.name,
                version: metadata.version,
                requires_txt: None,
            }),
        });
    }

    Err(Error::MissingMetadata(project.to_path_buf()))
}

/// Unpack a source distribution into `build_dir` and read its static metadata.
fn read_source_dist(source: &Path, build_dir: &Path) -> Result<ExtractedMetadata, Error> {
    let root = archive::extract_source(source, build_dir)?;

    let pkg_info = root.join("PKG-INFO");
    if pkg_info.is_file() {
        match Metadata::parse_pkg_info(&fs_err::read(&pkg_info)?) {
            Ok(metadata) => {
                return Ok(ExtractedMetadata {
                    dependencies: metadata.requires_dist,
                    requires_python: metadata.requires_python,
                    distribution: None,
                });
            }
            Err(err) => debug!("Unable to use `PKG-INFO` of {}: {err}", source.display()),
        }
    }

    if let Some(egg_info) = find_egg_info(&root)? {
        let egg_info = read_egg_info(&egg_info)?;
        let mut dependencies = egg_info.metadata.requires_dist;
        if let Some(requires_txt) = &egg_info.requires_txt {
            for requirement in requires_txt.unconditional_requirements() {
                if !dependencies.contains(&requirement) {
                    dependencies.push(requirement);
                }
            }
        }
        return Ok(ExtractedMetadata {
            dependencies,
            requires_python: egg_info.metadata.requires_python,
            distribution: None,
        });
    }

    Err(Error::MissingMetadata(source.to_path_buf()))
}
