use std::io::{Read, Seek};
use std::path::Path;
use std::str::FromStr;

use zip::ZipArchive;

use pinion_distribution_filename::WheelFilename;
use pinion_pypi_types::Metadata;

use crate::Error;

/// Read the core metadata from the `.dist-info/METADATA` file of a wheel on disk.
pub(crate) fn read_wheel_metadata(path: &Path) -> Result<Metadata, Error> {
    let filename = path
        .file_name()
        .map(|filename| filename.to_string_lossy().to_string())
        .unwrap_or_default();
    let filename = WheelFilename::from_str(&filename)?;

    let mut archive = ZipArchive::new(fs_err::File::open(path)?)?;
    let dist_info = find_dist_info(&filename, &mut archive)?;

    let metadata_file = format!("{dist_info}.dist-info/METADATA");
    let mut contents = Vec::new();
    archive
        .by_name(&metadata_file)?
        .read_to_end(&mut contents)?;

    Metadata::parse_metadata(&contents).map_err(|err| Error::Metadata(metadata_file, err))
}

/// Find the `.dist-info` directory of the wheel's own distribution.
///
/// The metadata name may be uppercase while the wheel and dist info names are lowercase, or the
/// other way round, so the names are compared in lowercase.
fn find_dist_info(
    filename: &WheelFilename,
    archive: &mut ZipArchive<impl Read + Seek>,
) -> Result<String, Error> {
    let dist_info_matcher = format!(
        "{}-{}",
        filename.name.as_dist_info_name(),
        filename.version
    )
    .to_lowercase();
    let dist_infos: Vec<_> = archive
        .file_names()
        .filter_map(|name| name.split_once('/'))
        .filter_map(|(dir, file)| Some((dir.strip_suffix(".dist-info")?, file)))
        .filter(|(dir, file)| dir.to_lowercase() == dist_info_matcher && *file == "METADATA")
        .map(|(dir, _file)| dir.to_string())
        .collect();
    match dist_infos.as_slice() {
        [] => Err(Error::InvalidWheel(
            filename.to_string(),
            "missing .dist-info directory".to_string(),
        )),
        [dist_info] => Ok(dist_info.clone()),
        _ => Err(Error::InvalidWheel(
            filename.to_string(),
            format!("multiple .dist-info directories: {}", dist_infos.join(", ")),
        )),
    }
}
