use std::io;

use futures::TryStreamExt;
use reqwest::header::ACCEPT_ENCODING;
use reqwest_middleware::ClientWithMiddleware;
use tracing::trace;

use pinion_pypi_types::Location;
use pinion_types::ArtifactReader;

use crate::Error;

/// Open an artifact for streaming, either from the local filesystem (`file://`) or over HTTP.
///
/// Remote artifacts are requested without content encoding, so that the bytes read are exactly
/// the bytes that were published and hashed.
pub async fn open_local_or_remote_file(
    location: &Location,
    client: &ClientWithMiddleware,
) -> Result<ArtifactReader, Error> {
    if location.is_file() {
        let path = location
            .to_file_path()
            .ok_or_else(|| Error::InvalidFileUrl(location.url().clone()))?;
        if fs_err::tokio::metadata(&path).await?.is_dir() {
            return Err(Error::Directory(path));
        }
        trace!("Opening local file: {}", path.display());
        let file = fs_err::tokio::File::open(&path).await?;
        return Ok(Box::pin(file));
    }

    let url = location.url_without_fragment();
    trace!("Streaming remote file: {url}");
    let response = client
        .get(url)
        .header(ACCEPT_ENCODING, "identity")
        .send()
        .await?
        .error_for_status()?;
    let stream = response.bytes_stream().map_err(io::Error::other);
    Ok(Box::pin(tokio_util::io::StreamReader::new(stream)))
}
