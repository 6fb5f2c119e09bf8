use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use anyhow::Result;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pinion_extract::{ArchiveExtractor, Error};
use pinion_pypi_types::{Location, Requirement};
use pinion_types::{ExtractedMetadata, ExtractionRequest};

struct Dirs {
    build: TempDir,
    source: TempDir,
    downloads: TempDir,
    wheels: TempDir,
}

impl Dirs {
    fn new() -> Result<Self> {
        Ok(Self {
            build: tempfile::tempdir()?,
            source: tempfile::tempdir()?,
            downloads: tempfile::tempdir()?,
            wheels: tempfile::tempdir()?,
        })
    }

    fn request<'a>(
        &'a self,
        requirement: &'a Requirement,
        location: &'a Location,
    ) -> ExtractionRequest<'a> {
        ExtractionRequest {
            requirement,
            location,
            build_dir: self.build.path(),
            source_dir: self.source.path(),
            download_dir: Some(self.downloads.path()),
            wheel_download_dir: self.wheels.path(),
        }
    }
}

fn extractor() -> ArchiveExtractor {
    ArchiveExtractor::new(reqwest_middleware::ClientBuilder::new(reqwest::Client::new()).build())
}

fn names(metadata: &ExtractedMetadata) -> Vec<String> {
    metadata
        .dependencies
        .iter()
        .map(|requirement| requirement.name.to_string())
        .collect()
}

fn write_wheel(dir: &Path) -> Result<Location> {
    let path = dir.join("foo-1.0-py3-none-any.whl");
    let mut writer = zip::ZipWriter::new(fs_err::File::create(&path)?);
    let options = zip::write::SimpleFileOptions::default();
    writer.start_file("foo/__init__.py", options)?;
    writer.start_file("foo-1.0.dist-info/METADATA", options)?;
    writer.write_all(
        b"Metadata-Version: 2.1\nName: foo\nVersion: 1.0\nRequires-Python: >=3.8\n\
          Requires-Dist: bar>=1\nRequires-Dist: baz; extra == 'test'\n",
    )?;
    writer.finish()?;
    Ok(Location::new(Url::from_file_path(&path).unwrap()))
}

fn sdist_bytes(files: &[(&str, &str)]) -> Result<Vec<u8>> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, contents.as_bytes())?;
    }
    Ok(builder.into_inner()?.finish()?)
}

#[tokio::test]
async fn wheel_metadata() -> Result<()> {
    let dirs = Dirs::new()?;
    let location = write_wheel(dirs.build.path())?;
    let requirement = Requirement::from_str("foo==1.0")?;

    let metadata = extractor()
        .extract_metadata(dirs.request(&requirement, &location))
        .await?;

    assert_eq!(names(&metadata), vec!["bar", "baz"]);
    assert_eq!(
        metadata.requires_python.unwrap().to_string(),
        ">=3.8"
    );
    assert!(metadata.distribution.is_none());
    Ok(())
}

#[tokio::test]
async fn sdist_with_static_pkg_info() -> Result<()> {
    let dirs = Dirs::new()?;
    let archive = dirs.downloads.path().join("foo-1.0.tar.gz");
    fs_err::write(
        &archive,
        sdist_bytes(&[(
            "foo-1.0/PKG-INFO",
            "Metadata-Version: 2.2\nName: foo\nVersion: 1.0\nRequires-Dist: bar\n",
        )])?,
    )?;
    let location = Location::new(Url::from_file_path(&archive).unwrap());
    let requirement = Requirement::from_str("foo==1.0")?;

    let metadata = extractor()
        .extract_metadata(dirs.request(&requirement, &location))
        .await?;
    assert_eq!(names(&metadata), vec!["bar"]);
    Ok(())
}

#[tokio::test]
async fn sdist_falls_back_to_egg_info() -> Result<()> {
    let dirs = Dirs::new()?;
    let archive = dirs.downloads.path().join("foo-1.0.tar.gz");
    fs_err::write(
        &archive,
        sdist_bytes(&[
            (
                "foo-1.0/PKG-INFO",
                "Metadata-Version: 1.0\nName: foo\nVersion: 1.0\n",
            ),
            (
                "foo-1.0/foo.egg-info/PKG-INFO",
                "Metadata-Version: 1.0\nName: foo\nVersion: 1.0\n",
            ),
            (
                "foo-1.0/foo.egg-info/requires.txt",
                "bar\n\n[test]\npytest\n\n[:sys_platform == \"win32\"]\ncolorama\n",
            ),
        ])?,
    )?;
    let location = Location::new(Url::from_file_path(&archive).unwrap());
    let requirement = Requirement::from_str("foo==1.0")?;

    let metadata = extractor()
        .extract_metadata(dirs.request(&requirement, &location))
        .await?;
    assert_eq!(names(&metadata), vec!["bar", "colorama"]);
    assert!(metadata.dependencies[1].marker.is_some());
    Ok(())
}

#[tokio::test]
async fn project_directory() -> Result<()> {
    let dirs = Dirs::new()?;
    let project = dirs.source.path().join("project");
    let egg_info = project.join("src").join("my_project.egg-info");
    fs_err::create_dir_all(&egg_info)?;
    fs_err::write(
        egg_info.join("PKG-INFO"),
        "Metadata-Version: 2.1\nName: my-project\nVersion: 0.3.0\n",
    )?;
    fs_err::write(egg_info.join("requires.txt"), "requests\n")?;

    let location = Location::new(Url::from_directory_path(&project).unwrap());
    let requirement = Requirement::from_str(&format!("-e {}", project.display()))?;

    let metadata = extractor()
        .extract_metadata(dirs.request(&requirement, &location))
        .await?;
    let distribution = metadata.distribution.unwrap();
    assert_eq!(distribution.name.to_string(), "my-project");
    assert_eq!(distribution.version.to_string(), "0.3.0");
    assert_eq!(distribution.requires_txt.unwrap().sections.len(), 1);
    Ok(())
}

#[tokio::test]
async fn project_without_metadata() -> Result<()> {
    let dirs = Dirs::new()?;
    let project = dirs.source.path().join("empty-project");
    fs_err::create_dir_all(&project)?;
    let location = Location::new(Url::from_directory_path(&project).unwrap());
    let requirement = Requirement::from_str(&format!("-e {}", project.display()))?;

    let result = extractor()
        .extract_metadata(dirs.request(&requirement, &location))
        .await;
    assert!(matches!(result, Err(Error::MissingMetadata(_))));
    Ok(())
}

#[tokio::test]
async fn vcs_is_unsupported() -> Result<()> {
    let dirs = Dirs::new()?;
    let location = Location::from_str("git+https://github.com/pallets/flask.git@2.0")?;
    let requirement = Requirement::from_str("-e git+https://github.com/pallets/flask.git@2.0")?;

    let err = extractor()
        .extract_metadata(dirs.request(&requirement, &location))
        .await
        .unwrap_err();
    insta::assert_snapshot!(
        err,
        @"Version control checkouts are not supported: git+https://github.com/pallets/flask.git@2.0"
    );
    Ok(())
}

#[tokio::test]
async fn remote_sdist_is_downloaded_once() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/foo-1.0.tar.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(sdist_bytes(&[(
            "foo-1.0/PKG-INFO",
            "Metadata-Version: 2.2\nName: foo\nVersion: 1.0\nRequires-Dist: bar\n",
        )])?))
        .expect(1)
        .mount(&server)
        .await;

    let dirs = Dirs::new()?;
    let location = Location::from_str(&format!("{}/files/foo-1.0.tar.gz", server.uri()))?;
    let requirement = Requirement::from_str("foo==1.0")?;
    let extractor = extractor();

    let metadata = extractor
        .extract_metadata(dirs.request(&requirement, &location))
        .await?;
    assert_eq!(names(&metadata), vec!["bar"]);
    assert!(dirs.downloads.path().join("foo-1.0.tar.gz").is_file());

    // The second extraction reuses the download, but needs a fresh build directory.
    fs_err::remove_dir_all(dirs.build.path())?;
    fs_err::create_dir_all(dirs.build.path())?;
    let metadata = extractor
        .extract_metadata(dirs.request(&requirement, &location))
        .await?;
    assert_eq!(names(&metadata), vec!["bar"]);
    Ok(())
}
