use std::str::FromStr;

use anyhow::Result;
use pep440_rs::Version;
use tokio::io::AsyncReadExt;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pinion_client::{Error, RegistryClientBuilder};
use pinion_normalize::PackageName;
use pinion_pypi_types::{IndexUrl, IndexUrls, Location};

fn simple_page(files: &serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "application/vnd.pypi.simple.v1+json")
        .set_body_json(serde_json::json!({
            "meta": {"api-version": "1.0"},
            "name": "foo",
            "files": files,
        }))
}

fn index(server: &MockServer, prefix: &str) -> Result<IndexUrl> {
    Ok(IndexUrl::from_str(&format!("{}/{prefix}/", server.uri()))?)
}

#[tokio::test]
async fn simple_resolves_file_urls() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/simple/foo/"))
        .and(header("accept", "application/vnd.pypi.simple.v1+json"))
        .respond_with(simple_page(&serde_json::json!([
            {
                "filename": "foo-1.0-py3-none-any.whl",
                "hashes": {"sha256": "abc123"},
                "url": "../../files/foo-1.0-py3-none-any.whl",
            },
            {
                "filename": "foo-1.0.tar.gz",
                "hashes": {},
                "url": "https://files.example.com/foo-1.0.tar.gz",
            },
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = RegistryClientBuilder::new()
        .index_urls(IndexUrls::from_args(
            Some(index(&server, "simple")?),
            vec![],
            false,
        ))
        .retries(0)
        .build()?;
    let files = client.simple(&PackageName::from_str("Foo")?).await?;

    assert_eq!(files.len(), 2);
    assert_eq!(
        files[0].location.to_string(),
        format!("{}/files/foo-1.0-py3-none-any.whl#sha256=abc123", server.uri())
    );
    assert_eq!(
        files[1].location.to_string(),
        "https://files.example.com/foo-1.0.tar.gz"
    );
    Ok(())
}

#[tokio::test]
async fn simple_falls_through_missing_packages() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/primary/foo/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/extra/foo/"))
        .respond_with(simple_page(&serde_json::json!([
            {"filename": "foo-2.0.tar.gz", "url": "foo-2.0.tar.gz"},
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = RegistryClientBuilder::new()
        .index_urls(IndexUrls::from_args(
            Some(index(&server, "primary")?),
            vec![index(&server, "extra")?],
            false,
        ))
        .retries(0)
        .build()?;
    let files = client.simple(&PackageName::from_str("foo")?).await?;

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].index, index(&server, "extra")?);
    Ok(())
}

#[tokio::test]
async fn simple_not_found_anywhere() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = RegistryClientBuilder::new()
        .index_urls(IndexUrls::from_args(
            Some(index(&server, "simple")?),
            vec![],
            false,
        ))
        .retries(0)
        .build()?;
    let err = client
        .simple(&PackageName::from_str("foo")?)
        .await
        .unwrap_err();
    insta::assert_snapshot!(err, @"Package `foo` was not found in the registry");
    Ok(())
}

#[tokio::test]
async fn requires_dist_matches_equivalent_release() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pypi/foo/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "info": {"name": "foo", "version": "1.0.0"},
            "releases": {"0.9": [], "1.0.0": []},
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pypi/foo/1.0.0/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "info": {
                "name": "foo",
                "version": "1.0.0",
                "requires_dist": ["bar>=1", "not a requirement!", "baz; extra == 'test'"],
                "requires_python": ">=3.8",
            },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = RegistryClientBuilder::new()
        .json_api_url(Url::parse(&format!("{}/pypi/", server.uri()))?)
        .retries(0)
        .build()?;
    let requirements = client
        .requires_dist(&PackageName::from_str("foo")?, &Version::from_str("1.0")?)
        .await?
        .unwrap();

    let names: Vec<_> = requirements
        .iter()
        .map(|requirement| requirement.name.to_string())
        .collect();
    assert_eq!(names, vec!["bar", "baz"]);
    assert!(requirements[1].marker_mentions_extra());
    Ok(())
}

#[tokio::test]
async fn requires_dist_unavailable() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pypi/foo/json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = RegistryClientBuilder::new()
        .json_api_url(Url::parse(&format!("{}/pypi/", server.uri()))?)
        .retries(0)
        .build()?;
    let name = PackageName::from_str("foo")?;
    let version = Version::from_str("1.0")?;
    assert!(client.requires_dist(&name, &version).await?.is_none());

    // Without PyPI among the indexes, there is no JSON API to ask.
    let client = RegistryClientBuilder::new()
        .index_urls(IndexUrls::from_args(
            Some(index(&server, "simple")?),
            vec![],
            false,
        ))
        .build()?;
    assert!(client.requires_dist(&name, &version).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn open_remote_requests_identity_encoding() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/foo-1.0.tar.gz"))
        .and(header("accept-encoding", "identity"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"archive bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let client = RegistryClientBuilder::new().retries(0).build()?;
    let location = Location::from_str(&format!(
        "{}/files/foo-1.0.tar.gz#sha256=abc123",
        server.uri()
    ))?;
    let mut reader = client.open(&location).await?;
    let mut contents = Vec::new();
    reader.read_to_end(&mut contents).await?;
    assert_eq!(contents, b"archive bytes");
    Ok(())
}

#[tokio::test]
async fn open_remote_error_status() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = RegistryClientBuilder::new().retries(0).build()?;
    let location = Location::from_str(&format!("{}/files/missing.tar.gz", server.uri()))?;
    assert!(matches!(
        client.open(&location).await,
        Err(Error::Request(_))
    ));
    Ok(())
}

#[tokio::test]
async fn open_local() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let file = temp_dir.path().join("foo-1.0.tar.gz");
    fs_err::write(&file, "local bytes")?;

    let client = RegistryClientBuilder::new().build()?;
    let location = Location::new(Url::from_file_path(&file).unwrap());
    let mut reader = client.open(&location).await?;
    let mut contents = String::new();
    reader.read_to_string(&mut contents).await?;
    assert_eq!(contents, "local bytes");

    let directory = Location::new(Url::from_directory_path(temp_dir.path()).unwrap());
    assert!(matches!(
        client.open(&directory).await,
        Err(Error::Directory(_))
    ));
    Ok(())
}
