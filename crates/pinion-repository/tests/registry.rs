//! The repository against a real registry client and a mock index server.

use std::str::FromStr;

use anyhow::{Result, bail};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pinion_cache::Cache;
use pinion_client::RegistryClientBuilder;
use pinion_normalize::PackageName;
use pinion_platform_tags::Tags;
use pinion_pypi_types::{IndexUrl, IndexUrls, Requirement};
use pinion_repository::{Error, PackageRepository, RepositoryOptions, TargetPython};
use pinion_types::{ExtractedMetadata, ExtractionRequest, MetadataExtractor};

struct NoExtractor;

fn options() -> Result<RepositoryOptions> {
    Ok(RepositoryOptions::new(
        TargetPython::from_str("3.12.1")?,
        Tags::new(vec![(
            "py3".to_string(),
            "none".to_string(),
            "any".to_string(),
        )]),
    ))
}

impl MetadataExtractor for NoExtractor {
    async fn extract<'a>(&'a self, request: ExtractionRequest<'a>) -> Result<ExtractedMetadata> {
        bail!("unexpected extraction of {}", request.requirement)
    }
}

#[tokio::test]
async fn best_match_and_hashes_from_registry() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/simple/foo/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/vnd.pypi.simple.v1+json")
                .set_body_json(serde_json::json!({
                    "meta": {"api-version": "1.0"},
                    "name": "foo",
                    "files": [
                        {
                            "filename": "foo-1.0-py3-none-any.whl",
                            "hashes": {"sha256": "00ff"},
                            "url": "../../files/foo-1.0-py3-none-any.whl",
                        },
                        {
                            "filename": "foo-1.1-py3-none-any.whl",
                            "hashes": {"sha256": "01ff"},
                            "requires-python": ">=3.13",
                            "url": "../../files/foo-1.1-py3-none-any.whl",
                        },
                        {
                            "filename": "foo-1.0-cp312-cp312-win_amd64.whl",
                            "hashes": {"sha256": "02ff"},
                            "url": "../../files/foo-1.0-cp312-cp312-win_amd64.whl",
                        },
                    ],
                })),
        )
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/foo-1.0-py3-none-any.whl"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello world"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/foo-1.0-cp312-cp312-win_amd64.whl"))
        .respond_with(ResponseTemplate::new(200).set_body_string("a windows wheel"))
        .expect(1)
        .mount(&server)
        .await;

    let client = RegistryClientBuilder::new()
        .index_urls(IndexUrls::from_args(
            Some(IndexUrl::from_str(&format!("{}/simple/", server.uri()))?),
            vec![],
            false,
        ))
        .retries(0)
        .build()?;
    let mut repository = PackageRepository::new(client, NoExtractor, options()?, Cache::temp()?)?;

    let best = repository
        .find_best_match(&Requirement::from_str("foo")?, None)
        .await?;
    assert_eq!(best.to_string(), "foo==1.0");

    let hashes = repository.get_hashes(&best).await?;
    insta::assert_debug_snapshot!(hashes, @r#"
    {
        "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9",
    }
    "#);
    // The second lookup is answered by the hash cache.
    assert_eq!(repository.get_hashes(&best).await?, hashes);

    // Across all platforms, the Windows wheel is hashed as well.
    let mut all = repository.allow_all_artifacts();
    let hashes = all.get_hashes(&best).await?;
    assert_eq!(hashes.len(), 2);
    Ok(())
}

#[tokio::test]
async fn package_unknown_to_every_index() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;

    let client = RegistryClientBuilder::new()
        .index_urls(IndexUrls::from_args(
            Some(IndexUrl::from_str(&format!("{}/simple/", server.uri()))?),
            vec![IndexUrl::from_str(&format!("{}/extra/", server.uri()))?],
            false,
        ))
        .retries(0)
        .build()?;
    let mut repository = PackageRepository::new(client, NoExtractor, options()?, Cache::temp()?)?;

    let err = repository
        .find_best_match(&Requirement::from_str("nope>=1")?, None)
        .await
        .unwrap_err();
    let Error::NoCandidateFound(no_candidate) = &err else {
        panic!("expected no candidate, got {err:?}");
    };
    assert!(no_candidate.candidates.is_empty());
    insta::assert_snapshot!(err, @"No version of nope matches >=1 (no versions available)");

    // The empty result is memoized like any other.
    assert!(
        repository
            .find_all_candidates(&PackageName::from_str("nope")?)
            .await?
            .is_empty()
    );
    Ok(())
}
