//! Types for PyPI's JSON API (`/pypi/<project>/json` and `/pypi/<project>/<version>/json`).
//!
//! Only the fields needed to read a release's declared dependencies are modeled.

use std::collections::BTreeMap;

use serde::Deserialize;

/// The project response, listing every release by its version string.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectJson {
    #[serde(default)]
    pub releases: BTreeMap<String, serde_json::Value>,
}

/// The response for a single release.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseJson {
    pub info: ReleaseInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseInfo {
    pub name: String,
    pub version: String,
    /// `None` when the release didn't upload metadata with dependency information, which is not
    /// the same as having no dependencies.
    pub requires_dist: Option<Vec<String>>,
    pub requires_python: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_release() {
        let response = r#"
        {
            "info": {
                "name": "requests",
                "version": "2.31.0",
                "requires_dist": [
                    "charset-normalizer<4,>=2",
                    "PySocks!=1.5.7,>=1.5.6; extra == \"socks\""
                ],
                "requires_python": ">=3.7",
                "summary": "Python HTTP for Humans."
            },
            "urls": []
        }
        "#;
        let release: ReleaseJson = serde_json::from_str(response).unwrap();
        assert_eq!(release.info.requires_dist.unwrap().len(), 2);
        assert_eq!(release.info.requires_python.as_deref(), Some(">=3.7"));
    }

    #[test]
    fn parse_project() {
        let response = r#"{"info": {}, "releases": {"1.0": [], "2.0rc1": [{}]}}"#;
        let project: ProjectJson = serde_json::from_str(response).unwrap();
        assert_eq!(
            project.releases.keys().collect::<Vec<_>>(),
            vec!["1.0", "2.0rc1"]
        );
    }
}
