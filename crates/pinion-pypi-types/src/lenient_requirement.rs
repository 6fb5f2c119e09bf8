use std::str::FromStr;

use pep440_rs::{VersionSpecifiers, VersionSpecifiersParseError};
use serde::{Deserialize, Deserializer, de};
use tracing::warn;

/// Like [`VersionSpecifiers`], but attempts to correct some common errors found in published
/// `Requires-Python` values.
///
/// Wildcards on ordered comparisons are dropped (`>=3.6.*` becomes `>=3.6`), wildcards missing
/// their dot are added (`!=3.0*` becomes `!=3.0.*`), and empty clauses are removed (`>=3.6,`).
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LenientVersionSpecifiers(VersionSpecifiers);

impl FromStr for LenientVersionSpecifiers {
    type Err = VersionSpecifiersParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match VersionSpecifiers::from_str(s) {
            Ok(specifiers) => Ok(Self(specifiers)),
            Err(err) => {
                let patched = patch_specifiers(s);
                if patched != s {
                    if let Ok(specifiers) = VersionSpecifiers::from_str(&patched) {
                        warn!(
                            "Correcting invalid version specifier (before: `{s}`; after: `{patched}`)"
                        );
                        return Ok(Self(specifiers));
                    }
                }
                Err(err)
            }
        }
    }
}

fn patch_specifiers(s: &str) -> String {
    s.split(',')
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
        .map(|clause| {
            let is_ordered = [">=", "<=", ">", "<", "~="]
                .iter()
                .any(|operator| clause.starts_with(operator));
            if is_ordered {
                clause.strip_suffix(".*").unwrap_or(clause).to_string()
            } else if clause.ends_with('*') && !clause.ends_with(".*") {
                format!("{}.*", clause.trim_end_matches('*'))
            } else {
                clause.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<LenientVersionSpecifiers> for VersionSpecifiers {
    fn from(specifiers: LenientVersionSpecifiers) -> Self {
        specifiers.0
    }
}

impl<'de> Deserialize<'de> for LenientVersionSpecifiers {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(de::Error::custom)
    }
}
