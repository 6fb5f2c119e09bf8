use pep440_rs::{Operator, Version, VersionSpecifiers};

/// Filter `versions` down to those matching `specifiers`, honoring a pre-release policy.
///
/// * `Some(true)` includes pre-releases, `Some(false)` excludes them.
/// * `None` follows the specifiers: pre-releases are allowed if any inclusive specifier names a
///   pre-release (e.g. `>=2.0b1`), and otherwise used only when no final release matches.
///
/// The relative order of `versions` is preserved.
pub fn matching_versions<'a>(
    specifiers: &VersionSpecifiers,
    versions: impl IntoIterator<Item = &'a Version>,
    prereleases: Option<bool>,
) -> Vec<&'a Version> {
    let allow_prereleases = prereleases.unwrap_or_else(|| {
        specifiers.iter().any(|specifier| {
            !matches!(
                specifier.operator(),
                Operator::NotEqual | Operator::NotEqualStar
            ) && specifier.version().any_prerelease()
        })
    });

    let matching: Vec<&Version> = versions
        .into_iter()
        .filter(|version| specifiers.contains(version))
        .collect();
    if allow_prereleases {
        return matching;
    }

    let finals: Vec<&Version> = matching
        .iter()
        .copied()
        .filter(|version| !version.any_prerelease())
        .collect();
    if finals.is_empty() && prereleases.is_none() {
        matching
    } else {
        finals
    }
}
