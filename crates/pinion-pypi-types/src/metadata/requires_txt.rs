use std::str::FromStr;

use tracing::debug;

use crate::Requirement;
use crate::requirement::normalize_marker;

/// A `requires.txt` file, as written into an `.egg-info` directory by setuptools.
///
/// Lines before the first header are unconditional. A header such as `[socks]`,
/// `[:sys_platform == "win32"]` or `[socks:python_version < "3"]` applies its extra and marker
/// to every line until the next header.
///
/// See: <https://setuptools.pypa.io/en/latest/deprecated/python_eggs.html#dependency-metadata>
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiresTxt {
    pub sections: Vec<RequiresTxtSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiresTxtSection {
    pub extra: Option<String>,
    pub marker: Option<String>,
    pub lines: Vec<String>,
}

impl RequiresTxt {
    pub fn parse(content: &str) -> Self {
        let mut sections = vec![RequiresTxtSection::default()];

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(header) = line.strip_prefix('[').and_then(|line| line.strip_suffix(']')) {
                let (extra, marker) = match header.split_once(':') {
                    Some((extra, marker)) => (extra.trim(), marker.trim()),
                    None => (header.trim(), ""),
                };
                sections.push(RequiresTxtSection {
                    extra: (!extra.is_empty()).then(|| extra.to_string()),
                    marker: (!marker.is_empty()).then(|| marker.to_string()),
                    lines: Vec::new(),
                });
                continue;
            }

            if let Some(section) = sections.last_mut() {
                section.lines.push(line.to_string());
            }
        }

        sections.retain(|section| !section.lines.is_empty());
        Self { sections }
    }

    /// The requirements that apply regardless of which extras are requested, each carrying the
    /// marker of its section.
    ///
    /// Sections that belong to an extra are skipped. A malformed line, or a section with a
    /// malformed marker, is skipped on its own without affecting the rest of the file.
    pub fn unconditional_requirements(&self) -> Vec<Requirement> {
        let mut requirements = Vec::new();
        for section in &self.sections {
            if section.extra.is_some() {
                continue;
            }

            let marker = match section.marker.as_deref().map(normalize_marker).transpose() {
                Ok(marker) => marker.flatten(),
                Err(err) => {
                    debug!("Skipping `requires.txt` section with invalid marker: {err}");
                    continue;
                }
            };

            for line in &section.lines {
                match Requirement::from_str(line) {
                    Ok(requirement) => requirements.push(match &marker {
                        Some(marker) => requirement.and_marker(marker),
                        None => requirement,
                    }),
                    Err(err) => debug!("Skipping invalid `requires.txt` line `{line}`: {err}"),
                }
            }
        }
        requirements
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRES_TXT: &str = r#"
Werkzeug>=0.14
Jinja2>=2.10

[dev]
pytest>=3
sphinx

[:sys_platform == "win32"]
colorama
not a requirement!

[]
click

[dotenv:sys_platform == "darwin"]
python-dotenv
"#;

    #[test]
    fn sections() {
        let requires_txt = RequiresTxt::parse(REQUIRES_TXT);
        let headers: Vec<_> = requires_txt
            .sections
            .iter()
            .map(|section| (section.extra.as_deref(), section.marker.as_deref()))
            .collect();
        assert_eq!(
            headers,
            vec![
                (None, None),
                (Some("dev"), None),
                (None, Some(r#"sys_platform == "win32""#)),
                (None, None),
                (Some("dotenv"), Some(r#"sys_platform == "darwin""#)),
            ]
        );
    }

    #[test]
    fn unconditional_requirements() {
        let requirements = RequiresTxt::parse(REQUIRES_TXT).unconditional_requirements();
        let names: Vec<_> = requirements
            .iter()
            .map(|requirement| requirement.name.to_string())
            .collect();
        assert_eq!(names, vec!["werkzeug", "jinja2", "colorama", "click"]);

        assert!(requirements[0].marker.is_none());
        assert!(
            requirements[2]
                .marker
                .as_deref()
                .is_some_and(|marker| marker.contains("sys_platform"))
        );
        assert!(requirements[3].marker.is_none());
    }

    #[test]
    fn invalid_marker_skips_section() {
        let requirements =
            RequiresTxt::parse("six\n[:not a marker]\ncolorama\n").unconditional_requirements();
        assert_eq!(requirements.len(), 1);
        assert_eq!(requirements[0].name.as_ref(), "six");
    }
}
