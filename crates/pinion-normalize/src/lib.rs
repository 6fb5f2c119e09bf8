use std::error::Error;
use std::fmt::{Display, Formatter};

pub use extra_name::ExtraName;
pub use package_name::PackageName;

mod extra_name;
mod package_name;

/// Validate and normalize a package or extra name.
///
/// Lowercases ASCII letters and collapses every run of `-`, `_` and `.` into a single `-`.
/// Names must start and end with a letter or digit.
pub(crate) fn validate_and_normalize(name: &str) -> Result<String, InvalidNameError> {
    let mut normalized = String::with_capacity(name.len());
    let mut previous: Option<u8> = None;

    for byte in name.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' => {
                if matches!(previous, Some(b'-' | b'_' | b'.')) {
                    normalized.push('-');
                }
                normalized.push(byte.to_ascii_lowercase() as char);
            }
            b'-' | b'_' | b'.' if previous.is_some() => {}
            _ => return Err(InvalidNameError(name.to_string())),
        }
        previous = Some(byte);
    }

    match previous {
        None | Some(b'-' | b'_' | b'.') => Err(InvalidNameError(name.to_string())),
        Some(_) => Ok(normalized),
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InvalidNameError(String);

impl Display for InvalidNameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Not a valid package or extra name: \"{}\". Names must start and end with a letter or \
            digit and may only contain -, _, ., and alphanumeric characters",
            self.0
        )
    }
}

impl Error for InvalidNameError {}
