use std::fmt::{Display, Formatter};
use std::num::ParseIntError;
use std::str::FromStr;
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum BuildTagError {
    #[error("must not be empty")]
    Empty,
    #[error("must start with a digit")]
    NoLeadingDigit,
    #[error(transparent)]
    ParseInt(#[from] ParseIntError),
}

/// The optional build tag for a wheel.
///
/// Acts as a tie-breaker between wheels that are otherwise identical. Sorts by the leading
/// digits as an integer, then by the remainder as a string.
///
/// See: <https://packaging.python.org/en/latest/specifications/binary-distribution-format/#file-name-convention>
#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct BuildTag(u64, Option<Arc<str>>);

impl FromStr for BuildTag {
    type Err = BuildTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(BuildTagError::Empty);
        }

        let (prefix, suffix) = match s.find(|c: char| !c.is_ascii_digit()) {
            // Ex) `abc`
            Some(0) => return Err(BuildTagError::NoLeadingDigit),
            // Ex) `123abc`
            Some(split) => {
                let (prefix, suffix) = s.split_at(split);
                (prefix, Some(suffix))
            }
            // Ex) `123`
            None => (s, None),
        };

        Ok(Self(prefix.parse::<u64>()?, suffix.map(Arc::from)))
    }
}

impl Display for BuildTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.1 {
            Some(suffix) => write!(f, "{}{}", self.0, suffix),
            None => write!(f, "{}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::BuildTag;

    #[test]
    fn ordering() {
        let one = BuildTag::from_str("1").unwrap();
        let one_a = BuildTag::from_str("1a").unwrap();
        let ten = BuildTag::from_str("10").unwrap();
        assert!(one < one_a);
        assert!(one_a < ten);
    }

    #[test]
    fn invalid() {
        assert!(BuildTag::from_str("").is_err());
        assert!(BuildTag::from_str("a1").is_err());
    }
}
