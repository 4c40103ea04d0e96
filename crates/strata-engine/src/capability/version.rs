use core::fmt;
use core::str::FromStr;

/// Error returned by [`DriverVersion::parse`].
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum VersionParseError {
    #[error("driver version string is empty")]
    Empty,
    #[error("driver version {0:?} does not start with a major version number")]
    MissingMajor(String),
    #[error("driver version {0:?} has no minor version number")]
    MissingMinor(String),
}

/// Numeric prefix of a driver version string.
///
/// Accepted shape: `MAJOR.MINOR[.PATCH][suffix]`. The suffix (vendor name,
/// profile, build id) is ignored, e.g. `"4.6.0 NVIDIA 535.54.03"` or
/// `"3.3 (Core Profile) Mesa 23.2.1"`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DriverVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: Option<u32>,
}

impl DriverVersion {
    #[inline]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            patch: None,
        }
    }

    pub fn parse(raw: &str) -> Result<Self, VersionParseError> {
        let s = raw.trim();
        if s.is_empty() {
            return Err(VersionParseError::Empty);
        }

        let (major, rest) =
            take_number(s).ok_or_else(|| VersionParseError::MissingMajor(s.to_owned()))?;

        let (minor, rest) = rest
            .strip_prefix('.')
            .and_then(take_number)
            .ok_or_else(|| VersionParseError::MissingMinor(s.to_owned()))?;

        let patch = rest
            .strip_prefix('.')
            .and_then(take_number)
            .map(|(patch, _)| patch);

        Ok(Self {
            major,
            minor,
            patch,
        })
    }
}

impl FromStr for DriverVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DriverVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.patch {
            Some(patch) => write!(f, "{}.{}.{}", self.major, self.minor, patch),
            None => write!(f, "{}.{}", self.major, self.minor),
        }
    }
}

/// Splits a leading run of ASCII digits off `s`.
///
/// Returns `None` when `s` does not start with a digit or the number overflows `u32`.
fn take_number(s: &str) -> Option<(u32, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    let n = s[..end].parse().ok()?;
    Some((n, &s[end..]))
}
