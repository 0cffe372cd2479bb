//! Shared domain value types.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Capability role attached to a caller. Mutations and the hypermedia links
/// pointing at them are gated on `Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    Admin,
}

/// Response-shaping version, ordered so that since-version fields can be
/// compared against the version a request resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion {
    pub major: u16,
    pub minor: u16,
}

impl ApiVersion {
    pub const V1_0: ApiVersion = ApiVersion { major: 1, minor: 0 };
    pub const V2_0: ApiVersion = ApiVersion { major: 2, minor: 0 };
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self::V1_0
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid api version `{input}`")]
pub struct VersionParseError {
    pub input: String,
}

impl FromStr for ApiVersion {
    type Err = VersionParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || VersionParseError {
            input: input.to_string(),
        };
        let (major, minor) = input.trim().split_once('.').ok_or_else(invalid)?;
        let major = major.parse::<u16>().map_err(|_| invalid())?;
        let minor = minor.parse::<u16>().map_err(|_| invalid())?;
        Ok(Self { major, minor })
    }
}
