//! Release versions of the database binary.

use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A released binary version, e.g. `v24.2.12`.
///
/// Ordering is lexicographic over `(major, minor, patch)`, which matches
/// release order for every version the planner deals with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    major: u32,
    minor: u32,
    patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn patch(&self) -> u32 {
        self.patch
    }

    /// Returns `true` if this version is the same as or newer than `other`.
    pub fn at_least(&self, other: &Version) -> bool {
        self >= other
    }

    /// The `(major, minor)` release series, e.g. `(24, 2)` for `v24.2.12`.
    ///
    /// This is the value `cluster.preserve_downgrade_option` is pinned to.
    pub fn release_series(&self) -> (u32, u32) {
        (self.major, self.minor)
    }

    /// Renders the release series as `MAJOR.MINOR`.
    pub fn series_string(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('v').unwrap_or(trimmed);

        let mut parts = digits.split('.');
        let mut component = |name: &'static str| -> Result<u32, VersionParseError> {
            let raw = parts.next().ok_or_else(|| VersionParseError::MissingComponent {
                input: s.to_string(),
                component: name,
            })?;
            raw.parse::<u32>()
                .map_err(|_| VersionParseError::InvalidComponent {
                    input: s.to_string(),
                    component: name,
                })
        };

        let major = component("major")?;
        let minor = component("minor")?;
        let patch = component("patch")?;

        if parts.next().is_some() {
            return Err(VersionParseError::TrailingInput(s.to_string()));
        }

        Ok(Self::new(major, minor, patch))
    }
}

impl TryFrom<String> for Version {
    type Error = VersionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

/// Errors produced while parsing a [`Version`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionParseError {
    /// A `major`, `minor` or `patch` component is absent.
    #[error("version {input:?} is missing its {component} component")]
    MissingComponent {
        input: String,
        component: &'static str,
    },

    /// A component is not a non-negative integer.
    #[error("version {input:?} has an invalid {component} component")]
    InvalidComponent {
        input: String,
        component: &'static str,
    },

    /// More than three dot-separated components.
    #[error("version {0:?} has trailing components")]
    TrailingInput(String),
}
