//! Canonical work identifiers
//!
//! Projects and phases are keyed by identifiers of the form `PREFIX-NNN`
//! or `PREFIX-NNN.M` (e.g. `WT-4`, `OF-9.1`). The prefix is an uppercase
//! alphanumeric token starting with a letter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A parsed canonical identifier: `PREFIX-major[.minor]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkId {
    prefix: String,
    major: u32,
    minor: Option<u32>,
}

impl WorkId {
    /// Create an identifier from its parts
    pub fn from_parts(prefix: &str, major: u32, minor: Option<u32>) -> Result<Self, IdParseError> {
        validate_prefix(prefix)?;
        Ok(Self {
            prefix: prefix.to_string(),
            major,
            minor,
        })
    }

    /// The alphabetic prefix (e.g. "WT")
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The major number
    pub fn major(&self) -> u32 {
        self.major
    }

    /// The minor number, if any (`WT-3.1` -> `Some(1)`)
    pub fn minor(&self) -> Option<u32> {
        self.minor
    }

    /// Parse an identifier from a string
    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        s.parse()
    }

    /// Whether a string is in canonical identifier form
    pub fn is_canonical(s: &str) -> bool {
        Self::parse(s).is_ok()
    }
}

impl fmt::Display for WorkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.minor {
            Some(minor) => write!(f, "{}-{}.{}", self.prefix, self.major, minor),
            None => write!(f, "{}-{}", self.prefix, self.major),
        }
    }
}

impl FromStr for WorkId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, number) = s
            .split_once('-')
            .ok_or_else(|| IdParseError::MissingDelimiter(s.to_string()))?;

        validate_prefix(prefix)?;

        let (major_str, minor_str) = match number.split_once('.') {
            Some((major, minor)) => (major, Some(minor)),
            None => (number, None),
        };

        let major = parse_number(major_str, s)?;
        let minor = match minor_str {
            Some(m) => Some(parse_number(m, s)?),
            None => None,
        };

        Ok(Self {
            prefix: prefix.to_string(),
            major,
            minor,
        })
    }
}

impl Serialize for WorkId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for WorkId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn validate_prefix(prefix: &str) -> Result<(), IdParseError> {
    let mut chars = prefix.chars();
    let valid = match chars.next() {
        Some(first) => {
            first.is_ascii_uppercase()
                && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(IdParseError::InvalidPrefix(prefix.to_string()))
    }
}

fn parse_number(part: &str, full: &str) -> Result<u32, IdParseError> {
    if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
        return Err(IdParseError::InvalidNumber(full.to_string()));
    }
    part.parse()
        .map_err(|_| IdParseError::InvalidNumber(full.to_string()))
}

/// Allocate the next sequential identifier within a prefix scope.
///
/// Pure function of the ids currently in scope: the result is
/// `PREFIX-(max major + 1)`, or `PREFIX-1` when no id with that prefix
/// exists. Non-canonical ids in the input are ignored.
///
/// Reconciliation itself never mints ids (backfill reuses extracted
/// identifiers); this is for collaborator stores that create records
/// of their own and want the same numbering discipline.
pub fn next_in_scope<'a>(
    prefix: &str,
    existing: impl IntoIterator<Item = &'a str>,
) -> Result<WorkId, IdParseError> {
    validate_prefix(prefix)?;
    let max_major = existing
        .into_iter()
        .filter_map(|id| WorkId::parse(id).ok())
        .filter(|id| id.prefix() == prefix)
        .map(|id| id.major())
        .max()
        .unwrap_or(0);
    WorkId::from_parts(prefix, max_major + 1, None)
}

/// Errors that can occur when parsing work identifiers
#[derive(Debug, Error)]
pub enum IdParseError {
    #[error("invalid identifier prefix: '{0}' (expected uppercase letters/digits starting with a letter)")]
    InvalidPrefix(String),

    #[error("missing '-' delimiter in identifier: '{0}'")]
    MissingDelimiter(String),

    #[error("invalid number component in identifier: '{0}'")]
    InvalidNumber(String),
}
