//! Site code model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AvwxError;

/// A 4-character airport or location identifier, always stored uppercase
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SiteCode(String);

impl SiteCode {
    /// Number of characters in every site code
    pub const LEN: usize = 4;

    /// Parse a site code, accepting any letter case
    pub fn new(code: &str) -> crate::Result<Self> {
        let trimmed = code.trim();
        if trimmed.chars().count() != Self::LEN {
            return Err(AvwxError::validation(format!(
                "site code '{trimmed}' must be {} characters",
                Self::LEN
            )));
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AvwxError::validation(format!(
                "site code '{trimmed}' must be alphanumeric"
            )));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse a comma separated list such as `cyxe,CYYL, cjy4`
    pub fn parse_list(list: &str) -> crate::Result<Vec<Self>> {
        list.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Self::new)
            .collect()
    }
}

impl FromStr for SiteCode {
    type Err = AvwxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SiteCode {
    type Error = AvwxError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<SiteCode> for String {
    fn from(value: SiteCode) -> Self {
        value.0
    }
}

impl AsRef<str> for SiteCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
