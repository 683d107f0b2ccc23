//! Envelope returned by every NAV CANADA alpha endpoint
//!
//! Each record's `text` holds a second JSON document whose shape depends on
//! the product that was queried.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub struct AlphaResponse {
    #[serde(default)]
    pub meta: Meta,
    #[serde(default)]
    pub data: Vec<AlphaRecord>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Meta {
    pub now: Option<String>,
    #[serde(default)]
    pub count: Count,
    #[serde(default)]
    pub messages: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Count {
    #[serde(default)]
    pub metar: u32,
    #[serde(default)]
    pub taf: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlphaRecord {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub pk: Option<Value>,
    /// Site code for METAR/TAF/winds, product path for GFA
    #[serde(default)]
    pub location: String,
    #[serde(rename = "startValidity", default)]
    pub start_validity: Option<String>,
    #[serde(rename = "endValidity", default)]
    pub end_validity: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "hasError", default)]
    pub has_error: bool,
    /// A single position or a list of them, depending on how many sites were asked for
    #[serde(default)]
    pub position: Value,
}

impl AlphaResponse {
    pub fn from_json(body: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(body)?)
    }
}
