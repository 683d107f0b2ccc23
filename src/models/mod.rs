//! Data models for the aviation weather aggregator
//!
//! This module contains the canonical per-site structures organized by product:
//! - Site: 4-character site codes
//! - Report: METAR/TAF text lines per site
//! - Gfa: graphical area forecast image metadata
//! - Winds: upper winds partitioned into low and high elevation bands

pub mod gfa;
pub mod report;
pub mod site;
pub mod winds;

// Re-export all public types for convenient access
pub use gfa::{Gfa, GfaMetadata};
pub use report::WeatherReport;
pub use site::SiteCode;
pub use winds::{AirportWinds, ElevationValues, LOW_BAND_CEILING, Wind};
