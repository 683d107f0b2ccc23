//! METAR/TAF report model

use serde::{Deserialize, Serialize};

use super::SiteCode;

/// Observations and forecasts for one site, in upstream arrival order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    /// Site these lines belong to
    pub site: SiteCode,
    /// METAR/SPECI lines, never re-sorted
    pub metar: Vec<String>,
    /// TAF lines, never re-sorted
    pub taf: Vec<String>,
    /// Webcam image URLs, when the provider publishes any
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cams: Vec<String>,
}

impl WeatherReport {
    #[must_use]
    pub fn new(site: SiteCode) -> Self {
        Self {
            site,
            metar: Vec::new(),
            taf: Vec::new(),
            cams: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metar.is_empty() && self.taf.is_empty() && self.cams.is_empty()
    }
}
