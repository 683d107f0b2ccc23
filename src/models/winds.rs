//! Upper winds model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SiteCode;

/// Highest elevation (inclusive) that still belongs to the low band
pub const LOW_BAND_CEILING: f64 = 18_000.0;

/// Readings at one elevation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElevationValues {
    pub elevation: f64,
    /// Readings in upstream order; `None` where upstream sent null
    pub values: Vec<Option<f64>>,
}

impl ElevationValues {
    #[must_use]
    pub fn is_low_band(&self) -> bool {
        self.elevation <= LOW_BAND_CEILING
    }
}

/// One forecast issue for a band of elevations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    #[serde(rename = "elevation_values")]
    pub data: Vec<ElevationValues>,
    pub based_on: DateTime<Utc>,
    pub valid: DateTime<Utc>,
    pub for_use_start: DateTime<Utc>,
    pub for_use_end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirportWinds {
    pub site: SiteCode,
    #[serde(rename = "low_winds")]
    pub low: Vec<Wind>,
    #[serde(rename = "high_winds")]
    pub high: Vec<Wind>,
}

impl AirportWinds {
    #[must_use]
    pub fn new(site: SiteCode) -> Self {
        Self {
            site,
            low: Vec::new(),
            high: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundary_is_inclusive() {
        let at_ceiling = ElevationValues {
            elevation: 18_000.0,
            values: vec![],
        };
        let above = ElevationValues {
            elevation: 18_001.0,
            values: vec![],
        };
        assert!(at_ceiling.is_low_band());
        assert!(!above.is_low_band());
    }
}
