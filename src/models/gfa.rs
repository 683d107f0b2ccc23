//! Graphical area forecast (GFA) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The minimal information needed to display and select one GFA image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GfaMetadata {
    pub start_validity: DateTime<Utc>,
    pub end_validity: DateTime<Utc>,
    /// Image id used to build the image URL
    pub id: String,
}

/// GFA images split by forecast category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gfa {
    pub clouds_weather: Vec<GfaMetadata>,
    pub icing_turbulence_freezing: Vec<GfaMetadata>,
}
