//! Decoder for the GFA (graphical area forecast) `text` payload

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

use super::response::AlphaRecord;
use crate::AvwxError;
use crate::models::{Gfa, GfaMetadata};

/// Timestamp layout of frame validity times
pub const GFA_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Nested document carried in a GFA record's `text`
#[derive(Debug, Deserialize)]
pub struct GfaText {
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub sub_product: String,
    #[serde(default)]
    pub geography: String,
    #[serde(default)]
    pub sub_geography: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub frame_lists: Vec<FrameList>,
}

#[derive(Debug, Deserialize)]
pub struct FrameList {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub sv: String,
    #[serde(default)]
    pub ev: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub frames: Vec<Frame>,
}

#[derive(Debug, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub id: i64,
    /// Only parsed when the frame emits a record
    #[serde(rename = "sv", default)]
    pub start_validity: String,
    #[serde(rename = "ev", default)]
    pub end_validity: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
pub struct Image {
    pub id: i64,
    #[serde(default)]
    pub created: String,
}

/// Location discriminators that route GFA records to a category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GfaLocations {
    pub clouds_weather: String,
    pub icing_turbulence_freezing: String,
}

impl GfaLocations {
    /// Discriminators for a GFA region such as `GFACN32`
    #[must_use]
    pub fn for_region(region: &str) -> Self {
        Self {
            clouds_weather: format!("GFA/CLDWX/{region}/"),
            icing_turbulence_freezing: format!("GFA/TURBC/{region}/"),
        }
    }
}

/// Treat an explicit `null` list like a missing one
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn parse_validity(raw: &str) -> crate::Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, GFA_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| AvwxError::decode(format!("invalid GFA validity '{raw}': {e}")))
}

/// Extract one [`GfaMetadata`] per frame of the last frame list.
///
/// Earlier frame lists are ignored. Frames without images are skipped; the
/// last image of a frame represents it.
pub fn extract_gfa_metadata(text: &str) -> crate::Result<Vec<GfaMetadata>> {
    let gfa_text: GfaText = serde_json::from_str(text)?;

    let last = gfa_text
        .frame_lists
        .last()
        .ok_or_else(|| AvwxError::decode("GFA payload has no frame lists"))?;

    last.frames
        .iter()
        .filter_map(|frame| frame.images.last().map(|image| (frame, image)))
        .map(|(frame, image)| -> crate::Result<GfaMetadata> {
            Ok(GfaMetadata {
                start_validity: parse_validity(&frame.start_validity)?,
                end_validity: parse_validity(&frame.end_validity)?,
                id: image.id.to_string(),
            })
        })
        .collect()
}

/// Decode every GFA record and route it by its location.
///
/// Any failure, including a location that matches neither category, fails the
/// whole decode.
pub fn process_gfa_response<'a, I>(records: I, locations: &GfaLocations) -> crate::Result<Gfa>
where
    I: IntoIterator<Item = &'a AlphaRecord>,
{
    let mut gfa = Gfa::default();

    for record in records {
        let metadata = extract_gfa_metadata(&record.text)?;

        if record.location == locations.clouds_weather {
            gfa.clouds_weather.extend(metadata);
        } else if record.location == locations.icing_turbulence_freezing {
            gfa.icing_turbulence_freezing.extend(metadata);
        } else {
            return Err(AvwxError::decode(format!(
                "unknown GFA location: {}",
                record.location
            )));
        }
    }

    Ok(gfa)
}
