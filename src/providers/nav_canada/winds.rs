//! Decoder for the upper winds `text` payload
//!
//! The payload is a JSON array with no declared schema, e.g.
//!
//! ```text
//! ["FBCN35","KWNO","2025-06-08T13:57:00+00:00", ...4 more timestamps...,
//!  null,null,null,null,[[45000,330,34,-59,0],[24000,310,51,-24,0]]]
//! ```
//!
//! Elements are classified by shape rather than by position. The five
//! timestamps map to (issued, based on, valid, for use start, for use end);
//! every table row is `[elevation, reading, reading, reading, reading]`.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use super::response::AlphaRecord;
use crate::AvwxError;
use crate::models::{AirportWinds, ElevationValues, SiteCode, Wind};

/// Timestamp layout used inside winds payloads
pub const WINDS_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Upstream always sends null at these positions. Skipped whatever they hold;
/// re-check if the payload layout changes.
pub const PLACEHOLDER_INDICES: RangeInclusive<usize> = 7..=10;

const EXPECTED_TIMESTAMPS: usize = 5;
const EXPECTED_ROW_LEN: usize = 5;

const BASED_ON_INDEX: usize = 1;
const VALID_INDEX: usize = 2;
const FOR_USE_START_INDEX: usize = 3;
const FOR_USE_END_INDEX: usize = 4;

/// Shape of one element of the winds array
#[derive(Debug, Clone, PartialEq)]
pub enum WindsValue {
    Text(String),
    Timestamp(DateTime<Utc>),
    Number(f64),
    /// Rows of numbers; non-numeric entries are kept as `None`
    Table(Vec<Vec<Option<f64>>>),
}

#[must_use]
pub fn is_placeholder_index(index: usize) -> bool {
    PLACEHOLDER_INDICES.contains(&index)
}

/// Classify a single element. Nulls, booleans, objects and arrays that are not
/// arrays of arrays give `None`.
#[must_use]
pub fn classify(value: &Value) -> Option<WindsValue> {
    match value {
        Value::String(s) => Some(
            DateTime::parse_from_str(s, WINDS_TIME_FORMAT)
                .map(|ts| WindsValue::Timestamp(ts.with_timezone(&Utc)))
                .unwrap_or_else(|_| WindsValue::Text(s.clone())),
        ),
        Value::Number(n) => n.as_f64().map(WindsValue::Number),
        Value::Array(items) => items
            .iter()
            .map(|row| {
                row.as_array()
                    .map(|cells| cells.iter().map(Value::as_f64).collect::<Vec<_>>())
            })
            .collect::<Option<Vec<_>>>()
            .map(WindsValue::Table),
        Value::Null | Value::Bool(_) | Value::Object(_) => None,
    }
}

/// The winds array split by element shape, each list in arrival order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindsText {
    pub texts: Vec<String>,
    pub numbers: Vec<f64>,
    pub timestamps: Vec<DateTime<Utc>>,
    /// Rows of every table, flattened
    pub rows: Vec<Vec<Option<f64>>>,
}

/// Winds from one record, split by band. A band with no rows is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindBands {
    pub low: Option<Wind>,
    pub high: Option<Wind>,
}

impl WindsText {
    pub fn parse(text: &str) -> crate::Result<Self> {
        let raw: Value = serde_json::from_str(text)?;
        let Value::Array(elements) = raw else {
            return Err(AvwxError::decode("winds payload is not a JSON array"));
        };

        let mut decoded = WindsText::default();
        for (index, element) in elements.iter().enumerate() {
            if is_placeholder_index(index) {
                continue;
            }
            match classify(element) {
                Some(WindsValue::Text(text)) => decoded.texts.push(text),
                Some(WindsValue::Timestamp(ts)) => decoded.timestamps.push(ts),
                Some(WindsValue::Number(n)) => decoded.numbers.push(n),
                Some(WindsValue::Table(rows)) => decoded.rows.extend(rows),
                None => debug!(index, value = %element, "Unclassified winds element"),
            }
        }

        Ok(decoded)
    }

    /// Turn the decoded payload into low/high band winds.
    ///
    /// Fails with `PartialData` unless exactly five timestamps were found.
    /// Rows of the wrong length or without an elevation are skipped.
    pub fn into_bands(self) -> crate::Result<WindBands> {
        if self.timestamps.len() != EXPECTED_TIMESTAMPS {
            return Err(AvwxError::partial_data(format!(
                "expected {EXPECTED_TIMESTAMPS} timestamps for winds, got {}",
                self.timestamps.len()
            )));
        }

        let mut low = Vec::new();
        let mut high = Vec::new();
        for row in self.rows {
            if row.len() != EXPECTED_ROW_LEN {
                debug!(
                    expected = EXPECTED_ROW_LEN,
                    actual = row.len(),
                    ?row,
                    "Skipping winds row of unexpected length"
                );
                continue;
            }
            let Some(elevation) = row[0] else {
                debug!(?row, "Skipping winds row without elevation");
                continue;
            };

            let values = ElevationValues {
                elevation,
                values: row[1..].to_vec(),
            };
            if values.is_low_band() {
                low.push(values);
            } else {
                high.push(values);
            }
        }

        let ts = &self.timestamps;
        let wind = |data: Vec<ElevationValues>| Wind {
            data,
            based_on: ts[BASED_ON_INDEX],
            valid: ts[VALID_INDEX],
            for_use_start: ts[FOR_USE_START_INDEX],
            for_use_end: ts[FOR_USE_END_INDEX],
        };

        Ok(WindBands {
            low: (!low.is_empty()).then(|| wind(low)),
            high: (!high.is_empty()).then(|| wind(high)),
        })
    }
}

/// Decode every upper winds record, grouped per site in first-seen order.
///
/// Records that fail to decode are logged and skipped; the rest of the batch
/// still counts.
pub fn process_winds_response<'a, I>(records: I) -> Vec<AirportWinds>
where
    I: IntoIterator<Item = &'a AlphaRecord>,
{
    let mut winds: Vec<AirportWinds> = Vec::new();
    let mut index: HashMap<SiteCode, usize> = HashMap::new();

    for record in records {
        let site = match SiteCode::new(&record.location) {
            Ok(site) => site,
            Err(e) => {
                warn!(location = %record.location, "Skipping winds record: {e}");
                continue;
            }
        };

        let slot = *index.entry(site.clone()).or_insert_with(|| {
            winds.push(AirportWinds::new(site.clone()));
            winds.len() - 1
        });

        let bands = match WindsText::parse(&record.text).and_then(WindsText::into_bands) {
            Ok(bands) => bands,
            Err(e) => {
                warn!(%site, "Dropping winds record: {e}");
                continue;
            }
        };

        let entry = &mut winds[slot];
        entry.low.extend(bands.low);
        entry.high.extend(bands.high);
    }

    winds
}
