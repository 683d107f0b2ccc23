//! Query construction for the NAV CANADA alpha API
//!
//! An [`AlphaQuery`] is a plain value; [`AlphaQuery::to_query_string`] is a
//! pure function of it, so the same query always renders the same bytes.

use std::collections::BTreeMap;
use std::fmt;

use crate::models::SiteCode;

/// Data categories understood by the alpha endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alpha {
    Airmet,
    Sigmet,
    Metar,
    Taf,
    Upperwind,
}

impl Alpha {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Alpha::Airmet => "airmet",
            Alpha::Sigmet => "sigmet",
            Alpha::Metar => "metar",
            Alpha::Taf => "taf",
            Alpha::Upperwind => "upperwind",
        }
    }

    /// Match an upstream `type` tag; unknown tags give `None`
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "airmet" => Some(Alpha::Airmet),
            "sigmet" => Some(Alpha::Sigmet),
            "metar" => Some(Alpha::Metar),
            "taf" => Some(Alpha::Taf),
            "upperwind" => Some(Alpha::Upperwind),
            _ => None,
        }
    }
}

impl fmt::Display for Alpha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image products served by the alpha endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageType {
    GfaClouds,
    GfaTurbulence,
}

impl ImageType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ImageType::GfaClouds => "GFA/CLDWX",
            ImageType::GfaTurbulence => "GFA/TURBC",
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything that goes into one alpha API request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlphaQuery {
    pub sites: Vec<SiteCode>,
    /// Record-count selector; 0 lets upstream choose
    pub metar_choice: u32,
    pub alpha: Vec<Alpha>,
    pub images: Vec<ImageType>,
    /// Extra parameters, emitted sorted by key
    pub extra: BTreeMap<String, String>,
    pub radius: u32,
}

impl AlphaQuery {
    /// Render the query string (without the leading `?`)
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut params: Vec<String> = Vec::with_capacity(
            self.sites.len() + self.alpha.len() + self.images.len() + self.extra.len() + 2,
        );

        params.extend(
            self.sites
                .iter()
                .map(|site| format!("site={}", site.as_str().to_ascii_uppercase())),
        );
        params.push(format!("metar_choice={}", self.metar_choice));
        params.extend(self.alpha.iter().map(|alpha| format!("alpha={alpha}")));
        params.extend(self.images.iter().map(|image| format!("image={image}")));
        params.extend(self.extra.iter().map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        }));
        params.push(format!("radius={}", self.radius));

        params.join("&")
    }

    /// Full request URL against `base_url`
    #[must_use]
    pub fn url(&self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('?');
        format!("{base}?{}", self.to_query_string())
    }
}
