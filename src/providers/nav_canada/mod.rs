//! NAV CANADA alpha API
//!
//! One endpoint serves METAR/TAF, GFA image metadata and upper winds for many
//! sites at once, so this is the batch provider.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use super::BatchFetch;
use crate::http::HttpClient;
use crate::models::{AirportWinds, Gfa, SiteCode, WeatherReport};

pub mod gfa;
pub mod metar;
pub mod query;
pub mod response;
pub mod winds;

pub use gfa::GfaLocations;
pub use query::{Alpha, AlphaQuery, ImageType};
pub use response::{AlphaRecord, AlphaResponse};

pub const NAV_CANADA_BASE_URL: &str = "https://plan.navcanada.ca/weather/api/alpha/";

/// Number of most recent METARs requested per site
pub const METAR_CHOICE: u32 = 3;

pub const DEFAULT_GFA_REGION: &str = "GFACN32";

/// Sites served through the alpha API
pub const NAV_CANADA_SITES: &[&str] = &[
    "CYXE", "CYVT", "CYLJ", "CYSF", "CYVC", "CYKJ", "CYPA", "CYFO", "CYQW", "CYQR", "CYMM",
    "CYSM", "CYPY", "CYQD", "CYLL", "CYYN", "CYXH", "CYTH", "CYQV", "CYOD", "CYYL",
];

#[must_use]
pub fn supported_sites() -> Vec<SiteCode> {
    super::site_list(NAV_CANADA_SITES)
}

#[derive(Debug, Clone)]
pub struct NavCanadaClient {
    http: HttpClient,
    base_url: String,
    gfa_locations: GfaLocations,
}

impl NavCanadaClient {
    #[must_use]
    pub fn new(http: HttpClient, base_url: impl Into<String>, gfa_region: &str) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            gfa_locations: GfaLocations::for_region(gfa_region),
        }
    }

    async fn query(&self, query: &AlphaQuery) -> crate::Result<AlphaResponse> {
        let url = query.url(&self.base_url);
        self.http.get_json(&url).await
    }

    /// METAR and TAF lines for `sites`: one report per site, in the order the
    /// sites were asked for, empty where upstream had nothing
    #[instrument(skip(self, sites), fields(site_count = sites.len()))]
    pub async fn weather_reports(&self, sites: &[SiteCode]) -> crate::Result<Vec<WeatherReport>> {
        let query = AlphaQuery {
            sites: sites.to_vec(),
            metar_choice: METAR_CHOICE,
            alpha: vec![Alpha::Metar, Alpha::Taf],
            ..Default::default()
        };
        let response = self.query(&query).await?;
        debug!(
            metar = response.meta.count.metar,
            taf = response.meta.count.taf,
            records = response.data.len(),
            "Alpha response"
        );

        let merged = metar::merge_reports(&response.data);
        info!("Received reports for {} of {} sites", merged.len(), sites.len());
        Ok(metar::reports_for_request(merged, sites))
    }

    /// GFA image metadata anchored on `site`
    #[instrument(skip(self))]
    pub async fn gfa(&self, site: &SiteCode) -> crate::Result<Gfa> {
        let query = AlphaQuery {
            sites: vec![site.clone()],
            images: vec![ImageType::GfaTurbulence, ImageType::GfaClouds],
            ..Default::default()
        };
        let response = self.query(&query).await?;
        gfa::process_gfa_response(&response.data, &self.gfa_locations)
    }

    /// Upper winds for `sites`
    #[instrument(skip(self, sites), fields(site_count = sites.len()))]
    pub async fn winds(&self, sites: &[SiteCode]) -> crate::Result<Vec<AirportWinds>> {
        let query = AlphaQuery {
            sites: sites.to_vec(),
            alpha: vec![Alpha::Upperwind],
            extra: BTreeMap::from([("upperwind_choice".to_string(), "both".to_string())]),
            ..Default::default()
        };
        let response = self.query(&query).await?;
        Ok(winds::process_winds_response(&response.data))
    }
}

#[async_trait]
impl BatchFetch for NavCanadaClient {
    async fn fetch_batch(&self, sites: &[SiteCode]) -> crate::Result<Vec<WeatherReport>> {
        self.weather_reports(sites).await
    }
}
