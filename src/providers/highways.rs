//! Highway weather station pages
//!
//! Each site has an HTML page with its recent METAR/SPECI/LWIS lines in bold
//! and a few webcam images.

use std::collections::BTreeMap;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::{info, instrument};

use super::SingleFetch;
use crate::AvwxError;
use crate::http::HttpClient;
use crate::models::{SiteCode, WeatherReport};

pub const HIGHWAYS_BASE_URL: &str = "http://highways.glmobile.com";

/// Site code to page name on the highways server
pub const HIGHWAYS_PAGES: &[(&str, &str)] = &[
    ("CYBE", "uranium"),
    ("CZFD", "fonddulac"),
    ("CYSF", "stonyrapids"),
    ("CZWL", "wollaston"),
    ("CJL4", "laloche"),
    ("CYVT", "buffalonarrows"),
    ("CKB2", "patuanak"),
    ("CJF3", "ilealacrosse"),
    ("CZPO", "pinehouse"),
    ("CJY4", "sandybay"),
    ("CJW4", "pelican"),
    ("CJT4", "cumberlandhouse"),
    ("CYLJ", "meadowlake"),
    ("CYHB", "hudsonbay"),
];

const REPORT_MARKERS: [&str; 3] = ["METAR", "SPECI", "LWIS"];

#[derive(Debug, Clone)]
pub struct HighwaysClient {
    http: HttpClient,
    base_url: String,
    pages: BTreeMap<SiteCode, String>,
}

impl HighwaysClient {
    #[must_use]
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        let pages = HIGHWAYS_PAGES
            .iter()
            .filter_map(|(code, page)| SiteCode::new(code).ok().map(|s| (s, (*page).to_string())))
            .collect();
        Self {
            http,
            base_url: base_url.into(),
            pages,
        }
    }

    pub fn supported_sites(&self) -> impl Iterator<Item = SiteCode> + '_ {
        self.pages.keys().cloned()
    }

    fn page_url(&self, site: &SiteCode) -> crate::Result<String> {
        let page = self
            .pages
            .get(site)
            .ok_or_else(|| AvwxError::validation(format!("no highways page for {site}")))?;
        Ok(format!("{}/{page}", self.base_url.trim_end_matches('/')))
    }
}

/// Pull report lines and webcam URLs out of a highways page
pub fn parse_highways_page(html: &str, page_url: &str, site: SiteCode) -> crate::Result<WeatherReport> {
    let document = Html::parse_document(html);
    let bold = selector("b")?;
    let images = selector("img[src]")?;

    let mut report = WeatherReport::new(site);
    report.metar = document
        .select(&bold)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|text| REPORT_MARKERS.iter().any(|marker| text.contains(marker)))
        .collect();
    report.cams = document
        .select(&images)
        .filter_map(|element| element.value().attr("src"))
        .map(|src| format!("{page_url}/{src}"))
        .collect();

    Ok(report)
}

fn selector(css: &str) -> crate::Result<Selector> {
    Selector::parse(css).map_err(|e| AvwxError::decode(format!("invalid CSS selector {css:?}: {e:?}")))
}

#[async_trait]
impl SingleFetch for HighwaysClient {
    #[instrument(skip(self))]
    async fn fetch_single(&self, site: &SiteCode) -> crate::Result<WeatherReport> {
        let url = self.page_url(site)?;
        let body = self.http.get_text(&url).await?;
        let report = parse_highways_page(&body, &url, site.clone())?;
        info!(
            metar = report.metar.len(),
            cams = report.cams.len(),
            "Parsed highways page"
        );
        Ok(report)
    }
}
