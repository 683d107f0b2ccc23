//! Points North METAR pages (`<SITE>_metar.html`)

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{instrument, warn};

use super::SingleFetch;
use crate::AvwxError;
use crate::http::HttpClient;
use crate::models::{SiteCode, WeatherReport};

pub const POINTS_NORTH_BASE_URL: &str = "https://www.pointsnorthgroup.ca/weather";

static REPORT_CELL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<TD COLSPAN="3">(.*?)</TD>"#).expect("report cell pattern is valid")
});

#[derive(Debug, Clone)]
pub struct PointsNorthClient {
    http: HttpClient,
    base_url: String,
}

impl PointsNorthClient {
    #[must_use]
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn page_url(&self, site: &SiteCode) -> String {
        format!("{}/{site}_metar.html", self.base_url.trim_end_matches('/'))
    }
}

/// Collect every report cell of a Points North page
pub fn parse_points_north_page(html: &str, site: SiteCode) -> crate::Result<WeatherReport> {
    let lines: Vec<String> = REPORT_CELL
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .collect();

    if lines.is_empty() {
        warn!(%site, "No report cells found on Points North page");
        return Err(AvwxError::validation(format!(
            "no METAR found on Points North page for {site}"
        )));
    }

    let mut report = WeatherReport::new(site);
    report.metar = lines;
    Ok(report)
}

#[async_trait]
impl SingleFetch for PointsNorthClient {
    #[instrument(skip(self))]
    async fn fetch_single(&self, site: &SiteCode) -> crate::Result<WeatherReport> {
        let body = self.http.get_text(&self.page_url(site)).await?;
        parse_points_north_page(&body, site.clone())
    }
}
