//! Shared application state for the HTTP API

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::{AvwxConfig, CoordinatorConfig};
use crate::coordinator::FetchOptions;
use crate::http::HttpClient;
use crate::models::SiteCode;
use crate::providers::{
    HighwaysClient, NavCanadaClient, PointsNorthClient, Provider, ProviderRegistry, nav_canada,
};

#[derive(Debug, Clone)]
pub struct AppState {
    /// Providers in claim priority order
    pub registry: Arc<ProviderRegistry>,
    /// Serves GFA and upper winds directly
    pub nav_canada: Arc<NavCanadaClient>,
    pub coordinator: CoordinatorConfig,
    pub default_sites: Arc<[SiteCode]>,
    pub gfa_site: SiteCode,
}

impl AppState {
    /// Build the providers and registry described by `config`
    pub fn from_config(config: &AvwxConfig) -> Result<Self> {
        let http = HttpClient::new(&config.upstream).context("Failed to build HTTP client")?;
        let upstream = &config.upstream;

        let nav_canada = Arc::new(NavCanadaClient::new(
            http.clone(),
            upstream.nav_canada_base_url.clone(),
            &config.providers.gfa_region,
        ));
        let highways = Arc::new(HighwaysClient::new(
            http.clone(),
            upstream.highways_base_url.clone(),
        ));
        let highways_sites: Vec<SiteCode> = highways.supported_sites().collect();
        let points_north = Arc::new(PointsNorthClient::new(
            http,
            upstream.points_north_base_url.clone(),
        ));

        let registry = ProviderRegistry::new(vec![
            Provider::batch(
                "nav_canada",
                nav_canada::supported_sites(),
                nav_canada.clone(),
            ),
            Provider::single("highways", highways_sites, highways),
            Provider::single("points_north", config.points_north_sites()?, points_north),
        ]);

        Ok(Self {
            registry: Arc::new(registry),
            nav_canada,
            coordinator: config.coordinator.clone(),
            default_sites: config.default_sites()?.into(),
            gfa_site: config.gfa_site()?,
        })
    }

    /// Fresh options for one request, with its own cancellation token
    #[must_use]
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions::from_config(&self.coordinator)
    }
}
