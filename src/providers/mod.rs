//! Upstream weather providers
//!
//! Every provider is described by a [`Provider`]: a name, the sites it can
//! serve, and exactly one [`Capability`]. The [`ProviderRegistry`] keeps them
//! in registration order, which is also claim priority.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::models::{SiteCode, WeatherReport};

pub mod highways;
pub mod nav_canada;
pub mod points_north;

pub use highways::HighwaysClient;
pub use nav_canada::NavCanadaClient;
pub use points_north::PointsNorthClient;

/// Fetches reports for many sites in one upstream call
#[async_trait]
pub trait BatchFetch: Send + Sync {
    async fn fetch_batch(&self, sites: &[SiteCode]) -> crate::Result<Vec<WeatherReport>>;
}

/// Fetches the report for one site per upstream call
#[async_trait]
pub trait SingleFetch: Send + Sync {
    async fn fetch_single(&self, site: &SiteCode) -> crate::Result<WeatherReport>;
}

#[derive(Clone)]
pub enum Capability {
    Batch(Arc<dyn BatchFetch>),
    Single(Arc<dyn SingleFetch>),
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Batch(_) => f.write_str("Batch"),
            Capability::Single(_) => f.write_str("Single"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Provider {
    name: String,
    supported_sites: BTreeSet<SiteCode>,
    capability: Capability,
}

impl Provider {
    pub fn batch<I>(name: impl Into<String>, sites: I, fetcher: Arc<dyn BatchFetch>) -> Self
    where
        I: IntoIterator<Item = SiteCode>,
    {
        Self {
            name: name.into(),
            supported_sites: sites.into_iter().collect(),
            capability: Capability::Batch(fetcher),
        }
    }

    pub fn single<I>(name: impl Into<String>, sites: I, fetcher: Arc<dyn SingleFetch>) -> Self
    where
        I: IntoIterator<Item = SiteCode>,
    {
        Self {
            name: name.into(),
            supported_sites: sites.into_iter().collect(),
            capability: Capability::Single(fetcher),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn supported_sites(&self) -> &BTreeSet<SiteCode> {
        &self.supported_sites
    }

    #[must_use]
    pub fn supports(&self, site: &SiteCode) -> bool {
        self.supported_sites.contains(site)
    }

    #[must_use]
    pub fn capability(&self) -> &Capability {
        &self.capability
    }

    #[must_use]
    pub fn is_batch(&self) -> bool {
        matches!(self.capability, Capability::Batch(_))
    }
}

/// Ordered, immutable list of providers
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Provider>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new(providers: Vec<Provider>) -> Self {
        Self { providers }
    }

    #[must_use]
    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    pub fn iter(&self) -> impl Iterator<Item = &Provider> {
        self.providers.iter()
    }

    /// Index of the first provider, in registration order, that supports `site`
    #[must_use]
    pub fn claimant(&self, site: &SiteCode) -> Option<usize> {
        self.providers.iter().position(|p| p.supports(site))
    }

    /// Every site any provider can serve
    #[must_use]
    pub fn all_sites(&self) -> BTreeSet<SiteCode> {
        self.providers
            .iter()
            .flat_map(|p| p.supported_sites().iter().cloned())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Parse a static site list; entries that are not valid site codes are dropped
pub(crate) fn site_list(codes: &[&str]) -> Vec<SiteCode> {
    codes
        .iter()
        .filter_map(|code| SiteCode::new(code).ok())
        .collect()
}
