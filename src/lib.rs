//! `avwx-hub` - aviation weather aggregation
//!
//! Collects METAR/TAF reports, graphical area forecast metadata and upper
//! winds from several upstream providers and serves them as one JSON API.

pub mod api;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod http;
pub mod logging;
pub mod models;
pub mod providers;
pub mod web;

// Re-export core types for public API
pub use config::AvwxConfig;
pub use coordinator::{FetchOptions, FetchOutcome, SiteFailure, fetch_reports};
pub use error::{AvwxError, ErrorKind};
pub use models::{AirportWinds, Gfa, GfaMetadata, SiteCode, WeatherReport};
pub use providers::{Capability, Provider, ProviderRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, AvwxError>;
