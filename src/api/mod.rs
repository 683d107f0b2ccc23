use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    AvwxError, ErrorKind,
    coordinator::{self, FetchOutcome},
    models::{AirportWinds, Gfa, SiteCode},
};

pub mod state;

pub use state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SitesQuery {
    /// Comma separated site codes
    pub sites: Option<String>,
}

impl SitesQuery {
    fn resolve(&self, state: &AppState) -> crate::Result<Vec<SiteCode>> {
        match self.sites.as_deref().map(str::trim) {
            Some(list) if !list.is_empty() => SiteCode::parse_list(list),
            _ => Ok(state.default_sites.to_vec()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: ErrorKind,
}

/// Error returned from handlers, rendered as JSON with a matching status
#[derive(Debug)]
pub struct ApiError(AvwxError);

impl From<AvwxError> for ApiError {
    fn from(err: AvwxError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_GATEWAY,
        };
        let body = ErrorBody {
            error: self.0.user_message(),
            kind: self.0.kind(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/metar", get(get_metar))
        .route("/gfa", get(get_gfa))
        .route("/winds", get(get_winds))
        .route("/health", get(get_health))
        .with_state(state)
}

async fn get_metar(
    State(state): State<AppState>,
    Query(query): Query<SitesQuery>,
) -> Result<Json<FetchOutcome>, ApiError> {
    let sites = query.resolve(&state)?;
    let outcome = coordinator::fetch_reports(&state.registry, &sites, &state.fetch_options()).await;
    Ok(Json(outcome))
}

async fn get_gfa(State(state): State<AppState>) -> Result<Json<Gfa>, ApiError> {
    let gfa = state.nav_canada.gfa(&state.gfa_site).await.map_err(|e| {
        warn!("GFA request failed: {e}");
        e
    })?;
    Ok(Json(gfa))
}

async fn get_winds(
    State(state): State<AppState>,
    Query(query): Query<SitesQuery>,
) -> Result<Json<Vec<AirportWinds>>, ApiError> {
    let sites = query.resolve(&state)?;
    let winds = state.nav_canada.winds(&sites).await.map_err(|e| {
        warn!("Winds request failed: {e}");
        e
    })?;
    Ok(Json(winds))
}

async fn get_health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: crate::VERSION,
    })
}
