//! HTTP API - a thin axum layer over [`crate::core`].
//!
//! Handlers authenticate the caller, check its role, decode the request and
//! delegate to one core function. Errors become `{"error": ...}` bodies via
//! [`error`].

pub mod auth;
pub mod error;

mod catalog;
mod clients;
mod inventory;
mod invoices;
mod orders;
mod reports;
mod session;
mod users;

use crate::{
    config::{server::ServerSettings, settings::AppConfig},
    core::{
        PageRequest,
        credentials::{Argon2Hasher, PasswordHasher, RandomTokenIssuer, TokenIssuer},
        parse_date_bound,
        report::{Document, DocumentRenderer, PlainTextRenderer},
    },
    errors::Result,
};
use auth::{ConfigTokenVerifier, TokenVerifier};
use axum::{
    Router,
    http::{HeaderValue, header},
    middleware,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, TimeDelta, Utc};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub settings: Arc<ServerSettings>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub issuer: Arc<dyn TokenIssuer>,
    pub renderer: Arc<dyn DocumentRenderer>,
}

impl AppState {
    /// State with the config-file token verifier, Argon2 password hashing,
    /// random session tokens and the plain-text renderer.
    #[must_use]
    pub fn new(
        db: impl Into<Arc<DatabaseConnection>>,
        config: AppConfig,
        settings: ServerSettings,
    ) -> Self {
        let verifier = Arc::new(ConfigTokenVerifier::from_tokens(&config.tokens));
        Self {
            db: db.into(),
            config: Arc::new(config),
            settings: Arc::new(settings),
            verifier,
            hasher: Arc::new(Argon2Hasher::default()),
            issuer: Arc::new(RandomTokenIssuer),
            renderer: Arc::new(PlainTextRenderer),
        }
    }

    /// Replaces the password hasher.
    #[must_use]
    pub fn with_hasher(mut self, hasher: impl PasswordHasher + 'static) -> Self {
        self.hasher = Arc::new(hasher);
        self
    }

    /// Lifetime of sessions opened by `POST /login`
    #[must_use]
    pub fn session_ttl(&self) -> TimeDelta {
        TimeDelta::minutes(self.config.auth.session_minutes)
    }
}

/// `?page&limit&search` query of paginated listings
#[derive(Debug, Deserialize)]
struct ListQuery {
    page: Option<u64>,
    limit: Option<u64>,
    search: Option<String>,
}

impl ListQuery {
    fn page_request(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest {
            page: self.page.unwrap_or(defaults.page),
            limit: self.limit.unwrap_or(defaults.limit),
        }
    }
}

/// Parses the optional `fecha_inicio`/`fecha_fin` query bounds.
fn date_bounds(
    inicio: Option<&str>,
    fin: Option<&str>,
) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
    let desde = inicio.map(|v| parse_date_bound(v, false)).transpose()?;
    let hasta = fin.map(|v| parse_date_bound(v, true)).transpose()?;
    Ok((desde, hasta))
}

/// Renders a document and serves it as a download.
fn document_response(renderer: &dyn DocumentRenderer, document: &Document) -> Result<Response> {
    let body = renderer.render(document)?;
    let disposition = format!("attachment; filename=\"{}\"", renderer.file_name(document));
    Ok((
        [
            (header::CONTENT_TYPE, renderer.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|e| warn!("Ignoring invalid CORS origin '{origin}': {e}"))
                .ok()
        })
        .collect();
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Builds the application router.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(session::routes())
        .merge(users::routes())
        .merge(clients::routes())
        .merge(catalog::routes())
        .merge(inventory::routes())
        .merge(orders::routes())
        .merge(invoices::routes())
        .merge(reports::routes())
        .layer(middleware::map_response_with_state(
            state.clone(),
            error::attach_details,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.settings.cors_origins))
        .with_state(state)
}
