//! HTTP surface of the dashboard.
//!
//! - `GET /` the dashboard page for `start_date`/`end_date`/`page`
//! - `GET /api/selection` the same selection as JSON
//! - `GET /health`

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::config::Config;
use crate::dashboard::page::{render_page, PageView};
use crate::dashboard::{self, ChartError, Selection};
use crate::error::StartupError;
use crate::table::SalesTable;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct DashboardState {
    pub table: Arc<SalesTable>,
    pub config: Arc<Config>,
}

impl DashboardState {
    pub fn new(config: Config, table: SalesTable) -> Self {
        Self {
            table: Arc::new(table),
            config: Arc::new(config),
        }
    }
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("{0}")]
    Chart(#[from] ChartError),
}

impl WebError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            WebError::InvalidDate(_) => StatusCode::BAD_REQUEST,
            WebError::Chart(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        log::error!("Error returned {self:?}");
        (self.as_status_code(), format!("{self}")).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SelectionQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<usize>,
}

impl SelectionQuery {
    /// Resolve the range, falling back to the configured initial dates.
    ///
    /// A cleared input arrives as an empty string and counts as missing.
    /// Starts before the picker's minimum are clamped to it.
    fn range(&self, config: &Config) -> Result<(NaiveDate, NaiveDate), WebError> {
        let start = parse_date(self.start_date.as_deref())?.unwrap_or(config.initial_start_date);
        let end = parse_date(self.end_date.as_deref())?.unwrap_or(config.initial_end_date);
        Ok((start.max(config.min_date), end))
    }
}

fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>, WebError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| WebError::InvalidDate(s.to_string())),
    }
}

fn run_selection(state: &DashboardState, query: &SelectionQuery) -> Result<Selection, WebError> {
    let (start, end) = query.range(&state.config)?;
    Ok(dashboard::select(&state.table, start, end))
}

async fn index(
    State(state): State<DashboardState>,
    Query(query): Query<SelectionQuery>,
) -> Result<Html<String>, WebError> {
    let selection = run_selection(&state, &query)?;
    let html = render_page(&PageView {
        selection: &selection,
        min_date: state.config.min_date,
        page: query.page.unwrap_or(1),
        page_size: state.config.page_size,
    })?;
    Ok(Html(html))
}

async fn api_selection(
    State(state): State<DashboardState>,
    Query(query): Query<SelectionQuery>,
) -> Result<Json<Selection>, WebError> {
    Ok(Json(run_selection(&state, &query)?))
}

async fn health() -> &'static str {
    "ok"
}

pub fn router(state: DashboardState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/selection", get(api_selection))
        .route("/health", get(health))
        .with_state(state)
}

/// Bind the configured address and serve until the process exits.
pub async fn serve(config: Config, table: SalesTable) -> Result<(), StartupError> {
    let addr = config.bind_addr();
    let app = router(DashboardState::new(config, table));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: addr.clone(),
            source,
        })?;
    log::info!("Dashboard listening on http://{addr}");

    axum::serve(listener, app)
        .await
        .map_err(StartupError::Server)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn query(start: Option<&str>, end: Option<&str>) -> SelectionQuery {
        SelectionQuery {
            start_date: start.map(String::from),
            end_date: end.map(String::from),
            page: None,
        }
    }

    #[test]
    fn test_range_defaults_to_initial_dates() {
        let config = Config::default();
        let (start, end) = query(None, Some("")).range(&config).unwrap();
        assert_eq!(start, date("2023-08-01"));
        assert_eq!(end, date("2023-08-09"));
    }

    #[test]
    fn test_range_clamps_to_min_date() {
        let config = Config::default();
        let (start, end) = query(Some("2022-06-01"), Some("2023-01-05"))
            .range(&config)
            .unwrap();
        assert_eq!(start, date("2023-01-01"));
        assert_eq!(end, date("2023-01-05"));
    }

    #[test]
    fn test_range_rejects_malformed_dates() {
        let config = Config::default();
        let err = query(Some("01/08/2023"), None).range(&config).unwrap_err();
        assert!(matches!(err, WebError::InvalidDate(ref s) if s == "01/08/2023"));
        assert_eq!(err.as_status_code(), StatusCode::BAD_REQUEST);
    }
}
