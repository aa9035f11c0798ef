//! HTTP adapter for the personnel core.
//!
//! This module plays the request dispatcher: every request first
//! passes the [`policy_gate`] middleware, which resolves the caller and
//! asks the [`PolicyEngine`] for a decision.  Report handlers then
//! check the finer-grained capabilities in the [`PermissionCatalog`],
//! fetch records from the [`RecordStore`] and hand the built table back
//! as a CSV download.  Logging happens here, never in the core.

use crate::catalog::PermissionCatalog;
use crate::config::ServerConfig;
use crate::error::CoreError;
use crate::models::{Principal, ReportRequest, ReportType};
use crate::policy::{Decision, PolicyEngine};
use crate::report::{self, export_filename, CSV_CONTENT_TYPE};
use crate::store::{JsonFixtures, RecordStore, SessionResolver};
use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info};

pub const LOGIN_PATH: &str = "/login";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

/// Shared, read-only state.  Nothing in here is mutated after startup,
/// so no locks are needed.
pub struct AppState {
    pub catalog: PermissionCatalog,
    pub policy: PolicyEngine,
    pub sessions: Arc<dyn SessionResolver>,
    pub store: Arc<dyn RecordStore>,
}

/// Errors surfaced by the handlers.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Forbidden(String),
    Internal(anyhow::Error),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        if err.is_caller_error() {
            ApiError::BadRequest(err.to_string())
        } else {
            ApiError::Internal(err.into())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Forbidden(message) => (StatusCode::FORBIDDEN, message),
            ApiError::Internal(err) => {
                error!(error = %format!("{err:#}"), "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Build the API router around the given state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/me", get(me))
        .route("/api/reports/attendance/summary", get(attendance_summary))
        .route("/api/reports/:report_type/export", get(export_report))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), policy_gate))
        .with_state(state)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Gatekeeping middleware applied to every route, including the fallback.
///
/// API paths receive 401/403 JSON bodies; page paths are redirected to
/// the login or unauthorized page.
pub async fn policy_gate(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let principal = bearer_token(request.headers()).and_then(|token| state.sessions.resolve(token));

    match state.policy.authorize(principal.as_ref(), &path) {
        Decision::Allow => {
            if let Some(principal) = principal {
                request.extensions_mut().insert(principal);
            }
            next.run(request).await
        }
        Decision::DenyUnauthenticated => {
            debug!(%path, "request without a session");
            deny(&path, StatusCode::UNAUTHORIZED, LOGIN_PATH, "authentication required")
        }
        Decision::DenyForbidden => {
            // Only reachable with a principal.
            let role = principal.as_ref().map(|p| p.role.as_str()).unwrap_or_default();
            info!(%path, role, "access denied by route policy");
            deny(&path, StatusCode::FORBIDDEN, UNAUTHORIZED_PATH, "forbidden")
        }
    }
}

fn deny(path: &str, status: StatusCode, redirect_to: &str, message: &str) -> Response {
    if path.starts_with("/api/") {
        (status, Json(json!({ "error": message }))).into_response()
    } else {
        Redirect::to(redirect_to).into_response()
    }
}

fn require_capabilities(
    catalog: &PermissionCatalog,
    principal: &Principal,
    required: &[&str],
) -> Result<(), ApiError> {
    if catalog.has_all(principal.role, required) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "role {} lacks one of: {}",
            principal.role,
            required.join(", ")
        )))
    }
}

fn export_capabilities(report_type: ReportType) -> &'static [&'static str] {
    match report_type {
        ReportType::Payroll => &["report.export", "payroll.read"],
        ReportType::Attendance | ReportType::Leave => &["report.export"],
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
}

/// Handler for GET /api/me
async fn me(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Response, ApiError> {
    let mut capabilities: Vec<&str> = state
        .catalog
        .capabilities_of(principal.role)?
        .iter()
        .map(|c| c.as_str())
        .collect();
    capabilities.sort_unstable();
    Ok(Json(json!({ "principal": principal, "capabilities": capabilities })).into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub department_id: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

impl ReportQuery {
    fn to_request(&self, report_type: &str) -> Result<ReportRequest, CoreError> {
        ReportRequest::parse(
            report_type,
            self.department_id.as_deref(),
            self.date_from.as_deref(),
            self.date_to.as_deref(),
        )
    }
}

/// Handler for GET /api/reports/:report_type/export
async fn export_report(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(report_type): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    let request = query.to_request(&report_type)?;
    require_capabilities(&state.catalog, &principal, export_capabilities(request.report_type))?;

    let records = state.store.records_for(&request).map_err(ApiError::Internal)?;
    let table = report::build(&request, &records);
    info!(
        report = %request.report_type,
        rows = table.len(),
        user = %principal.id,
        "report exported"
    );

    let filename = export_filename(request.report_type, chrono::Local::now().date_naive());
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, CSV_CONTENT_TYPE)
        .header(header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\""))
        .body(Body::from(table.to_csv()))
        .map_err(|e| ApiError::Internal(anyhow!("response build failed: {e}")))
}

/// Handler for GET /api/reports/attendance/summary
async fn attendance_summary(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    let request = query.to_request(ReportType::Attendance.as_str())?;
    require_capabilities(&state.catalog, &principal, &["report.view"])?;

    let records = state.store.records_for(&request).map_err(ApiError::Internal)?;
    let stats = report::attendance_stats(&request, &records.attendance);
    Ok(Json(stats).into_response())
}

/// Launch the API server.  Loads fixtures, validates the static tables
/// and blocks until the server terminates.
pub async fn serve(config: &ServerConfig) -> Result<()> {
    let fixtures = Arc::new(JsonFixtures::load(&config.data_file)?);
    let catalog = PermissionCatalog::standard().context("capability catalog is invalid")?;
    let state = Arc::new(AppState {
        catalog,
        policy: PolicyEngine::default(),
        sessions: fixtures.clone(),
        store: fixtures,
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, data_file = %config.data_file.display(), "server listening");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
