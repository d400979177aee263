//! HTTP request handlers for the circumstances service.
//!
//! Maps requests onto [`CircumstancesService`] calls and every outcome onto
//! the response envelope. Each handler checks the caller's roles first.

use crate::auth::{AuthError, Authorizer, Policy};
use crate::envelope::{reason_phrase, status_code_name, ApiResponse};
use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, OriginalUri, Path, State},
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router as AxumRouter,
};
use circumstances_domain::traits::CircumstancesStore;
use circumstances_domain::{CircumstancesId, CircumstancesRequest, CircumstancesResponse, ValidationError};
use circumstances_service::{CircumstancesService, ServiceError};
use circumstances_store::SqliteStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Builds resource paths for records
#[derive(Debug, Clone)]
pub struct ResourcePaths {
    base_path: String,
    api_version: Option<String>,
}

impl ResourcePaths {
    /// Paths under `base_path`, with an optional version segment
    pub fn new(base_path: impl Into<String>, api_version: Option<String>) -> Self {
        Self {
            base_path: base_path.into(),
            api_version,
        }
    }

    /// Path of the record with `id`, e.g. `/nsjsa/v1/claim/{id}`
    pub fn claim(&self, id: CircumstancesId) -> String {
        match &self.api_version {
            Some(version) => format!("{}/{}/claim/{}", self.base_path, version, id),
            None => format!("{}/claim/{}", self.base_path, id),
        }
    }
}

/// Shared application state
pub struct AppState<S: CircumstancesStore = SqliteStore> {
    /// Record operations
    pub service: CircumstancesService<S>,
    /// Role checks
    pub authorizer: Arc<Authorizer>,
    /// Resource path construction
    pub paths: Arc<ResourcePaths>,
}

impl<S: CircumstancesStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            authorizer: Arc::clone(&self.authorizer),
            paths: Arc::clone(&self.paths),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
    /// Service version
    pub version: String,
}

/// Path parameters for `/claim/:id`
#[derive(Debug, Deserialize)]
pub struct ClaimPath {
    id: Uuid,
}

/// Path parameters for `/citizen/:claimantId/claim`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimantPath {
    claimant_id: Uuid,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Service-layer failure
    Service(ServiceError),
    /// Authorization failure
    Auth(AuthError),
    /// No record for the requested id or claimant
    NotFound,
    /// Unusable path parameter or body
    BadRequest(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Service(ServiceError::Validation(_)) => StatusCode::BAD_REQUEST,
            AppError::Service(ServiceError::Serialization(_)) => StatusCode::BAD_REQUEST,
            AppError::Service(ServiceError::DuplicateRecord) => StatusCode::CONFLICT,
            AppError::Service(ServiceError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(AuthError::Forbidden) => StatusCode::FORBIDDEN,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Service(ServiceError::Store(e)) => {
                error!("Store failure: {}", e);
                reason_phrase(status).to_string()
            }
            AppError::Service(e) => e.to_string(),
            AppError::Auth(e) => e.to_string(),
            AppError::NotFound => reason_phrase(status).to_string(),
            AppError::BadRequest(msg) => msg,
        };

        let body = Json(ApiResponse::<()>::error(status_code_name(status), message));
        (status, body).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        AppError::Service(e)
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Auth(e)
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Service(ServiceError::Validation(e))
    }
}

impl From<PathRejection> for AppError {
    fn from(e: PathRejection) -> Self {
        AppError::BadRequest(e.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::BadRequest(e.body_text())
    }
}

/// Parse and validate a request body
fn parse_payload(
    body: Result<Json<Value>, JsonRejection>,
) -> Result<CircumstancesRequest, AppError> {
    let Json(value) = body?;
    let payload = CircumstancesRequest::from_value(value)?;
    payload.validate()?;
    Ok(payload)
}

fn found<T>(path: String, data: Option<T>) -> Result<(StatusCode, Json<ApiResponse<T>>), AppError> {
    match data {
        Some(data) => Ok((StatusCode::OK, Json(ApiResponse::success(path, data)))),
        None => Err(AppError::NotFound),
    }
}

type Envelope<T> = Result<(StatusCode, Json<ApiResponse<T>>), AppError>;

/// GET /claim/:id - Fetch a record by id
async fn get_claim_circumstances_by_id<S>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    OriginalUri(uri): OriginalUri,
    path: Result<Path<ClaimPath>, PathRejection>,
) -> Envelope<CircumstancesResponse>
where
    S: CircumstancesStore + Send + 'static,
{
    state.authorizer.authorize(&headers, Policy::READ)?;
    let Path(ClaimPath { id }) = path?;
    debug!("Getting circumstances for id: {}", id);

    let response = state.service.get_by_id(CircumstancesId::from_uuid(id))?;
    found(uri.path().to_string(), response)
}

/// GET /citizen/:claimantId/claim - Fetch a claimant's record
async fn get_claim_circumstances_by_claimant_id<S>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    OriginalUri(uri): OriginalUri,
    path: Result<Path<ClaimantPath>, PathRejection>,
) -> Envelope<CircumstancesResponse>
where
    S: CircumstancesStore + Send + 'static,
{
    state.authorizer.authorize(&headers, Policy::READ)?;
    let Path(ClaimantPath { claimant_id }) = path?;
    debug!("Getting circumstances for claimantId: {}", claimant_id);

    let response = state
        .service
        .get_by_claimant_id(&claimant_id.to_string())?;
    found(uri.path().to_string(), response)
}

/// POST /citizen/:claimantId/claim - Create a claimant's record
async fn create_claim_circumstances<S>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    path: Result<Path<ClaimantPath>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Envelope<CircumstancesId>
where
    S: CircumstancesStore + Send + 'static,
{
    state.authorizer.authorize(&headers, Policy::CREATE)?;
    let Path(ClaimantPath { claimant_id }) = path?;
    debug!("Creating circumstances for claimantId: {}", claimant_id);

    let mut payload = parse_payload(body)?;
    payload.set_claimant_id(&claimant_id.to_string());

    let id = state.service.create(payload)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(state.paths.claim(id), id)),
    ))
}

/// PATCH /claim/:id - Replace a record's document
async fn update_claim_circumstances<S>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    path: Result<Path<ClaimPath>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Envelope<CircumstancesId>
where
    S: CircumstancesStore + Send + 'static,
{
    state.authorizer.authorize(&headers, Policy::UPDATE)?;
    let Path(ClaimPath { id }) = path?;
    debug!("Updating circumstances for id: {}", id);

    let payload = parse_payload(body)?;
    let id = state.service.update(CircumstancesId::from_uuid(id), payload)?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(state.paths.claim(id), id)),
    ))
}

/// DELETE /claim/:id - Delete a record
async fn delete_claim_circumstances<S>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    path: Result<Path<ClaimPath>, PathRejection>,
) -> Envelope<CircumstancesId>
where
    S: CircumstancesStore + Send + 'static,
{
    state.authorizer.authorize(&headers, Policy::DELETE)?;
    let Path(ClaimPath { id }) = path?;
    debug!("Deleting circumstances for id: {}", id);

    let id = CircumstancesId::from_uuid(id);
    if state.service.get_by_id(id)?.is_none() {
        error!("Error deleting circumstances for id: {}", id);
        return Err(AppError::NotFound);
    }

    state.service.delete(id)?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(state.paths.claim(id), id)),
    ))
}

/// GET /health - Liveness check
async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Envelope for requests no route matched
async fn not_found_fallback() -> Response {
    status_envelope(StatusCode::NOT_FOUND, None)
}

/// Envelope for the empty 405 responses the method router produces
async fn method_not_allowed_envelope(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }
    let allow = response.headers().get(header::ALLOW).cloned();
    status_envelope(StatusCode::METHOD_NOT_ALLOWED, allow)
}

fn status_envelope(status: StatusCode, allow: Option<header::HeaderValue>) -> Response {
    warn!("Unrouted request answered with {}", status);
    let body = Json(ApiResponse::<()>::error(
        status.as_u16().to_string(),
        reason_phrase(status),
    ));
    let mut response = (status, body).into_response();
    if let Some(allow) = allow {
        response.headers_mut().insert(header::ALLOW, allow);
    }
    response
}

fn claim_routes<S>() -> AxumRouter<AppState<S>>
where
    S: CircumstancesStore + Send + 'static,
{
    AxumRouter::new()
        .route(
            "/claim/:id",
            get(get_claim_circumstances_by_id::<S>)
                .patch(update_claim_circumstances::<S>)
                .delete(delete_claim_circumstances::<S>),
        )
        .route(
            "/citizen/:claimantId/claim",
            get(get_claim_circumstances_by_claimant_id::<S>)
                .post(create_claim_circumstances::<S>),
        )
}

/// Create the axum router with all routes
///
/// Claim routes are mounted under `base_path` and again under
/// `base_path/:version`, so versioned URLs resolve to the same handlers.
pub fn create_router<S>(state: AppState<S>, base_path: &str) -> AxumRouter
where
    S: CircumstancesStore + Send + 'static,
{
    let versioned = AxumRouter::new().nest(&format!("{}/:version", base_path), claim_routes::<S>());
    let unversioned = if base_path.is_empty() {
        claim_routes::<S>()
    } else {
        AxumRouter::new().nest(base_path, claim_routes::<S>())
    };

    AxumRouter::new()
        .route("/health", get(health_check))
        .merge(unversioned)
        .merge(versioned)
        .fallback(not_found_fallback)
        .layer(middleware::map_response(method_not_allowed_envelope))
        .with_state(state)
}
