//! Axum routes for the Machine View service.

use axum::{
    extract::{rejection::JsonRejection, Json, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::serializer::MachineDocument;
use crate::types::{Mode, Slice, SliceDescriptor, SliceId};

use super::state::{ServiceError, ServiceState};

/// Route assumed when a request does not name one.
const DEFAULT_ROUTE: &str = "/";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query selecting the route shown in the document header.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteQuery {
    /// Route path; `/` when absent.
    pub route: Option<String>,
}

impl RouteQuery {
    fn route(&self) -> &str {
        self.route.as_deref().unwrap_or(DEFAULT_ROUTE)
    }
}

/// Registered slices in emission order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliceListResponse {
    /// The slices.
    pub slices: Vec<Slice>,
    /// Registry version the list was read at.
    pub registry_version: u64,
}

/// Response to a publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResponse {
    /// Id the slice was registered under.
    pub id: SliceId,
}

/// Current mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeBody {
    /// The mode.
    pub mode: Mode,
}

/// Service health response (detailed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Registered slice count.
    pub slice_count: usize,
    /// Slices published through this service.
    pub owned_slice_count: usize,
    /// Current mode.
    pub mode: Mode,
    /// Registry mutation counter.
    pub registry_version: u64,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    /// Always `alive`.
    pub status: String,
}

/// Structured error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
    /// Additional error details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response with code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: ErrorResponse) -> ApiError {
    tracing::warn!(
        code = %error.code,
        error = %error.error,
        status = status.as_u16(),
        "Request error"
    );
    (status, Json(error))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Render the document as Markdown.
async fn markdown_handler(
    State(state): State<Arc<ServiceState>>,
    Query(query): Query<RouteQuery>,
) -> impl IntoResponse {
    let document = state.serializer.render(&state.registry, query.route());
    (
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        document.markdown,
    )
}

/// Render the document with metadata.
async fn document_handler(
    State(state): State<Arc<ServiceState>>,
    Query(query): Query<RouteQuery>,
) -> Json<MachineDocument> {
    Json(state.serializer.render(&state.registry, query.route()))
}

/// List registered slices in emission order.
async fn list_slices_handler(State(state): State<Arc<ServiceState>>) -> Json<SliceListResponse> {
    let registry_version = state.registry.version();
    let slices = state
        .registry
        .ordered_slices()
        .iter()
        .map(|slice| Slice::clone(slice))
        .collect();

    Json(SliceListResponse {
        slices,
        registry_version,
    })
}

/// Publish a service-owned slice.
async fn publish_slice_handler(
    State(state): State<Arc<ServiceState>>,
    body: Result<Json<SliceDescriptor>, JsonRejection>,
) -> Result<(StatusCode, Json<PublishResponse>), ApiError> {
    let Json(descriptor) = body.map_err(|rejection| {
        api_error(
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("INVALID_DESCRIPTOR", "Invalid slice descriptor")
                .with_details(rejection.body_text()),
        )
    })?;

    match state.publish(descriptor) {
        Ok(id) => Ok((StatusCode::CREATED, Json(PublishResponse { id }))),
        Err(ServiceError::SliceIdTaken(id)) => Err(api_error(
            StatusCode::CONFLICT,
            ErrorResponse::new("SLICE_ID_TAKEN", "Slice id is held by another owner")
                .with_details(id.to_string()),
        )),
    }
}

/// Remove a service-owned slice.
async fn retract_slice_handler(
    State(state): State<Arc<ServiceState>>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = SliceId::new(raw_id.clone()).map_err(|e| {
        api_error(
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("INVALID_SLICE_ID", e.to_string()),
        )
    })?;

    if state.retract(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(api_error(
            StatusCode::NOT_FOUND,
            ErrorResponse::new("SLICE_NOT_OWNED", "No service-owned slice with this id")
                .with_details(raw_id),
        ))
    }
}

/// Read the mode.
async fn get_mode_handler(State(state): State<Arc<ServiceState>>) -> Json<ModeBody> {
    Json(ModeBody {
        mode: state.registry.mode(),
    })
}

/// Set the mode.
async fn set_mode_handler(
    State(state): State<Arc<ServiceState>>,
    body: Result<Json<ModeBody>, JsonRejection>,
) -> Result<Json<ModeBody>, ApiError> {
    let Json(ModeBody { mode }) = body.map_err(|rejection| {
        api_error(
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("INVALID_MODE", "Mode must be \"human\" or \"machine\"")
                .with_details(rejection.body_text()),
        )
    })?;

    state.registry.set_mode(mode);
    Ok(Json(ModeBody { mode }))
}

/// Flip the mode.
async fn toggle_mode_handler(State(state): State<Arc<ServiceState>>) -> Json<ModeBody> {
    Json(ModeBody {
        mode: state.registry.toggle_mode(),
    })
}

/// Health check endpoint (detailed).
async fn health_handler(State(state): State<Arc<ServiceState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        slice_count: state.registry.len(),
        owned_slice_count: state.owned_count(),
        mode: state.registry.mode(),
        registry_version: state.registry.version(),
    })
}

/// Liveness probe endpoint.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for the Machine View service.
pub fn create_router(state: ServiceState) -> Router {
    let state = Arc::new(state);

    Router::new()
        // Documents
        .route("/machine-view.md", get(markdown_handler))
        .route("/api/machine-view", get(document_handler))
        // Slices
        .route("/api/slices", get(list_slices_handler).post(publish_slice_handler))
        .route("/api/slices/:id", delete(retract_slice_handler))
        // Mode
        .route("/api/mode", get(get_mode_handler).put(set_mode_handler))
        .route("/api/mode/toggle", post(toggle_mode_handler))
        // Health checks
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .with_state(state)
}
