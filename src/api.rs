use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::verdict::VerdictResponse;
use crate::verifier::{Verifier, VerifyError};

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<Verifier>,
}

impl AppState {
    pub fn new(verifier: Verifier) -> Self {
        Self {
            verifier: Arc::new(verifier),
        }
    }
}

/// Build the public router. CORS is fully open: the browser extension and the
/// static website call this service cross-origin.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(|| async { "OK" }))
        .route("/verify", post(verify))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct VerifyReq {
    claim: String,
    #[serde(default)]
    is_page: bool,
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "msg": "Claim checker running. Use POST /verify" }))
}

async fn verify(
    State(state): State<AppState>,
    Json(body): Json<VerifyReq>,
) -> Result<Json<VerdictResponse>, ApiError> {
    let resp = state.verifier.verify(&body.claim, body.is_page).await?;
    Ok(Json(resp))
}

/// Client-facing error: `{"detail": "..."}` with a 4xx status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl From<VerifyError> for ApiError {
    fn from(e: VerifyError) -> Self {
        match e {
            VerifyError::EmptyClaim => Self {
                status: StatusCode::BAD_REQUEST,
                detail: e.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}
