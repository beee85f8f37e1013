use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use tracing::{info, error};
use uuid::Uuid;

use crate::extract::Dimensions;
use super::server::SharedGenerator;
use super::types::{ApiResponse, DimensionsRequest};

/// Returns a health check response
pub async fn health_check() -> &'static str {
    info!("Health check endpoint called");
    "minemind is running!"
}

/// Extracts grid dimensions from the query in the request body.
///
/// Inference runs on the blocking pool; the generator mutex keeps a single
/// completion in flight.
pub async fn dimensions(
    State(generator): State<SharedGenerator>,
    Json(request): Json<DimensionsRequest>,
) -> (StatusCode, Json<ApiResponse<Dimensions>>) {
    let request_id = Uuid::new_v4().to_string();
    info!(%request_id, "Dimensions endpoint called with query: {:?}", request.query);

    let query = request.query.trim().to_string();
    if query.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(request_id, "Query must not be empty")),
        );
    }

    let result = tokio::task::spawn_blocking(move || {
        let mut generator = generator.lock().unwrap_or_else(|e| e.into_inner());
        generator.generate_dimensions(&query)
    })
    .await;

    match result {
        Ok(Some(dims)) => {
            info!(%request_id, "Extracted dimensions: {}", dims);
            (StatusCode::OK, Json(ApiResponse::success(request_id, dims)))
        }
        Ok(None) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::error(
                request_id,
                "Could not extract dimensions from the model output",
            )),
        ),
        Err(e) => {
            error!(%request_id, "Inference task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(request_id, format!("Inference task failed: {}", e))),
            )
        }
    }
}
