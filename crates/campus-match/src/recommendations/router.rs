use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde_json::json;

use super::service::{RecommendationError, RecommendationRequest, RecommendationService};

/// Router exposing the recommendation endpoint.
pub fn recommendation_router(service: Arc<RecommendationService>) -> Router {
    Router::new()
        .route("/api/v1/recommendations", post(recommend_handler))
        .with_state(service)
}

pub(crate) async fn recommend_handler(
    State(service): State<Arc<RecommendationService>>,
    axum::Json(request): axum::Json<RecommendationRequest>,
) -> Response {
    match service.recommend(request).await {
        Ok(response) => (StatusCode::OK, axum::Json(response)).into_response(),
        Err(error @ RecommendationError::InvalidPerTier { .. }) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
    }
}
