use super::common::*;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use crate::recommendations::domain::Tier;
use crate::recommendations::router::recommend_handler;
use crate::recommendations::service::RecommendationRequest;
use crate::recommendations::recommendation_router;

#[tokio::test]
async fn recommend_route_returns_a_balanced_pool() {
    let service = Arc::new(service(Arc::new(ScriptedSource::default()), empty_reference()));
    let router = recommendation_router(service);

    let mut seed = skewed_seed();
    seed.push(unscored("Juniper College", Tier::Safety, 85));
    seed.push(unscored("Larch College", Tier::Safety, 92));
    seed.push(unscored("Maple College", Tier::Reach, 18));
    let body = json!({
        "profile": { "gpa_weighted": 3.7, "sat_total": 1380 },
        "constraints": {},
        "seed": seed,
    });

    let response = router
        .oneshot(
            axum::http::Request::post("/api/v1/recommendations")
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::to_vec(&body).expect("serialize request"),
                ))
                .expect("build request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["recommendations"].as_array().map(Vec::len), Some(9));
    assert_eq!(payload["counts"]["reach"], 3);
    assert_eq!(payload["counts"]["match"], 3);
    assert_eq!(payload["counts"]["safety"], 3);
    assert_eq!(payload["shortfall"], false);
    assert!(payload.get("generated_at").is_some());
    assert_eq!(payload["recommendations"][0]["tier"], "reach");
}

#[tokio::test]
async fn recommend_handler_rejects_invalid_per_tier() {
    let service = Arc::new(service(Arc::new(ScriptedSource::default()), empty_reference()));

    let response = recommend_handler(
        State(service),
        axum::Json(RecommendationRequest {
            per_tier: Some(0),
            ..RecommendationRequest::default()
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .is_some_and(|error| error.contains("per_tier")));
}

#[tokio::test]
async fn malformed_json_is_rejected_by_the_extractor() {
    let service = Arc::new(service(Arc::new(ScriptedSource::default()), empty_reference()));
    let router = recommendation_router(service);

    let response = router
        .oneshot(
            axum::http::Request::post("/api/v1/recommendations")
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from("{\"profile\": 3"))
                .expect("build request"),
        )
        .await
        .expect("route executes");

    assert!(response.status().is_client_error());
}
