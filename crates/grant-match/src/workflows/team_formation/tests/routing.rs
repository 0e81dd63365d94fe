use super::common::*;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::team_formation::router::form_teams_handler;
use crate::workflows::team_formation::{
    team_router, TeamFormationOptions, TeamFormationService, TeamSelector,
};

fn post_teams(opportunity_id: &str, body: serde_json::Value) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::post(format!("/api/v1/opportunities/{opportunity_id}/teams"))
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(
            serde_json::to_vec(&body).expect("body serializes"),
        ))
        .expect("request builds")
}

#[tokio::test]
async fn team_route_returns_results() {
    let (service, _) = build_service(TeamSelector::deterministic());
    let router = team_router(Arc::new(service));

    let response = router
        .oneshot(post_teams(LAB_OPPORTUNITY, json!({})))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["opportunity_id"], LAB_OPPORTUNITY);
    assert_eq!(payload["candidates"].as_array().map(Vec::len), Some(5));
    assert_eq!(payload["selection"]["path"], "fallback");
    assert_eq!(payload["results"][0]["team"], json!([1, 3]));
    assert_eq!(payload["results"][0]["status"], "excellent");
    assert_eq!(
        payload["results"][0]["meta"]["algo"],
        "coverage_overlap_exhaustive"
    );
    assert!(payload["results"][0]["meta"]["quality"]["critical_hit_total"].is_number());
}

#[tokio::test]
async fn team_route_passes_overrides() {
    let (service, _) = build_service(TeamSelector::deterministic());
    let router = team_router(Arc::new(service));

    let response = router
        .oneshot(post_teams(
            LAB_OPPORTUNITY,
            json!({"desired_team_count": 2, "lambda_grid": [0.0, 2.0]}),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["results"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn handler_returns_not_found_for_unknown_opportunity() {
    let (service, _) = build_service(TeamSelector::deterministic());

    let response = form_teams_handler::<MemorySource>(
        State(Arc::new(service)),
        Path("opp-missing".to_string()),
        axum::Json(TeamFormationOptions::default()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert_eq!(payload["opportunity_id"], "opp-missing");
}

#[tokio::test]
async fn handler_returns_unprocessable_for_bad_configuration() {
    let (service, _) = build_service(TeamSelector::deterministic());
    let options = TeamFormationOptions {
        lambda_grid: Some(vec![2.0, 1.0]),
        ..TeamFormationOptions::default()
    };

    let response = form_teams_handler::<MemorySource>(
        State(Arc::new(service)),
        Path(LAB_OPPORTUNITY.to_string()),
        axum::Json(options),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .contains("lambda grid"));
}

#[tokio::test]
async fn handler_returns_service_unavailable_when_source_fails() {
    let service = TeamFormationService::new(
        Arc::new(UnavailableSource),
        Arc::new(TeamSelector::deterministic()),
        matching_config(),
    );

    let response = form_teams_handler::<UnavailableSource>(
        State(Arc::new(service)),
        Path(LAB_OPPORTUNITY.to_string()),
        axum::Json(TeamFormationOptions::default()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
