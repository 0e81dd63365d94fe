use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde_json::json;

use super::error::TeamFormationError;
use super::service::{TeamFormationOptions, TeamFormationService};
use super::source::MatchSource;

/// Router exposing team formation for a single opportunity.
pub fn team_router<S>(service: Arc<TeamFormationService<S>>) -> Router
where
    S: MatchSource + 'static,
{
    Router::new()
        .route(
            "/api/v1/opportunities/:opportunity_id/teams",
            post(form_teams_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn form_teams_handler<S>(
    State(service): State<Arc<TeamFormationService<S>>>,
    Path(opportunity_id): Path<String>,
    axum::Json(options): axum::Json<TeamFormationOptions>,
) -> Response
where
    S: MatchSource + 'static,
{
    match service.form_teams(&opportunity_id, &options).await {
        Ok(outcome) => {
            let payload = json!({
                "opportunity_id": outcome.opportunity_id,
                "computed_at": outcome.computed_at,
                "candidates": outcome.candidates,
                "selection": outcome.selection,
                "results": outcome.results,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(TeamFormationError::NotFound(message)) => {
            let payload = json!({
                "opportunity_id": opportunity_id,
                "error": message,
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(error @ TeamFormationError::Configuration(_))
        | Err(error @ TeamFormationError::MalformedInput(_)) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(error @ TeamFormationError::Source(_)) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
        }
        Err(error @ TeamFormationError::SearchAborted(_)) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
