use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use rally_core::reconcile::Drift;
use rally_types::api::{CounterCheck, ReconcileResponse};
use rally_types::models::VoteTarget;

use crate::AppState;
use crate::error::ApiError;

fn response(drift: Drift) -> Json<ReconcileResponse> {
    Json(ReconcileResponse {
        drift_detected: drift.detected(),
        counters: drift
            .counters
            .into_iter()
            .map(|c| CounterCheck {
                counter: c.counter.to_string(),
                stored: c.stored,
                actual: c.actual,
            })
            .collect(),
    })
}

pub async fn event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(response(state.reconciler.reconcile_event(event_id)?))
}

pub async fn team(
    State(state): State<AppState>,
    Path(team_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(response(state.reconciler.reconcile_team(team_id)?))
}

pub async fn post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(response(
        state.reconciler.reconcile_votable(post_id, VoteTarget::Post)?,
    ))
}

pub async fn comment(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(response(
        state
            .reconciler
            .reconcile_votable(comment_id, VoteTarget::Comment)?,
    ))
}

pub async fn question(
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(response(state.reconciler.reconcile_question(question_id)?))
}
