use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use rally_core::teams::LeaveOutcome;
use rally_types::api::{
    Claims, CreateTeamRequest, PostTeamMessageRequest, TransferLeadershipRequest,
};

use crate::error::ApiError;
use crate::{AppState, actor_from};

pub async fn create_team(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateTeamRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let team = state.teams.create_team(
        actor_from(&claims),
        req.event_id,
        &req.name,
        req.max_members,
    )?;
    Ok((StatusCode::CREATED, Json(team)))
}

pub async fn join(
    State(state): State<AppState>,
    Path(team_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let member = state.teams.join_team(actor_from(&claims), team_id)?;
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn leave(
    State(state): State<AppState>,
    Path(team_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.teams.leave_team(actor_from(&claims), team_id)?;
    let disbanded = outcome == LeaveOutcome::TeamDisbanded;
    Ok(Json(serde_json::json!({ "team_disbanded": disbanded })))
}

pub async fn transfer_leadership(
    State(state): State<AppState>,
    Path(team_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<TransferLeadershipRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .teams
        .transfer_leadership(actor_from(&claims), team_id, req.new_leader_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn disband(
    State(state): State<AppState>,
    Path(team_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    state.teams.disband_team(actor_from(&claims), team_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn post_message(
    State(state): State<AppState>,
    Path(team_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PostTeamMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state
        .teams
        .post_team_message(actor_from(&claims), team_id, &req.body)?;
    Ok((StatusCode::CREATED, Json(message)))
}
