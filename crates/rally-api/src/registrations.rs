use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use rally_types::api::{Claims, RegisterForEventRequest};

use crate::error::ApiError;
use crate::{AppState, actor_from};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateEventRequest {
    pub title: String,
    pub capacity: u32,
}

pub async fn create_event(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let event = state
        .registrations
        .create_event(actor_from(&claims), &req.title, req.capacity)?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn register(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<RegisterForEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let registration =
        state
            .registrations
            .register_for_event(actor_from(&claims), event_id, req.team_id)?;
    Ok((StatusCode::CREATED, Json(registration)))
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(registration_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let registration = state
        .registrations
        .cancel_registration(actor_from(&claims), registration_id)?;
    Ok(Json(registration))
}

pub async fn mark_attended(
    State(state): State<AppState>,
    Path(registration_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let registration = state
        .registrations
        .mark_attended(actor_from(&claims), registration_id)?;
    Ok(Json(registration))
}
