use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use rally_types::api::{CastVoteRequest, CastVoteResponse, Claims, PostAnswerRequest};

use crate::error::ApiError;
use crate::{AppState, actor_from};

pub async fn cast_vote(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CastVoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.tallies.cast_vote(
        actor_from(&claims),
        req.target_id,
        req.target_kind,
        req.vote_type,
    )?;

    Ok(Json(CastVoteResponse {
        vote: outcome.vote,
        upvotes: outcome.upvotes,
        downvotes: outcome.downvotes,
    }))
}

pub async fn post_answer(
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PostAnswerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let answer = state
        .tallies
        .post_answer(actor_from(&claims), question_id, &req.body)?;
    Ok((StatusCode::CREATED, Json(answer)))
}

pub async fn delete_answer(
    State(state): State<AppState>,
    Path(answer_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    state.tallies.delete_answer(actor_from(&claims), answer_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn accept_answer(
    State(state): State<AppState>,
    Path(answer_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let answer = state.tallies.accept_answer(actor_from(&claims), answer_id)?;
    Ok(Json(answer))
}
