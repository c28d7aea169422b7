use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{VoteTarget, VoteType};

// -- JWT Claims --

/// Claims carried in tokens issued by the external identity provider.
/// Canonical definition lives here in rally-types so the REST middleware and
/// the core's Actor construction agree on the shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: String,
    pub exp: usize,
}

// -- Registrations --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterForEventRequest {
    pub team_id: Option<Uuid>,
}

// -- Teams --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTeamRequest {
    pub event_id: Uuid,
    pub name: String,
    pub max_members: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransferLeadershipRequest {
    pub new_leader_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostTeamMessageRequest {
    pub body: String,
}

// -- Votes / Q&A --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CastVoteRequest {
    pub target_id: Uuid,
    pub target_kind: VoteTarget,
    pub vote_type: VoteType,
}

#[derive(Debug, Serialize)]
pub struct CastVoteResponse {
    /// The user's vote on the target after this operation, if any.
    pub vote: Option<VoteType>,
    pub upvotes: u32,
    pub downvotes: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostAnswerRequest {
    pub body: String,
}

// -- Reconciliation --

#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub drift_detected: bool,
    /// stored/actual pairs for each counter that was checked.
    pub counters: Vec<CounterCheck>,
}

#[derive(Debug, Serialize)]
pub struct CounterCheck {
    pub counter: String,
    pub stored: i64,
    pub actual: i64,
}
