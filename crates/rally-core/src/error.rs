use rally_types::models::RegistrationStatus;
use thiserror::Error;

/// Error taxonomy for the consistency core.
///
/// The first group are expected, user-facing outcomes ("this is full"); the
/// second are policy violations; `Store` covers transient backing-store
/// failures, which callers may retry after re-reading current state — the
/// core never retries internally with stale inputs.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("event is at capacity")]
    CapacityExceeded,

    #[error("team is full")]
    TeamFull,

    #[error("user already has an active registration for this event")]
    AlreadyRegistered,

    #[error("user is already a member of a team for this event")]
    AlreadyMember,

    #[error("invalid registration transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: RegistrationStatus,
        to: RegistrationStatus,
    },

    #[error("leader must transfer leadership or disband the team before leaving")]
    LeaderMustTransferOrDisband,

    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl RegistryError {
    /// Stable machine-readable code, used by the HTTP layer so clients can
    /// tell "full" apart from "already registered".
    pub fn code(&self) -> &'static str {
        match self {
            Self::CapacityExceeded => "capacity_exceeded",
            Self::TeamFull => "team_full",
            Self::AlreadyRegistered => "already_registered",
            Self::AlreadyMember => "already_member",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::LeaderMustTransferOrDisband => "leader_must_transfer_or_disband",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Store(_) => "store_error",
        }
    }
}
