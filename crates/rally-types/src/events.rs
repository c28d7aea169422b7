use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Structured events handed to the notification dispatcher after a commit.
/// Delivery is fire-and-forget: a failed or dropped notification never rolls
/// back the transaction that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Notification {
    /// A registration was created successfully
    RegistrationConfirmed {
        event_id: Uuid,
        event_title: String,
        user_id: Uuid,
    },

    /// A registration was cancelled by the registrant or an organizer
    RegistrationCancelled {
        event_id: Uuid,
        event_title: String,
        user_id: Uuid,
    },

    /// An organizer marked the registrant as attended
    AttendanceMarked {
        event_id: Uuid,
        event_title: String,
        user_id: Uuid,
    },

    /// Team leadership moved to another member
    LeadershipTransferred {
        team_id: Uuid,
        team_name: String,
        new_leader_id: Uuid,
    },

    /// A team was deleted, either explicitly or by its last member leaving
    TeamDisbanded {
        team_id: Uuid,
        team_name: String,
    },
}

impl Notification {
    /// The user this notification is primarily about, if it targets one.
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Self::RegistrationConfirmed { user_id, .. } => Some(*user_id),
            Self::RegistrationCancelled { user_id, .. } => Some(*user_id),
            Self::AttendanceMarked { user_id, .. } => Some(*user_id),
            Self::LeadershipTransferred { new_leader_id, .. } => Some(*new_leader_id),
            // TeamDisbanded fans out to the whole roster
            Self::TeamDisbanded { .. } => None,
        }
    }
}
