//! Team membership: size caps, leader uniqueness, and the leave/disband
//! rules that keep a roster consistent.
//!
//! A team is created together with its leader row in one transaction, so
//! there is no observable moment where a team exists without exactly one
//! leader. Joins use the same conditional-slot discipline as event
//! registration.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use rally_db::{Database, queries};
use rally_notify::Notifier;
use rally_types::events::Notification;
use rally_types::models::{Team, TeamMember, TeamMessage, TeamRole};

use crate::actor::Actor;
use crate::convert;
use crate::error::RegistryError;

pub const DEFAULT_MAX_MEMBERS: u32 = 5;

/// What `leave_team` did, since leaving as the last member dissolves the
/// team entirely.
#[derive(Debug, PartialEq, Eq)]
pub enum LeaveOutcome {
    Left,
    TeamDisbanded,
}

#[derive(Clone)]
pub struct TeamService {
    db: Arc<Database>,
    notifier: Notifier,
}

impl TeamService {
    pub fn new(db: Arc<Database>, notifier: Notifier) -> Self {
        Self { db, notifier }
    }

    /// Create a team with the acting user as leader. The team row and the
    /// leader's member row are one atomic unit.
    pub fn create_team(
        &self,
        actor: Actor,
        event_id: Uuid,
        name: &str,
        max_members: Option<u32>,
    ) -> Result<Team, RegistryError> {
        let max_members = max_members.unwrap_or(DEFAULT_MAX_MEMBERS);
        let team_id = Uuid::new_v4();
        let member_id = Uuid::new_v4();
        let event_key = event_id.to_string();
        let user_key = actor.user_id.to_string();

        let row = self.db.with_tx(|tx| {
            if queries::get_event(tx, &event_key)?.is_none() {
                return Err(RegistryError::NotFound("event"));
            }
            if queries::user_team_for_event(tx, &event_key, &user_key)?.is_some() {
                return Err(RegistryError::AlreadyMember);
            }

            queries::insert_team(
                tx,
                &team_id.to_string(),
                &event_key,
                name,
                &user_key,
                i64::from(max_members),
                1,
            )?;
            queries::insert_team_member(
                tx,
                &member_id.to_string(),
                &team_id.to_string(),
                &user_key,
                TeamRole::Leader.as_str(),
            )?;

            queries::get_team(tx, &team_id.to_string())?
                .ok_or(RegistryError::NotFound("team"))
        })?;

        info!(%team_id, %event_id, "team created");
        convert::team(&row)
    }

    /// Join a team as a regular member. Two concurrent joiners racing for
    /// the last slot get exactly one success and one `TeamFull`.
    pub fn join_team(&self, actor: Actor, team_id: Uuid) -> Result<TeamMember, RegistryError> {
        let team_key = team_id.to_string();
        let user_key = actor.user_id.to_string();
        let member_id = Uuid::new_v4();

        let row = self.db.with_tx(|tx| {
            let team =
                queries::get_team(tx, &team_key)?.ok_or(RegistryError::NotFound("team"))?;

            // One team per event: membership in this team or a sibling team
            // both read as "already a member".
            if queries::user_team_for_event(tx, &team.event_id, &user_key)?.is_some() {
                return Err(RegistryError::AlreadyMember);
            }

            if !queries::reserve_team_slot(tx, &team_key)? {
                return Err(RegistryError::TeamFull);
            }
            queries::insert_team_member(
                tx,
                &member_id.to_string(),
                &team_key,
                &user_key,
                TeamRole::Member.as_str(),
            )?;

            queries::get_team_member(tx, &team_key, &user_key)?
                .ok_or(RegistryError::NotFound("team member"))
        })?;

        info!(%team_id, user_id = %actor.user_id, "joined team");
        convert::team_member(&row)
    }

    /// Leave a team. A leader with other members remaining must transfer
    /// leadership or disband instead; a leader leaving alone dissolves the
    /// team (members and messages cascade away).
    pub fn leave_team(&self, actor: Actor, team_id: Uuid) -> Result<LeaveOutcome, RegistryError> {
        let team_key = team_id.to_string();
        let user_key = actor.user_id.to_string();

        let (outcome, notify) = self.db.with_tx(|tx| {
            let team =
                queries::get_team(tx, &team_key)?.ok_or(RegistryError::NotFound("team"))?;
            let member = queries::get_team_member(tx, &team_key, &user_key)?
                .ok_or(RegistryError::NotFound("team member"))?;

            if member.role == TeamRole::Leader.as_str() {
                if queries::team_has_other_members(tx, &team_key, &user_key)? {
                    return Err(RegistryError::LeaderMustTransferOrDisband);
                }
                // Sole member: the team goes away with them.
                queries::delete_team(tx, &team_key)?;
                return Ok((
                    LeaveOutcome::TeamDisbanded,
                    Some(Notification::TeamDisbanded {
                        team_id,
                        team_name: team.name,
                    }),
                ));
            }

            queries::delete_team_member(tx, &team_key, &user_key)?;
            queries::release_team_slot(tx, &team_key)?;
            Ok((LeaveOutcome::Left, None))
        })?;

        if let Some(notification) = notify {
            info!(%team_id, "team disbanded by last member leaving");
            self.notifier.dispatch(notification);
        }

        Ok(outcome)
    }

    /// Hand leadership to another current member. Demotion and promotion
    /// are one unit of work; the team never has zero or two leaders.
    pub fn transfer_leadership(
        &self,
        actor: Actor,
        team_id: Uuid,
        new_leader_id: Uuid,
    ) -> Result<(), RegistryError> {
        let team_key = team_id.to_string();
        let user_key = actor.user_id.to_string();
        let new_leader_key = new_leader_id.to_string();

        let team_name = self.db.with_tx(|tx| {
            let team =
                queries::get_team(tx, &team_key)?.ok_or(RegistryError::NotFound("team"))?;
            let current = queries::get_team_member(tx, &team_key, &user_key)?
                .ok_or(RegistryError::NotFound("team member"))?;
            if current.role != TeamRole::Leader.as_str() {
                return Err(RegistryError::Forbidden(
                    "only the leader may transfer leadership",
                ));
            }
            if queries::get_team_member(tx, &team_key, &new_leader_key)?.is_none() {
                return Err(RegistryError::NotFound("team member"));
            }

            queries::set_team_member_role(tx, &team_key, &user_key, TeamRole::Member.as_str())?;
            queries::set_team_member_role(
                tx,
                &team_key,
                &new_leader_key,
                TeamRole::Leader.as_str(),
            )?;
            Ok(team.name)
        })?;

        info!(%team_id, %new_leader_id, "leadership transferred");
        self.notifier.dispatch(Notification::LeadershipTransferred {
            team_id,
            team_name,
            new_leader_id,
        });

        Ok(())
    }

    /// Delete the team and everything it owns. Leader only.
    pub fn disband_team(&self, actor: Actor, team_id: Uuid) -> Result<(), RegistryError> {
        let team_key = team_id.to_string();
        let user_key = actor.user_id.to_string();

        let team_name = self.db.with_tx(|tx| {
            let team =
                queries::get_team(tx, &team_key)?.ok_or(RegistryError::NotFound("team"))?;
            let member = queries::get_team_member(tx, &team_key, &user_key)?
                .ok_or(RegistryError::NotFound("team member"))?;
            if member.role != TeamRole::Leader.as_str() {
                return Err(RegistryError::Forbidden("only the leader may disband the team"));
            }
            queries::delete_team(tx, &team_key)?;
            Ok(team.name)
        })?;

        info!(%team_id, "team disbanded");
        self.notifier.dispatch(Notification::TeamDisbanded {
            team_id,
            team_name,
        });

        Ok(())
    }

    /// Post to the team chat. Members only — the membership check is the
    /// authorization rule, made explicit here instead of living in store
    /// policies.
    pub fn post_team_message(
        &self,
        actor: Actor,
        team_id: Uuid,
        body: &str,
    ) -> Result<TeamMessage, RegistryError> {
        let team_key = team_id.to_string();
        let user_key = actor.user_id.to_string();
        let message_id = Uuid::new_v4();

        self.db.with_tx(|tx| {
            if queries::get_team(tx, &team_key)?.is_none() {
                return Err(RegistryError::NotFound("team"));
            }
            if queries::get_team_member(tx, &team_key, &user_key)?.is_none() {
                return Err(RegistryError::Forbidden(
                    "only team members may post team messages",
                ));
            }
            queries::insert_team_message(tx, &message_id.to_string(), &team_key, &user_key, body)?;
            Ok(())
        })?;

        Ok(TeamMessage {
            id: message_id,
            team_id,
            author_id: actor.user_id,
            body: body.to_string(),
            created_at: chrono::Utc::now(),
        })
    }
}
