//! Row-to-model conversions. DB rows carry strings; the API models carry
//! Uuid/DateTime. A malformed stored value is a data-integrity failure, not
//! a caller error, so it surfaces as `Store`.

use anyhow::{Context, anyhow};
use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

use rally_db::models::{AnswerRow, RegistrationRow, TeamMemberRow, TeamRow};
use rally_types::models::{
    Answer, Registration, RegistrationStatus, Team, TeamMember, TeamRole,
};

use crate::error::RegistryError;

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, RegistryError> {
    Ok(s.parse::<Uuid>()
        .with_context(|| format!("malformed uuid in store: {s}"))?)
}

/// SQLite's datetime('now') produces "YYYY-MM-DD HH:MM:SS" in UTC.
pub(crate) fn parse_ts(s: &str) -> Result<DateTime<Utc>, RegistryError> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .with_context(|| format!("malformed timestamp in store: {s}"))?;
    Ok(naive.and_utc())
}

fn parse_opt_ts(s: &Option<String>) -> Result<Option<DateTime<Utc>>, RegistryError> {
    s.as_deref().map(parse_ts).transpose()
}

pub(crate) fn registration(row: &RegistrationRow) -> Result<Registration, RegistryError> {
    Ok(Registration {
        id: parse_uuid(&row.id)?,
        event_id: parse_uuid(&row.event_id)?,
        user_id: parse_uuid(&row.user_id)?,
        team_id: row.team_id.as_deref().map(parse_uuid).transpose()?,
        status: RegistrationStatus::parse(&row.status)
            .ok_or_else(|| anyhow!("unknown registration status: {}", row.status))?,
        registered_at: parse_ts(&row.registered_at)?,
        attended_at: parse_opt_ts(&row.attended_at)?,
        cancelled_at: parse_opt_ts(&row.cancelled_at)?,
    })
}

pub(crate) fn team(row: &TeamRow) -> Result<Team, RegistryError> {
    Ok(Team {
        id: parse_uuid(&row.id)?,
        event_id: parse_uuid(&row.event_id)?,
        name: row.name.clone(),
        creator_id: parse_uuid(&row.creator_id)?,
        max_members: u32::try_from(row.max_members).context("negative max_members in store")?,
        member_count: u32::try_from(row.member_count).context("negative member_count in store")?,
        created_at: parse_ts(&row.created_at)?,
    })
}

pub(crate) fn team_member(row: &TeamMemberRow) -> Result<TeamMember, RegistryError> {
    Ok(TeamMember {
        id: parse_uuid(&row.id)?,
        team_id: parse_uuid(&row.team_id)?,
        user_id: parse_uuid(&row.user_id)?,
        role: TeamRole::parse(&row.role)
            .ok_or_else(|| anyhow!("unknown team role: {}", row.role))?,
        joined_at: parse_ts(&row.joined_at)?,
    })
}

pub(crate) fn answer(row: &AnswerRow) -> Result<Answer, RegistryError> {
    Ok(Answer {
        id: parse_uuid(&row.id)?,
        question_id: parse_uuid(&row.question_id)?,
        author_id: parse_uuid(&row.author_id)?,
        body: row.body.clone(),
        is_accepted: row.is_accepted,
        created_at: parse_ts(&row.created_at)?,
    })
}
