use crate::Database;
use crate::models::{AnswerRow, EventRow, QuestionRow, RegistrationRow, TeamMemberRow, TeamRow, VoteRow};
use anyhow::Result;
use rusqlite::{Connection, params};

use rally_types::models::{VoteTarget, VoteType};

// Free functions take a `&Connection` so they compose inside a transaction
// (`rusqlite::Transaction` derefs to `Connection`). The `impl Database`
// methods below are single-statement convenience reads.

// -- Events --

pub fn insert_event(
    conn: &Connection,
    id: &str,
    title: &str,
    organizer_id: &str,
    capacity: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO events (id, title, organizer_id, capacity) VALUES (?1, ?2, ?3, ?4)",
        params![id, title, organizer_id, capacity],
    )?;
    Ok(())
}

pub fn get_event(conn: &Connection, id: &str) -> Result<Option<EventRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, organizer_id, capacity, registered_count, created_at
         FROM events WHERE id = ?1",
    )?;

    let row = stmt
        .query_row([id], |row| {
            Ok(EventRow {
                id: row.get(0)?,
                title: row.get(1)?,
                organizer_id: row.get(2)?,
                capacity: row.get(3)?,
                registered_count: row.get(4)?,
                created_at: row.get(5)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Increment `registered_count` only while it is below capacity.
/// Returns false when the event is full (zero rows updated). This is the
/// race-free ceiling check: the comparison happens inside the UPDATE itself,
/// never in application code against a previously-read value.
pub fn reserve_event_slot(conn: &Connection, event_id: &str) -> Result<bool> {
    let n = conn.execute(
        "UPDATE events SET registered_count = registered_count + 1
         WHERE id = ?1 AND registered_count < capacity",
        [event_id],
    )?;
    Ok(n == 1)
}

/// Decrement `registered_count`, floored at zero by the WHERE guard.
pub fn release_event_slot(conn: &Connection, event_id: &str) -> Result<bool> {
    let n = conn.execute(
        "UPDATE events SET registered_count = registered_count - 1
         WHERE id = ?1 AND registered_count > 0",
        [event_id],
    )?;
    Ok(n == 1)
}

/// Change capacity. Lowering below the current registered_count is refused
/// by the WHERE clause; returns false in that case.
pub fn set_event_capacity(conn: &Connection, event_id: &str, capacity: i64) -> Result<bool> {
    let n = conn.execute(
        "UPDATE events SET capacity = ?2
         WHERE id = ?1 AND registered_count <= ?2",
        params![event_id, capacity],
    )?;
    Ok(n == 1)
}

pub fn count_active_registrations(conn: &Connection, event_id: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM registrations
         WHERE event_id = ?1 AND status IN ('registered', 'attended')",
        [event_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn set_registered_count(conn: &Connection, event_id: &str, count: i64) -> Result<()> {
    conn.execute(
        "UPDATE events SET registered_count = ?2 WHERE id = ?1",
        params![event_id, count],
    )?;
    Ok(())
}

// -- Registrations --

pub fn insert_registration(
    conn: &Connection,
    id: &str,
    event_id: &str,
    user_id: &str,
    team_id: Option<&str>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO registrations (id, event_id, user_id, team_id, status)
         VALUES (?1, ?2, ?3, ?4, 'registered')",
        params![id, event_id, user_id, team_id],
    )?;
    Ok(())
}

pub fn get_registration(conn: &Connection, id: &str) -> Result<Option<RegistrationRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, event_id, user_id, team_id, status, registered_at, attended_at, cancelled_at
         FROM registrations WHERE id = ?1",
    )?;

    let row = stmt.query_row([id], map_registration).optional()?;
    Ok(row)
}

pub fn find_active_registration(
    conn: &Connection,
    event_id: &str,
    user_id: &str,
) -> Result<Option<RegistrationRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, event_id, user_id, team_id, status, registered_at, attended_at, cancelled_at
         FROM registrations
         WHERE event_id = ?1 AND user_id = ?2 AND status != 'cancelled'",
    )?;

    let row = stmt.query_row([event_id, user_id], map_registration).optional()?;
    Ok(row)
}

pub fn mark_registration_attended(conn: &Connection, id: &str) -> Result<()> {
    conn.execute(
        "UPDATE registrations SET status = 'attended', attended_at = datetime('now')
         WHERE id = ?1",
        [id],
    )?;
    Ok(())
}

pub fn mark_registration_cancelled(conn: &Connection, id: &str) -> Result<()> {
    conn.execute(
        "UPDATE registrations SET status = 'cancelled', cancelled_at = datetime('now')
         WHERE id = ?1",
        [id],
    )?;
    Ok(())
}

fn map_registration(row: &rusqlite::Row<'_>) -> rusqlite::Result<RegistrationRow> {
    Ok(RegistrationRow {
        id: row.get(0)?,
        event_id: row.get(1)?,
        user_id: row.get(2)?,
        team_id: row.get(3)?,
        status: row.get(4)?,
        registered_at: row.get(5)?,
        attended_at: row.get(6)?,
        cancelled_at: row.get(7)?,
    })
}

// -- Teams --

pub fn insert_team(
    conn: &Connection,
    id: &str,
    event_id: &str,
    name: &str,
    creator_id: &str,
    max_members: i64,
    member_count: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO teams (id, event_id, name, creator_id, max_members, member_count)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![id, event_id, name, creator_id, max_members, member_count],
    )?;
    Ok(())
}

pub fn get_team(conn: &Connection, id: &str) -> Result<Option<TeamRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, event_id, name, creator_id, max_members, member_count, created_at
         FROM teams WHERE id = ?1",
    )?;

    let row = stmt
        .query_row([id], |row| {
            Ok(TeamRow {
                id: row.get(0)?,
                event_id: row.get(1)?,
                name: row.get(2)?,
                creator_id: row.get(3)?,
                max_members: row.get(4)?,
                member_count: row.get(5)?,
                created_at: row.get(6)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Increment `member_count` only while it is below `max_members`.
/// Same ceiling discipline as `reserve_event_slot`.
pub fn reserve_team_slot(conn: &Connection, team_id: &str) -> Result<bool> {
    let n = conn.execute(
        "UPDATE teams SET member_count = member_count + 1
         WHERE id = ?1 AND member_count < max_members",
        [team_id],
    )?;
    Ok(n == 1)
}

pub fn release_team_slot(conn: &Connection, team_id: &str) -> Result<bool> {
    let n = conn.execute(
        "UPDATE teams SET member_count = member_count - 1
         WHERE id = ?1 AND member_count > 0",
        [team_id],
    )?;
    Ok(n == 1)
}

pub fn set_member_count(conn: &Connection, team_id: &str, count: i64) -> Result<()> {
    conn.execute(
        "UPDATE teams SET member_count = ?2 WHERE id = ?1",
        params![team_id, count],
    )?;
    Ok(())
}

pub fn insert_team_member(
    conn: &Connection,
    id: &str,
    team_id: &str,
    user_id: &str,
    role: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO team_members (id, team_id, user_id, role) VALUES (?1, ?2, ?3, ?4)",
        params![id, team_id, user_id, role],
    )?;
    Ok(())
}

pub fn get_team_member(
    conn: &Connection,
    team_id: &str,
    user_id: &str,
) -> Result<Option<TeamMemberRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, team_id, user_id, role, joined_at
         FROM team_members WHERE team_id = ?1 AND user_id = ?2",
    )?;

    let row = stmt
        .query_row([team_id, user_id], |row| {
            Ok(TeamMemberRow {
                id: row.get(0)?,
                team_id: row.get(1)?,
                user_id: row.get(2)?,
                role: row.get(3)?,
                joined_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

pub fn delete_team_member(conn: &Connection, team_id: &str, user_id: &str) -> Result<bool> {
    let n = conn.execute(
        "DELETE FROM team_members WHERE team_id = ?1 AND user_id = ?2",
        [team_id, user_id],
    )?;
    Ok(n == 1)
}

pub fn count_team_members(conn: &Connection, team_id: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM team_members WHERE team_id = ?1",
        [team_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn team_has_other_members(conn: &Connection, team_id: &str, user_id: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM team_members WHERE team_id = ?1 AND user_id != ?2",
        [team_id, user_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn set_team_member_role(
    conn: &Connection,
    team_id: &str,
    user_id: &str,
    role: &str,
) -> Result<()> {
    conn.execute(
        "UPDATE team_members SET role = ?3 WHERE team_id = ?1 AND user_id = ?2",
        params![team_id, user_id, role],
    )?;
    Ok(())
}

/// Delete the team row. Member and message rows go with it via the
/// ON DELETE CASCADE foreign keys.
pub fn delete_team(conn: &Connection, team_id: &str) -> Result<()> {
    conn.execute("DELETE FROM teams WHERE id = ?1", [team_id])?;
    Ok(())
}

/// The team (if any) the user already belongs to for a given event.
pub fn user_team_for_event(
    conn: &Connection,
    event_id: &str,
    user_id: &str,
) -> Result<Option<String>> {
    let row = conn
        .query_row(
            "SELECT t.id FROM team_members tm
             JOIN teams t ON tm.team_id = t.id
             WHERE t.event_id = ?1 AND tm.user_id = ?2",
            [event_id, user_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(row)
}

pub fn insert_team_message(
    conn: &Connection,
    id: &str,
    team_id: &str,
    author_id: &str,
    body: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO team_messages (id, team_id, author_id, body) VALUES (?1, ?2, ?3, ?4)",
        params![id, team_id, author_id, body],
    )?;
    Ok(())
}

// -- Votes --

fn votable_table(kind: VoteTarget) -> &'static str {
    match kind {
        VoteTarget::Post => "posts",
        VoteTarget::Comment => "comments",
    }
}

fn vote_fk_column(kind: VoteTarget) -> &'static str {
    match kind {
        VoteTarget::Post => "post_id",
        VoteTarget::Comment => "comment_id",
    }
}

fn tally_column(vote_type: VoteType) -> &'static str {
    match vote_type {
        VoteType::Up => "upvotes",
        VoteType::Down => "downvotes",
    }
}

pub fn votable_exists(conn: &Connection, kind: VoteTarget, id: &str) -> Result<bool> {
    let sql = format!("SELECT COUNT(*) FROM {} WHERE id = ?1", votable_table(kind));
    let count: i64 = conn.query_row(&sql, [id], |row| row.get(0))?;
    Ok(count > 0)
}

pub fn get_tally(conn: &Connection, kind: VoteTarget, id: &str) -> Result<Option<(i64, i64)>> {
    let sql = format!(
        "SELECT upvotes, downvotes FROM {} WHERE id = ?1",
        votable_table(kind)
    );
    let row = conn
        .query_row(&sql, [id], |row| Ok((row.get(0)?, row.get(1)?)))
        .optional()?;
    Ok(row)
}

pub fn find_vote(
    conn: &Connection,
    user_id: &str,
    kind: VoteTarget,
    target_id: &str,
) -> Result<Option<VoteRow>> {
    let sql = format!(
        "SELECT id, user_id, post_id, comment_id, vote_type
         FROM votes WHERE user_id = ?1 AND {} = ?2",
        vote_fk_column(kind)
    );

    let row = conn
        .query_row(&sql, [user_id, target_id], |row| {
            Ok(VoteRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                post_id: row.get(2)?,
                comment_id: row.get(3)?,
                vote_type: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

pub fn insert_vote(
    conn: &Connection,
    id: &str,
    user_id: &str,
    kind: VoteTarget,
    target_id: &str,
    vote_type: VoteType,
) -> Result<()> {
    let sql = format!(
        "INSERT INTO votes (id, user_id, {}, vote_type) VALUES (?1, ?2, ?3, ?4)",
        vote_fk_column(kind)
    );
    conn.execute(&sql, params![id, user_id, target_id, vote_type.as_str()])?;
    Ok(())
}

pub fn delete_vote(conn: &Connection, vote_id: &str) -> Result<()> {
    conn.execute("DELETE FROM votes WHERE id = ?1", [vote_id])?;
    Ok(())
}

pub fn set_vote_type(conn: &Connection, vote_id: &str, vote_type: VoteType) -> Result<()> {
    conn.execute(
        "UPDATE votes SET vote_type = ?2 WHERE id = ?1",
        params![vote_id, vote_type.as_str()],
    )?;
    Ok(())
}

/// Adjust one tally column by `delta`, floored at zero.
pub fn bump_tally(
    conn: &Connection,
    kind: VoteTarget,
    target_id: &str,
    vote_type: VoteType,
    delta: i64,
) -> Result<()> {
    let col = tally_column(vote_type);
    let sql = format!(
        "UPDATE {} SET {col} = MAX(0, {col} + ?2) WHERE id = ?1",
        votable_table(kind)
    );
    conn.execute(&sql, params![target_id, delta])?;
    Ok(())
}

pub fn count_votes(
    conn: &Connection,
    kind: VoteTarget,
    target_id: &str,
    vote_type: VoteType,
) -> Result<i64> {
    let sql = format!(
        "SELECT COUNT(*) FROM votes WHERE {} = ?1 AND vote_type = ?2",
        vote_fk_column(kind)
    );
    let count = conn.query_row(&sql, params![target_id, vote_type.as_str()], |row| row.get(0))?;
    Ok(count)
}

pub fn set_tally(
    conn: &Connection,
    kind: VoteTarget,
    target_id: &str,
    upvotes: i64,
    downvotes: i64,
) -> Result<()> {
    let sql = format!(
        "UPDATE {} SET upvotes = ?2, downvotes = ?3 WHERE id = ?1",
        votable_table(kind)
    );
    conn.execute(&sql, params![target_id, upvotes, downvotes])?;
    Ok(())
}

pub fn insert_post(conn: &Connection, id: &str, author_id: &str, title: &str, body: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO posts (id, author_id, title, body) VALUES (?1, ?2, ?3, ?4)",
        params![id, author_id, title, body],
    )?;
    Ok(())
}

pub fn insert_comment(
    conn: &Connection,
    id: &str,
    post_id: &str,
    author_id: &str,
    body: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO comments (id, post_id, author_id, body) VALUES (?1, ?2, ?3, ?4)",
        params![id, post_id, author_id, body],
    )?;
    Ok(())
}

// -- Q&A --

pub fn insert_question(
    conn: &Connection,
    id: &str,
    event_id: Option<&str>,
    author_id: &str,
    title: &str,
    body: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO questions (id, event_id, author_id, title, body) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, event_id, author_id, title, body],
    )?;
    Ok(())
}

pub fn get_question(conn: &Connection, id: &str) -> Result<Option<QuestionRow>> {
    let row = conn
        .query_row(
            "SELECT id, author_id, is_answered FROM questions WHERE id = ?1",
            [id],
            |row| {
                Ok(QuestionRow {
                    id: row.get(0)?,
                    author_id: row.get(1)?,
                    is_answered: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

pub fn insert_answer(
    conn: &Connection,
    id: &str,
    question_id: &str,
    author_id: &str,
    body: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO answers (id, question_id, author_id, body) VALUES (?1, ?2, ?3, ?4)",
        params![id, question_id, author_id, body],
    )?;
    Ok(())
}

pub fn get_answer(conn: &Connection, id: &str) -> Result<Option<AnswerRow>> {
    let row = conn
        .query_row(
            "SELECT id, question_id, author_id, body, is_accepted, created_at
             FROM answers WHERE id = ?1",
            [id],
            |row| {
                Ok(AnswerRow {
                    id: row.get(0)?,
                    question_id: row.get(1)?,
                    author_id: row.get(2)?,
                    body: row.get(3)?,
                    is_accepted: row.get(4)?,
                    created_at: row.get(5)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

pub fn delete_answer(conn: &Connection, id: &str) -> Result<bool> {
    let n = conn.execute("DELETE FROM answers WHERE id = ?1", [id])?;
    Ok(n == 1)
}

pub fn question_has_answers(conn: &Connection, question_id: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM answers WHERE question_id = ?1",
        [question_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn set_question_answered(conn: &Connection, question_id: &str, answered: bool) -> Result<()> {
    conn.execute(
        "UPDATE questions SET is_answered = ?2 WHERE id = ?1",
        params![question_id, answered],
    )?;
    Ok(())
}

pub fn set_accepted_answer(conn: &Connection, question_id: &str, answer_id: &str) -> Result<()> {
    conn.execute(
        "UPDATE answers SET is_accepted = 0 WHERE question_id = ?1",
        [question_id],
    )?;
    conn.execute("UPDATE answers SET is_accepted = 1 WHERE id = ?1", [answer_id])?;
    Ok(())
}

// -- Convenience reads on the shared handle --

impl Database {
    pub fn get_event(&self, id: &str) -> Result<Option<EventRow>> {
        self.with_conn(|conn| get_event(conn, id))
    }

    pub fn get_registration(&self, id: &str) -> Result<Option<RegistrationRow>> {
        self.with_conn(|conn| get_registration(conn, id))
    }

    pub fn get_team(&self, id: &str) -> Result<Option<TeamRow>> {
        self.with_conn(|conn| get_team(conn, id))
    }

    pub fn get_tally(&self, kind: VoteTarget, id: &str) -> Result<Option<(i64, i64)>> {
        self.with_conn(|conn| get_tally(conn, kind, id))
    }
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn reserve_slot_respects_ceiling() {
        let db = db();
        db.with_conn(|conn| {
            insert_event(conn, "e1", "Hack Night", "org", 2)?;
            assert!(reserve_event_slot(conn, "e1")?);
            assert!(reserve_event_slot(conn, "e1")?);
            // full now
            assert!(!reserve_event_slot(conn, "e1")?);
            let ev = get_event(conn, "e1")?.unwrap();
            assert_eq!(ev.registered_count, 2);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn release_slot_floors_at_zero() {
        let db = db();
        db.with_conn(|conn| {
            insert_event(conn, "e1", "Hack Night", "org", 2)?;
            assert!(!release_event_slot(conn, "e1")?);
            assert!(reserve_event_slot(conn, "e1")?);
            assert!(release_event_slot(conn, "e1")?);
            assert!(!release_event_slot(conn, "e1")?);
            let ev = get_event(conn, "e1")?.unwrap();
            assert_eq!(ev.registered_count, 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn capacity_cannot_drop_below_registered() {
        let db = db();
        db.with_conn(|conn| {
            insert_event(conn, "e1", "Hack Night", "org", 5)?;
            reserve_event_slot(conn, "e1")?;
            reserve_event_slot(conn, "e1")?;
            reserve_event_slot(conn, "e1")?;
            assert!(!set_event_capacity(conn, "e1", 2)?);
            assert!(set_event_capacity(conn, "e1", 3)?);
            assert!(set_event_capacity(conn, "e1", 10)?);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn active_registration_index_allows_reregistration() {
        let db = db();
        db.with_conn(|conn| {
            insert_event(conn, "e1", "Hack Night", "org", 5)?;
            insert_registration(conn, "r1", "e1", "u1", None)?;
            // second active row for the same (event, user) violates the index
            assert!(insert_registration(conn, "r2", "e1", "u1", None).is_err());
            mark_registration_cancelled(conn, "r1")?;
            // cancelled history no longer blocks
            insert_registration(conn, "r3", "e1", "u1", None)?;
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn team_slot_ceiling() {
        let db = db();
        db.with_conn(|conn| {
            insert_event(conn, "e1", "Hack Night", "org", 5)?;
            insert_team(conn, "t1", "e1", "Rustaceans", "u1", 2, 1)?;
            assert!(reserve_team_slot(conn, "t1")?);
            assert!(!reserve_team_slot(conn, "t1")?);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn team_delete_cascades() {
        let db = db();
        db.with_conn(|conn| {
            insert_event(conn, "e1", "Hack Night", "org", 5)?;
            insert_team(conn, "t1", "e1", "Rustaceans", "u1", 5, 1)?;
            insert_team_member(conn, "m1", "t1", "u1", "leader")?;
            insert_team_message(conn, "msg1", "t1", "u1", "hello")?;
            delete_team(conn, "t1")?;
            assert_eq!(count_team_members(conn, "t1")?, 0);
            let msgs: i64 = conn.query_row(
                "SELECT COUNT(*) FROM team_messages WHERE team_id = 't1'",
                [],
                |row| row.get(0),
            )?;
            assert_eq!(msgs, 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn vote_must_reference_exactly_one_target() {
        let db = db();
        db.with_conn(|conn| {
            insert_post(conn, "p1", "u1", "title", "body")?;
            insert_comment(conn, "c1", "p1", "u1", "body")?;
            // neither target
            let neither = conn.execute(
                "INSERT INTO votes (id, user_id, vote_type) VALUES ('v1', 'u1', 'up')",
                [],
            );
            assert!(neither.is_err());
            // both targets
            let both = conn.execute(
                "INSERT INTO votes (id, user_id, post_id, comment_id, vote_type)
                 VALUES ('v2', 'u1', 'p1', 'c1', 'up')",
                [],
            );
            assert!(both.is_err());
            insert_vote(conn, "v3", "u1", VoteTarget::Post, "p1", VoteType::Up)?;
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn bump_tally_floors_at_zero() {
        let db = db();
        db.with_conn(|conn| {
            insert_post(conn, "p1", "u1", "title", "body")?;
            bump_tally(conn, VoteTarget::Post, "p1", VoteType::Up, -1)?;
            assert_eq!(get_tally(conn, VoteTarget::Post, "p1")?, Some((0, 0)));
            bump_tally(conn, VoteTarget::Post, "p1", VoteType::Up, 1)?;
            bump_tally(conn, VoteTarget::Post, "p1", VoteType::Down, 1)?;
            assert_eq!(get_tally(conn, VoteTarget::Post, "p1")?, Some((1, 1)));
            Ok(())
        })
        .unwrap();
    }
}
