use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS events (
            id                  TEXT PRIMARY KEY,
            title               TEXT NOT NULL,
            organizer_id        TEXT NOT NULL,
            capacity            INTEGER NOT NULL CHECK (capacity > 0),
            registered_count    INTEGER NOT NULL DEFAULT 0 CHECK (registered_count >= 0),
            created_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS registrations (
            id              TEXT PRIMARY KEY,
            event_id        TEXT NOT NULL REFERENCES events(id),
            user_id         TEXT NOT NULL,
            team_id         TEXT REFERENCES teams(id) ON DELETE SET NULL,
            status          TEXT NOT NULL CHECK (status IN ('registered', 'attended', 'cancelled')),
            registered_at   TEXT NOT NULL DEFAULT (datetime('now')),
            attended_at     TEXT,
            cancelled_at    TEXT
        );

        -- At most one non-cancelled registration per (event, user).
        -- Cancelled rows stay behind as history and never block re-registration.
        CREATE UNIQUE INDEX IF NOT EXISTS idx_registrations_active
            ON registrations(event_id, user_id)
            WHERE status != 'cancelled';

        CREATE INDEX IF NOT EXISTS idx_registrations_event
            ON registrations(event_id, status);

        CREATE TABLE IF NOT EXISTS teams (
            id              TEXT PRIMARY KEY,
            event_id        TEXT NOT NULL REFERENCES events(id),
            name            TEXT NOT NULL,
            creator_id      TEXT NOT NULL,
            max_members     INTEGER NOT NULL DEFAULT 5 CHECK (max_members > 0),
            member_count    INTEGER NOT NULL DEFAULT 0 CHECK (member_count >= 0),
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS team_members (
            id          TEXT PRIMARY KEY,
            team_id     TEXT NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
            user_id     TEXT NOT NULL,
            role        TEXT NOT NULL CHECK (role IN ('leader', 'member')),
            joined_at   TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(team_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_team_members_team
            ON team_members(team_id);

        CREATE TABLE IF NOT EXISTS team_messages (
            id          TEXT PRIMARY KEY,
            team_id     TEXT NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
            author_id   TEXT NOT NULL,
            body        TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS posts (
            id          TEXT PRIMARY KEY,
            author_id   TEXT NOT NULL,
            title       TEXT NOT NULL,
            body        TEXT NOT NULL,
            upvotes     INTEGER NOT NULL DEFAULT 0 CHECK (upvotes >= 0),
            downvotes   INTEGER NOT NULL DEFAULT 0 CHECK (downvotes >= 0),
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS comments (
            id          TEXT PRIMARY KEY,
            post_id     TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            author_id   TEXT NOT NULL,
            body        TEXT NOT NULL,
            upvotes     INTEGER NOT NULL DEFAULT 0 CHECK (upvotes >= 0),
            downvotes   INTEGER NOT NULL DEFAULT 0 CHECK (downvotes >= 0),
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- A vote references exactly one of post_id / comment_id.
        CREATE TABLE IF NOT EXISTS votes (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL,
            post_id     TEXT REFERENCES posts(id) ON DELETE CASCADE,
            comment_id  TEXT REFERENCES comments(id) ON DELETE CASCADE,
            vote_type   TEXT NOT NULL CHECK (vote_type IN ('up', 'down')),
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            CHECK ((post_id IS NULL) != (comment_id IS NULL)),
            UNIQUE(user_id, post_id),
            UNIQUE(user_id, comment_id)
        );

        CREATE TABLE IF NOT EXISTS questions (
            id          TEXT PRIMARY KEY,
            event_id    TEXT REFERENCES events(id),
            author_id   TEXT NOT NULL,
            title       TEXT NOT NULL,
            body        TEXT NOT NULL,
            is_answered INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS answers (
            id          TEXT PRIMARY KEY,
            question_id TEXT NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
            author_id   TEXT NOT NULL,
            body        TEXT NOT NULL,
            is_accepted INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_answers_question
            ON answers(question_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
