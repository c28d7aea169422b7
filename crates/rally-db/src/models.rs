/// Database row types — these map directly to SQLite rows.
/// Distinct from rally-types API models to keep the DB layer independent.

pub struct EventRow {
    pub id: String,
    pub title: String,
    pub organizer_id: String,
    pub capacity: i64,
    pub registered_count: i64,
    pub created_at: String,
}

pub struct RegistrationRow {
    pub id: String,
    pub event_id: String,
    pub user_id: String,
    pub team_id: Option<String>,
    pub status: String,
    pub registered_at: String,
    pub attended_at: Option<String>,
    pub cancelled_at: Option<String>,
}

pub struct TeamRow {
    pub id: String,
    pub event_id: String,
    pub name: String,
    pub creator_id: String,
    pub max_members: i64,
    pub member_count: i64,
    pub created_at: String,
}

pub struct TeamMemberRow {
    pub id: String,
    pub team_id: String,
    pub user_id: String,
    pub role: String,
    pub joined_at: String,
}

pub struct VoteRow {
    pub id: String,
    pub user_id: String,
    pub post_id: Option<String>,
    pub comment_id: Option<String>,
    pub vote_type: String,
}

pub struct QuestionRow {
    pub id: String,
    pub author_id: String,
    pub is_answered: bool,
}

pub struct AnswerRow {
    pub id: String,
    pub question_id: String,
    pub author_id: String,
    pub body: String,
    pub is_accepted: bool,
    pub created_at: String,
}
