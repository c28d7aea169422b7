//! Tally Synchronizer: vote tallies and `is_answered` always agree with
//! their fact rows.
//!
//! Casting a vote is an idempotent upsert: no prior vote inserts, a
//! same-type prior vote retracts, an opposite-type prior vote flips. The
//! row change and the tally adjustment are one unit of work in every case,
//! so no reader ever sees a tally that disagrees with the vote rows.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use rally_db::{Database, queries};
use rally_types::models::{Answer, VoteTarget, VoteType};

use crate::actor::Actor;
use crate::convert;
use crate::error::RegistryError;

/// What a cast did, plus the tallies after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    /// The user's vote on the target after the operation. None means the
    /// cast retracted an existing vote.
    pub vote: Option<VoteType>,
    pub upvotes: u32,
    pub downvotes: u32,
}

#[derive(Clone)]
pub struct TallyService {
    db: Arc<Database>,
}

impl TallyService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Cast, retract, or flip a vote. The target kind picks exactly one of
    /// post/comment; the votes table CHECK rejects anything else.
    pub fn cast_vote(
        &self,
        actor: Actor,
        target_id: Uuid,
        target_kind: VoteTarget,
        vote_type: VoteType,
    ) -> Result<VoteOutcome, RegistryError> {
        let target_key = target_id.to_string();
        let user_key = actor.user_id.to_string();
        let vote_id = Uuid::new_v4();

        self.db.with_tx(|tx| {
            if !queries::votable_exists(tx, target_kind, &target_key)? {
                return Err(RegistryError::NotFound("votable item"));
            }

            let prior = queries::find_vote(tx, &user_key, target_kind, &target_key)?;
            let vote_after = match prior {
                None => {
                    queries::insert_vote(
                        tx,
                        &vote_id.to_string(),
                        &user_key,
                        target_kind,
                        &target_key,
                        vote_type,
                    )?;
                    queries::bump_tally(tx, target_kind, &target_key, vote_type, 1)?;
                    Some(vote_type)
                }
                Some(existing) if existing.vote_type == vote_type.as_str() => {
                    // Same type again: retraction.
                    queries::delete_vote(tx, &existing.id)?;
                    queries::bump_tally(tx, target_kind, &target_key, vote_type, -1)?;
                    None
                }
                Some(existing) => {
                    // Opposite type: flip the row and move both tallies.
                    queries::set_vote_type(tx, &existing.id, vote_type)?;
                    queries::bump_tally(tx, target_kind, &target_key, vote_type.opposite(), -1)?;
                    queries::bump_tally(tx, target_kind, &target_key, vote_type, 1)?;
                    Some(vote_type)
                }
            };

            let (upvotes, downvotes) = queries::get_tally(tx, target_kind, &target_key)?
                .ok_or(RegistryError::NotFound("votable item"))?;

            Ok(VoteOutcome {
                vote: vote_after,
                upvotes: u32::try_from(upvotes).unwrap_or(0),
                downvotes: u32::try_from(downvotes).unwrap_or(0),
            })
        })
    }

    /// Post an answer; `is_answered` is recomputed in the same transaction
    /// as the insert, never deferred.
    pub fn post_answer(
        &self,
        actor: Actor,
        question_id: Uuid,
        body: &str,
    ) -> Result<Answer, RegistryError> {
        let question_key = question_id.to_string();
        let answer_id = Uuid::new_v4();

        let row = self.db.with_tx(|tx| {
            if queries::get_question(tx, &question_key)?.is_none() {
                return Err(RegistryError::NotFound("question"));
            }

            queries::insert_answer(
                tx,
                &answer_id.to_string(),
                &question_key,
                &actor.user_id.to_string(),
                body,
            )?;
            let answered = queries::question_has_answers(tx, &question_key)?;
            queries::set_question_answered(tx, &question_key, answered)?;

            queries::get_answer(tx, &answer_id.to_string())?
                .ok_or(RegistryError::NotFound("answer"))
        })?;

        info!(%question_id, %answer_id, "answer posted");
        convert::answer(&row)
    }

    /// Delete an answer (its author or the question's author). The
    /// `is_answered` recompute rides in the same transaction.
    pub fn delete_answer(&self, actor: Actor, answer_id: Uuid) -> Result<(), RegistryError> {
        let answer_key = answer_id.to_string();

        self.db.with_tx(|tx| {
            let answer = queries::get_answer(tx, &answer_key)?
                .ok_or(RegistryError::NotFound("answer"))?;
            let question = queries::get_question(tx, &answer.question_id)?
                .ok_or(RegistryError::NotFound("question"))?;

            if !actor.is(&answer.author_id) && !actor.is(&question.author_id) {
                return Err(RegistryError::Forbidden(
                    "only the answer author or the question author may delete an answer",
                ));
            }

            queries::delete_answer(tx, &answer_key)?;
            let answered = queries::question_has_answers(tx, &answer.question_id)?;
            queries::set_question_answered(tx, &answer.question_id, answered)?;
            Ok(())
        })
    }

    /// Accept an answer. Question author only. Acceptance marks the chosen
    /// answer; `is_answered` stays an existence property.
    pub fn accept_answer(&self, actor: Actor, answer_id: Uuid) -> Result<Answer, RegistryError> {
        let answer_key = answer_id.to_string();

        let row = self.db.with_tx(|tx| {
            let answer = queries::get_answer(tx, &answer_key)?
                .ok_or(RegistryError::NotFound("answer"))?;
            let question = queries::get_question(tx, &answer.question_id)?
                .ok_or(RegistryError::NotFound("question"))?;

            if !actor.is(&question.author_id) {
                return Err(RegistryError::Forbidden(
                    "only the question author may accept an answer",
                ));
            }

            queries::set_accepted_answer(tx, &answer.question_id, &answer_key)?;
            queries::get_answer(tx, &answer_key)?
                .ok_or(RegistryError::NotFound("answer"))
        })?;

        convert::answer(&row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        tallies: TallyService,
        db: Arc<Database>,
        post_id: Uuid,
        comment_id: Uuid,
        question_id: Uuid,
        question_author: Actor,
    }

    fn fixture() -> Fixture {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let tallies = TallyService::new(db.clone());

        let post_id = Uuid::new_v4();
        let comment_id = Uuid::new_v4();
        let question_id = Uuid::new_v4();
        let question_author = Actor::student(Uuid::new_v4());

        db.with_conn(|conn| {
            queries::insert_post(conn, &post_id.to_string(), "author", "title", "body")?;
            queries::insert_comment(
                conn,
                &comment_id.to_string(),
                &post_id.to_string(),
                "author",
                "body",
            )?;
            queries::insert_question(
                conn,
                &question_id.to_string(),
                None,
                &question_author.user_id.to_string(),
                "how?",
                "tell me",
            )?;
            Ok(())
        })
        .unwrap();

        Fixture {
            tallies,
            db,
            post_id,
            comment_id,
            question_id,
            question_author,
        }
    }

    fn tally(db: &Database, kind: VoteTarget, id: Uuid) -> (i64, i64) {
        db.get_tally(kind, &id.to_string()).unwrap().unwrap()
    }

    fn vote_rows(db: &Database, user: Actor, kind: VoteTarget, id: Uuid) -> i64 {
        db.with_conn(|conn| {
            Ok(queries::find_vote(conn, &user.user_id.to_string(), kind, &id.to_string())?
                .map_or(0, |_| 1))
        })
        .unwrap()
    }

    #[test]
    fn first_cast_inserts_and_increments() {
        let f = fixture();
        let alice = Actor::student(Uuid::new_v4());

        let out = f
            .tallies
            .cast_vote(alice, f.post_id, VoteTarget::Post, VoteType::Up)
            .unwrap();
        assert_eq!(out.vote, Some(VoteType::Up));
        assert_eq!((out.upvotes, out.downvotes), (1, 0));
        assert_eq!(tally(&f.db, VoteTarget::Post, f.post_id), (1, 0));
    }

    #[test]
    fn same_type_again_retracts() {
        let f = fixture();
        let alice = Actor::student(Uuid::new_v4());

        f.tallies
            .cast_vote(alice, f.post_id, VoteTarget::Post, VoteType::Up)
            .unwrap();
        let out = f
            .tallies
            .cast_vote(alice, f.post_id, VoteTarget::Post, VoteType::Up)
            .unwrap();

        assert_eq!(out.vote, None);
        assert_eq!(tally(&f.db, VoteTarget::Post, f.post_id), (0, 0));
        assert_eq!(vote_rows(&f.db, alice, VoteTarget::Post, f.post_id), 0);
    }

    #[test]
    fn opposite_type_flips_atomically() {
        // Post starts (0,0); up -> (1,0); down -> (0,1), one row, type=down
        let f = fixture();
        let alice = Actor::student(Uuid::new_v4());

        f.tallies
            .cast_vote(alice, f.post_id, VoteTarget::Post, VoteType::Up)
            .unwrap();
        let out = f
            .tallies
            .cast_vote(alice, f.post_id, VoteTarget::Post, VoteType::Down)
            .unwrap();

        assert_eq!(out.vote, Some(VoteType::Down));
        assert_eq!(tally(&f.db, VoteTarget::Post, f.post_id), (0, 1));
        assert_eq!(vote_rows(&f.db, alice, VoteTarget::Post, f.post_id), 1);

        let stored = f
            .db
            .with_conn(|conn| {
                queries::find_vote(
                    conn,
                    &alice.user_id.to_string(),
                    VoteTarget::Post,
                    &f.post_id.to_string(),
                )
            })
            .unwrap()
            .unwrap();
        assert_eq!(stored.vote_type, "down");
    }

    #[test]
    fn votes_on_comments_track_separately() {
        let f = fixture();
        let alice = Actor::student(Uuid::new_v4());

        f.tallies
            .cast_vote(alice, f.comment_id, VoteTarget::Comment, VoteType::Down)
            .unwrap();
        assert_eq!(tally(&f.db, VoteTarget::Comment, f.comment_id), (0, 1));
        assert_eq!(tally(&f.db, VoteTarget::Post, f.post_id), (0, 0));
    }

    #[test]
    fn tallies_match_rows_after_many_users() {
        let f = fixture();

        for _ in 0..4 {
            f.tallies
                .cast_vote(
                    Actor::student(Uuid::new_v4()),
                    f.post_id,
                    VoteTarget::Post,
                    VoteType::Up,
                )
                .unwrap();
        }
        for _ in 0..2 {
            f.tallies
                .cast_vote(
                    Actor::student(Uuid::new_v4()),
                    f.post_id,
                    VoteTarget::Post,
                    VoteType::Down,
                )
                .unwrap();
        }

        assert_eq!(tally(&f.db, VoteTarget::Post, f.post_id), (4, 2));
        let ups = f
            .db
            .with_conn(|conn| {
                queries::count_votes(conn, VoteTarget::Post, &f.post_id.to_string(), VoteType::Up)
            })
            .unwrap();
        assert_eq!(ups, 4);
    }

    #[test]
    fn answer_flow_keeps_is_answered_exact() {
        let f = fixture();
        let alice = Actor::student(Uuid::new_v4());

        let is_answered = |db: &Database| {
            db.with_conn(|conn| {
                Ok(queries::get_question(conn, &f.question_id.to_string())?
                    .unwrap()
                    .is_answered)
            })
            .unwrap()
        };

        assert!(!is_answered(&f.db));

        let a1 = f.tallies.post_answer(alice, f.question_id, "try X").unwrap();
        assert!(is_answered(&f.db));

        let bob = Actor::student(Uuid::new_v4());
        let a2 = f.tallies.post_answer(bob, f.question_id, "try Y").unwrap();

        f.tallies.delete_answer(alice, a1.id).unwrap();
        // one answer left
        assert!(is_answered(&f.db));

        f.tallies.delete_answer(bob, a2.id).unwrap();
        assert!(!is_answered(&f.db));
    }

    #[test]
    fn answer_deletion_authorization() {
        let f = fixture();
        let alice = Actor::student(Uuid::new_v4());
        let mallory = Actor::student(Uuid::new_v4());

        let answer = f.tallies.post_answer(alice, f.question_id, "try X").unwrap();
        assert!(matches!(
            f.tallies.delete_answer(mallory, answer.id),
            Err(RegistryError::Forbidden(_))
        ));
        // the question author may also delete
        f.tallies.delete_answer(f.question_author, answer.id).unwrap();
    }

    #[test]
    fn accept_answer_is_question_author_only() {
        let f = fixture();
        let alice = Actor::student(Uuid::new_v4());

        let answer = f.tallies.post_answer(alice, f.question_id, "try X").unwrap();
        assert!(matches!(
            f.tallies.accept_answer(alice, answer.id),
            Err(RegistryError::Forbidden(_))
        ));

        let accepted = f.tallies.accept_answer(f.question_author, answer.id).unwrap();
        assert!(accepted.is_accepted);

        // accepting another answer moves the mark
        let second = f
            .tallies
            .post_answer(Actor::student(Uuid::new_v4()), f.question_id, "try Y")
            .unwrap();
        f.tallies.accept_answer(f.question_author, second.id).unwrap();
        let first_again = f
            .db
            .with_conn(|conn| queries::get_answer(conn, &answer.id.to_string()))
            .unwrap()
            .unwrap();
        assert!(!first_again.is_accepted);
    }
}
