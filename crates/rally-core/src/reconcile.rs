//! Counter Reconciliation: the correctness backstop.
//!
//! Recomputes a derived counter from its fact rows inside the same
//! IMMEDIATE-transaction discipline as the write path and overwrites the
//! stored value when they disagree. Drift means some write path has a
//! latent bug, so every repair is logged as a data-integrity event rather
//! than silently absorbed. Safe to run at any time alongside live traffic.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use rally_db::{Database, queries};
use rally_types::models::{VoteTarget, VoteType};

use crate::error::RegistryError;

/// One stored-vs-actual comparison.
#[derive(Debug, Clone)]
pub struct CounterDrift {
    pub counter: &'static str,
    pub stored: i64,
    pub actual: i64,
}

impl CounterDrift {
    fn drifted(&self) -> bool {
        self.stored != self.actual
    }
}

/// Result of reconciling one aggregate.
#[derive(Debug, Clone)]
pub struct Drift {
    pub counters: Vec<CounterDrift>,
}

impl Drift {
    pub fn detected(&self) -> bool {
        self.counters.iter().any(CounterDrift::drifted)
    }
}

#[derive(Clone)]
pub struct Reconciler {
    db: Arc<Database>,
}

impl Reconciler {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn reconcile_event(&self, event_id: Uuid) -> Result<Drift, RegistryError> {
        let key = event_id.to_string();
        self.db.with_tx(|tx| {
            let event = queries::get_event(tx, &key)?.ok_or(RegistryError::NotFound("event"))?;
            let actual = queries::count_active_registrations(tx, &key)?;

            let check = CounterDrift {
                counter: "registered_count",
                stored: event.registered_count,
                actual,
            };
            if check.drifted() {
                warn!(
                    event_id = %key,
                    stored = check.stored,
                    actual = check.actual,
                    "registered_count drift detected, repairing"
                );
                queries::set_registered_count(tx, &key, actual)?;
            }

            Ok(Drift {
                counters: vec![check],
            })
        })
    }

    pub fn reconcile_team(&self, team_id: Uuid) -> Result<Drift, RegistryError> {
        let key = team_id.to_string();
        self.db.with_tx(|tx| {
            let team = queries::get_team(tx, &key)?.ok_or(RegistryError::NotFound("team"))?;
            let actual = queries::count_team_members(tx, &key)?;

            let check = CounterDrift {
                counter: "member_count",
                stored: team.member_count,
                actual,
            };
            if check.drifted() {
                warn!(
                    team_id = %key,
                    stored = check.stored,
                    actual = check.actual,
                    "member_count drift detected, repairing"
                );
                queries::set_member_count(tx, &key, actual)?;
            }

            Ok(Drift {
                counters: vec![check],
            })
        })
    }

    pub fn reconcile_votable(
        &self,
        target_id: Uuid,
        kind: VoteTarget,
    ) -> Result<Drift, RegistryError> {
        let key = target_id.to_string();
        self.db.with_tx(|tx| {
            let (stored_up, stored_down) = queries::get_tally(tx, kind, &key)?
                .ok_or(RegistryError::NotFound("votable item"))?;
            let actual_up = queries::count_votes(tx, kind, &key, VoteType::Up)?;
            let actual_down = queries::count_votes(tx, kind, &key, VoteType::Down)?;

            let checks = vec![
                CounterDrift {
                    counter: "upvotes",
                    stored: stored_up,
                    actual: actual_up,
                },
                CounterDrift {
                    counter: "downvotes",
                    stored: stored_down,
                    actual: actual_down,
                },
            ];
            if checks.iter().any(CounterDrift::drifted) {
                warn!(
                    target_id = %key,
                    kind = kind.as_str(),
                    stored_up,
                    stored_down,
                    actual_up,
                    actual_down,
                    "vote tally drift detected, repairing"
                );
                queries::set_tally(tx, kind, &key, actual_up, actual_down)?;
            }

            Ok(Drift { counters: checks })
        })
    }

    pub fn reconcile_question(&self, question_id: Uuid) -> Result<Drift, RegistryError> {
        let key = question_id.to_string();
        self.db.with_tx(|tx| {
            let question =
                queries::get_question(tx, &key)?.ok_or(RegistryError::NotFound("question"))?;
            let actual = queries::question_has_answers(tx, &key)?;

            let check = CounterDrift {
                counter: "is_answered",
                stored: i64::from(question.is_answered),
                actual: i64::from(actual),
            };
            if check.drifted() {
                warn!(
                    question_id = %key,
                    stored = check.stored,
                    actual = check.actual,
                    "is_answered drift detected, repairing"
                );
                queries::set_question_answered(tx, &key, actual)?;
            }

            Ok(Drift {
                counters: vec![check],
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Actor;
    use crate::registrations::RegistrationService;
    use rally_notify::Notifier;

    fn setup() -> (Arc<Database>, Reconciler, RegistrationService) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let reconciler = Reconciler::new(db.clone());
        let registrations = RegistrationService::new(db.clone(), Notifier::new());
        (db, reconciler, registrations)
    }

    #[test]
    fn clean_event_reports_no_drift() {
        let (_db, reconciler, registrations) = setup();
        let organizer = Actor::organizer(Uuid::new_v4());
        let event = registrations.create_event(organizer, "Hack Night", 5).unwrap();
        registrations
            .register_for_event(Actor::student(Uuid::new_v4()), event.id, None)
            .unwrap();

        let drift = reconciler.reconcile_event(event.id).unwrap();
        assert!(!drift.detected());
    }

    #[test]
    fn corrupted_count_is_detected_and_repaired() {
        let (db, reconciler, registrations) = setup();
        let organizer = Actor::organizer(Uuid::new_v4());
        let event = registrations.create_event(organizer, "Hack Night", 5).unwrap();
        registrations
            .register_for_event(Actor::student(Uuid::new_v4()), event.id, None)
            .unwrap();

        // Corrupt the counter out-of-band, as a buggy write path would.
        db.with_conn(|conn| {
            conn.execute(
                "UPDATE events SET registered_count = 4 WHERE id = ?1",
                [event.id.to_string()],
            )?;
            Ok(())
        })
        .unwrap();

        let drift = reconciler.reconcile_event(event.id).unwrap();
        assert!(drift.detected());
        assert_eq!(drift.counters[0].stored, 4);
        assert_eq!(drift.counters[0].actual, 1);

        // Repaired: a second pass is clean.
        let again = reconciler.reconcile_event(event.id).unwrap();
        assert!(!again.detected());
        assert_eq!(
            db.get_event(&event.id.to_string()).unwrap().unwrap().registered_count,
            1
        );
    }

    #[test]
    fn tally_drift_is_repaired() {
        let (db, reconciler, _) = setup();
        let post_id = Uuid::new_v4();
        db.with_conn(|conn| {
            queries::insert_post(conn, &post_id.to_string(), "author", "t", "b")?;
            // stored tallies claim votes that have no rows behind them
            queries::set_tally(conn, VoteTarget::Post, &post_id.to_string(), 7, 3)?;
            Ok(())
        })
        .unwrap();

        let drift = reconciler.reconcile_votable(post_id, VoteTarget::Post).unwrap();
        assert!(drift.detected());
        assert_eq!(
            db.get_tally(VoteTarget::Post, &post_id.to_string()).unwrap(),
            Some((0, 0))
        );
    }

    #[test]
    fn answered_flag_drift_is_repaired() {
        let (db, reconciler, _) = setup();
        let question_id = Uuid::new_v4();
        db.with_conn(|conn| {
            queries::insert_question(conn, &question_id.to_string(), None, "author", "q", "b")?;
            queries::set_question_answered(conn, &question_id.to_string(), true)?;
            Ok(())
        })
        .unwrap();

        let drift = reconciler.reconcile_question(question_id).unwrap();
        assert!(drift.detected());

        let answered = db
            .with_conn(|conn| {
                Ok(queries::get_question(conn, &question_id.to_string())?
                    .unwrap()
                    .is_answered)
            })
            .unwrap();
        assert!(!answered);
    }

    #[test]
    fn missing_aggregate_is_not_found() {
        let (_db, reconciler, _) = setup();
        assert!(matches!(
            reconciler.reconcile_event(Uuid::new_v4()),
            Err(RegistryError::NotFound("event"))
        ));
    }
}
