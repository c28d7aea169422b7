//! Registration lifecycle: registered -> attended | cancelled.
//!
//! Transition legality is decided by a pure match on the current status
//! before anything is written. A transition that moves a registration in or
//! out of the active set adjusts the Capacity Ledger inside the same
//! transaction as the status write — the two are never observable apart.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use rally_db::{Database, queries};
use rally_notify::Notifier;
use rally_types::events::Notification;
use rally_types::models::{Event, Registration, RegistrationStatus};

use crate::actor::Actor;
use crate::capacity;
use crate::convert;
use crate::error::RegistryError;

#[derive(Clone)]
pub struct RegistrationService {
    db: Arc<Database>,
    notifier: Notifier,
}

impl RegistrationService {
    pub fn new(db: Arc<Database>, notifier: Notifier) -> Self {
        Self { db, notifier }
    }

    /// Organizer-only event creation.
    pub fn create_event(
        &self,
        actor: Actor,
        title: &str,
        capacity: u32,
    ) -> Result<Event, RegistryError> {
        if !actor.is_organizer() {
            return Err(RegistryError::Forbidden("only organizers may create events"));
        }

        // capacity > 0 is enforced by the schema CHECK
        let id = Uuid::new_v4();
        let row = self.db.with_tx(|tx| {
            queries::insert_event(
                tx,
                &id.to_string(),
                title,
                &actor.user_id.to_string(),
                i64::from(capacity),
            )?;
            queries::get_event(tx, &id.to_string())?
                .ok_or_else(|| RegistryError::NotFound("event"))
        })?;

        Ok(Event {
            id,
            title: row.title,
            organizer_id: actor.user_id,
            capacity,
            registered_count: 0,
            created_at: convert::parse_ts(&row.created_at)?,
        })
    }

    /// Organizer-only capacity change; lowering below the current
    /// registered_count is rejected.
    pub fn update_capacity(
        &self,
        actor: Actor,
        event_id: Uuid,
        new_capacity: u32,
    ) -> Result<(), RegistryError> {
        if !actor.is_organizer() {
            return Err(RegistryError::Forbidden("only organizers may change capacity"));
        }
        self.db
            .with_tx(|tx| capacity::update_capacity(tx, &event_id.to_string(), new_capacity))
    }

    /// Register the acting user for an event, optionally attached to a team
    /// they already belong to. Slot reservation and the registration fact
    /// row commit in one transaction; two racers for the last slot get
    /// exactly one success and one `CapacityExceeded`.
    pub fn register_for_event(
        &self,
        actor: Actor,
        event_id: Uuid,
        team_id: Option<Uuid>,
    ) -> Result<Registration, RegistryError> {
        let event_key = event_id.to_string();
        let user_key = actor.user_id.to_string();
        let registration_id = Uuid::new_v4();

        let (registration, event_title) = self.db.with_tx(|tx| {
            let event =
                queries::get_event(tx, &event_key)?.ok_or(RegistryError::NotFound("event"))?;

            if queries::find_active_registration(tx, &event_key, &user_key)?.is_some() {
                return Err(RegistryError::AlreadyRegistered);
            }

            let team_key = match team_id {
                Some(team_id) => {
                    let team_key = team_id.to_string();
                    let team = queries::get_team(tx, &team_key)?
                        .ok_or(RegistryError::NotFound("team"))?;
                    if team.event_id != event_key {
                        return Err(RegistryError::Forbidden(
                            "team does not belong to this event",
                        ));
                    }
                    if queries::get_team_member(tx, &team_key, &user_key)?.is_none() {
                        return Err(RegistryError::Forbidden(
                            "registrant is not a member of this team",
                        ));
                    }
                    Some(team_key)
                }
                None => None,
            };

            capacity::try_reserve_slot(tx, &event_key)?;
            queries::insert_registration(
                tx,
                &registration_id.to_string(),
                &event_key,
                &user_key,
                team_key.as_deref(),
            )?;

            let row = queries::get_registration(tx, &registration_id.to_string())?
                .ok_or(RegistryError::NotFound("registration"))?;
            Ok((convert::registration(&row)?, event.title))
        })?;

        info!(%event_id, user_id = %actor.user_id, "registration confirmed");
        self.notifier.dispatch(Notification::RegistrationConfirmed {
            event_id,
            event_title,
            user_id: actor.user_id,
        });

        Ok(registration)
    }

    /// Cancel a registration. Registrant or organizer only.
    ///
    /// registered -> cancelled releases the slot atomically with the status
    /// write. Cancelling an already-cancelled registration is an idempotent
    /// no-op (and never double-decrements); attended registrations cannot
    /// be cancelled.
    pub fn cancel_registration(
        &self,
        actor: Actor,
        registration_id: Uuid,
    ) -> Result<Registration, RegistryError> {
        let reg_key = registration_id.to_string();

        let (registration, notify) = self.db.with_tx(|tx| {
            let row = queries::get_registration(tx, &reg_key)?
                .ok_or(RegistryError::NotFound("registration"))?;
            actor.may_act_on_registration(&row.user_id)?;

            let status = parse_status(&row.status)?;
            match status {
                RegistrationStatus::Registered => {
                    queries::mark_registration_cancelled(tx, &reg_key)?;
                    capacity::release_slot(tx, &row.event_id)?;

                    let event = queries::get_event(tx, &row.event_id)?
                        .ok_or(RegistryError::NotFound("event"))?;
                    let updated = queries::get_registration(tx, &reg_key)?
                        .ok_or(RegistryError::NotFound("registration"))?;
                    Ok((convert::registration(&updated)?, Some(event.title)))
                }
                RegistrationStatus::Cancelled => {
                    // Idempotent: retrying a cancel after a lost response is
                    // not an error, and the ledger is untouched.
                    Ok((convert::registration(&row)?, None))
                }
                RegistrationStatus::Attended => Err(RegistryError::InvalidTransition {
                    from: RegistrationStatus::Attended,
                    to: RegistrationStatus::Cancelled,
                }),
            }
        })?;

        if let Some(event_title) = notify {
            info!(%registration_id, "registration cancelled");
            self.notifier.dispatch(Notification::RegistrationCancelled {
                event_id: registration.event_id,
                event_title,
                user_id: registration.user_id,
            });
        }

        Ok(registration)
    }

    /// Mark attendance. Organizer only; idempotent for already-attended
    /// rows. Both registered and attended are active, so the ledger does
    /// not move.
    pub fn mark_attended(
        &self,
        actor: Actor,
        registration_id: Uuid,
    ) -> Result<Registration, RegistryError> {
        if !actor.is_organizer() {
            return Err(RegistryError::Forbidden("only organizers may mark attendance"));
        }

        let reg_key = registration_id.to_string();

        let (registration, notify) = self.db.with_tx(|tx| {
            let row = queries::get_registration(tx, &reg_key)?
                .ok_or(RegistryError::NotFound("registration"))?;

            let status = parse_status(&row.status)?;
            match status {
                RegistrationStatus::Registered => {
                    queries::mark_registration_attended(tx, &reg_key)?;
                    let event = queries::get_event(tx, &row.event_id)?
                        .ok_or(RegistryError::NotFound("event"))?;
                    let updated = queries::get_registration(tx, &reg_key)?
                        .ok_or(RegistryError::NotFound("registration"))?;
                    Ok((convert::registration(&updated)?, Some(event.title)))
                }
                RegistrationStatus::Attended => Ok((convert::registration(&row)?, None)),
                RegistrationStatus::Cancelled => Err(RegistryError::InvalidTransition {
                    from: RegistrationStatus::Cancelled,
                    to: RegistrationStatus::Attended,
                }),
            }
        })?;

        if let Some(event_title) = notify {
            info!(%registration_id, "attendance marked");
            self.notifier.dispatch(Notification::AttendanceMarked {
                event_id: registration.event_id,
                event_title,
                user_id: registration.user_id,
            });
        }

        Ok(registration)
    }
}

fn parse_status(s: &str) -> Result<RegistrationStatus, RegistryError> {
    RegistrationStatus::parse(s)
        .ok_or_else(|| RegistryError::Store(anyhow::anyhow!("unknown registration status: {s}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> RegistrationService {
        let db = Arc::new(Database::open_in_memory().unwrap());
        RegistrationService::new(db, Notifier::new())
    }

    fn seed_event(svc: &RegistrationService, capacity: u32) -> (Actor, Uuid) {
        let organizer = Actor::organizer(Uuid::new_v4());
        let event = svc.create_event(organizer, "Hack Night", capacity).unwrap();
        (organizer, event.id)
    }

    #[test]
    fn register_then_cancel_roundtrip() {
        let svc = service();
        let (_, event_id) = seed_event(&svc, 2);
        let alice = Actor::student(Uuid::new_v4());

        let reg = svc.register_for_event(alice, event_id, None).unwrap();
        assert_eq!(reg.status, RegistrationStatus::Registered);
        assert_eq!(
            svc.db.get_event(&event_id.to_string()).unwrap().unwrap().registered_count,
            1
        );

        let cancelled = svc.cancel_registration(alice, reg.id).unwrap();
        assert_eq!(cancelled.status, RegistrationStatus::Cancelled);
        assert!(cancelled.cancelled_at.is_some());
        assert_eq!(
            svc.db.get_event(&event_id.to_string()).unwrap().unwrap().registered_count,
            0
        );
    }

    #[test]
    fn duplicate_registration_rejected() {
        let svc = service();
        let (_, event_id) = seed_event(&svc, 5);
        let alice = Actor::student(Uuid::new_v4());

        svc.register_for_event(alice, event_id, None).unwrap();
        assert!(matches!(
            svc.register_for_event(alice, event_id, None),
            Err(RegistryError::AlreadyRegistered)
        ));
    }

    #[test]
    fn reregistration_after_cancel_is_a_new_row() {
        let svc = service();
        let (_, event_id) = seed_event(&svc, 5);
        let alice = Actor::student(Uuid::new_v4());

        let first = svc.register_for_event(alice, event_id, None).unwrap();
        svc.cancel_registration(alice, first.id).unwrap();
        let second = svc.register_for_event(alice, event_id, None).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(second.status, RegistrationStatus::Registered);
    }

    #[test]
    fn transition_legality() {
        let svc = service();
        let (organizer, event_id) = seed_event(&svc, 5);
        let alice = Actor::student(Uuid::new_v4());

        let reg = svc.register_for_event(alice, event_id, None).unwrap();

        // attended -> cancelled is illegal
        svc.mark_attended(organizer, reg.id).unwrap();
        assert!(matches!(
            svc.cancel_registration(alice, reg.id),
            Err(RegistryError::InvalidTransition { .. })
        ));
        // illegal transition must not touch the ledger
        assert_eq!(
            svc.db.get_event(&event_id.to_string()).unwrap().unwrap().registered_count,
            1
        );

        // cancelled -> attended is illegal
        let bob = Actor::student(Uuid::new_v4());
        let reg_b = svc.register_for_event(bob, event_id, None).unwrap();
        svc.cancel_registration(bob, reg_b.id).unwrap();
        assert!(matches!(
            svc.mark_attended(organizer, reg_b.id),
            Err(RegistryError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn attendance_and_cancel_are_idempotent() {
        let svc = service();
        let (organizer, event_id) = seed_event(&svc, 5);
        let alice = Actor::student(Uuid::new_v4());
        let bob = Actor::student(Uuid::new_v4());

        let reg_a = svc.register_for_event(alice, event_id, None).unwrap();
        svc.mark_attended(organizer, reg_a.id).unwrap();
        let again = svc.mark_attended(organizer, reg_a.id).unwrap();
        assert_eq!(again.status, RegistrationStatus::Attended);

        let reg_b = svc.register_for_event(bob, event_id, None).unwrap();
        svc.cancel_registration(bob, reg_b.id).unwrap();
        let count_after_first = svc
            .db
            .get_event(&event_id.to_string())
            .unwrap()
            .unwrap()
            .registered_count;
        // second cancel is a no-op: no double-decrement
        svc.cancel_registration(bob, reg_b.id).unwrap();
        assert_eq!(
            svc.db.get_event(&event_id.to_string()).unwrap().unwrap().registered_count,
            count_after_first
        );
    }

    #[test]
    fn only_registrant_or_organizer_may_cancel() {
        let svc = service();
        let (_, event_id) = seed_event(&svc, 5);
        let alice = Actor::student(Uuid::new_v4());
        let mallory = Actor::student(Uuid::new_v4());

        let reg = svc.register_for_event(alice, event_id, None).unwrap();
        assert!(matches!(
            svc.cancel_registration(mallory, reg.id),
            Err(RegistryError::Forbidden(_))
        ));
    }

    #[test]
    fn only_organizer_marks_attendance() {
        let svc = service();
        let (_, event_id) = seed_event(&svc, 5);
        let alice = Actor::student(Uuid::new_v4());

        let reg = svc.register_for_event(alice, event_id, None).unwrap();
        assert!(matches!(
            svc.mark_attended(alice, reg.id),
            Err(RegistryError::Forbidden(_))
        ));
    }

    #[test]
    fn concurrent_registrations_never_overfill() {
        let capacity = 3u32;
        let contenders = 10;

        let svc = service();
        let (_, event_id) = seed_event(&svc, capacity);

        let mut handles = Vec::new();
        for _ in 0..contenders {
            let svc = svc.clone();
            handles.push(std::thread::spawn(move || {
                let user = Actor::student(Uuid::new_v4());
                svc.register_for_event(user, event_id, None)
            }));
        }

        let mut successes = 0;
        let mut full = 0;
        for handle in handles {
            match handle.join().unwrap() {
                Ok(_) => successes += 1,
                Err(RegistryError::CapacityExceeded) => full += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(successes, capacity as usize);
        assert_eq!(full, contenders - capacity as usize);

        // Derived counter agrees with the fact rows.
        let event = svc.db.get_event(&event_id.to_string()).unwrap().unwrap();
        assert_eq!(event.registered_count, i64::from(capacity));
        let actual = svc
            .db
            .with_conn(|conn| queries::count_active_registrations(conn, &event_id.to_string()))
            .unwrap();
        assert_eq!(actual, i64::from(capacity));
    }

    #[test]
    fn overbooking_scenario() {
        // capacity=1: A registers, B is refused, A cancels, B retries fine
        let svc = service();
        let (_, event_id) = seed_event(&svc, 1);
        let a = Actor::student(Uuid::new_v4());
        let b = Actor::student(Uuid::new_v4());

        let reg_a = svc.register_for_event(a, event_id, None).unwrap();
        assert!(matches!(
            svc.register_for_event(b, event_id, None),
            Err(RegistryError::CapacityExceeded)
        ));

        svc.cancel_registration(a, reg_a.id).unwrap();
        let reg_b = svc.register_for_event(b, event_id, None).unwrap();
        assert_eq!(reg_b.status, RegistrationStatus::Registered);
    }
}
