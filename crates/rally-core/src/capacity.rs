//! Capacity Ledger: the event's `registered_count` never exceeds `capacity`
//! after any committed write.
//!
//! The ceiling check is a conditional UPDATE (`... WHERE registered_count <
//! capacity`), so the comparison happens atomically in the store. Reading the
//! count, comparing in application code, and then writing is not race-free
//! and is deliberately not offered here.

use rusqlite::Connection;
use tracing::debug;

use rally_db::queries;

use crate::error::RegistryError;

/// Claim one slot for a new active registration. Runs inside the caller's
/// transaction; the caller inserts the registration fact row in the same
/// unit of work.
pub fn try_reserve_slot(conn: &Connection, event_id: &str) -> Result<(), RegistryError> {
    if queries::reserve_event_slot(conn, event_id)? {
        debug!(event_id, "reserved registration slot");
        return Ok(());
    }

    // Zero rows updated: either the event is full or it doesn't exist.
    match queries::get_event(conn, event_id)? {
        Some(_) => Err(RegistryError::CapacityExceeded),
        None => Err(RegistryError::NotFound("event")),
    }
}

/// Give a slot back after a previously-active registration leaves the active
/// set. The caller is responsible for checking the prior status was active;
/// a registration that was already cancelled must not reach here (that would
/// double-decrement). The floor guard in the UPDATE is the last line of
/// defense, not the policy.
pub fn release_slot(conn: &Connection, event_id: &str) -> Result<(), RegistryError> {
    if !queries::release_event_slot(conn, event_id)? {
        // Counter already at zero while a fact row was active: drift.
        tracing::warn!(event_id, "release_slot found registered_count already at zero");
    }
    debug!(event_id, "released registration slot");
    Ok(())
}

/// Change an event's capacity. Lowering below the current registered_count
/// is rejected; raising always succeeds.
pub fn update_capacity(conn: &Connection, event_id: &str, capacity: u32) -> Result<(), RegistryError> {
    if queries::set_event_capacity(conn, event_id, i64::from(capacity))? {
        return Ok(());
    }
    match queries::get_event(conn, event_id)? {
        Some(_) => Err(RegistryError::CapacityExceeded),
        None => Err(RegistryError::NotFound("event")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rally_db::Database;

    #[test]
    fn reserve_distinguishes_full_from_missing() {
        let db = Database::open_in_memory().unwrap();
        db.with_tx(|tx| {
            queries::insert_event(tx, "e1", "Hack Night", "org", 1)?;
            try_reserve_slot(tx, "e1")?;
            assert!(matches!(
                try_reserve_slot(tx, "e1"),
                Err(RegistryError::CapacityExceeded)
            ));
            assert!(matches!(
                try_reserve_slot(tx, "missing"),
                Err(RegistryError::NotFound("event"))
            ));
            Ok::<_, RegistryError>(())
        })
        .unwrap();
    }

    #[test]
    fn lowering_capacity_below_count_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.with_tx(|tx| {
            queries::insert_event(tx, "e1", "Hack Night", "org", 4)?;
            try_reserve_slot(tx, "e1")?;
            try_reserve_slot(tx, "e1")?;
            assert!(matches!(
                update_capacity(tx, "e1", 1),
                Err(RegistryError::CapacityExceeded)
            ));
            update_capacity(tx, "e1", 2)?;
            update_capacity(tx, "e1", 10)?;
            Ok::<_, RegistryError>(())
        })
        .unwrap();
    }
}
