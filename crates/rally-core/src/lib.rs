//! The consistency core: keeps derived counters (event registered_count,
//! team member_count, vote tallies, question is_answered) in exact agreement
//! with their fact rows, and enforces the registration and team-membership
//! state machines those counters depend on.
//!
//! Every mutating operation runs inside one database transaction; a counter
//! never moves without the fact-row change that justifies it committing in
//! the same unit of work.

pub mod actor;
pub mod capacity;
mod convert;
pub mod error;
pub mod reconcile;
pub mod registrations;
pub mod teams;
pub mod votes;

pub use actor::{Actor, Role};
pub use error::RegistryError;
