pub mod error;
pub mod middleware;
pub mod reconcile;
pub mod registrations;
pub mod teams;
pub mod votes;

use std::sync::Arc;

use rally_core::actor::{Actor, Role};
use rally_core::reconcile::Reconciler;
use rally_core::registrations::RegistrationService;
use rally_core::teams::TeamService;
use rally_core::votes::TallyService;
use rally_db::Database;
use rally_notify::Notifier;
use rally_types::api::Claims;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub registrations: RegistrationService,
    pub teams: TeamService,
    pub tallies: TallyService,
    pub reconciler: Reconciler,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>, notifier: Notifier) -> Self {
        Self {
            registrations: RegistrationService::new(db.clone(), notifier.clone()),
            teams: TeamService::new(db.clone(), notifier),
            tallies: TallyService::new(db.clone()),
            reconciler: Reconciler::new(db),
        }
    }
}

/// Build the acting identity from verified claims. Unknown role strings
/// degrade to Student — the least-privileged role.
pub fn actor_from(claims: &Claims) -> Actor {
    Actor {
        user_id: claims.sub,
        role: Role::parse(&claims.role).unwrap_or(Role::Student),
    }
}
