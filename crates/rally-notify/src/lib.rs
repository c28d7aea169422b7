//! Fire-and-forget notification dispatch.
//!
//! The core hands a [`Notification`] to the dispatcher *after* its
//! transaction commits. Dispatch never blocks the caller and never fails
//! from the caller's perspective; if nobody is listening, the event is
//! dropped.

use tokio::sync::broadcast;
use tracing::debug;

use rally_types::events::Notification;

#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1024);
        Self { tx }
    }

    /// Subscribe to notifications. Delivery workers (push, email) drain from
    /// here.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    /// Dispatch a notification to all subscribers. Send errors (no
    /// receivers) are ignored: delivery failure must never affect the
    /// operation that produced the event.
    pub fn dispatch(&self, notification: Notification) {
        debug!(?notification, "dispatching notification");
        let _ = self.tx.send(notification);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rally_types::events::Notification;
    use uuid::Uuid;

    #[test]
    fn dispatch_without_subscribers_is_fine() {
        let notifier = Notifier::new();
        notifier.dispatch(Notification::TeamDisbanded {
            team_id: Uuid::nil(),
            team_name: "ghosts".into(),
        });
    }

    #[test]
    fn subscribers_receive_dispatched_events() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();
        notifier.dispatch(Notification::RegistrationConfirmed {
            event_id: Uuid::nil(),
            event_title: "Hack Night".into(),
            user_id: Uuid::nil(),
        });
        let got = rx.try_recv().unwrap();
        assert!(matches!(got, Notification::RegistrationConfirmed { .. }));
    }
}
