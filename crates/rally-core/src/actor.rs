use uuid::Uuid;

use crate::error::RegistryError;

/// Role attached to the authenticated identity. The identity provider is
/// trusted to have established both fields; the core only checks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Organizer,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Self::Student),
            "organizer" => Some(Self::Organizer),
            _ => None,
        }
    }
}

/// The acting identity passed into every core operation. Replaces the
/// store-level row policies of the original design with explicit checks
/// that are testable in isolation.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn student(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::Student,
        }
    }

    pub fn organizer(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::Organizer,
        }
    }

    pub fn is_organizer(&self) -> bool {
        self.role == Role::Organizer
    }

    /// True when the actor is the named user.
    pub fn is(&self, user_id: &str) -> bool {
        self.user_id.to_string() == user_id
    }

    /// Registrant-or-organizer check, the rule governing registration
    /// transitions.
    pub fn may_act_on_registration(&self, registrant_id: &str) -> Result<(), RegistryError> {
        if self.is(registrant_id) || self.is_organizer() {
            Ok(())
        } else {
            Err(RegistryError::Forbidden(
                "only the registrant or an organizer may modify a registration",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registrant_and_organizer_may_act() {
        let registrant = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let id = registrant.to_string();

        assert!(Actor::student(registrant).may_act_on_registration(&id).is_ok());
        assert!(Actor::organizer(stranger).may_act_on_registration(&id).is_ok());
        assert!(matches!(
            Actor::student(stranger).may_act_on_registration(&id),
            Err(RegistryError::Forbidden(_))
        ));
    }
}
