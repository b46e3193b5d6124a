//! Resolving caller credentials to an acting identity.

use crate::core::{ActorId, EventKind};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Opaque credential presented by a caller.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens end up in log fields; never print the secret itself.
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthorizationError {
    #[error("access token is missing, unknown or expired")]
    Unauthenticated,

    #[error("{actor} may not trigger {event}")]
    Forbidden { actor: ActorId, event: EventKind },
}

/// Maps a credential to the actor recorded in the audit trail.
pub trait Authorizer: Send + Sync {
    /// Resolve `token` to an actor.
    fn authenticate(&self, token: &AccessToken) -> Result<ActorId, AuthorizationError>;

    /// Resolve `token` and check that its actor may trigger `event`.
    ///
    /// Any authenticated actor may trigger any event unless overridden.
    fn authorize(
        &self,
        token: &AccessToken,
        event: EventKind,
    ) -> Result<ActorId, AuthorizationError> {
        let _ = event;
        self.authenticate(token)
    }
}

#[derive(Debug, Clone)]
struct Grant {
    actor: ActorId,
    events: Option<HashSet<EventKind>>,
}

/// Fixed allow-list of tokens, for tests and single-tenant deployments.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthorizer {
    grants: HashMap<AccessToken, Grant>,
}

impl StaticAuthorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `token` to act as `actor` for every event.
    pub fn grant(mut self, token: AccessToken, actor: ActorId) -> Self {
        self.grants.insert(token, Grant { actor, events: None });
        self
    }

    /// Allow `token` to act as `actor` for the listed events only.
    pub fn grant_events(
        mut self,
        token: AccessToken,
        actor: ActorId,
        events: impl IntoIterator<Item = EventKind>,
    ) -> Self {
        let grant = Grant {
            actor,
            events: Some(events.into_iter().collect()),
        };
        self.grants.insert(token, grant);
        self
    }
}

impl Authorizer for StaticAuthorizer {
    fn authenticate(&self, token: &AccessToken) -> Result<ActorId, AuthorizationError> {
        self.grants
            .get(token)
            .map(|grant| grant.actor.clone())
            .ok_or(AuthorizationError::Unauthenticated)
    }

    fn authorize(
        &self,
        token: &AccessToken,
        event: EventKind,
    ) -> Result<ActorId, AuthorizationError> {
        let grant = self
            .grants
            .get(token)
            .ok_or(AuthorizationError::Unauthenticated)?;

        match &grant.events {
            Some(events) if !events.contains(&event) => Err(AuthorizationError::Forbidden {
                actor: grant.actor.clone(),
                event,
            }),
            _ => Ok(grant.actor.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_token_is_unauthenticated() {
        let authorizer = StaticAuthorizer::new();

        assert_eq!(
            authorizer.authenticate(&AccessToken::new("nope")),
            Err(AuthorizationError::Unauthenticated)
        );
    }

    #[test]
    fn full_grant_allows_every_event() {
        let token = AccessToken::new("t-admin");
        let authorizer = StaticAuthorizer::new().grant(token.clone(), ActorId::new("admin-1"));

        for event in EventKind::ALL {
            assert_eq!(
                authorizer.authorize(&token, event),
                Ok(ActorId::new("admin-1"))
            );
        }
    }

    #[test]
    fn scoped_grant_forbids_other_events() {
        let token = AccessToken::new("t-lawyer");
        let authorizer = StaticAuthorizer::new().grant_events(
            token.clone(),
            ActorId::new("lawyer-7"),
            [EventKind::CompleteDocs],
        );

        assert!(authorizer.authorize(&token, EventKind::CompleteDocs).is_ok());
        assert_eq!(
            authorizer.authorize(&token, EventKind::CompleteDeal),
            Err(AuthorizationError::Forbidden {
                actor: ActorId::new("lawyer-7"),
                event: EventKind::CompleteDeal,
            })
        );
    }

    #[test]
    fn debug_hides_token_value() {
        let token = AccessToken::new("secret-value");
        assert!(!format!("{token:?}").contains("secret"));
    }
}
