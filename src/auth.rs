//! Renter identity.
//!
//! Session issuance (login, password checks) lives outside this service. What
//! arrives here is a bearer token; an [`IdentityProvider`] turns it into a
//! [`UserId`]. Sessions are explicit values with a lifecycle: opened at login,
//! closed at logout or when the token is rejected.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::model::UserId;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The user behind `token`, or `None` if the token is unknown or closed.
    async fn resolve(&self, token: &str) -> Option<UserId>;

    /// End the session behind `token`. Returns false if it was not open.
    async fn revoke(&self, token: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// In-process session table keyed by token.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session under a caller-chosen token, replacing any session
    /// already using it.
    pub fn open_with_token(&self, token: String, user_id: UserId) -> Session {
        let session = Session {
            token: token.clone(),
            user_id,
            created_at: Utc::now(),
        };
        self.sessions.insert(token, session.clone());
        session
    }

    /// Close a session. Returns it if it was open.
    pub fn close(&self, token: &str) -> Option<Session> {
        self.sessions.remove(token).map(|(_, s)| s)
    }
}

#[async_trait]
impl IdentityProvider for SessionStore {
    async fn resolve(&self, token: &str) -> Option<UserId> {
        self.sessions.get(token).map(|s| s.user_id)
    }

    async fn revoke(&self, token: &str) -> bool {
        self.close(token).is_some()
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
