//! Authenticated session handling
//!
//! The client only needs to know whether a session is present and which
//! bearer token to attach. Sign-in itself belongs to the hosted auth
//! service.

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use cm_core::Id;

/// A signed-in session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub user_id: Option<Id>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            user_id: None,
            expires_at: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| expires <= now)
    }

    /// Non-empty token that has not expired
    pub fn is_present(&self) -> bool {
        !self.access_token.trim().is_empty() && !self.is_expired(Utc::now())
    }
}

/// Source of the current session
pub trait SessionProvider: Send + Sync {
    fn current(&self) -> Option<Session>;

    fn is_authenticated(&self) -> bool {
        self.current().is_some_and(|s| s.is_present())
    }
}

/// Session held in memory, replaceable at runtime
#[derive(Debug, Default)]
pub struct MemorySession {
    session: RwLock<Option<Session>>,
}

impl MemorySession {
    pub fn new(session: Option<Session>) -> Self {
        Self {
            session: RwLock::new(session),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Session from an optional configured token; blank tokens mean no session
    pub fn from_token(token: Option<&str>) -> Self {
        Self::new(
            token
                .filter(|t| !t.trim().is_empty())
                .map(Session::new),
        )
    }

    pub fn sign_in(&self, session: Session) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    pub fn sign_out(&self) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl SessionProvider for MemorySession {
    fn current(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    #[test]
    fn test_from_token() {
        assert!(!MemorySession::from_token(None).is_authenticated());
        assert!(!MemorySession::from_token(Some("  ")).is_authenticated());
        assert!(MemorySession::from_token(Some("abc")).is_authenticated());
    }

    #[test]
    fn test_expired_session_not_present() {
        let mut session = Session::new("abc");
        session.expires_at = Some(Utc::now() - Duration::minutes(1));
        assert!(!session.is_present());

        session.expires_at = Some(Utc::now() + Duration::hours(1));
        assert!(session.is_present());
    }

    #[test]
    fn test_sign_in_and_out() {
        let store = MemorySession::anonymous();
        store.sign_in(Session::new("abc"));
        assert_eq!(store.current().map(|s| s.access_token), Some("abc".into()));
        store.sign_out();
        assert!(store.current().is_none());
    }

    #[test]
    fn test_poisoned_lock_still_tracks_session() {
        let store = Arc::new(MemorySession::anonymous());
        let holder = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.session.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();
        assert!(store.session.is_poisoned());

        store.sign_in(Session::new("token-1"));
        assert!(store.is_authenticated());
        assert_eq!(store.current().unwrap().access_token, "token-1");

        store.sign_out();
        assert!(!store.is_authenticated());
    }
}
