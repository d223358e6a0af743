//! Admin session table
//!
//! Sessions are opaque random ids mapped to an expiry. Every successful
//! lookup pushes the expiry forward (sliding window).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::RngCore;
use tokio::sync::RwLock;

/// Cookie carrying the session id
pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone)]
struct AdminSession {
    expires_at: Instant,
}

/// Session manager for logged-in administrators
pub struct SessionManager {
    sessions: RwLock<HashMap<String, AdminSession>>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Generate a new session id: 32 random bytes, hex encoded
    pub fn generate_session_id() -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Create a new session and return its id
    pub async fn create_session(&self) -> String {
        let session_id = Self::generate_session_id();
        let session = AdminSession {
            expires_at: Instant::now() + self.ttl,
        };

        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(session_id.clone(), session);
        session_id
    }

    /// Check a session id, extending it when live
    ///
    /// Expired sessions are removed and reported as invalid.
    pub async fn touch(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        match sessions.get_mut(session_id) {
            Some(session) if session.expires_at > now => {
                session.expires_at = now + self.ttl;
                true
            }
            Some(_) => {
                sessions.remove(session_id);
                false
            }
            None => false,
        }
    }

    /// Remove a session
    pub async fn remove_session(&self, session_id: &str) {
        self.sessions.write().await.remove(session_id);
    }

    /// Get active session count
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_unique_hex() {
        let a = SessionManager::generate_session_id();
        let b = SessionManager::generate_session_id();

        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let manager = SessionManager::new(Duration::from_secs(60));

        let id = manager.create_session().await;
        assert!(manager.touch(&id).await);
        assert_eq!(manager.session_count().await, 1);

        manager.remove_session(&id).await;
        assert!(!manager.touch(&id).await);
        assert_eq!(manager.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let manager = SessionManager::new(Duration::from_secs(60));
        assert!(!manager.touch("nope").await);
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected_and_removed() {
        let manager = SessionManager::new(Duration::ZERO);

        let id = manager.create_session().await;

        assert!(!manager.touch(&id).await);
        assert_eq!(manager.session_count().await, 0);
    }
}
