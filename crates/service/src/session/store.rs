use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use moka::future::Cache;
use rand::{rngs::OsRng, RngCore};
use tracing::debug;

use super::{Session, SessionUser};

/// Storage for live sessions keyed by their opaque token.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Open a new session for `user` and return it with a fresh token.
    async fn create(&self, user: SessionUser) -> Session;
    async fn get(&self, token: &str) -> Option<Session>;
    /// Returns `true` when a session was actually removed.
    async fn remove(&self, token: &str) -> bool;
}

/// In-process session store; entries expire after the configured TTL.
pub struct MokaSessionStore {
    cache: Cache<String, Session>,
    ttl: Duration,
}

impl MokaSessionStore {
    pub fn new(ttl: Duration, max_sessions: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_sessions)
            .time_to_live(ttl)
            .build();
        Self { cache, ttl }
    }

    pub fn ttl(&self) -> Duration { self.ttl }
}

fn new_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[async_trait]
impl SessionStore for MokaSessionStore {
    async fn create(&self, user: SessionUser) -> Session {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or_else(|_| chrono::Duration::days(7));
        let session = Session { token: new_token(), user, created_at: now, expires_at: now + ttl };
        self.cache.insert(session.token.clone(), session.clone()).await;
        debug!(user_id = %session.user.id, "session_created");
        session
    }

    async fn get(&self, token: &str) -> Option<Session> {
        let session = self.cache.get(token).await?;
        if session.expires_at <= Utc::now() {
            self.cache.invalidate(token).await;
            return None;
        }
        Some(session)
    }

    async fn remove(&self, token: &str) -> bool {
        self.cache.remove(token).await.is_some()
    }
}
