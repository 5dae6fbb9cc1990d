use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use tokio::time::{Duration, Instant};

use super::{Database, UserRecord};

const ENABLE_LOGS: bool = true;

use crate::log_info;

pub const USER_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Signed-in user as handed over by the identity layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub bearer_token: String,
}

/// `ensure_user` with a short-lived in-memory cache in front, so repeated
/// lookups for the same signed-in user do not hit SQLite each time.
pub struct UserDirectory {
    db: Database,
    ttl: Duration,
    cache: Mutex<HashMap<String, (UserRecord, Instant)>>,
}

impl UserDirectory {
    pub fn new(db: Database) -> Self {
        Self::with_ttl(db, USER_CACHE_TTL)
    }

    pub fn with_ttl(db: Database, ttl: Duration) -> Self {
        Self {
            db,
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub async fn resolve(&self, identity: &Identity) -> Result<UserRecord> {
        let now = Instant::now();
        let cached = self.cached(&identity.user_id, now);
        if let Some(user) = cached {
            return Ok(user);
        }

        let user = self.db.ensure_user(&identity.user_id).await?;
        log_info!(
            "user {} ready (new: {})",
            user.id,
            user.is_new()
        );
        self.lock()
            .insert(identity.user_id.clone(), (user.clone(), now + self.ttl));
        Ok(user)
    }

    /// Drop the cached row, e.g. after the user's settings were saved.
    pub fn invalidate(&self, user_id: &str) {
        self.lock().remove(user_id);
    }

    fn cached(&self, user_id: &str, now: Instant) -> Option<UserRecord> {
        let mut cache = self.lock();
        match cache.get(user_id) {
            Some((user, expires_at)) if *expires_at > now => Some(user.clone()),
            Some(_) => {
                cache.remove(user_id);
                None
            }
            None => None,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, (UserRecord, Instant)>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
