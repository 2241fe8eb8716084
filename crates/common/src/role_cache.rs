//! Permission-role cache reads.
//!
//! Permission-role codes are written to Redis by the role-management side of
//! the platform; this module only reads them. A missing key is treated as
//! "no permissions" rather than an error, so an unpopulated cache denies
//! every permission-gated action.

use async_trait::async_trait;
use fred::clients::Client as RedisClient;
use fred::interfaces::KeysInterface;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

use crate::error::{AppError, AppResult};

/// Backend for permission-role reads.
///
/// Core services and the API permission gate depend on this trait rather
/// than on Redis directly, so tests can substitute an in-memory store.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Permission-role codes cached for a user. Empty on miss.
    async fn get_roles(&self, user_id: &str) -> AppResult<Vec<String>>;

    /// Drop the cached entries for a user.
    ///
    /// Called after a user is deleted so stale permissions cannot be read
    /// back.
    async fn invalidate_user(&self, user_id: &str) -> AppResult<()>;
}

/// Shared handle to a role store.
pub type RoleCache = Arc<dyn RoleStore>;

/// Role store over a shared Redis client.
pub struct RedisRoleStore {
    redis: Arc<RedisClient>,
}

impl RedisRoleStore {
    /// Create a role store over an established Redis client.
    #[must_use]
    pub const fn new(redis: Arc<RedisClient>) -> Self {
        Self { redis }
    }

    /// Cache key for a user's permission-role codes.
    #[must_use]
    pub fn roles_key(user_id: &str) -> String {
        format!("caches:roles:{user_id}")
    }

    /// Cache key for a user's profile snapshot.
    #[must_use]
    pub fn profile_key(user_id: &str) -> String {
        format!("caches:profiles:{user_id}")
    }
}

#[async_trait]
impl RoleStore for RedisRoleStore {
    /// Returns an empty list on cache miss. A value that fails to parse as a
    /// JSON string array is also treated as a miss, after logging.
    async fn get_roles(&self, user_id: &str) -> AppResult<Vec<String>> {
        let key = Self::roles_key(user_id);
        let raw: Option<String> = self
            .redis
            .get(&key)
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;

        let Some(raw) = raw else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(roles) => Ok(roles),
            Err(e) => {
                warn!(key = %key, error = %e, "Malformed role cache entry, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    async fn invalidate_user(&self, user_id: &str) -> AppResult<()> {
        let keys = vec![Self::roles_key(user_id), Self::profile_key(user_id)];
        let _: u64 = self
            .redis
            .del(keys)
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;
        Ok(())
    }
}

/// In-memory role store for tests and local development.
#[derive(Default)]
pub struct MemoryRoleStore {
    roles: Mutex<HashMap<String, Vec<String>>>,
}

impl MemoryRoleStore {
    /// Create an empty store; every lookup behaves like a cache miss.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add role codes for a user.
    #[must_use]
    pub fn with_roles(self, user_id: &str, codes: &[&str]) -> Self {
        {
            let mut roles = self.roles.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            roles.insert(
                user_id.to_string(),
                codes.iter().map(ToString::to_string).collect(),
            );
        }
        self
    }
}

#[async_trait]
impl RoleStore for MemoryRoleStore {
    async fn get_roles(&self, user_id: &str) -> AppResult<Vec<String>> {
        let roles = self
            .roles
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(roles.get(user_id).cloned().unwrap_or_default())
    }

    async fn invalidate_user(&self, user_id: &str) -> AppResult<()> {
        let mut roles = self
            .roles
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        roles.remove(user_id);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn cache_keys_follow_platform_convention() {
        assert_eq!(RedisRoleStore::roles_key("u1"), "caches:roles:u1");
        assert_eq!(RedisRoleStore::profile_key("u1"), "caches:profiles:u1");
    }

    #[tokio::test]
    async fn memory_store_misses_are_empty() {
        let store = MemoryRoleStore::new();
        let roles = store.get_roles("nobody").await.unwrap();
        assert!(roles.is_empty());
    }

    #[tokio::test]
    async fn memory_store_invalidation_forgets_the_user() {
        let store = MemoryRoleStore::new().with_roles("u1", &["SUSPEND_STUDENT"]);
        assert_eq!(store.get_roles("u1").await.unwrap(), vec!["SUSPEND_STUDENT"]);

        store.invalidate_user("u1").await.unwrap();
        assert!(store.get_roles("u1").await.unwrap().is_empty());
    }
}
