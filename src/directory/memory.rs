//! In-process user directory.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{UserDirectory, UserRecord};
use crate::{Error, Result};

/// Thread-safe in-memory user directory keyed by username.
pub struct MemoryUserDirectory {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryUserDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Number of registered users.
    pub async fn len(&self) -> usize {
        let users = self.users.read().await;
        users.len()
    }

    /// True when no users are registered.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryUserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users.get(username).cloned())
    }

    async fn insert(&self, record: UserRecord) -> Result<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&record.username) {
            return Err(Error::Conflict);
        }
        users.insert(record.username.clone(), record);
        Ok(())
    }

    async fn update_last_login(&self, username: &str, at: u64) -> Result<()> {
        let mut users = self.users.write().await;
        if let Some(user) = users.get_mut(username) {
            user.last_login_at = Some(at);
            user.updated_at = at;
        }
        Ok(())
    }
}
