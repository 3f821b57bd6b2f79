//! In-memory user store.
//!
//! Usernames and emails are unique across the store; ids are sequential
//! starting at 1.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserStoreError {
    #[error("Username or email already exists")]
    Duplicate,

    #[error("user store is full ({limit} users)")]
    CapacityReached { limit: usize },
}

#[derive(Debug)]
pub struct UserStore {
    users: RwLock<Vec<User>>,
    max_users: usize,
}

impl UserStore {
    pub fn new(max_users: usize) -> Self {
        Self {
            users: RwLock::new(Vec::new()),
            max_users,
        }
    }

    pub async fn create(&self, username: &str, email: &str) -> Result<User, UserStoreError> {
        let mut users = self.users.write().await;

        if users.iter().any(|u| u.username == username || u.email == email) {
            return Err(UserStoreError::Duplicate);
        }
        if users.len() >= self.max_users {
            return Err(UserStoreError::CapacityReached { limit: self.max_users });
        }

        let user = User {
            id: users.last().map_or(1, |u| u.id + 1),
            username: username.to_string(),
            email: email.to_string(),
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    pub async fn list(&self) -> Vec<User> {
        self.users.read().await.clone()
    }
}
