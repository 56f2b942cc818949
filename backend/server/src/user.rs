//! # Users
//!
//! Account records and the storage seam behind them.
//!
//! ## Invariants
//!
//! - Ids are handed out sequentially starting at 1
//! - Email and nickname are each unique, enforced at save time so two racing sign ups cannot both win
//! - Only the bcrypt hash of a password is ever stored
//!
//! ## Backends
//!
//! - [`MemoryStore`]: default when `REDIS_URL` is unset, lost on restart
//! - [`RedisStore`](crate::database::RedisStore): hashes plus two index hashes, see [`database`](crate::database)
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use contract::{Role, SignUpResponse};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub password_hash: String,
    pub nickname: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub nickname: String,
    pub role: Role,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Email is already in use.")]
    DuplicateEmail,

    #[error("Nickname is already in use.")]
    DuplicateNickname,

    #[error("Corrupt user record {id}: {reason}")]
    Corrupt { id: u64, reason: String },

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: u64) -> Result<Option<User>, StoreError>;

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError>;

    async fn exists_by_nickname(&self, nickname: &str) -> Result<bool, StoreError>;

    async fn save(&self, user: NewUser) -> Result<User, StoreError>;
}

impl From<&User> for SignUpResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            nickname: user.nickname.clone(),
            role: user.role,
        }
    }
}

#[derive(Default)]
struct Tables {
    users: HashMap<u64, User>,
    by_email: HashMap<String, u64>,
    by_nickname: HashMap<String, u64>,
    last_id: u64,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;

        Ok(tables
            .by_email
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.tables.read().await.by_email.contains_key(email))
    }

    async fn exists_by_nickname(&self, nickname: &str) -> Result<bool, StoreError> {
        Ok(self.tables.read().await.by_nickname.contains_key(nickname))
    }

    async fn save(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.by_email.contains_key(&new_user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        if tables.by_nickname.contains_key(&new_user.nickname) {
            return Err(StoreError::DuplicateNickname);
        }

        tables.last_id += 1;
        let user = User {
            id: tables.last_id,
            email: new_user.email,
            password_hash: new_user.password_hash,
            nickname: new_user.nickname,
            role: new_user.role,
            created_at: Utc::now(),
        };

        tables.by_email.insert(user.email.clone(), user.id);
        tables.by_nickname.insert(user.nickname.clone(), user.id);
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn new_user(email: &str, nickname: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            nickname: nickname.to_string(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn ids_are_sequential_from_one() {
        let store = MemoryStore::new();

        let first = store.save(new_user("a@b.co", "alpha")).await.unwrap();
        let second = store.save(new_user("c@d.co", "bravo")).await.unwrap();

        assert_eq!((first.id, second.id), (1, 2));
        assert_eq!(store.find_by_id(2).await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn lookups_follow_indexes() {
        let store = MemoryStore::new();
        let saved = store.save(new_user("a@b.co", "alpha")).await.unwrap();

        assert_eq!(store.find_by_email("a@b.co").await.unwrap(), Some(saved));
        assert!(store.find_by_email("x@y.co").await.unwrap().is_none());
        assert!(store.exists_by_email("a@b.co").await.unwrap());
        assert!(store.exists_by_nickname("alpha").await.unwrap());
        assert!(!store.exists_by_nickname("bravo").await.unwrap());
    }

    #[tokio::test]
    async fn duplicates_are_rejected_without_consuming_ids() {
        let store = MemoryStore::new();
        store.save(new_user("a@b.co", "alpha")).await.unwrap();

        assert!(matches!(
            store.save(new_user("a@b.co", "other")).await,
            Err(StoreError::DuplicateEmail)
        ));
        assert!(matches!(
            store.save(new_user("new@b.co", "alpha")).await,
            Err(StoreError::DuplicateNickname)
        ));

        let next = store.save(new_user("new@b.co", "bravo")).await.unwrap();
        assert_eq!(next.id, 2);
    }

    #[tokio::test]
    async fn concurrent_saves_of_same_email_admit_one() {
        let store = Arc::new(MemoryStore::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store.save(new_user("race@b.co", &format!("nick{i}"))).await
                })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
    }
}
