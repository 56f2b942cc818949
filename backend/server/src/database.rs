//! # Redis
//!
//! Persistent user storage, used when `REDIS_URL` is set.
//!
//! ## Layout
//!
//! - `users:next_id`: counter, `INCR` hands out the next id
//! - `user:{id}`: hash with `email`, `password_hash`, `nickname`, `role`, `created_at` (RFC 3339)
//! - `users:by_email`: hash of email to id
//! - `users:by_nickname`: hash of nickname to id
//!
//! ## Saving
//!
//! 1. Allocate an id with `INCR`.
//! 2. Run [`SAVE_USER`] once: it checks both indexes, then claims them and writes the `user:{id}` hash.
//!    Redis runs the script atomically, so a save either lands whole or leaves nothing behind.
//! 3. A taken email or nickname burns the id, like a failed insert into an identity column.
use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use contract::Role;
use redis::{
    AsyncCommands, Client, Script,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use tracing::debug;

use crate::user::{NewUser, StoreError, User, UserStore};

const NEXT_ID: &str = "users:next_id";
const BY_EMAIL: &str = "users:by_email";
const BY_NICKNAME: &str = "users:by_nickname";

/// KEYS: user hash, email index, nickname index.
/// ARGV: id, email, nickname, password hash, role, created at.
/// Returns 0 on success, 1 for a taken email, 2 for a taken nickname.
const SAVE_USER: &str = r#"
if redis.call('HEXISTS', KEYS[2], ARGV[2]) == 1 then
    return 1
end
if redis.call('HEXISTS', KEYS[3], ARGV[3]) == 1 then
    return 2
end
redis.call('HSET', KEYS[2], ARGV[2], ARGV[1])
redis.call('HSET', KEYS[3], ARGV[3], ARGV[1])
redis.call('HSET', KEYS[1],
    'email', ARGV[2],
    'password_hash', ARGV[4],
    'nickname', ARGV[3],
    'role', ARGV[5],
    'created_at', ARGV[6])
return 0
"#;

pub async fn init_redis(redis_url: &str) -> Result<ConnectionManager, StoreError> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(500));

    let client = Client::open(redis_url)?;
    let connection_manager = client.get_connection_manager_with_config(config).await?;

    Ok(connection_manager)
}

fn user_key(id: u64) -> String {
    format!("user:{id}")
}

pub struct RedisStore {
    connection: ConnectionManager,
    save_user: Script,
}

impl RedisStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self {
            connection,
            save_user: Script::new(SAVE_USER),
        }
    }

    async fn load(&self, id: u64) -> Result<Option<User>, StoreError> {
        let mut connection = self.connection.clone();
        let fields: HashMap<String, String> = connection.hgetall(user_key(id)).await?;

        if fields.is_empty() {
            return Ok(None);
        }

        parse_user(id, fields).map(Some)
    }
}

#[async_trait]
impl UserStore for RedisStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let mut connection = self.connection.clone();
        let id: Option<u64> = connection.hget(BY_EMAIL, email).await?;

        match id {
            Some(id) => self.load(id).await,
            None => Ok(None),
        }
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<User>, StoreError> {
        self.load(id).await
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let mut connection = self.connection.clone();

        Ok(connection.hexists(BY_EMAIL, email).await?)
    }

    async fn exists_by_nickname(&self, nickname: &str) -> Result<bool, StoreError> {
        let mut connection = self.connection.clone();

        Ok(connection.hexists(BY_NICKNAME, nickname).await?)
    }

    async fn save(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut connection = self.connection.clone();

        let id: u64 = connection.incr(NEXT_ID, 1).await?;
        let user = User {
            id,
            email: new_user.email,
            password_hash: new_user.password_hash,
            nickname: new_user.nickname,
            role: new_user.role,
            created_at: Utc::now(),
        };

        let outcome: i64 = self
            .save_user
            .key(user_key(id))
            .key(BY_EMAIL)
            .key(BY_NICKNAME)
            .arg(id)
            .arg(&user.email)
            .arg(&user.nickname)
            .arg(&user.password_hash)
            .arg(user.role.as_str())
            .arg(user.created_at.to_rfc3339())
            .invoke_async(&mut connection)
            .await?;

        save_outcome(id, outcome)?;

        Ok(user)
    }
}

fn save_outcome(id: u64, outcome: i64) -> Result<(), StoreError> {
    match outcome {
        0 => Ok(()),
        1 => {
            debug!("Email taken, id {id} burned");
            Err(StoreError::DuplicateEmail)
        }
        2 => {
            debug!("Nickname taken, id {id} burned");
            Err(StoreError::DuplicateNickname)
        }
        other => Err(StoreError::Corrupt {
            id,
            reason: format!("unexpected save result {other}"),
        }),
    }
}

fn parse_user(id: u64, mut fields: HashMap<String, String>) -> Result<User, StoreError> {
    let mut take = |name: &str| {
        fields.remove(name).ok_or_else(|| StoreError::Corrupt {
            id,
            reason: format!("missing field {name}"),
        })
    };

    let email = take("email")?;
    let password_hash = take("password_hash")?;
    let nickname = take("nickname")?;
    let role = take("role")?
        .parse::<Role>()
        .map_err(|reason| StoreError::Corrupt { id, reason })?;
    let created_at = DateTime::parse_from_rfc3339(&take("created_at")?)
        .map_err(|e| StoreError::Corrupt {
            id,
            reason: e.to_string(),
        })?
        .with_timezone(&Utc);

    Ok(User {
        id,
        email,
        password_hash,
        nickname,
        role,
        created_at,
    })
}
