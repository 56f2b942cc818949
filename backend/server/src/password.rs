use thiserror::Error;
use tokio::task::{JoinError, spawn_blocking};
use tracing::warn;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Hashing task failed: {0}")]
    Task(#[from] JoinError),
}

#[derive(Debug, Clone, Copy)]
pub struct PasswordEncoder {
    cost: u32,
}

impl PasswordEncoder {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hashes on the blocking pool, bcrypt at production cost takes tens of milliseconds.
    pub async fn encode(&self, raw: &str) -> Result<String, PasswordError> {
        let raw = raw.to_string();
        let cost = self.cost;

        Ok(spawn_blocking(move || bcrypt::hash(raw, cost)).await??)
    }

    pub async fn matches(&self, raw: &str, hash: &str) -> bool {
        let raw = raw.to_string();
        let hash = hash.to_string();

        match spawn_blocking(move || bcrypt::verify(raw, &hash)).await {
            Ok(Ok(matched)) => matched,
            Ok(Err(e)) => {
                warn!("Stored password hash unusable: {e}");
                false
            }
            Err(e) => {
                warn!("Password check task failed: {e}");
                false
            }
        }
    }
}
