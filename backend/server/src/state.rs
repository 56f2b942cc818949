use std::sync::Arc;

use tracing::{info, warn};

use super::{
    config::Config,
    database::{RedisStore, init_redis},
    error::StartupError,
    password::PasswordEncoder,
    service::AuthService,
    token::{TokenError, TokenProvider},
    user::{MemoryStore, UserStore},
};

pub struct AppState {
    pub config: Config,
    pub auth: AuthService,
    pub tokens: TokenProvider,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Arc<Self>, StartupError> {
        let users: Arc<dyn UserStore> = match &config.redis_url {
            Some(redis_url) => {
                info!("Connecting to Redis...");
                Arc::new(RedisStore::new(init_redis(redis_url).await?))
            }
            None => {
                warn!("REDIS_URL not set, users are kept in memory");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::with_store(config, users)?)
    }

    pub fn with_store(config: Config, users: Arc<dyn UserStore>) -> Result<Arc<Self>, TokenError> {
        let tokens = TokenProvider::new(&config.jwt_secret, config.jwt_expiration_ms)?;
        let auth = AuthService::new(users, PasswordEncoder::new(config.bcrypt_cost));

        Ok(Arc::new(Self {
            config,
            auth,
            tokens,
        }))
    }
}
