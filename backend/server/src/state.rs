use std::sync::Arc;

use tracing::info;

use super::{
    config::{Config, StoreKind},
    database::init_redis,
    error::AppError,
    recipes::Recipes,
    store::{MemoryStore, RedisStore, SharedStore},
    users::Users,
};

pub struct State {
    pub config: Config,
    pub recipes: Recipes,
    pub users: Users,
}

impl State {
    pub async fn new(config: Config) -> Result<Arc<Self>, AppError> {
        let store: SharedStore = match config.store {
            StoreKind::Redis => {
                let connection = init_redis(&config.redis_url)
                    .await
                    .map_err(|e| AppError::Store(e.into()))?;
                Arc::new(RedisStore::new(connection))
            }
            StoreKind::Memory => {
                info!("Using in-memory store, nothing will persist");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: SharedStore) -> Arc<Self> {
        Arc::new(Self {
            config,
            recipes: Recipes::new(store.clone()),
            users: Users::new(store),
        })
    }
}
