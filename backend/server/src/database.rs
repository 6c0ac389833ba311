//! # Redis
//!
//! Document store for recipes and users.
//!
//! ## Layout
//!
//! - `recipes`: hash, recipe id to JSON document
//! - `recipes:author:{id}`: set of recipe ids owned by a user
//! - `users`: hash, user id to JSON document
//! - `users:username`: hash, username to user id
//!
//! ## Ownership
//!
//! Update and delete run as Lua scripts. The script reads the document,
//! compares `author` against the caller and writes in the same step, so the
//! ownership check and the mutation are one atomic round trip.
use std::time::Duration;

use redis::{
    Client, RedisError,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use tracing::info;

pub async fn init_redis(redis_url: &str) -> Result<ConnectionManager, RedisError> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(100));

    let client = Client::open(redis_url)?;
    let connection_manager = client.get_connection_manager_with_config(config).await?;

    info!("Connected to Redis");

    Ok(connection_manager)
}
