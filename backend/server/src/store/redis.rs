use std::collections::HashMap;

use async_trait::async_trait;
use book::{ListOptions, Recipe, RecipePatch, RecordId, User};
use chrono::{DateTime, Utc};
use redis::{AsyncCommands, Script, aio::ConnectionManager};
use tracing::{debug, warn};

use super::{OwnedMatch, RecipeFilter, RecipeStore, StoreError, UserStore};

pub const RECIPES_KEY: &str = "recipes";
pub const USERS_KEY: &str = "users";
pub const USERNAMES_KEY: &str = "users:username";

pub fn author_key(author: &RecordId) -> String {
    format!("{RECIPES_KEY}:author:{author}")
}

// KEYS: recipes, recipes:author:{author}
// ARGV: id, author, patch json, now millis
const UPDATE_OWNED: &str = r#"
local raw = redis.call('HGET', KEYS[1], ARGV[1])
if not raw then return false end
local doc = cjson.decode(raw)
if doc['author'] ~= ARGV[2] then return false end
for field, value in pairs(cjson.decode(ARGV[3])) do
    doc[field] = value
end
local now = tonumber(ARGV[4])
if now <= doc['updatedAt'] then now = doc['updatedAt'] + 1 end
doc['updatedAt'] = now
local encoded = cjson.encode(doc)
redis.call('HSET', KEYS[1], ARGV[1], encoded)
return encoded
"#;

// KEYS: recipes, recipes:author:{author}
// ARGV: id, author
const DELETE_OWNED: &str = r#"
local raw = redis.call('HGET', KEYS[1], ARGV[1])
if not raw then return 0 end
local doc = cjson.decode(raw)
if doc['author'] ~= ARGV[2] then return 0 end
redis.call('HDEL', KEYS[1], ARGV[1])
redis.call('SREM', KEYS[2], ARGV[1])
return 1
"#;

// KEYS: recipes, recipes:author:{author}
const FIND_BY_AUTHOR: &str = r#"
local docs = {}
for _, id in ipairs(redis.call('SMEMBERS', KEYS[2])) do
    local raw = redis.call('HGET', KEYS[1], id)
    if raw then table.insert(docs, raw) end
end
return docs
"#;

// KEYS: users, users:username
// ARGV: id, username, document
const INSERT_USER: &str = r#"
if redis.call('HSETNX', KEYS[2], ARGV[2], ARGV[1]) == 0 then return 0 end
redis.call('HSET', KEYS[1], ARGV[1], ARGV[3])
return 1
"#;

/// Document store over a shared [`ConnectionManager`]. Each call clones the
/// manager, which is a cheap handle onto the same multiplexed connection.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

fn decode_all<T: serde::de::DeserializeOwned>(raw: Vec<String>) -> Result<Vec<T>, StoreError> {
    raw.iter()
        .map(|doc| serde_json::from_str(doc).map_err(StoreError::from))
        .collect()
}

#[async_trait]
impl RecipeStore for RedisStore {
    async fn insert_recipe(&self, recipe: Recipe) -> Result<Recipe, StoreError> {
        let mut connection = self.connection.clone();
        let id = recipe.id.to_string();
        let document = serde_json::to_string(&recipe)?;

        let _: () = redis::pipe()
            .atomic()
            .hset(RECIPES_KEY, &id, document)
            .ignore()
            .sadd(author_key(&recipe.author), &id)
            .ignore()
            .query_async(&mut connection)
            .await?;

        debug!("Stored recipe {id}");

        Ok(recipe)
    }

    async fn find_recipes(
        &self,
        filter: RecipeFilter,
        options: ListOptions,
    ) -> Result<Vec<Recipe>, StoreError> {
        let mut connection = self.connection.clone();

        let raw: Vec<String> = match filter.author {
            Some(author) => {
                Script::new(FIND_BY_AUTHOR)
                    .key(RECIPES_KEY)
                    .key(author_key(&author))
                    .invoke_async(&mut connection)
                    .await?
            }
            None => {
                let all: HashMap<String, String> = connection.hgetall(RECIPES_KEY).await?;
                all.into_values().collect()
            }
        };

        let mut recipes: Vec<Recipe> = decode_all(raw)?;
        recipes.retain(|recipe| filter.matches(recipe));
        options.sort(&mut recipes);

        Ok(recipes)
    }

    async fn find_recipe(&self, id: &RecordId) -> Result<Option<Recipe>, StoreError> {
        let mut connection = self.connection.clone();

        let raw: Option<String> = connection.hget(RECIPES_KEY, id.to_string()).await?;

        Ok(raw.map(|doc| serde_json::from_str(&doc)).transpose()?)
    }

    async fn update_recipe(
        &self,
        owned: OwnedMatch,
        patch: &RecipePatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Recipe>, StoreError> {
        let mut connection = self.connection.clone();

        let raw: Option<String> = Script::new(UPDATE_OWNED)
            .key(RECIPES_KEY)
            .key(author_key(&owned.author))
            .arg(owned.id.to_string())
            .arg(owned.author.to_string())
            .arg(serde_json::to_string(patch)?)
            .arg(now.timestamp_millis())
            .invoke_async(&mut connection)
            .await?;

        if raw.is_none() {
            debug!("No recipe {} owned by {}", owned.id, owned.author);
        }

        Ok(raw.map(|doc| serde_json::from_str(&doc)).transpose()?)
    }

    async fn delete_recipe(&self, owned: OwnedMatch) -> Result<u64, StoreError> {
        let mut connection = self.connection.clone();

        let deleted: u64 = Script::new(DELETE_OWNED)
            .key(RECIPES_KEY)
            .key(author_key(&owned.author))
            .arg(owned.id.to_string())
            .arg(owned.author.to_string())
            .invoke_async(&mut connection)
            .await?;

        Ok(deleted)
    }
}

#[async_trait]
impl UserStore for RedisStore {
    async fn insert_user(&self, user: User) -> Result<User, StoreError> {
        let mut connection = self.connection.clone();

        let inserted: u64 = Script::new(INSERT_USER)
            .key(USERS_KEY)
            .key(USERNAMES_KEY)
            .arg(user.id.to_string())
            .arg(&user.username)
            .arg(serde_json::to_string(&user)?)
            .invoke_async(&mut connection)
            .await?;

        if inserted == 0 {
            warn!("Username {} already taken", user.username);
            return Err(StoreError::DuplicateUsername(user.username));
        }

        Ok(user)
    }

    async fn find_user(&self, id: &RecordId) -> Result<Option<User>, StoreError> {
        let mut connection = self.connection.clone();

        let raw: Option<String> = connection.hget(USERS_KEY, id.to_string()).await?;

        Ok(raw.map(|doc| serde_json::from_str(&doc)).transpose()?)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let mut connection = self.connection.clone();

        let id: Option<String> = connection.hget(USERNAMES_KEY, username).await?;
        let Some(id) = id else {
            return Ok(None);
        };

        let raw: Option<String> = connection.hget(USERS_KEY, id).await?;

        Ok(raw.map(|doc| serde_json::from_str(&doc)).transpose()?)
    }
}
