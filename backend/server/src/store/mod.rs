//! # Document Store
//!
//! What the services need from persistence: insert, find, find one, update
//! one matching, delete one matching, sort. Two backends implement it, Redis
//! for deployments and an in-memory map for tests and local runs.
//!
//! Mutations never take a bare id. They take an [`OwnedMatch`], so a record
//! only matches when both its id and its author line up. A wrong id, a wrong
//! owner, or both all come back the same way: nothing matched.
use std::sync::Arc;

use async_trait::async_trait;
use book::{ListOptions, Recipe, RecipePatch, RecordId, User};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use thiserror::Error;

pub mod memory;
pub mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("Corrupt document: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Username {0} already taken")]
    DuplicateUsername(String),
}

/// Ownership-scoped match: `{ _id: id, author: author }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnedMatch {
    pub id: RecordId,
    pub author: RecordId,
}

impl OwnedMatch {
    pub fn new(id: RecordId, author: RecordId) -> Self {
        Self { id, author }
    }

    pub fn matches(&self, recipe: &Recipe) -> bool {
        recipe.id == self.id && recipe.author == self.author
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub author: Option<RecordId>,
}

impl RecipeFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_author(author: RecordId) -> Self {
        Self {
            author: Some(author),
        }
    }

    pub fn matches(&self, recipe: &Recipe) -> bool {
        self.author.is_none_or(|author| recipe.author == author)
    }
}

#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn insert_recipe(&self, recipe: Recipe) -> Result<Recipe, StoreError>;

    async fn find_recipes(
        &self,
        filter: RecipeFilter,
        options: ListOptions,
    ) -> Result<Vec<Recipe>, StoreError>;

    async fn find_recipe(&self, id: &RecordId) -> Result<Option<Recipe>, StoreError>;

    /// Applies `patch` to the one record matching `owned` and returns it with
    /// a fresh `updated_at`, or `None` when nothing matched.
    async fn update_recipe(
        &self,
        owned: OwnedMatch,
        patch: &RecipePatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Recipe>, StoreError>;

    /// Number of records removed, 0 or 1.
    async fn delete_recipe(&self, owned: OwnedMatch) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: User) -> Result<User, StoreError>;

    async fn find_user(&self, id: &RecordId) -> Result<Option<User>, StoreError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
}

pub trait Store: RecipeStore + UserStore {}

impl<T: RecipeStore + UserStore> Store for T {}

pub type SharedStore = Arc<dyn Store>;

/// Current time at the resolution documents are stored and served with.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// `updated_at` has to move strictly forward even when the clock has not.
/// Compared in whole milliseconds, the way the document carries it.
pub fn next_updated_at(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let now = now.trunc_subsecs(3);
    if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}
