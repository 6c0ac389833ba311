use async_trait::async_trait;
use book::{ListOptions, Recipe, RecipePatch, RecordId, User};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::{OwnedMatch, RecipeFilter, RecipeStore, StoreError, UserStore, next_updated_at};

/// Records kept in insertion order, which doubles as the natural order for
/// ties when sorting.
#[derive(Default)]
pub struct MemoryStore {
    recipes: Mutex<Vec<Recipe>>,
    users: Mutex<Vec<User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecipeStore for MemoryStore {
    async fn insert_recipe(&self, recipe: Recipe) -> Result<Recipe, StoreError> {
        self.recipes.lock().await.push(recipe.clone());

        Ok(recipe)
    }

    async fn find_recipes(
        &self,
        filter: RecipeFilter,
        options: ListOptions,
    ) -> Result<Vec<Recipe>, StoreError> {
        let mut found: Vec<Recipe> = self
            .recipes
            .lock()
            .await
            .iter()
            .filter(|recipe| filter.matches(recipe))
            .cloned()
            .collect();

        options.sort(&mut found);

        Ok(found)
    }

    async fn find_recipe(&self, id: &RecordId) -> Result<Option<Recipe>, StoreError> {
        Ok(self
            .recipes
            .lock()
            .await
            .iter()
            .find(|recipe| recipe.id == *id)
            .cloned())
    }

    async fn update_recipe(
        &self,
        owned: OwnedMatch,
        patch: &RecipePatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Recipe>, StoreError> {
        let mut recipes = self.recipes.lock().await;

        let Some(recipe) = recipes.iter_mut().find(|recipe| owned.matches(recipe)) else {
            return Ok(None);
        };

        recipe.apply(patch);
        recipe.updated_at = next_updated_at(recipe.updated_at, now);

        Ok(Some(recipe.clone()))
    }

    async fn delete_recipe(&self, owned: OwnedMatch) -> Result<u64, StoreError> {
        let mut recipes = self.recipes.lock().await;

        match recipes.iter().position(|recipe| owned.matches(recipe)) {
            Some(index) => {
                recipes.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: User) -> Result<User, StoreError> {
        let mut users = self.users.lock().await;

        if users.iter().any(|existing| existing.username == user.username) {
            return Err(StoreError::DuplicateUsername(user.username));
        }

        users.push(user.clone());

        Ok(user)
    }

    async fn find_user(&self, id: &RecordId) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|user| user.id == *id)
            .cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }
}
