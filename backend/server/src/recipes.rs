//! # Recipes
//!
//! CRUD over recipe documents.
//!
//! ## Ownership
//!
//! There is no permission check before a write. The actor goes into the
//! store's match as `{ _id, author }`, so a write by anyone but the author
//! simply matches nothing:
//! - update returns `None`
//! - delete returns `0`
//!
//! Callers cannot tell a missing recipe from someone else's recipe.
//!
//! ## Concurrency
//!
//! One store call per operation and no locks held here. Two updates racing on
//! the same recipe both land, last one wins.
use book::{ListOptions, NewRecipe, Recipe, RecipePatch, RecordId, ValidationError};
use tracing::{debug, info};

use crate::{
    error::AppError,
    store::{OwnedMatch, RecipeFilter, SharedStore, now_millis},
    users::Users,
};

/// Turns the identity handed over by the session layer into an author id.
///
/// No identity at all is a broken call, not bad data. An empty or malformed
/// one fails validation on `author` like any other field would.
pub fn resolve_actor(actor: Option<&str>) -> Result<RecordId, AppError> {
    let raw = actor.ok_or(AppError::MissingActor)?;

    let mut errors = ValidationError::new("Recipe");
    if raw.is_empty() {
        errors.required("author");
        return Err(errors.into());
    }

    raw.parse().map_err(|e| {
        errors.invalid("author", &e);
        errors.into()
    })
}

#[derive(Clone)]
pub struct Recipes {
    store: SharedStore,
    users: Users,
}

impl Recipes {
    pub fn new(store: SharedStore) -> Self {
        Self {
            users: Users::new(store.clone()),
            store,
        }
    }

    pub async fn create(&self, actor: &RecordId, draft: NewRecipe) -> Result<Recipe, AppError> {
        let recipe = Recipe::new(*actor, draft, now_millis());
        recipe.validate()?;

        let recipe = self.store.insert_recipe(recipe).await?;
        info!("Created recipe {} by {}", recipe.id, recipe.author);

        Ok(recipe)
    }

    pub async fn list_all(&self, options: ListOptions) -> Result<Vec<Recipe>, AppError> {
        Ok(self.store.find_recipes(RecipeFilter::all(), options).await?)
    }

    pub async fn list_by_author(
        &self,
        handle: &str,
        options: ListOptions,
    ) -> Result<Vec<Recipe>, AppError> {
        let Some(author) = self.users.resolve_author_handle(handle).await? else {
            return Ok(Vec::new());
        };

        let recipes = self
            .store
            .find_recipes(RecipeFilter::by_author(author), options)
            .await?;
        debug!("Found {} recipes by {handle}", recipes.len());

        Ok(recipes)
    }

    pub async fn get_by_id(&self, id: &RecordId) -> Result<Option<Recipe>, AppError> {
        Ok(self.store.find_recipe(id).await?)
    }

    pub async fn update(
        &self,
        actor: &RecordId,
        id: &RecordId,
        patch: RecipePatch,
    ) -> Result<Option<Recipe>, AppError> {
        patch.validate()?;

        let updated = self
            .store
            .update_recipe(OwnedMatch::new(*id, *actor), &patch, now_millis())
            .await?;

        match &updated {
            Some(recipe) => info!("Updated recipe {}", recipe.id),
            None => debug!("Update of {id} by {actor} matched nothing"),
        }

        Ok(updated)
    }

    pub async fn delete(&self, actor: &RecordId, id: &RecordId) -> Result<u64, AppError> {
        let deleted = self
            .store
            .delete_recipe(OwnedMatch::new(*id, *actor))
            .await?;

        if deleted > 0 {
            info!("Deleted recipe {id}");
        }

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use book::{NewUser, SortBy, SortOrder, User};

    use super::*;
    use crate::store::MemoryStore;

    const SOUP_STEPS: &str = "Remove chicken thigh from bone\n\nHeat oil in a pan and brown chicken and vegetables\n\nBring chicken stock to a boil\n\nAdd browned chicken and vegetables and cook for 3 hours";
    const SOUP_IMAGE: &str =
        "https://cdn.pixabay.com/photo/2018/01/04/17/17/chicken-soup-3061166_960_720.jpg";

    struct Fixture {
        recipes: Recipes,
        owner: User,
        stranger: User,
        created: Vec<Recipe>,
    }

    fn samples() -> Vec<NewRecipe> {
        vec![
            NewRecipe {
                name: "Chicken Soup".to_string(),
                ingredients: Some(
                    "1 lb chicken thigh\n2 tbsp oil\n1 onion\n2 carrots\n1 qt chicken stock"
                        .to_string(),
                ),
                steps: Some(SOUP_STEPS.to_string()),
                image: Some(SOUP_IMAGE.to_string()),
            },
            NewRecipe {
                name: "Ham Sandwich".to_string(),
                ingredients: Some("4 oz ham\n2 slices of bread".to_string()),
                steps: Some(
                    "Place ham on one slice of bread\n\nPlace second slice on top\n\nCut diagonally into two triangles"
                        .to_string(),
                ),
                image: None,
            },
            NewRecipe {
                name: "Coleslaw".to_string(),
                ingredients: Some("1 head of cabbage\n2 carrots\n3/4 cup mayonnaise".to_string()),
                steps: Some("Shred cabbage and carrots\n\nWhisk together mayonnaise".to_string()),
                image: None,
            },
        ]
    }

    async fn fixture() -> Fixture {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let users = Users::new(store.clone());
        let recipes = Recipes::new(store);

        let owner = users
            .create_user(NewUser {
                username: "hello".to_string(),
            })
            .await
            .unwrap();
        let stranger = users
            .create_user(NewUser {
                username: "test".to_string(),
            })
            .await
            .unwrap();

        let mut created = Vec::new();
        for draft in samples() {
            created.push(recipes.create(&owner.id, draft).await.unwrap());
        }

        Fixture {
            recipes,
            owner,
            stranger,
            created,
        }
    }

    fn zero_id() -> RecordId {
        "000000000000000000000000".parse().unwrap()
    }

    #[tokio::test]
    async fn test_create_with_all_fields() {
        let f = fixture().await;
        let soup = &f.created[0];

        assert_eq!(soup.author, f.owner.id);
        assert_eq!(soup.created_at, soup.updated_at);

        let found = f.recipes.get_by_id(&soup.id).await.unwrap().unwrap();
        assert_eq!(&found, soup);
        assert_eq!(found.image.as_deref(), Some(SOUP_IMAGE));
    }

    #[tokio::test]
    async fn test_create_with_only_a_name() {
        let f = fixture().await;
        let recipe = f
            .recipes
            .create(&f.owner.id, NewRecipe::named("Only a name"))
            .await
            .unwrap();

        assert!(recipe.ingredients.is_none());
        assert!(f.recipes.get_by_id(&recipe.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_without_name_fails() {
        let f = fixture().await;
        let draft = NewRecipe {
            ingredients: Some("Recipe with no name".to_string()),
            ..Default::default()
        };

        let err = f.recipes.create(&f.owner.id, draft).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("`name` is required"));
        assert_eq!(f.recipes.list_all(ListOptions::default()).await.unwrap().len(), 3);
    }

    #[test]
    fn test_actor_resolution() {
        let err = resolve_actor(Some("")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("`author` is required"));

        let err = resolve_actor(Some("not-an-id")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("at path `author`"));

        assert!(matches!(resolve_actor(None), Err(AppError::MissingActor)));
        assert_eq!(resolve_actor(Some("000000000000000000000000")).unwrap(), zero_id());
    }

    #[tokio::test]
    async fn test_list_all_newest_first() {
        let f = fixture().await;
        let recipes = f.recipes.list_all(ListOptions::default()).await.unwrap();

        assert_eq!(recipes.len(), f.created.len());
        assert!(recipes.windows(2).all(|pair| pair[0].created_at >= pair[1].created_at));
    }

    #[tokio::test]
    async fn test_list_sort_options() {
        let f = fixture().await;
        let touched = f
            .recipes
            .update(
                &f.owner.id,
                &f.created[0].id,
                RecipePatch {
                    image: Some("https://example.com/new.jpg".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        let recipes = f
            .recipes
            .list_all(ListOptions::new(SortBy::UpdatedAt, SortOrder::Ascending))
            .await
            .unwrap();

        assert!(recipes.windows(2).all(|pair| pair[0].updated_at <= pair[1].updated_at));
        assert_eq!(recipes.last().map(|r| r.updated_at), Some(touched.updated_at));
    }

    #[tokio::test]
    async fn test_list_by_author() {
        let f = fixture().await;

        let mine = f
            .recipes
            .list_by_author("hello", ListOptions::default())
            .await
            .unwrap();
        assert_eq!(mine.len(), 3);
        assert!(mine.iter().all(|r| r.author == f.owner.id));

        let theirs = f
            .recipes
            .list_by_author("test", ListOptions::default())
            .await
            .unwrap();
        assert!(theirs.is_empty());

        let nobody = f
            .recipes
            .list_by_author("nonexistent", ListOptions::default())
            .await
            .unwrap();
        assert!(nobody.is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let f = fixture().await;
        assert!(f.recipes.get_by_id(&zero_id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_changes_only_given_field() {
        let f = fixture().await;
        let soup = &f.created[0];

        let updated = f
            .recipes
            .update(
                &f.owner.id,
                &soup.id,
                RecipePatch {
                    ingredients: Some("Test contents".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        let found = f.recipes.get_by_id(&soup.id).await.unwrap().unwrap();
        assert_eq!(found, updated);
        assert_eq!(found.ingredients.as_deref(), Some("Test contents"));
        assert_eq!(found.name, "Chicken Soup");
        assert_eq!(found.steps.as_deref(), Some(SOUP_STEPS));
        assert_eq!(found.image.as_deref(), Some(SOUP_IMAGE));
        assert_eq!(found.author, f.owner.id);
        assert_eq!(found.created_at, soup.created_at);
        assert!(found.updated_at > soup.updated_at);
    }

    #[tokio::test]
    async fn test_empty_update_still_bumps_timestamp() {
        let f = fixture().await;
        let soup = &f.created[0];

        let first = f
            .recipes
            .update(&f.owner.id, &soup.id, RecipePatch::default())
            .await
            .unwrap()
            .unwrap();
        let second = f
            .recipes
            .update(&f.owner.id, &soup.id, RecipePatch::default())
            .await
            .unwrap()
            .unwrap();

        assert!(first.updated_at > soup.updated_at);
        assert!(second.updated_at > first.updated_at);
    }

    #[tokio::test]
    async fn test_immediate_update_advances_served_timestamp() {
        let f = fixture().await;

        for _ in 0..50 {
            let created = f
                .recipes
                .create(&f.owner.id, NewRecipe::named("Quick edit"))
                .await
                .unwrap();
            let before = serde_json::to_value(&created).unwrap();
            assert_eq!(serde_json::from_value::<Recipe>(before.clone()).unwrap(), created);

            let updated = f
                .recipes
                .update(&f.owner.id, &created.id, RecipePatch::default())
                .await
                .unwrap()
                .unwrap();
            let after = serde_json::to_value(&updated).unwrap();

            assert!(after["updatedAt"].as_i64() > before["updatedAt"].as_i64());
            assert_eq!(after["createdAt"], before["createdAt"]);
        }
    }

    #[tokio::test]
    async fn test_update_rejects_empty_name() {
        let f = fixture().await;
        let patch = RecipePatch {
            name: Some(String::new()),
            ..Default::default()
        };

        let err = f
            .recipes
            .update(&f.owner.id, &f.created[0].id, patch)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_mismatches_are_none() {
        let f = fixture().await;
        let soup = &f.created[0];
        let patch = RecipePatch {
            name: Some("not my recipe".to_string()),
            ..Default::default()
        };

        let attempts = [
            (zero_id(), zero_id()),
            (zero_id(), soup.id),
            (f.owner.id, zero_id()),
            (f.stranger.id, soup.id),
        ];

        for (actor, id) in attempts {
            let result = f.recipes.update(&actor, &id, patch.clone()).await.unwrap();
            assert!(result.is_none());
        }

        let found = f.recipes.get_by_id(&soup.id).await.unwrap().unwrap();
        assert_eq!(&found, soup);
    }

    #[tokio::test]
    async fn test_delete_by_owner() {
        let f = fixture().await;
        let soup = &f.created[0];

        assert_eq!(f.recipes.delete(&f.owner.id, &soup.id).await.unwrap(), 1);
        assert!(f.recipes.get_by_id(&soup.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_mismatches_are_zero() {
        let f = fixture().await;
        let soup = &f.created[0];

        let attempts = [
            (zero_id(), soup.id),
            (f.owner.id, zero_id()),
            (zero_id(), zero_id()),
            (f.stranger.id, soup.id),
        ];

        for (actor, id) in attempts {
            assert_eq!(f.recipes.delete(&actor, &id).await.unwrap(), 0);
        }

        assert!(f.recipes.get_by_id(&soup.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_three_recipes_scenario() {
        let f = fixture().await;
        let options = ListOptions::default();

        assert_eq!(f.recipes.list_all(options).await.unwrap().len(), 3);
        assert_eq!(f.recipes.list_by_author("hello", options).await.unwrap().len(), 3);
        assert_eq!(
            f.recipes
                .list_by_author("nonexistent", options)
                .await
                .unwrap()
                .len(),
            0
        );

        let slaw = &f.created[2];
        assert_eq!(f.recipes.delete(&f.owner.id, &slaw.id).await.unwrap(), 1);
        assert_eq!(f.recipes.list_all(options).await.unwrap().len(), 2);
        assert_eq!(f.recipes.delete(&f.owner.id, &slaw.id).await.unwrap(), 0);
    }
}
