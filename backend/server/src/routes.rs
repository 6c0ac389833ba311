use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{self, Path, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use book::{DeleteResult, NewRecipe, NewUser, Recipe, RecipePatch, RecipeQuery, UserInfo};
use serde::Serialize;

use crate::{
    error::AppError,
    state::State,
    utils::{get_actor, get_payload, parse_id, recipe_url},
};

type AppState = extract::State<Arc<State>>;

#[derive(Serialize)]
pub struct CreatedRecipe {
    pub recipe: Recipe,
    pub url: String,
}

pub async fn health_handler() -> &'static str {
    "OK"
}

pub async fn list_recipes_handler(
    extract::State(state): AppState,
    Query(query): Query<RecipeQuery>,
) -> Result<Json<Vec<Recipe>>, AppError> {
    let options = query.options();

    let recipes = match query.author() {
        Some(author) => state.recipes.list_by_author(author, options).await?,
        None => state.recipes.list_all(options).await?,
    };

    Ok(Json(recipes))
}

pub async fn get_recipe_handler(
    extract::State(state): AppState,
    Path(id): Path<String>,
) -> Result<Json<Recipe>, AppError> {
    let id = parse_id(&id)?;

    state
        .recipes
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

pub async fn create_recipe_handler(
    extract::State(state): AppState,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let actor = get_actor(&headers, &state.config.actor_header)?;
    let draft: NewRecipe = get_payload(&body)?;

    let recipe = state.recipes.create(&actor, draft).await?;
    let url = recipe_url(&recipe.id, &recipe.name);

    Ok((StatusCode::CREATED, Json(CreatedRecipe { recipe, url })))
}

/// Any mismatch, wrong id or wrong owner, is a 404.
pub async fn update_recipe_handler(
    extract::State(state): AppState,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Recipe>, AppError> {
    let actor = get_actor(&headers, &state.config.actor_header)?;
    let id = parse_id(&id)?;
    let patch: RecipePatch = get_payload(&body)?;

    state
        .recipes
        .update(&actor, &id, patch)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

pub async fn delete_recipe_handler(
    extract::State(state): AppState,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<DeleteResult>, AppError> {
    let actor = get_actor(&headers, &state.config.actor_header)?;
    let id = parse_id(&id)?;

    let deleted_count = state.recipes.delete(&actor, &id).await?;

    Ok(Json(DeleteResult { deleted_count }))
}

pub async fn create_user_handler(
    extract::State(state): AppState,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let draft: NewUser = get_payload(&body)?;
    let user = state.users.create_user(draft).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user_handler(
    extract::State(state): AppState,
    Path(id): Path<String>,
) -> Result<Json<UserInfo>, AppError> {
    let id = parse_id(&id)?;

    state
        .users
        .get_user_info(&id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}
