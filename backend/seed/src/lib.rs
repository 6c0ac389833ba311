//! # Seeding
//!
//! Loads a file of recipes into whatever store the server is configured for,
//! all under one author.
//!
//! 1. Load config the same way the server does.
//! 2. Find the author by username, create them if missing.
//! 3. Create every recipe in the file as that author.
//! 4. Recipes that fail validation are reported and skipped, the rest still load.
use std::{fs, path::Path, sync::Arc};

use anyhow::Context;
use book::{NewRecipe, NewUser, RecordId};
use indicatif::{ProgressBar, ProgressStyle};
use server::{config::Config, error::AppError, state::State};
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub created: usize,
    pub skipped: usize,
}

pub async fn load_recipes(path: &Path, username: &str) -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let drafts = read_recipes(path)?;
    println!("Loaded Recipes: {}\n", drafts.len());

    let state = State::new(Config::load()?).await?;
    let author = find_or_create_author(&state, username).await?;

    let summary = seed_recipes(&state, &author, drafts).await?;

    println!("Total Created: {}", summary.created);
    println!("Total Skipped: {}", summary.skipped);

    Ok(())
}

pub fn read_recipes(path: &Path) -> anyhow::Result<Vec<NewRecipe>> {
    let json_string =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

    parse_recipes(&json_string).with_context(|| format!("parsing {}", path.display()))
}

pub fn parse_recipes(json_string: &str) -> serde_json::Result<Vec<NewRecipe>> {
    serde_json::from_str(json_string)
}

pub async fn find_or_create_author(state: &Arc<State>, username: &str) -> anyhow::Result<RecordId> {
    if let Some(id) = state.users.resolve_author_handle(username).await? {
        println!("Using existing user {username}");
        return Ok(id);
    }

    let user = state
        .users
        .create_user(NewUser {
            username: username.to_string(),
        })
        .await?;
    println!("Created user {username}");

    Ok(user.id)
}

pub async fn seed_recipes(
    state: &Arc<State>,
    author: &RecordId,
    drafts: Vec<NewRecipe>,
) -> anyhow::Result<Summary> {
    let pb = ProgressBar::new(drafts.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )?
        .progress_chars("=> "),
    );

    let mut summary = Summary::default();

    for draft in drafts {
        pb.set_message(format!("Creating {}", draft.name));

        match state.recipes.create(author, draft).await {
            Ok(_) => summary.created += 1,
            Err(AppError::Validation(e)) => {
                warn!("Skipping recipe: {e}");
                summary.skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }

        pb.inc(1);
    }

    pb.finish_with_message("Done");

    Ok(summary)
}
