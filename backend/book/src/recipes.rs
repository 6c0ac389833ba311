//! # Recipes
//!
//! Stored shape of a recipe plus the payloads used to create and edit one.
//!
//! ## Document
//! - `_id`: generated, never changes
//! - `name`: required, non-empty
//! - `author`: id of the owning user, taken from the acting identity
//! - `ingredients`, `steps`: free text, one entry per line
//! - `image`: url
//! - `createdAt`, `updatedAt`: epoch milliseconds, set by the store
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{RecordId, ValidationError, text_to_list};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub name: String,
    pub author: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    /// Builds a fresh record owned by `author`. Both timestamps start equal.
    pub fn new(author: RecordId, draft: NewRecipe, now: DateTime<Utc>) -> Self {
        Self {
            id: RecordId::generate(),
            name: draft.name,
            author,
            ingredients: draft.ingredients,
            steps: draft.steps,
            image: draft.image,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::new("Recipe");

        if self.name.is_empty() {
            errors.required("name");
        }

        errors.into_result()
    }

    /// Applies every field present in `patch`, leaving the rest alone.
    pub fn apply(&mut self, patch: &RecipePatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(ingredients) = &patch.ingredients {
            self.ingredients = Some(ingredients.clone());
        }
        if let Some(steps) = &patch.steps {
            self.steps = Some(steps.clone());
        }
        if let Some(image) = &patch.image {
            self.image = Some(image.clone());
        }
    }

    pub fn ingredient_list(&self) -> Vec<&str> {
        self.ingredients.as_deref().map(text_to_list).unwrap_or_default()
    }

    pub fn step_list(&self) -> Vec<&str> {
        self.steps.as_deref().map(text_to_list).unwrap_or_default()
    }
}

/// Creation payload. `name` defaults to empty so a missing name surfaces as a
/// validation failure instead of a decode failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecipe {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ingredients: Option<String>,
    #[serde(default)]
    pub steps: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl NewRecipe {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Partial update. Absent fields stay untouched; there is no `author` field so
/// ownership cannot move.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl RecipePatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::new("Recipe");

        if self.name.as_deref() == Some("") {
            errors.required("name");
        }

        errors.into_result()
    }
}
