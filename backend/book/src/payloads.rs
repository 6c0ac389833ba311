//! Listing options shared by the query string and the service layer.
use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::Recipe;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortBy {
    #[default]
    #[serde(rename = "createdAt")]
    CreatedAt,
    #[serde(rename = "updatedAt")]
    UpdatedAt,
    #[serde(rename = "name")]
    Name,
}

impl SortBy {
    pub fn compare(self, a: &Recipe, b: &Recipe) -> Ordering {
        match self {
            SortBy::CreatedAt => a.created_at.cmp(&b.created_at),
            SortBy::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortBy::Name => a.name.cmp(&b.name),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "ascending", alias = "asc")]
    Ascending,
    #[default]
    #[serde(rename = "descending", alias = "desc")]
    Descending,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOptions {
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl ListOptions {
    pub fn new(sort_by: SortBy, sort_order: SortOrder) -> Self {
        Self {
            sort_by,
            sort_order,
        }
    }

    /// Stable sort, so ties keep whatever order the store returned.
    pub fn sort(&self, recipes: &mut [Recipe]) {
        recipes.sort_by(|a, b| {
            let ordering = self.sort_by.compare(a, b);
            match self.sort_order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });
    }
}

/// `GET /recipes` query string. An empty `author` means every author.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeQuery {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub sort_by: Option<SortBy>,
    #[serde(default)]
    pub sort_order: Option<SortOrder>,
}

impl RecipeQuery {
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref().filter(|author| !author.is_empty())
    }

    pub fn options(&self) -> ListOptions {
        ListOptions::new(
            self.sort_by.unwrap_or_default(),
            self.sort_order.unwrap_or_default(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub deleted_count: u64,
}
