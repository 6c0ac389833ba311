//! # Book
//!
//! Records shared by the server and the seeding tool.
//!
//! Everything here is plain data: no store access, no I/O. The server owns
//! persistence and authorization.
use std::fmt::{self, Display};

use thiserror::Error;

pub mod ids;
pub mod payloads;
pub mod recipes;
pub mod users;

pub use ids::{ParseIdError, RecordId};
pub use payloads::{DeleteResult, ListOptions, RecipeQuery, SortBy, SortOrder};
pub use recipes::{NewRecipe, Recipe, RecipePatch};
pub use users::{NewUser, User, UserInfo};

/// Every field that failed, reported together.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub model: &'static str,
    pub fields: Vec<FieldError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub path: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(model: &'static str) -> Self {
        Self {
            model,
            fields: Vec::new(),
        }
    }

    pub fn required(&mut self, path: &'static str) {
        self.fields.push(FieldError {
            path,
            message: format!("Path `{path}` is required."),
        });
    }

    pub fn invalid(&mut self, path: &'static str, err: &ParseIdError) {
        self.fields.push(FieldError {
            path,
            message: format!("{err} at path `{path}`"),
        });
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.fields.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation failed: ", self.model)?;

        for (index, field) in self.fields.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", field.path, field.message)?;
        }

        Ok(())
    }
}

/// Non-blank lines of a multi-line field, trimmed, in order.
pub fn text_to_list(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}
