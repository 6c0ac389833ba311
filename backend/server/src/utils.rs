use std::sync::LazyLock;

use axum::{
    body::Bytes,
    http::{HeaderMap, HeaderName},
};
use book::RecordId;
use regex::Regex;
use serde::de::DeserializeOwned;

use crate::{
    error::AppError::{self, MalformedPayload},
    recipes::resolve_actor,
};

static UNDERSCORES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[_]").expect("valid regex"));
static UNSAFE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9- ]").expect("valid regex"));
static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" +").expect("valid regex"));

pub fn get_payload<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|_| MalformedPayload)
}

/// Actor id from the header the proxy fills in. A missing header is a missing
/// actor; a header that is not valid text is treated as a malformed id.
pub fn get_actor(headers: &HeaderMap, actor_header: &HeaderName) -> Result<RecordId, AppError> {
    let raw = headers
        .get(actor_header)
        .map(|value| value.to_str().unwrap_or("?"));

    resolve_actor(raw)
}

pub fn parse_id(raw: &str) -> Result<RecordId, AppError> {
    Ok(raw.parse()?)
}

/// Url-safe form of a recipe name for `/recipes/{id}/{slug}` links.
pub fn slug(input: &str) -> String {
    let s = UNDERSCORES.replace_all(input, " ");
    let s = UNSAFE.replace_all(&s, "");
    let s = SPACES.replace_all(s.trim(), " ");

    s.to_lowercase().replace(' ', "-")
}

pub fn recipe_url(id: &RecordId, name: &str) -> String {
    match slug(name) {
        s if s.is_empty() => format!("/recipes/{id}"),
        s => format!("/recipes/{id}/{s}"),
    }
}
