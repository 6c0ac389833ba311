//! Documentation of a recipe sharing blog backend.
//!
//!
//!
//! # General Infrastructure
//! - User goes to the public endpoint running the reverse proxy
//! - Proxy checks the session and forwards to this server with the user's id in `x-user-id`
//! - This server never sees passwords or tokens, only the resolved id
//! - Requests without the header can still read recipes, but cannot write
//!
//!
//!
//! # Ownership
//!
//! **Goal**: Only the author of a recipe may change or remove it, without ever telling anyone
//! else whether a given recipe id exists.
//!
//! - Every write matches on both `_id` and `author`
//! - No separate "can this user edit" lookup, the match is the check
//! - Wrong id, wrong owner, or both: the write matches nothing
//! - Update answers 404, delete answers `{ "deletedCount": 0 }`
//!
//!
//!
//! # Notes
//!
//! ## Redis
//! Recipes are small JSON documents, a few hundred bytes each. A Redis hash holds all of them,
//! keyed by id, with one set per author so "recipes by user" does not scan the whole hash.
//!
//! Writes that need an ownership check run as Lua scripts, which Redis executes atomically.
//! That keeps check and write in one round trip with no window between them.
//!
//! ## Concurrent edits
//! No version numbers. Two edits to the same recipe both apply, last one wins.
//!
//!
//!
//! # Setup
//!
//! Run against a local Redis.
//! ```sh
//! REDIS_URL=redis://127.0.0.1:6379 RUST_LOG=info cargo run -p cookbook
//! ```
//!
//! Run with nothing persisted.
//! ```sh
//! STORE_BACKEND=memory RUST_LOG=debug cargo run -p cookbook
//! ```
//!
//! Load the sample recipes for a user.
//! ```sh
//! cargo run -p seed -- backend/seed/recipes.json hello
//! ```
//!
//!
//!
//! # Environment
//!
//! | Variable | Default |
//! |---|---|
//! | `RUST_PORT` | `3001` |
//! | `REDIS_URL` | `redis://127.0.0.1:6379` |
//! | `STORE_BACKEND` | `redis` |
//! | `ACTOR_HEADER` | `x-user-id` |
//!
//! Secrets are read from `/run/secrets`, currently only `REDIS_PASSWORD`.
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderName, Method, header::CONTENT_TYPE},
    routing::{get, post},
};
use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod error;
pub mod recipes;
pub mod routes;
pub mod state;
pub mod store;
pub mod users;
pub mod utils;

use config::Config;
use routes::{
    create_recipe_handler, create_user_handler, delete_recipe_handler, get_recipe_handler,
    get_user_handler, health_handler, list_recipes_handler, update_recipe_handler,
};
use state::State;

pub fn build_router(state: Arc<State>) -> Router {
    let cors = cors(state.config.actor_header.clone());

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/recipes",
            get(list_recipes_handler).post(create_recipe_handler),
        )
        .route(
            "/recipes/{id}",
            get(get_recipe_handler)
                .patch(update_recipe_handler)
                .put(update_recipe_handler)
                .delete(delete_recipe_handler),
        )
        .route("/users", post(create_user_handler))
        .route("/users/{id}", get(get_user_handler))
        .layer(cors)
        .with_state(state)
}

fn cors(actor_header: HeaderName) -> CorsLayer {
    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, actor_header])
        .max_age(Duration::from_secs(60 * 60))
}

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = State::new(config).await?;

    info!("Starting server...");
    let app = build_router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
