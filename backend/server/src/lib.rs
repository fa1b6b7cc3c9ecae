//! Backend of a small vocabulary manager.
//!
//! # Overview
//! - Users create words, optionally prefilled from a dictionary lookup on the client
//! - Words are linked as "similar" through directed relations, at most one per ordered pair
//! - A word page lists its relations, the search box finds candidates to link
//! - Deleting a word removes every relation that mentions it
//!
//!
//!
//! # Endpoints
//! - `GET /`, `GET /api/words`: all words, newest first
//! - `GET /api/words/{id}`: a word and its similar words
//! - `GET /api/words/{id}/related-from`: words that list this word as similar
//! - `GET /api/search?q=&exclude=`: substring search, see [`search`]
//! - `POST /vocabulary/{id}`: toggle one relation (`relatedId`) or save a batch (`selectedIds`)
//! - `POST /api/remove-relation`: delete one relation by id
//! - `DELETE /api/delete-word`: cascading delete
//! - `POST /create`: create a word from `newItem` and `dictionaryData`
//!
//!
//!
//! # Setup
//!
//! Run with debug logs.
//! ```sh
//! RUST_LOG=debug DATABASE_PATH=vocabulary.db cargo run
//! ```
use std::time::Duration;

use anyhow::Result;
use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{delete, get, post},
};
use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod error;
pub mod routes;
pub mod search;
pub mod state;
pub mod utils;

use routes::{
    SharedState, create_handler, delete_word_handler, list_handler, related_from_handler,
    relation_handler, remove_relation_handler, search_handler, word_handler,
};
use state::State;

pub async fn start_server() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new()?;

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    serve(listener, state).await?;

    info!("Server shutting down...");
    Ok(())
}

pub async fn serve(listener: TcpListener, state: SharedState) -> Result<()> {
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(state.config.cors_max_age_secs));

    Router::new()
        .route("/", get(list_handler))
        .route("/api/words", get(list_handler))
        .route("/api/words/{id}", get(word_handler))
        .route("/api/words/{id}/related-from", get(related_from_handler))
        .route("/api/search", get(search_handler))
        .route("/api/remove-relation", post(remove_relation_handler))
        .route("/api/delete-word", delete(delete_word_handler))
        .route("/vocabulary/{id}", post(relation_handler))
        .route("/create", post(create_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            return std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await
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
