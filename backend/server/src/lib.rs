//! Documentation of the Standard Board authentication backend.
//!
//!
//!
//! # General Infrastructure
//! - Frontend (Vite dev server on 5173, or 3000) talks to this server directly on 8080
//! - Every route lives under `/api/v1`
//! - Stateless, no server side sessions, the client keeps the access token
//! - Users live in Redis when `REDIS_URL` is set, in memory otherwise
//!
//!
//!
//! # Routes
//!
//! | Method | Path | Auth | Response |
//! |---|---|---|---|
//! | GET | `/api/v1/health` | public | bare health JSON |
//! | POST | `/api/v1/auth/signup` | public | 201 + envelope with the new user |
//! | POST | `/api/v1/auth/login` | public | 200 + envelope with the access token |
//! | GET | `/api/v1/users/me` | bearer | 200 + envelope with the token's user |
//!
//! Unknown paths answer 404 and known paths with the wrong method answer 405, both as envelopes.
//!
//! Everything except health is wrapped in the `{success, data, error}` envelope from [`contract`].
//!
//!
//!
//! # Authentication Flow
//!
//! - Sign up validates the payload, rejects taken emails/nicknames, stores a bcrypt hash
//! - Login looks up the email and checks the hash, both failures give the same message
//! - On success we sign an HS256 JWT with the email as subject, see [`token`]
//! - Protected routes run [`auth::require_auth`], which checks the token and reloads the user
//! - A token whose user has disappeared is treated like a bad token
//!
//!
//!
//! # Notes
//!
//! ## Why 400 for bad credentials
//! The frontend only reads the envelope and shows `error.message`. Keeping every business failure
//! at 400 keeps 401 meaning exactly one thing: the bearer token is missing or bad.
//!
//! ## CORS
//! Credentials are allowed, so origins are an explicit list and request headers are mirrored
//! instead of using a wildcard.
//!
//!
//!
//! # Setup
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
//!
//! Run with an in-memory store.
//! ```sh
//! JWT_SECRET_KEY=$(openssl rand -base64 48) RUST_LOG=info cargo run -p standard-board
//! ```
//!
//! Run against Redis.
//! ```sh
//! REDIS_URL=redis://127.0.0.1:6379 JWT_SECRET_KEY=... cargo run -p standard-board
//! ```
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
};
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tokio::{net::TcpListener, signal::ctrl_c};
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod password;
pub mod routes;
pub mod service;
pub mod state;
pub mod token;
pub mod user;
pub mod utils;

use auth::require_auth;
use config::Config;
use error::StartupError;
use routes::{
    health_handler, login_handler, me_handler, method_not_allowed_handler, not_found_handler,
    sign_up_handler,
};
use state::AppState;

pub async fn start_server() -> Result<(), StartupError> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = AppState::new(config).await?;

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");

    Ok(())
}

pub fn app(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/api/v1/users/me", get(me_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/auth/signup", post(sign_up_handler))
        .route("/api/v1/auth/login", post(login_handler))
        .merge(protected)
        .method_not_allowed_fallback(method_not_allowed_handler)
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|e| warn!("Skipping CORS origin {origin}: {e}"))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .max_age(Duration::from_secs(60 * 60))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
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
                error!("Failed to install signal handler: {e}");
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
