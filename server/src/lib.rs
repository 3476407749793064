//! Registration backend for the civic-data application.
//!
//! # General Infrastructure
//! - The frontend is served from static hosting; this service only exposes
//!   the JSON API behind a CORS whitelist.
//! - Accounts, passwords and tokens live in the managed Credential Service;
//!   profiles and form submissions live in the managed Document Store.
//!   This service holds no state of its own between requests.
//! - One container, one port, reverse-proxied on the host machine.
//!
//! # Request Flow
//! - Public: `/ping`, `/`, `/login_user`, `/password_reset`
//! - Any valid token: `/logout`, `/auth/me`, `/records`, `/records/{id}`,
//!   `/records/stats`
//! - Administrator only: `/create_user` and its id routes
//!
//! # Setup
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
//!
//! Run against local service emulators.
//! ```sh
//! RUST_LOG=info cargo run -p registro
//! ```
use std::time::Duration;

use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod auth;
pub mod config;
pub mod error;
pub mod forms;
pub mod routes;
pub mod session;
pub mod state;
pub mod stats;
pub mod users;

use config::Config;
use state::AppState;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new();

    info!("Starting server...");

    let app = routes::api_router(state.clone()).layer(cors_layer(&state.config));

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(86400))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
