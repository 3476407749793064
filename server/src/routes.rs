use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use crate::{
    forms::{create_record_handler, get_record_handler, list_records_handler},
    session::{login_handler, logout_handler, me_handler, password_reset_handler},
    state::AppState,
    stats::stats_handler,
    users::{
        create_user_handler, delete_user_handler, list_users_handler, update_user_handler,
    },
};

pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/ping", get(ping_handler))
        .route("/login_user", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/auth/me", get(me_handler))
        .route("/password_reset", post(password_reset_handler))
        .route(
            "/create_user",
            post(create_user_handler).get(list_users_handler),
        )
        .route(
            "/create_user/{id}",
            put(update_user_handler).delete(delete_user_handler),
        )
        .route(
            "/records",
            get(list_records_handler).post(create_record_handler),
        )
        .route("/records/stats", get(stats_handler))
        .route("/records/{id}", get(get_record_handler))
        .with_state(state)
}

pub async fn ping_handler() -> impl IntoResponse {
    (StatusCode::OK, "pong")
}

pub async fn root_handler() -> impl IntoResponse {
    Json(json!({
        "ok": true,
        "name": "Registro API",
        "time": Utc::now().to_rfc3339(),
    }))
}
