//! Session routes: password login, logout with token revocation, the
//! current-subject lookup, and the password-reset mail trigger.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use services::{models::USERS_COLLECTION, CredentialError, StoreError};
use tracing::warn;

use crate::{auth::authenticate, error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MeQuery {
    pub uid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: Option<String>,
}

pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let (Some(email), Some(password)) = (request.email, request.password) else {
        return Err(AppError::Validation(
            "email and password are required".to_string(),
        ));
    };

    let session = state
        .credentials
        .sign_in(&email, &password)
        .await
        .map_err(login_error)?;

    if !session.email_verified {
        // Best effort: a failed resend should not mask the 403.
        if let Err(err) = state.credentials.send_verification(&session.token).await {
            warn!("could not resend verification mail: {err}");
        }

        return Ok((
            StatusCode::FORBIDDEN,
            Json(json!({
                "success": false,
                "message": "email not verified, a new verification link was sent",
                "emailSent": true,
            })),
        )
            .into_response());
    }

    let role = match state.store.get(USERS_COLLECTION, &session.uid).await {
        Ok(document) => document.fields.get("role").cloned().unwrap_or(Value::Null),
        Err(StoreError::NotFound) => Value::Null,
        Err(other) => return Err(other.into()),
    };

    Ok(Json(json!({
        "success": true,
        "message": "login successful",
        "user": {
            "uid": session.uid,
            "email": session.email,
            "role": role,
            "token": session.token,
        },
    }))
    .into_response())
}

pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let user = authenticate(&state, &headers).await?;

    state.credentials.revoke_tokens(&user.uid).await?;

    // Best effort: the session is already gone even if the stamp fails.
    let now = Utc::now().to_rfc3339();
    let mut patch = Map::new();
    patch.insert("lastLogout".to_string(), Value::String(now.clone()));
    patch.insert("lastActivity".to_string(), Value::String(now));

    if let Err(err) = state.store.merge(USERS_COLLECTION, &user.uid, &patch).await {
        warn!("could not stamp logout for {}: {err}", user.uid);
    }

    Ok(Json(json!({
        "success": true,
        "message": "session closed",
        "userId": user.uid,
    })))
}

pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<MeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user = authenticate(&state, &headers).await?;

    if let Some(uid) = query.uid {
        if uid != user.uid {
            return Err(AppError::Forbidden(
                "uid does not match this token".to_string(),
            ));
        }
    }

    let document = state
        .store
        .get(USERS_COLLECTION, &user.uid)
        .await
        .map_err(|err| match err {
            StoreError::NotFound => AppError::NotFound("user profile not found".to_string()),
            other => other.into(),
        })?;

    let mut profile = Map::new();
    profile.insert("uid".to_string(), Value::String(user.uid));
    profile.insert(
        "email".to_string(),
        Value::String(user.email.unwrap_or_default()),
    );
    profile.extend(document.fields);

    Ok(Json(json!({ "success": true, "user": profile })))
}

pub async fn password_reset_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PasswordResetRequest>,
) -> Result<impl IntoResponse, AppError> {
    let Some(email) = request.email else {
        return Err(AppError::Validation("email is required".to_string()));
    };

    state
        .credentials
        .send_password_reset(&email)
        .await
        .map_err(reset_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "recovery mail sent, check your inbox",
        "data": {
            "email": email,
            "timestamp": Utc::now().to_rfc3339(),
        },
    })))
}

fn login_error(err: CredentialError) -> AppError {
    match err {
        CredentialError::UserNotFound => AppError::Unauthorized("user not registered".to_string()),
        CredentialError::WrongPassword => AppError::Unauthorized("wrong password".to_string()),
        CredentialError::InvalidEmail => AppError::Unauthorized("invalid email".to_string()),
        CredentialError::UserDisabled => {
            AppError::Unauthorized("this account has been disabled".to_string())
        }
        CredentialError::TooManyRequests => AppError::TooManyRequests,
        other => AppError::internal(other),
    }
}

fn reset_error(err: CredentialError) -> AppError {
    match err {
        CredentialError::UserNotFound => {
            AppError::Validation("no account exists for this email".to_string())
        }
        CredentialError::InvalidEmail => AppError::Validation("invalid email".to_string()),
        CredentialError::TooManyRequests => AppError::TooManyRequests,
        other => AppError::internal(other),
    }
}
