//! User administration. Every operation is admin-gated and touches both
//! halves of a user: the Credential Service account and the `Users/{uid}`
//! profile document. The account is the source of truth for login; the
//! profile carries the role and active flag the gate reads.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use services::{
    credential::{AccountUpdate, NewAccount},
    models::{UserProfile, USERS_COLLECTION},
    CredentialError, StoreError,
};

use crate::{auth::require_admin, error::AppError, state::AppState};

const ROLES: [&str; 2] = ["admin", "user"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: Option<String>,
    pub phone: String,
}

pub async fn create_user_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let admin = require_admin(&state, &headers).await?;

    let (Some(email), Some(password), Some(full_name), Some(role)) = (
        request.email,
        request.password,
        request.full_name,
        request.role,
    ) else {
        return Err(AppError::Validation(
            "email, password, fullName and role are required".to_string(),
        ));
    };

    if !ROLES.contains(&role.as_str()) {
        return Err(AppError::Validation(
            "role must be admin or user".to_string(),
        ));
    }

    // Administrators are provisioned by another administrator, so their
    // email skips the verification mail loop.
    let account = state
        .credentials
        .create_account(&NewAccount {
            email: email.clone(),
            password,
            display_name: full_name.clone(),
            phone_number: request.phone.clone(),
            email_verified: role == "admin",
            disabled: false,
        })
        .await
        .map_err(account_error)?;

    let now = Utc::now().to_rfc3339();
    let mut fields = Map::new();
    fields.insert("id".to_string(), Value::String(account.uid.clone()));
    fields.insert("email".to_string(), Value::String(email.clone()));
    fields.insert("fullName".to_string(), Value::String(full_name.clone()));
    fields.insert(
        "phone".to_string(),
        Value::String(request.phone.unwrap_or_default()),
    );
    fields.insert("role".to_string(), Value::String(role.clone()));
    fields.insert("isActive".to_string(), Value::Bool(true));
    fields.insert("createdAt".to_string(), Value::String(now.clone()));
    fields.insert("createdBy".to_string(), Value::String(admin.uid));
    fields.insert("updatedAt".to_string(), Value::String(now));

    state
        .store
        .merge(USERS_COLLECTION, &account.uid, &fields)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "user created",
            "user": {
                "id": account.uid,
                "email": email,
                "fullName": full_name,
                "role": role,
            },
        })),
    ))
}

pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    require_admin(&state, &headers).await?;

    let documents = state.store.scan(USERS_COLLECTION).await?;

    let users: Vec<UserSummary> = documents
        .into_iter()
        .map(|document| {
            let id = document.id.clone();
            let profile: UserProfile =
                serde_json::from_value(Value::Object(document.fields)).unwrap_or_default();

            UserSummary {
                id,
                full_name: profile.full_name,
                email: profile.email,
                role: profile.role,
                is_active: profile.is_active,
                created_at: profile.created_at,
                phone: profile.phone,
            }
        })
        .collect();

    Ok(Json(json!({ "success": true, "users": users })))
}

pub async fn update_user_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let admin = require_admin(&state, &headers).await?;

    if let Some(role) = &request.role {
        if !ROLES.contains(&role.as_str()) {
            return Err(AppError::Validation(
                "role must be admin or user".to_string(),
            ));
        }
    }

    ensure_profile_exists(&state, &id).await?;
    let account = get_account_or_404(&state, &id).await?;

    // Only push changed attributes to the Credential Service; an email
    // change drops the verified flag until the owner re-verifies.
    let mut update = AccountUpdate::default();
    if let Some(email) = &request.email {
        if *email != account.email {
            update.email = Some(email.clone());
            update.email_verified = Some(false);
        }
    }
    if let Some(full_name) = &request.full_name {
        if Some(full_name) != account.display_name.as_ref() {
            update.display_name = Some(full_name.clone());
        }
    }
    if let Some(phone) = &request.phone {
        if Some(phone) != account.phone_number.as_ref() {
            update.phone_number = Some(phone.clone());
        }
    }

    if !update.is_empty() {
        state
            .credentials
            .update_account(&id, &update)
            .await
            .map_err(account_error)?;
    }

    let mut patch = Map::new();
    if let Some(full_name) = request.full_name {
        patch.insert("fullName".to_string(), Value::String(full_name));
    }
    if let Some(email) = request.email {
        patch.insert("email".to_string(), Value::String(email));
    }
    if let Some(phone) = request.phone {
        patch.insert("phone".to_string(), Value::String(phone));
    }
    if let Some(role) = request.role {
        patch.insert("role".to_string(), Value::String(role));
    }
    if let Some(is_active) = request.is_active {
        patch.insert("isActive".to_string(), Value::Bool(is_active));
    }
    patch.insert(
        "updatedAt".to_string(),
        Value::String(Utc::now().to_rfc3339()),
    );
    patch.insert("updatedBy".to_string(), Value::String(admin.uid));

    state.store.merge(USERS_COLLECTION, &id, &patch).await?;

    Ok(Json(json!({ "success": true, "message": "user updated" })))
}

pub async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    require_admin(&state, &headers).await?;

    ensure_profile_exists(&state, &id).await?;
    get_account_or_404(&state, &id).await?;

    state
        .credentials
        .delete_account(&id)
        .await
        .map_err(account_error)?;
    state.store.delete(USERS_COLLECTION, &id).await?;

    Ok(Json(json!({ "success": true, "message": "user deleted" })))
}

async fn ensure_profile_exists(state: &AppState, id: &str) -> Result<(), AppError> {
    state
        .store
        .get(USERS_COLLECTION, id)
        .await
        .map_err(|err| match err {
            StoreError::NotFound => {
                AppError::NotFound("user not found in the database".to_string())
            }
            other => other.into(),
        })?;

    Ok(())
}

async fn get_account_or_404(
    state: &AppState,
    id: &str,
) -> Result<services::credential::Account, AppError> {
    state
        .credentials
        .get_account(id)
        .await
        .map_err(|err| match err {
            CredentialError::UserNotFound => {
                AppError::NotFound("user not found in the credential service".to_string())
            }
            other => AppError::internal(other),
        })
}

fn account_error(err: CredentialError) -> AppError {
    match err {
        CredentialError::EmailExists => {
            AppError::Validation("email already registered".to_string())
        }
        CredentialError::WeakPassword => AppError::Validation(
            "password must be at least 6 characters".to_string(),
        ),
        CredentialError::InvalidEmail => AppError::Validation("invalid email".to_string()),
        CredentialError::TooManyRequests => AppError::TooManyRequests,
        other => AppError::internal(other),
    }
}
