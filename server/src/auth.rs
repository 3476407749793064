//! Request authorization. Two levels: a valid token, or a valid token whose
//! stored profile is an active administrator.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use serde_json::Value;
use services::models::{UserProfile, USERS_COLLECTION};

use crate::{error::AppError, state::AppState};

/// Subject of a verified token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
}

/// Subject that passed the administrator gate, with the profile that
/// authorized it.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub uid: String,
    pub email: Option<String>,
    pub profile: UserProfile,
}

pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AppError::MissingToken)?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AppError::MissingToken)?;

    if token.is_empty() {
        return Err(AppError::MissingToken);
    }

    Ok(token)
}

/// Verifies the bearer token with the Credential Service. No store read.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthUser, AppError> {
    let token = bearer_token(headers)?;
    let claims = state.credentials.verify_token(token).await?;

    Ok(AuthUser {
        uid: claims.uid,
        email: claims.email,
    })
}

/// Verifies the token, then loads `Users/{uid}` and applies [`admin_check`].
pub async fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<AdminUser, AppError> {
    let user = authenticate(state, headers).await?;

    let document = state
        .store
        .get(USERS_COLLECTION, &user.uid)
        .await
        .map_err(|err| match err {
            services::StoreError::NotFound => {
                AppError::Forbidden("no profile for this subject".to_string())
            }
            other => other.into(),
        })?;

    let profile: UserProfile = serde_json::from_value(Value::Object(document.fields))
        .map_err(AppError::internal)?;

    admin_check(&profile)?;

    Ok(AdminUser {
        uid: user.uid,
        email: user.email,
        profile,
    })
}

/// The role/active decision, separate from the IO that loads the profile.
pub fn admin_check(profile: &UserProfile) -> Result<(), AppError> {
    if !profile.is_active {
        return Err(AppError::Forbidden("inactive user".to_string()));
    }

    if !profile.role.eq_ignore_ascii_case("admin") {
        return Err(AppError::Forbidden(
            "administrator role required".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue};
    use services::models::UserProfile;

    use super::{admin_check, bearer_token};
    use crate::error::AppError;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_extraction() {
        assert_eq!(bearer_token(&headers_with("Bearer abc")).unwrap(), "abc");
        assert_eq!(bearer_token(&headers_with("Bearer  abc ")).unwrap(), "abc");
    }

    #[test]
    fn test_missing_or_malformed_header() {
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(AppError::MissingToken)
        ));
        assert!(matches!(
            bearer_token(&headers_with("Basic abc")),
            Err(AppError::MissingToken)
        ));
        assert!(matches!(
            bearer_token(&headers_with("Bearer ")),
            Err(AppError::MissingToken)
        ));
    }

    fn profile(role: &str, is_active: bool) -> UserProfile {
        UserProfile {
            role: role.to_string(),
            is_active,
            ..UserProfile::default()
        }
    }

    #[test]
    fn test_active_admin_passes() {
        assert!(admin_check(&profile("admin", true)).is_ok());
        assert!(admin_check(&profile("Admin", true)).is_ok());
    }

    #[test]
    fn test_inactive_admin_rejected() {
        assert!(matches!(
            admin_check(&profile("admin", false)),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_plain_user_rejected() {
        assert!(matches!(
            admin_check(&profile("user", true)),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            admin_check(&profile("", true)),
            Err(AppError::Forbidden(_))
        ));
    }
}
