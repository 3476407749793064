//! # Credential Service
//!
//! Managed identity provider. Owns the accounts, passwords, and bearer
//! tokens; this backend never sees a password hash or mints a token itself.
//!
//! ## Surface used
//!
//! - Sessions: password sign-in, token verification, refresh-token
//!   revocation.
//! - Accounts: create/read/update/delete, admin key required.
//! - Mail flows: password-reset and email-verification dispatch. The
//!   service sends the mail; we only trigger it.
//!
//! Failures come back as `{"error": {"code", "message"}}` with a closed set
//! of codes, mapped below so callers can branch without string matching.

use reqwest::{header::AUTHORIZATION, Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("account not found")]
    UserNotFound,

    #[error("wrong password")]
    WrongPassword,

    #[error("invalid email")]
    InvalidEmail,

    #[error("email already registered")]
    EmailExists,

    #[error("password rejected by the credential service")]
    WeakPassword,

    #[error("too many attempts")]
    TooManyRequests,

    #[error("account disabled")]
    UserDisabled,

    #[error("token expired")]
    TokenExpired,

    #[error("token rejected")]
    InvalidToken,

    #[error("credential service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("credential service error {code}: {message}")]
    Service { code: String, message: String },
}

impl CredentialError {
    fn from_rejection(status: StatusCode, code: String, message: String) -> Self {
        match code.as_str() {
            "USER_NOT_FOUND" => Self::UserNotFound,
            "WRONG_PASSWORD" => Self::WrongPassword,
            "INVALID_EMAIL" => Self::InvalidEmail,
            "EMAIL_EXISTS" => Self::EmailExists,
            "WEAK_PASSWORD" => Self::WeakPassword,
            "TOO_MANY_REQUESTS" => Self::TooManyRequests,
            "USER_DISABLED" => Self::UserDisabled,
            "TOKEN_EXPIRED" => Self::TokenExpired,
            "INVALID_TOKEN" => Self::InvalidToken,
            _ if status == StatusCode::NOT_FOUND => Self::UserNotFound,
            _ if status == StatusCode::TOO_MANY_REQUESTS => Self::TooManyRequests,
            _ => Self::Service { code, message },
        }
    }
}

/// Result of a password sign-in.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub uid: String,
    pub email: String,
    pub token: String,
    pub email_verified: bool,
}

/// Verified-token claims. The subject id is all the gate needs; the email
/// rides along for responses.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    pub uid: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub email_verified: bool,
    pub disabled: bool,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
}

impl AccountUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.display_name.is_none()
            && self.phone_number.is_none()
            && self.email_verified.is_none()
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: ErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

pub struct CredentialClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl CredentialClient {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, CredentialError> {
        let request = self
            .http
            .post(format!("{}/v1/sessions", self.base_url))
            .json(&serde_json::json!({ "email": email, "password": password }));

        self.send(request).await
    }

    pub async fn verify_token(&self, token: &str) -> Result<TokenClaims, CredentialError> {
        let request = self
            .http
            .post(format!("{}/v1/tokens/verify", self.base_url))
            .json(&serde_json::json!({ "token": token }));

        self.send(request).await
    }

    pub async fn create_account(&self, account: &NewAccount) -> Result<Account, CredentialError> {
        let request = self
            .http
            .post(format!("{}/v1/accounts", self.base_url))
            .json(account);

        self.send(request).await
    }

    pub async fn get_account(&self, uid: &str) -> Result<Account, CredentialError> {
        let request = self.http.get(format!("{}/v1/accounts/{uid}", self.base_url));

        self.send(request).await
    }

    pub async fn update_account(
        &self,
        uid: &str,
        update: &AccountUpdate,
    ) -> Result<Account, CredentialError> {
        let request = self
            .http
            .patch(format!("{}/v1/accounts/{uid}", self.base_url))
            .json(update);

        self.send(request).await
    }

    pub async fn delete_account(&self, uid: &str) -> Result<(), CredentialError> {
        let request = self
            .http
            .delete(format!("{}/v1/accounts/{uid}", self.base_url));

        self.send_unit(request).await
    }

    /// Invalidates every refresh token issued to the subject. Live bearer
    /// tokens keep working until they expire; the service will not mint new
    /// ones.
    pub async fn revoke_tokens(&self, uid: &str) -> Result<(), CredentialError> {
        let request = self
            .http
            .post(format!("{}/v1/accounts/{uid}/revoke_tokens", self.base_url));

        self.send_unit(request).await
    }

    pub async fn send_password_reset(&self, email: &str) -> Result<(), CredentialError> {
        let request = self
            .http
            .post(format!("{}/v1/password_resets", self.base_url))
            .json(&serde_json::json!({ "email": email }));

        self.send_unit(request).await
    }

    pub async fn send_verification(&self, token: &str) -> Result<(), CredentialError> {
        let request = self
            .http
            .post(format!("{}/v1/verification_emails", self.base_url))
            .json(&serde_json::json!({ "token": token }));

        self.send_unit(request).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, CredentialError> {
        let response = request
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(response.json::<T>().await?);
        }

        Err(Self::rejection(response).await)
    }

    async fn send_unit(&self, request: RequestBuilder) -> Result<(), CredentialError> {
        let response = request
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(Self::rejection(response).await)
    }

    async fn rejection(response: reqwest::Response) -> CredentialError {
        let status = response.status();
        let body: ErrorBody = response.json().await.unwrap_or_default();

        CredentialError::from_rejection(status, body.error.code, body.error.message)
    }
}

#[cfg(test)]
mod tests {
    use super::{CredentialError, StatusCode};

    fn map(status: StatusCode, code: &str) -> CredentialError {
        CredentialError::from_rejection(status, code.to_string(), String::new())
    }

    #[test]
    fn test_known_codes() {
        assert!(matches!(
            map(StatusCode::BAD_REQUEST, "USER_NOT_FOUND"),
            CredentialError::UserNotFound
        ));
        assert!(matches!(
            map(StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            CredentialError::TokenExpired
        ));
        assert!(matches!(
            map(StatusCode::BAD_REQUEST, "EMAIL_EXISTS"),
            CredentialError::EmailExists
        ));
    }

    #[test]
    fn test_status_fallbacks() {
        assert!(matches!(
            map(StatusCode::NOT_FOUND, ""),
            CredentialError::UserNotFound
        ));
        assert!(matches!(
            map(StatusCode::TOO_MANY_REQUESTS, ""),
            CredentialError::TooManyRequests
        ));
    }

    #[test]
    fn test_unknown_code_kept_verbatim() {
        match map(StatusCode::BAD_REQUEST, "SOMETHING_NEW") {
            CredentialError::Service { code, .. } => assert_eq!(code, "SOMETHING_NEW"),
            other => panic!("unexpected mapping: {other:?}"),
        }
    }
}
