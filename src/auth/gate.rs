//! The per-role authentication gate.
//!
//! A [`RoleGate`] turns the credential material on a request into a verified
//! [`Identity`] of its role, or rejects it. The administrator and user gates
//! are the same type, each built with its own signing key; both share the
//! catalog store, whose credential namespaces are disjoint per role.

use std::sync::Arc;

use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use thiserror::Error;

use crate::auth::{JwtManager, SecretHasher};
use crate::domain::{CredentialRecord, Identity, Role};
use crate::error::{ErrorResponse, MarketError, MarketResult};
use crate::storage::CatalogStore;

/// Header carrying the identity half of a credential pair.
pub const USERNAME_HEADER: &str = "username";
/// Header carrying the secret half of a credential pair.
pub const PASSWORD_HEADER: &str = "password";

/// How a gate verifies protected requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStrategy {
    /// `username` / `password` headers checked against the credential store.
    DirectLookup,
    /// `Authorization: Bearer <jwt>` signed with the role's key.
    #[default]
    SignedToken,
}

impl std::fmt::Display for GateStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateStrategy::DirectLookup => write!(f, "direct_lookup"),
            GateStrategy::SignedToken => write!(f, "signed_token"),
        }
    }
}

/// Why a gate refused a request.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing credential")]
    Missing,

    #[error("Malformed credential: {0}")]
    Malformed(&'static str),

    #[error("Invalid credential")]
    Invalid,

    #[error("Session expired")]
    Expired,

    #[error("Credential store unavailable: {0}")]
    Unavailable(#[from] MarketError),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Missing => "MISSING_CREDENTIAL",
            AuthError::Malformed(_) => "MALFORMED_CREDENTIAL",
            AuthError::Invalid => "INVALID_CREDENTIAL",
            AuthError::Expired => "EXPIRED_CREDENTIAL",
            AuthError::Unavailable(_) => "CREDENTIAL_STORE_UNAVAILABLE",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::Unavailable(e) => {
                tracing::error!(error = %e, "Credential lookup failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::UNAUTHORIZED,
        };
        let error = match &self {
            AuthError::Unavailable(_) => "Authentication is temporarily unavailable".to_string(),
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error,
            code: self.code().to_string(),
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

/// Authentication gate for one role.
#[derive(Clone)]
pub struct RoleGate {
    strategy: GateStrategy,
    tokens: JwtManager,
    hasher: SecretHasher,
    store: Arc<dyn CatalogStore>,
}

impl RoleGate {
    pub fn new(
        strategy: GateStrategy,
        tokens: JwtManager,
        hasher: SecretHasher,
        store: Arc<dyn CatalogStore>,
    ) -> Self {
        Self {
            strategy,
            tokens,
            hasher,
            store,
        }
    }

    pub fn role(&self) -> Role {
        self.tokens.role()
    }

    pub fn strategy(&self) -> GateStrategy {
        self.strategy
    }

    /// Verify the credential material in `headers`.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
        match self.strategy {
            GateStrategy::DirectLookup => self.authenticate_pair(headers).await,
            GateStrategy::SignedToken => self.authenticate_token(headers),
        }
    }

    async fn authenticate_pair(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
        let username = header_value(headers, USERNAME_HEADER)?;
        let password = header_value(headers, PASSWORD_HEADER)?;

        let (username, password) = match (username.map(str::trim), password) {
            (None, None) => return Err(AuthError::Missing),
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
            _ => {
                return Err(AuthError::Malformed(
                    "expected both username and password headers",
                ))
            }
        };

        if !self.check_secret(username, password).await? {
            return Err(AuthError::Invalid);
        }

        Ok(Identity {
            role: self.role(),
            username: username.to_string(),
        })
    }

    fn authenticate_token(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
        let value = header_value(headers, AUTHORIZATION.as_str())?.ok_or(AuthError::Missing)?;

        let token = value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Malformed("expected 'Bearer <token>'"))?;

        let claims = self.tokens.verify(token)?;

        Ok(Identity {
            role: self.role(),
            username: claims.sub,
        })
    }

    /// Whether `secret` matches the stored record for `username`.
    pub async fn check_secret(&self, username: &str, secret: &str) -> MarketResult<bool> {
        let Some(record) = self.store.find_credential(self.role(), username).await? else {
            return Ok(false);
        };
        self.hasher.verify(secret, &record.password_hash).await
    }

    /// Create an account in this role's credential store.
    pub async fn register(&self, username: &str, secret: &str) -> MarketResult<()> {
        let password_hash = self.hasher.hash(secret).await?;
        self.store
            .insert_credential(self.role(), CredentialRecord::new(username, password_hash))
            .await
    }

    /// Exchange a credential pair for a session token.
    pub async fn login(&self, username: &str, secret: &str) -> MarketResult<String> {
        if !self.check_secret(username, secret).await? {
            return Err(MarketError::InvalidCredential);
        }
        self.tokens.issue(username)
    }

    #[cfg(test)]
    pub(crate) fn tokens(&self) -> &JwtManager {
        &self.tokens
    }
}

/// Read a header as UTF-8, untouched; a non-UTF-8 value is malformed.
fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, AuthError> {
    headers
        .get(name)
        .map(|v| {
            v.to_str()
                .map_err(|_| AuthError::Malformed("header is not valid UTF-8"))
        })
        .transpose()
}
