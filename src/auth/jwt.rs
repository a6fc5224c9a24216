//! Signed session tokens, one signing key per role.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;
use crate::domain::Role;
use crate::error::{MarketError, MarketResult};

/// Validity window of every issued token.
pub const TOKEN_LIFETIME_SECS: i64 = 3600;

/// JWT claims for authenticated accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username).
    pub sub: String,
    /// Role the token was minted for.
    pub role: Role,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued at time (Unix timestamp).
    pub iat: i64,
    /// Issuer.
    pub iss: String,
}

/// JWT token manager scoped to a single role.
#[derive(Clone)]
pub struct JwtManager {
    role: Role,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtManager {
    /// Create a manager signing `role` tokens with `secret`.
    pub fn new(role: Role, secret: &str, issuer: String) -> Self {
        Self {
            role,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Issue a token for `username` valid for [`TOKEN_LIFETIME_SECS`].
    pub fn issue(&self, username: &str) -> MarketResult<String> {
        self.issue_with_lifetime(username, Duration::seconds(TOKEN_LIFETIME_SECS))
    }

    pub(crate) fn issue_with_lifetime(
        &self,
        username: &str,
        lifetime: Duration,
    ) -> MarketResult<String> {
        let now = Utc::now();
        let exp = now + lifetime;

        let claims = Claims {
            sub: username.to_string(),
            role: self.role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| MarketError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a token minted for this manager's role.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.leeway = 0;

        let token_data: TokenData<Claims> = decode(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => {
                    tracing::debug!(error = %e, role = %self.role, "JWT validation failed");
                    AuthError::Invalid
                }
            })?;

        if token_data.claims.role != self.role {
            tracing::debug!(
                expected = %self.role,
                presented = %token_data.claims.role,
                "Token minted for another role"
            );
            return Err(AuthError::Invalid);
        }

        Ok(token_data.claims)
    }
}
