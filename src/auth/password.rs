//! Secret hashing for stored credentials.

use crate::error::{MarketError, MarketResult};

/// bcrypt hasher with a fixed work factor.
///
/// Hashing and verification run on the blocking pool.
#[derive(Debug, Clone, Copy)]
pub struct SecretHasher {
    cost: u32,
}

impl SecretHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a secret for storage.
    pub async fn hash(&self, secret: &str) -> MarketResult<String> {
        let secret = secret.to_string();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || bcrypt::hash(secret, cost))
            .await
            .map_err(|e| MarketError::Internal(format!("Hashing task failed: {}", e)))?
            .map_err(|e| MarketError::Internal(format!("Failed to hash secret: {}", e)))
    }

    /// Verify a secret against a stored hash.
    ///
    /// A hash that is not valid bcrypt never matches.
    pub async fn verify(&self, secret: &str, hash: &str) -> MarketResult<bool> {
        let secret = secret.to_string();
        let hash = hash.to_string();

        let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(secret, &hash))
            .await
            .map_err(|e| MarketError::Internal(format!("Verification task failed: {}", e)))?;

        match outcome {
            Ok(matches) => Ok(matches),
            Err(e) => {
                tracing::warn!(error = %e, "Stored secret is not a valid bcrypt hash");
                Ok(false)
            }
        }
    }
}
