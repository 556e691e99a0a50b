//! Bearer token issuance after successful verification.
//!
//! The production token service (JWT or otherwise) is an external
//! collaborator behind [`TokenIssuer`]. The default implementation mints an
//! opaque random token, which is all the core protocol requires.

use async_trait::async_trait;
use rand::RngCore;
use serde::Serialize;

use crate::crypto::SecureRng;
use crate::Result;

/// Wire value of the token type field.
pub const TOKEN_TYPE_BEARER: &str = "Bearer";

/// Default token lifetime in seconds (24 hours).
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 86_400;

/// A minted bearer credential, returned verbatim as the verify response.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BearerToken {
    /// The credential itself.
    pub token: String,
    /// Always `"Bearer"`.
    #[serde(rename = "type")]
    pub token_type: String,
    /// The authenticated username.
    pub username: String,
    /// Lifetime in seconds.
    pub expires_in: u64,
}

/// Mints bearer credentials for authenticated users.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Issues a token for a freshly authenticated username.
    async fn issue(&self, username: &str) -> Result<BearerToken>;
}

/// Issuer of opaque 256-bit random tokens.
pub struct RandomTokenIssuer {
    expires_in: u64,
}

impl RandomTokenIssuer {
    /// Creates an issuer with the given token lifetime in seconds.
    pub fn new(expires_in: u64) -> Self {
        Self { expires_in }
    }
}

impl Default for RandomTokenIssuer {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_TTL_SECS)
    }
}

#[async_trait]
impl TokenIssuer for RandomTokenIssuer {
    async fn issue(&self, username: &str) -> Result<BearerToken> {
        let mut token_bytes = [0u8; 32];
        SecureRng::new().fill_bytes(&mut token_bytes);
        Ok(BearerToken {
            token: hex::encode(token_bytes),
            token_type: TOKEN_TYPE_BEARER.to_string(),
            username: username.to_string(),
            expires_in: self.expires_in,
        })
    }
}
