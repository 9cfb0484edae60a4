//! Identity provider trust configuration.

use crate::objects::Identity;
use crate::signature::{self, SignatureError};

/// Shared secret and freshness window for identity assertions.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    secret: Box<[u8]>,
    /// Maximum accepted assertion age, in seconds.
    pub max_age_secs: i64,
}

impl IdentityConfig {
    pub fn new(secret: impl Into<Box<[u8]>>, max_age_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            max_age_secs,
        }
    }

    pub fn secret_bytes(&self) -> &[u8] {
        &self.secret
    }

    /// Verify a pair of identity headers against this configuration.
    pub fn verify(
        &self,
        identity_header: &str,
        signature_header: &str,
    ) -> Result<Identity, SignatureError> {
        signature::verify_identity(
            identity_header,
            signature_header,
            &self.secret,
            self.max_age_secs,
        )
    }
}
