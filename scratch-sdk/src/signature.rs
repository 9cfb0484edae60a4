//! Identity assertion signing and verification.
//!
//! The identity provider authenticates users and hands each client a signed
//! identity assertion. The server only checks the signature; it never sees
//! credentials. The wire format is two headers:
//!
//! ```text
//! Scratch-Identity:  {user_id}.{bucket}
//! Scratch-Signature: {unix_timestamp}.{base64_signature}
//! ```
//!
//! where the signature is `HMAC-SHA256("{identity}.{timestamp}", secret)`.

use crate::objects::{Identity, IdentityParseError};

/// Header carrying the `{user_id}.{bucket}` identity assertion.
pub const IDENTITY_HEADER: &str = "Scratch-Identity";

/// Header name for the HMAC signature over the identity assertion.
pub const SIGNATURE_HEADER: &str = "Scratch-Signature";

/// Query parameters carrying the same pair on a WebSocket upgrade, where
/// browsers cannot set headers.
pub const IDENTITY_QUERY_PARAM: &str = "identity";
pub const SIGNATURE_QUERY_PARAM: &str = "signature";

/// Header name for admin API authentication (plaintext secret).
pub const ADMIN_AUTH_HEADER: &str = "Scratch-Admin-Authorization";

/// Default maximum age of an identity assertion (in seconds).
pub const DEFAULT_MAX_ASSERTION_AGE: i64 = 24 * 60 * 60;

/// Errors produced by signature operations.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid header format")]
    InvalidFormat,
    #[error("invalid base64 encoding")]
    InvalidBase64,
    #[error("invalid identity: {0}")]
    Identity(#[from] IdentityParseError),
    #[error("invalid signature")]
    SignatureMismatch,
    #[error("signature expired")]
    Expired,
}

impl From<ring::error::Unspecified> for SignatureError {
    fn from(_: ring::error::Unspecified) -> Self {
        Self::SignatureMismatch
    }
}

/// A ready-to-send pair of identity headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedIdentity {
    /// Value for [`IDENTITY_HEADER`].
    pub identity: String,
    /// Value for [`SIGNATURE_HEADER`].
    pub signature: String,
}

/// Sign an identity with the current time.
pub fn sign_identity(identity: &Identity, key: &[u8]) -> SignedIdentity {
    let timestamp = time::OffsetDateTime::now_utc().unix_timestamp();
    sign_identity_at(identity, timestamp, key)
}

/// Sign an identity with an explicit timestamp.
pub fn sign_identity_at(identity: &Identity, timestamp: i64, key: &[u8]) -> SignedIdentity {
    let header = identity.to_header();
    let data = format!("{header}.{timestamp}");
    let sig = ring::hmac::sign(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key),
        data.as_bytes(),
    );
    SignedIdentity {
        identity: header,
        signature: format_signature_header(timestamp, sig.as_ref()),
    }
}

/// Verify a signed identity assertion and return the authenticated identity.
///
/// Checks the HMAC first, then that the assertion is no older than
/// `max_age` seconds.
pub fn verify_identity(
    identity_header: &str,
    signature_header: &str,
    key: &[u8],
    max_age: i64,
) -> Result<Identity, SignatureError> {
    let (timestamp, signature) = parse_signature_header(signature_header)?;
    let data = format!("{identity_header}.{timestamp}");
    ring::hmac::verify(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key),
        data.as_bytes(),
        &signature,
    )?;
    check_timestamp(timestamp, max_age)?;
    Ok(identity_header.parse()?)
}

// ---------------------------------------------------------------------------
// Header parsing / formatting
// ---------------------------------------------------------------------------

/// Parse a `Scratch-Signature` header value (`{timestamp}.{base64}`) into
/// `(timestamp, raw_signature_bytes)`.
pub fn parse_signature_header(value: &str) -> Result<(i64, Box<[u8]>), SignatureError> {
    let (timestamp, encoded) = value.split_once('.').ok_or(SignatureError::InvalidFormat)?;
    let timestamp: i64 = timestamp
        .parse()
        .map_err(|_| SignatureError::InvalidFormat)?;
    let signature_bytes = fast32::base64::RFC4648_NOPAD
        .decode_str(encoded)
        .map_err(|_| SignatureError::InvalidBase64)?
        .into_boxed_slice();
    Ok((timestamp, signature_bytes))
}

/// Format a `{timestamp}.{base64}` header value from its parts.
pub fn format_signature_header(timestamp: i64, signature: &[u8]) -> String {
    format!(
        "{}.{}",
        timestamp,
        fast32::base64::RFC4648_NOPAD.encode(signature)
    )
}

/// Check that a signature timestamp is no older than `max_age` seconds.
pub fn check_timestamp(timestamp: i64, max_age: i64) -> Result<(), SignatureError> {
    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    if now - timestamp > max_age {
        return Err(SignatureError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::Bucket;

    const KEY: &[u8] = b"identity-provider-secret";

    #[test]
    fn signed_identity_verifies() {
        let identity = Identity::new("user-42", Bucket::A);
        let signed = sign_identity(&identity, KEY);
        let verified =
            verify_identity(&signed.identity, &signed.signature, KEY, DEFAULT_MAX_ASSERTION_AGE)
                .unwrap();
        assert_eq!(verified, identity);
    }

    #[test]
    fn swapped_bucket_is_rejected() {
        let signed = sign_identity(&Identity::new("user-42", Bucket::A), KEY);
        let err = verify_identity("user-42.b", &signed.signature, KEY, DEFAULT_MAX_ASSERTION_AGE)
            .unwrap_err();
        assert!(matches!(err, SignatureError::SignatureMismatch));
    }

    #[test]
    fn wrong_key_is_rejected() {
        let signed = sign_identity(&Identity::new("user-42", Bucket::B), KEY);
        let err = verify_identity(
            &signed.identity,
            &signed.signature,
            b"another-secret",
            DEFAULT_MAX_ASSERTION_AGE,
        )
        .unwrap_err();
        assert!(matches!(err, SignatureError::SignatureMismatch));
    }

    #[test]
    fn stale_assertion_is_rejected() {
        let old = time::OffsetDateTime::now_utc().unix_timestamp() - 120;
        let signed = sign_identity_at(&Identity::new("user-42", Bucket::B), old, KEY);
        let err = verify_identity(&signed.identity, &signed.signature, KEY, 60).unwrap_err();
        assert!(matches!(err, SignatureError::Expired));
    }

    #[test]
    fn malformed_signature_header() {
        assert!(matches!(
            parse_signature_header("no-dot"),
            Err(SignatureError::InvalidFormat)
        ));
        assert!(matches!(
            parse_signature_header("12.!!!"),
            Err(SignatureError::InvalidBase64)
        ));
    }
}
