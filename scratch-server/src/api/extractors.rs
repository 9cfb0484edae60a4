//! Custom Axum extractors for request authentication.
//!
//! Provides:
//! - `AuthenticatedUser`: verifies the `Scratch-Identity` / `Scratch-Signature`
//!   header pair issued by the identity provider (used by the User API).
//! - `SocketUser`: the same check for WebSocket upgrades, also accepting the
//!   pair as `?identity=&signature=` query parameters.
//! - `AdminAuth`: checks the `Scratch-Admin-Authorization` header against the
//!   argon2 hash of the admin secret.
//!
//! All cryptographic operations are delegated to [`scratch_sdk::signature`]
//! and [`scratch_sdk::config`].

use axum::{
    extract::{FromRequestParts, Query},
    http::{HeaderMap, StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use scratch_sdk::objects::Identity;
use scratch_sdk::signature::{
    ADMIN_AUTH_HEADER, IDENTITY_HEADER, IDENTITY_QUERY_PARAM, SIGNATURE_HEADER,
    SIGNATURE_QUERY_PARAM, SignatureError,
};
use std::collections::HashMap;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// AuthenticatedUser - User API authentication via signed identity headers
// ---------------------------------------------------------------------------

/// The caller's verified identity.
///
/// # Header format
///
/// ```text
/// Scratch-Identity:  {user_id}.{bucket}
/// Scratch-Signature: {unix_timestamp}.{base64_signature}
/// ```
pub struct AuthenticatedUser(pub Identity);

/// Errors returned by the identity extractors.
#[derive(Debug)]
pub enum IdentityError {
    MissingIdentity,
    MissingSignature,
    InvalidHeader,
    InvalidBase64,
    InvalidIdentity,
    SignatureMismatch,
    Expired,
}

impl From<SignatureError> for IdentityError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::InvalidFormat => Self::InvalidHeader,
            SignatureError::InvalidBase64 => Self::InvalidBase64,
            SignatureError::Identity(_) => Self::InvalidIdentity,
            SignatureError::SignatureMismatch => Self::SignatureMismatch,
            SignatureError::Expired => Self::Expired,
        }
    }
}

impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            IdentityError::MissingIdentity => {
                (StatusCode::UNAUTHORIZED, "missing Scratch-Identity header")
            }
            IdentityError::MissingSignature => {
                (StatusCode::UNAUTHORIZED, "missing Scratch-Signature header")
            }
            IdentityError::InvalidHeader => (StatusCode::BAD_REQUEST, "invalid header format"),
            IdentityError::InvalidBase64 => {
                (StatusCode::BAD_REQUEST, "invalid signature encoding")
            }
            IdentityError::InvalidIdentity => (StatusCode::BAD_REQUEST, "invalid identity"),
            IdentityError::SignatureMismatch => {
                (StatusCode::UNAUTHORIZED, "signature verification failed")
            }
            IdentityError::Expired => (StatusCode::UNAUTHORIZED, "signature expired"),
        };
        (status, message).into_response()
    }
}

fn header_str<'a>(
    headers: &'a HeaderMap,
    name: &str,
    missing: IdentityError,
) -> Result<&'a str, IdentityError> {
    headers
        .get(name)
        .ok_or(missing)?
        .to_str()
        .map_err(|_| IdentityError::InvalidHeader)
}

async fn verify(
    state: &AppState,
    identity_value: &str,
    signature_value: &str,
) -> Result<Identity, IdentityError> {
    let identity = state.config.identity.read().await;
    Ok(identity.verify(identity_value, signature_value)?)
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = IdentityError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity_value =
            header_str(&parts.headers, IDENTITY_HEADER, IdentityError::MissingIdentity)?;
        let signature_value =
            header_str(&parts.headers, SIGNATURE_HEADER, IdentityError::MissingSignature)?;

        verify(state, identity_value, signature_value)
            .await
            .map(AuthenticatedUser)
    }
}

// ---------------------------------------------------------------------------
// SocketUser - WebSocket authentication via headers or query parameters
// ---------------------------------------------------------------------------

/// Verified identity of a WebSocket client.
///
/// Headers take precedence; without an identity header the pair is read
/// from the `identity` and `signature` query parameters.
pub struct SocketUser(pub Identity);

impl FromRequestParts<AppState> for SocketUser {
    type Rejection = IdentityError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if parts.headers.contains_key(IDENTITY_HEADER) {
            let AuthenticatedUser(identity) =
                AuthenticatedUser::from_request_parts(parts, state).await?;
            return Ok(SocketUser(identity));
        }

        let Query(mut params) = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .map_err(|_| IdentityError::InvalidHeader)?;
        let identity_value = params
            .remove(IDENTITY_QUERY_PARAM)
            .ok_or(IdentityError::MissingIdentity)?;
        let signature_value = params
            .remove(SIGNATURE_QUERY_PARAM)
            .ok_or(IdentityError::MissingSignature)?;

        verify(state, &identity_value, &signature_value)
            .await
            .map(SocketUser)
    }
}

// ---------------------------------------------------------------------------
// AdminAuth - Admin API authentication via plaintext secret header
// ---------------------------------------------------------------------------

/// Marker extractor for admin routes.
pub struct AdminAuth;

#[derive(Debug)]
pub enum AdminAuthError {
    MissingHeader,
    InvalidHeader,
    InvalidSecret,
    Internal,
}

impl IntoResponse for AdminAuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AdminAuthError::MissingHeader => (
                StatusCode::UNAUTHORIZED,
                "missing Scratch-Admin-Authorization header",
            ),
            AdminAuthError::InvalidHeader => (StatusCode::BAD_REQUEST, "invalid header format"),
            AdminAuthError::InvalidSecret => (StatusCode::UNAUTHORIZED, "invalid admin secret"),
            AdminAuthError::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        };
        (status, message).into_response()
    }
}

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AdminAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let secret = parts
            .headers
            .get(ADMIN_AUTH_HEADER)
            .ok_or(AdminAuthError::MissingHeader)?
            .to_str()
            .map_err(|_| AdminAuthError::InvalidHeader)?
            .to_owned();

        let admin = state.config.admin.read().await.clone();

        // argon2 verification is CPU-bound
        let verified = tokio::task::spawn_blocking(move || admin.verify_secret(&secret))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Admin secret verification task failed");
                AdminAuthError::Internal
            })?;

        if verified {
            Ok(AdminAuth)
        } else {
            tracing::warn!("Rejected admin request with invalid secret");
            Err(AdminAuthError::InvalidSecret)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::runtime::{
        AdminConfig, CardsConfig, IdentityConfig, ServerConfig, SharedConfig,
    };
    use axum::{Router, body::Body, http::Request, routing::get};
    use scratch_core::engine::ScratchEngine;
    use scratch_core::events::Fanout;
    use scratch_core::profile::StaticProfileStore;
    use scratch_core::store::MemoryStore;
    use scratch_sdk::objects::Bucket;
    use scratch_sdk::signature::{sign_identity, sign_identity_at};
    use std::sync::Arc;
    use tower::ServiceExt;

    const SECRET: &[u8] = b"extractor-secret";

    fn app() -> Router {
        let config = SharedConfig::new(
            ServerConfig {
                listen: ([127, 0, 0, 1], 0).into(),
            },
            AdminConfig::new(scratch_sdk::config::hash_secret("admin").unwrap()),
            IdentityConfig::new(SECRET.to_vec(), 300),
            CardsConfig::default(),
        );
        let engine = ScratchEngine::new(
            Arc::new(MemoryStore::new()),
            Arc::new(StaticProfileStore::new()),
            Fanout::new(),
            config.cards.clone(),
        );

        async fn whoami(AuthenticatedUser(identity): AuthenticatedUser) -> String {
            identity.to_header()
        }
        async fn socket_whoami(SocketUser(identity): SocketUser) -> String {
            identity.to_header()
        }
        async fn admin_only(_auth: AdminAuth) -> &'static str {
            "ok"
        }

        Router::new()
            .route("/me", get(whoami))
            .route("/socket", get(socket_whoami))
            .route("/admin", get(admin_only))
            .with_state(AppState::new(config, engine))
    }

    async fn call(request: Request<Body>) -> (StatusCode, String) {
        let resp = app().oneshot(request).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn accepts_signed_identity_headers() {
        let signed = sign_identity(&Identity::new("u1", Bucket::A), SECRET);
        let request = Request::get("/me")
            .header(IDENTITY_HEADER, signed.identity)
            .header(SIGNATURE_HEADER, signed.signature)
            .body(Body::empty())
            .unwrap();

        assert_eq!(call(request).await, (StatusCode::OK, "u1.a".to_owned()));
    }

    #[tokio::test]
    async fn rejects_stale_assertions() {
        let signed = sign_identity_at(&Identity::new("u1", Bucket::A), 1_000_000, SECRET);
        let request = Request::get("/me")
            .header(IDENTITY_HEADER, signed.identity)
            .header(SIGNATURE_HEADER, signed.signature)
            .body(Body::empty())
            .unwrap();

        assert_eq!(call(request).await.0, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejects_identity_signed_for_another_user() {
        let signed = sign_identity(&Identity::new("u1", Bucket::A), SECRET);
        let request = Request::get("/me")
            .header(IDENTITY_HEADER, "u2.a")
            .header(SIGNATURE_HEADER, signed.signature)
            .body(Body::empty())
            .unwrap();

        assert_eq!(call(request).await.0, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_signature_is_a_bad_request() {
        let request = Request::get("/me")
            .header(IDENTITY_HEADER, "u1.a")
            .header(SIGNATURE_HEADER, "not-a-signature")
            .body(Body::empty())
            .unwrap();

        assert_eq!(call(request).await.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn socket_identity_from_query_parameters() {
        let signed = sign_identity(&Identity::new("u9", Bucket::B), SECRET);
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair(IDENTITY_QUERY_PARAM, &signed.identity)
            .append_pair(SIGNATURE_QUERY_PARAM, &signed.signature)
            .finish();
        let request = Request::get(format!("/socket?{query}"))
            .body(Body::empty())
            .unwrap();

        assert_eq!(call(request).await, (StatusCode::OK, "u9.b".to_owned()));
    }

    #[tokio::test]
    async fn socket_without_signature_is_unauthorized() {
        let request = Request::get("/socket?identity=u9.b")
            .body(Body::empty())
            .unwrap();

        assert_eq!(call(request).await.0, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_secret_is_checked() {
        let missing = Request::get("/admin").body(Body::empty()).unwrap();
        assert_eq!(call(missing).await.0, StatusCode::UNAUTHORIZED);

        let wrong = Request::get("/admin")
            .header(ADMIN_AUTH_HEADER, "nope")
            .body(Body::empty())
            .unwrap();
        assert_eq!(call(wrong).await.0, StatusCode::UNAUTHORIZED);

        let right = Request::get("/admin")
            .header(ADMIN_AUTH_HEADER, "admin")
            .body(Body::empty())
            .unwrap();
        assert_eq!(call(right).await, (StatusCode::OK, "ok".to_owned()));
    }
}
