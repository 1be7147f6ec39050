//! Bearer-token authentication.
//!
//! Handlers never see tokens: the middleware resolves the caller through the
//! configured [`AuthProvider`] and stores an [`AuthenticatedUser`] in the
//! request extensions.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;

use crate::error::ApiError;
use crate::main_lib::AppState;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,
    #[error("Invalid or expired token")]
    InvalidToken,
}

/// The caller of a protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

/// Resolves a bearer token to the user it was issued for.
pub trait AuthProvider: Send + Sync {
    fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// Validates HS256 tokens signed with a shared secret. The `sub` claim is the
/// user id.
pub struct JwtAuthProvider {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtAuthProvider {
    pub fn new(secret: &[u8], audience: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl AuthProvider for JwtAuthProvider {
    fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|err| {
            tracing::debug!("Rejected token: {:?}", err.kind());
            AuthError::InvalidToken
        })?;

        let user_id = data.claims.sub.trim();
        if user_id.is_empty() {
            return Err(AuthError::InvalidToken);
        }
        Ok(AuthenticatedUser {
            user_id: user_id.to_string(),
        })
    }
}

fn bearer_token(request: &Request<Body>) -> Result<&str, AuthError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let mut parts = header.splitn(2, ' ');
    let (Some(scheme), Some(token)) = (parts.next(), parts.next()) else {
        return Err(AuthError::MissingToken);
    };
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(AuthError::MissingToken);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let user = state.auth.authenticate(bearer_token(&request)?)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;
    use std::time::{SystemTime, UNIX_EPOCH};

    const SECRET: &[u8] = b"test-secret-test-secret-test-sec";

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    fn token(claims: serde_json::Value, secret: &[u8]) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token_yields_subject() {
        let provider = JwtAuthProvider::new(SECRET, None);
        let user = provider
            .authenticate(&token(json!({ "sub": "user-1", "exp": now() + 600 }), SECRET))
            .unwrap();
        assert_eq!(user.user_id, "user-1");
    }

    #[test]
    fn test_expired_or_foreign_tokens_are_rejected() {
        let provider = JwtAuthProvider::new(SECRET, None);
        let expired = token(json!({ "sub": "user-1", "exp": now() - 3600 }), SECRET);
        assert!(matches!(
            provider.authenticate(&expired),
            Err(AuthError::InvalidToken)
        ));

        let foreign = token(
            json!({ "sub": "user-1", "exp": now() + 600 }),
            b"another-secret-another-secret-12",
        );
        assert!(matches!(
            provider.authenticate(&foreign),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_audience_is_enforced_when_configured() {
        let provider = JwtAuthProvider::new(SECRET, Some("donmoa"));
        let wrong = token(
            json!({ "sub": "user-1", "exp": now() + 600, "aud": "other" }),
            SECRET,
        );
        assert!(provider.authenticate(&wrong).is_err());

        let right = token(
            json!({ "sub": "user-1", "exp": now() + 600, "aud": "donmoa" }),
            SECRET,
        );
        assert!(provider.authenticate(&right).is_ok());
    }

    #[test]
    fn test_empty_subject_is_rejected() {
        let provider = JwtAuthProvider::new(SECRET, None);
        let blank = token(json!({ "sub": " ", "exp": now() + 600 }), SECRET);
        assert!(provider.authenticate(&blank).is_err());
    }

    #[test]
    fn test_bearer_token_parsing() {
        let request = Request::builder()
            .header(AUTHORIZATION, "bearer abc.def.ghi")
            .body(Body::empty())
            .unwrap();
        assert_eq!(bearer_token(&request).unwrap(), "abc.def.ghi");

        let request = Request::builder()
            .header(AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();
        assert!(bearer_token(&request).is_err());

        let request = Request::builder().body(Body::empty()).unwrap();
        assert!(matches!(
            bearer_token(&request),
            Err(AuthError::MissingToken)
        ));
    }
}
