use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::auth::{AuthError, Identity, TokenAuthenticator};
use crate::error::ApiError;

/// Header the web client sends its token in.
pub const TOKEN_HEADER: &str = "x-auth-token";

/// Token authentication middleware: verifies the caller's token and injects
/// the resulting `Identity` into request extensions.
pub async fn token_auth_middleware(
    State(authenticator): State<Arc<TokenAuthenticator>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = token_from_headers(request.headers());

    let identity = authenticator.authenticate(token.as_deref()).map_err(|e| {
        warn!(
            "Rejected {} {}: {}",
            request.method(),
            request.uri().path(),
            e
        );
        ApiError::from(e)
    })?;

    debug!("Authenticated user {}", identity.user_id);
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// `x-auth-token` wins; `Authorization: Bearer` is accepted as a fallback.
/// Any other Authorization scheme, or a value that is not UTF-8, is passed
/// through so it fails verification instead of reading as "no token".
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(TOKEN_HEADER) {
        return Some(header_text(value));
    }

    let auth_str = header_text(headers.get(AUTHORIZATION)?);
    match auth_str.strip_prefix("Bearer ") {
        Some(token) => Some(token.trim().to_string()),
        None => Some(auth_str),
    }
}

fn header_text(value: &HeaderValue) -> String {
    String::from_utf8_lossy(value.as_bytes()).trim().to_string()
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only present on routes behind token_auth_middleware
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .ok_or_else(|| AuthError::MissingToken.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn custom_header_takes_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, HeaderValue::from_static("abc"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn bearer_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn no_headers_means_no_token() {
        assert_eq!(token_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn foreign_scheme_is_not_treated_as_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert!(token_from_headers(&headers).is_some());
    }

    #[test]
    fn unreadable_token_is_invalid_not_missing() {
        let authenticator = TokenAuthenticator::from_secret(b"middleware-test-secret", 3600);

        for name in [TOKEN_HEADER, "authorization"] {
            let mut headers = HeaderMap::new();
            headers.insert(name, HeaderValue::from_bytes(b"abc\xff").unwrap());

            let token = token_from_headers(&headers);
            assert!(token.is_some(), "{} value should be seen", name);
            assert!(matches!(
                authenticator.authenticate(token.as_deref()),
                Err(AuthError::InvalidToken(_))
            ));
        }
    }

    #[test]
    fn blank_header_still_counts_as_missing() {
        let authenticator = TokenAuthenticator::from_secret(b"middleware-test-secret", 3600);
        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, HeaderValue::from_static("   "));

        let token = token_from_headers(&headers);
        assert_eq!(authenticator.authenticate(token.as_deref()), Err(AuthError::MissingToken));
    }

    #[test]
    fn readable_token_round_trips() {
        let authenticator = TokenAuthenticator::from_secret(b"middleware-test-secret", 3600);
        let user_id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", authenticator.issue(user_id).unwrap())).unwrap(),
        );

        let identity = authenticator.authenticate(token_from_headers(&headers).as_deref()).unwrap();
        assert_eq!(identity.user_id, user_id);
    }
}
