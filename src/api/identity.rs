//! Caller identity.
//!
//! [`AuthLayer`] validates the bearer token in front of protected routes
//! and stores the caller as an [`AuthenticatedUser`] request extension,
//! which handlers receive through the extractor below.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Request};
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use tower::{Layer, Service};

use super::error::ApiErrorResponse;
use crate::domain::UserId;
use crate::infrastructure::TokenService;

const BEARER_SCHEME: &str = "Bearer";

// =============================================================================
// AuthenticatedUser
// =============================================================================

/// The user a request was authenticated as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuthenticatedUser(pub UserId);

impl<State> FromRequestParts<State> for AuthenticatedUser
where
    State: Send + Sync,
{
    type Rejection = ApiErrorResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &State,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .copied()
            .ok_or_else(|| ApiErrorResponse::unauthorized("User not authenticated"))
    }
}

/// Resolves the caller from the `Authorization` header.
///
/// # Errors
///
/// Returns `401 Unauthorized` when the header is missing, is not of the form
/// `Bearer <token>`, or carries a token that fails validation.
pub fn authenticate(
    headers: &HeaderMap,
    tokens: &TokenService,
) -> Result<AuthenticatedUser, ApiErrorResponse> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiErrorResponse::unauthorized("Authorization header missing"))?;

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.split_once(' '))
        .filter(|(scheme, token)| {
            scheme.eq_ignore_ascii_case(BEARER_SCHEME) && !token.is_empty() && !token.contains(' ')
        })
        .map(|(_, token)| token)
        .ok_or_else(|| ApiErrorResponse::unauthorized("Invalid Authorization header format"))?;

    let user_id = tokens.validate(token)?;
    Ok(AuthenticatedUser(user_id))
}

// =============================================================================
// AuthLayer
// =============================================================================

/// Rejects requests without a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthLayer {
    tokens: Arc<TokenService>,
}

impl AuthLayer {
    #[must_use]
    pub const fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }
}

impl<Inner> Layer<Inner> for AuthLayer {
    type Service = AuthService<Inner>;

    fn layer(&self, inner: Inner) -> Self::Service {
        AuthService {
            inner,
            tokens: Arc::clone(&self.tokens),
        }
    }
}

// =============================================================================
// AuthService
// =============================================================================

#[derive(Debug, Clone)]
pub struct AuthService<Inner> {
    inner: Inner,
    tokens: Arc<TokenService>,
}

impl<Inner> Service<Request<Body>> for AuthService<Inner>
where
    Inner: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    Inner::Future: Send,
{
    type Response = Response;
    type Error = Inner::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, context: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(context)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let user = match authenticate(request.headers(), &self.tokens) {
            Ok(user) => user,
            Err(rejection) => {
                tracing::debug!(
                    path = %request.uri().path(),
                    reason = %rejection.error.error,
                    "Rejected unauthenticated request"
                );
                return Box::pin(async move { Ok(rejection.into_response()) });
            }
        };

        request.extensions_mut().insert(user);

        // The clone may not be ready; call the instance poll_ready was invoked on.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move { inner.call(request).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};
    use rstest::{fixture, rstest};
    use std::time::Duration;

    #[fixture]
    fn tokens() -> TokenService {
        TokenService::new("identity-secret", Duration::from_secs(60))
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[rstest]
    fn test_valid_bearer_token(tokens: TokenService) {
        let user_id = UserId::generate_v7();
        let token = tokens.issue(&user_id).unwrap();

        let user = authenticate(&headers_with(&format!("Bearer {token}")), &tokens).unwrap();

        assert_eq!(user, AuthenticatedUser(user_id));
    }

    #[rstest]
    fn test_missing_header(tokens: TokenService) {
        let rejection = authenticate(&HeaderMap::new(), &tokens).unwrap_err();

        assert_eq!(rejection.status, StatusCode::UNAUTHORIZED);
        assert_eq!(rejection.error.error, "Authorization header missing");
    }

    #[rstest]
    #[case("Basic dXNlcjpwYXNz")]
    #[case("Bearer")]
    #[case("Bearer ")]
    #[case("Bearer a b")]
    #[case("token-without-scheme")]
    fn test_malformed_header(tokens: TokenService, #[case] value: &str) {
        let rejection = authenticate(&headers_with(value), &tokens).unwrap_err();

        assert_eq!(rejection.status, StatusCode::UNAUTHORIZED);
        assert_eq!(rejection.error.error, "Invalid Authorization header format");
    }

    #[rstest]
    fn test_invalid_token(tokens: TokenService) {
        let rejection = authenticate(&headers_with("Bearer not.a.jwt"), &tokens).unwrap_err();

        assert_eq!(rejection.status, StatusCode::UNAUTHORIZED);
        assert_eq!(rejection.error.error, "Invalid or expired token");
    }

    #[rstest]
    #[tokio::test]
    async fn test_extractor_without_extension_is_unauthorized() {
        let (mut parts, ()) = Request::new(()).into_parts();

        let rejection = AuthenticatedUser::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();

        assert_eq!(rejection.status, StatusCode::UNAUTHORIZED);
        assert_eq!(rejection.error.error, "User not authenticated");
    }
}
