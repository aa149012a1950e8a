//! Route guards for axum back-office APIs.
//!
//! Something in front of the guard must put an [`AuthContext`] into the
//! request extensions; [`jwt::JwtAuthLayer`] does that from a bearer token.
//! [`AuthorizeLayer`] then lets the request through only if the engine
//! grants the route's tag.

use std::future::poll_fn;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::engine::{Decision, Engine};
use crate::permission::Permission;
use crate::store::Store;
use crate::types::PrincipalId;

use ::axum::body::Body;
use ::axum::response::{IntoResponse, Response};
use ::http::{Request, StatusCode};
use ::tower::{Layer, Service};

/// Principal acting on the request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub principal: PrincipalId,
}

impl AuthContext {
    pub fn new(principal: PrincipalId) -> Self {
        Self { principal }
    }
}

/// Guards every route below it with one tag.
#[derive(Debug, Clone)]
pub struct AuthorizeLayer<S> {
    engine: Arc<Engine<S>>,
    permission: Permission,
}

impl<S> AuthorizeLayer<S> {
    pub fn new(engine: Arc<Engine<S>>, permission: Permission) -> Self {
        Self { engine, permission }
    }
}

impl<S, Inner> Layer<Inner> for AuthorizeLayer<S>
where
    S: Store,
{
    type Service = AuthorizeService<Inner, S>;

    fn layer(&self, inner: Inner) -> Self::Service {
        AuthorizeService {
            inner,
            engine: self.engine.clone(),
            permission: self.permission.clone(),
        }
    }
}

/// Answers 401 without a context, 403 on deny and 500 when the store fails.
#[derive(Debug, Clone)]
pub struct AuthorizeService<Inner, S> {
    inner: Inner,
    engine: Arc<Engine<S>>,
    permission: Permission,
}

impl<Inner, S> Service<Request<Body>> for AuthorizeService<Inner, S>
where
    Inner: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    Inner::Future: Send + 'static,
    S: Store + 'static,
{
    type Response = Response;
    type Error = Inner::Error;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();
        let engine = self.engine.clone();
        let permission = self.permission.clone();

        Box::pin(async move {
            let Some(context) = req.extensions().get::<AuthContext>().cloned() else {
                return Ok((StatusCode::UNAUTHORIZED, "missing auth context").into_response());
            };

            match engine.authorize(&context.principal, &permission).await {
                Ok(Decision::Allow) => {
                    poll_fn(|cx| inner.poll_ready(cx)).await?;
                    inner.call(req).await
                }
                Ok(Decision::Deny) => Ok((StatusCode::FORBIDDEN, "forbidden").into_response()),
                Err(err) => {
                    tracing::warn!(error = %err, "authorization failed");
                    Ok((StatusCode::INTERNAL_SERVER_ERROR, "auth error").into_response())
                }
            }
        })
    }
}

#[cfg(feature = "axum-jwt")]
pub mod jwt {
    //! Bearer-token authentication producing an [`AuthContext`].

    use std::fmt;
    use std::future::poll_fn;
    use std::marker::PhantomData;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::task::{Context, Poll};

    use jsonwebtoken::{DecodingKey, Validation, decode};
    use serde::de::DeserializeOwned;
    use thiserror::Error;

    use crate::axum::AuthContext;
    use crate::types::PrincipalId;

    use ::axum::body::Body;
    use ::axum::extract::FromRequestParts;
    use ::axum::response::{IntoResponse, Response};
    use ::http::header::AUTHORIZATION;
    use ::http::request::Parts;
    use ::http::{HeaderMap, Request, StatusCode};
    use ::tower::{Layer, Service};

    /// Why a request could not be authenticated. Always answered with 401.
    #[derive(Debug, Error)]
    pub enum AuthError {
        #[error("missing authorization header")]
        MissingAuthorization,
        #[error("invalid authorization header")]
        InvalidAuthorization,
        #[error("invalid token")]
        InvalidToken,
        #[error("invalid principal id: {0}")]
        InvalidPrincipal(String),
    }

    impl IntoResponse for AuthError {
        fn into_response(self) -> Response {
            (StatusCode::UNAUTHORIZED, self.to_string()).into_response()
        }
    }

    /// Token claims that name a principal.
    pub trait JwtClaims: DeserializeOwned + Send + Sync + Clone + 'static {
        fn principal_id(&self) -> &str;
    }

    /// `sub` is the principal id.
    #[derive(Debug, Clone, serde::Deserialize)]
    pub struct DefaultClaims {
        pub sub: String,
        pub exp: Option<usize>,
    }

    impl JwtClaims for DefaultClaims {
        fn principal_id(&self) -> &str {
            &self.sub
        }
    }

    /// Key and rules tokens are checked against.
    #[derive(Clone)]
    pub struct JwtAuthState<C: JwtClaims> {
        decoding_key: Arc<DecodingKey>,
        validation: Validation,
        _marker: PhantomData<fn() -> C>,
    }

    impl<C: JwtClaims> fmt::Debug for JwtAuthState<C> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("JwtAuthState")
                .field("decoding_key", &"<redacted>")
                .field("validation", &self.validation)
                .finish()
        }
    }

    impl<C: JwtClaims> JwtAuthState<C> {
        pub fn new(decoding_key: DecodingKey, validation: Validation) -> Self {
            Self {
                decoding_key: Arc::new(decoding_key),
                validation,
                _marker: PhantomData,
            }
        }

        fn authenticate(&self, headers: &HeaderMap) -> Result<JwtAuth<C>, AuthError> {
            let token = bearer_token(headers)?;
            let data = decode::<C>(token, &self.decoding_key, &self.validation)
                .map_err(|_| AuthError::InvalidToken)?;
            let principal = PrincipalId::new(data.claims.principal_id())
                .map_err(|err| AuthError::InvalidPrincipal(err.to_string()))?;
            Ok(JwtAuth {
                context: AuthContext::new(principal),
                claims: data.claims,
            })
        }
    }

    /// Implemented by router state that carries a [`JwtAuthState`].
    pub trait JwtAuthProvider<C: JwtClaims> {
        fn jwt_auth(&self) -> &JwtAuthState<C>;
    }

    /// Verified token: the principal plus its claims.
    #[derive(Debug, Clone)]
    pub struct JwtAuth<C: JwtClaims> {
        pub context: AuthContext,
        pub claims: C,
    }

    impl<S, C> FromRequestParts<S> for JwtAuth<C>
    where
        S: Send + Sync + JwtAuthProvider<C>,
        C: JwtClaims,
    {
        type Rejection = AuthError;

        async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
            if let Some(existing) = parts.extensions.get::<JwtAuth<C>>() {
                return Ok(existing.clone());
            }
            let auth = state.jwt_auth().authenticate(&parts.headers)?;
            parts.extensions.insert(auth.clone());
            parts.extensions.insert(auth.context.clone());
            Ok(auth)
        }
    }

    impl<S> FromRequestParts<S> for AuthContext
    where
        S: Send + Sync + JwtAuthProvider<DefaultClaims>,
    {
        type Rejection = AuthError;

        async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
            if let Some(existing) = parts.extensions.get::<AuthContext>() {
                return Ok(existing.clone());
            }
            let auth = JwtAuth::<DefaultClaims>::from_request_parts(parts, state).await?;
            Ok(auth.context)
        }
    }

    /// Rejects requests without a valid bearer token.
    #[derive(Debug, Clone)]
    pub struct JwtAuthLayer<C: JwtClaims> {
        state: Arc<JwtAuthState<C>>,
    }

    impl<C: JwtClaims> JwtAuthLayer<C> {
        pub fn new(state: JwtAuthState<C>) -> Self {
            Self {
                state: Arc::new(state),
            }
        }
    }

    impl<S, C> Layer<S> for JwtAuthLayer<C>
    where
        C: JwtClaims,
    {
        type Service = JwtAuthService<S, C>;

        fn layer(&self, inner: S) -> Self::Service {
            JwtAuthService {
                inner,
                state: self.state.clone(),
            }
        }
    }

    #[derive(Debug, Clone)]
    pub struct JwtAuthService<S, C: JwtClaims> {
        inner: S,
        state: Arc<JwtAuthState<C>>,
    }

    impl<S, C> Service<Request<Body>> for JwtAuthService<S, C>
    where
        S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
        S::Future: Send + 'static,
        C: JwtClaims,
    {
        type Response = Response;
        type Error = S::Error;
        type Future =
            Pin<Box<dyn std::future::Future<Output = Result<Response, Self::Error>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, mut req: Request<Body>) -> Self::Future {
            let state = self.state.clone();
            let mut inner = self.inner.clone();

            Box::pin(async move {
                match state.authenticate(req.headers()) {
                    Ok(auth) => {
                        req.extensions_mut().insert(auth.context.clone());
                        req.extensions_mut().insert(auth);
                        poll_fn(|cx| inner.poll_ready(cx)).await?;
                        inner.call(req).await
                    }
                    Err(err) => Ok(err.into_response()),
                }
            })
        }
    }

    fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
        let value = headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthorization)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthorization)?;
        match value.strip_prefix("Bearer ") {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(AuthError::InvalidAuthorization),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use ::http::HeaderValue;

        #[test]
        fn bearer_token_should_require_scheme_and_value() {
            let mut headers = HeaderMap::new();
            assert!(matches!(
                bearer_token(&headers),
                Err(AuthError::MissingAuthorization)
            ));

            headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
            assert!(matches!(
                bearer_token(&headers),
                Err(AuthError::InvalidAuthorization)
            ));

            headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer token-1"));
            assert_eq!(bearer_token(&headers).unwrap(), "token-1");
        }
    }
}
