//! Request authentication for the MCP endpoint.
//!
//! An [`Authenticator`] turns request parts into a credential. On success the
//! credential is inserted into the request extensions, where the MCP server
//! finds it through the `http::request::Parts` rmcp attaches to each request
//! context. On failure the request is answered `401` with a JSON-RPC error.

mod token;

pub use token::{TOKEN_HEADER, TokenAuth};

use axum::body::Body;
use axum::response::IntoResponse;
use futures::future::BoxFuture;
use http::{Request, Response, StatusCode, header};
use std::task::{Context, Poll};

/// JSON-RPC error code used for authentication failures.
pub const UNAUTHORIZED_CODE: i64 = -32000;

/// Validates incoming requests.
pub trait Authenticator: Clone + Send + Sync + 'static {
    /// Inserted into `http::Extensions` on success.
    type Claims: Clone + Send + Sync + 'static;

    type Error: std::fmt::Display + Send;

    fn authenticate(
        &self,
        parts: &http::request::Parts,
    ) -> impl Future<Output = Result<Self::Claims, Self::Error>> + Send;
}

/// Tower [`Layer`](tower::Layer) that applies [`AuthService`].
#[derive(Clone)]
pub struct AuthLayer<A> {
    authenticator: A,
}

impl<A> AuthLayer<A> {
    pub fn new(authenticator: A) -> Self {
        Self { authenticator }
    }
}

impl<A, S> tower::Layer<S> for AuthLayer<A>
where
    A: Clone,
{
    type Service = AuthService<A, S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            authenticator: self.authenticator.clone(),
            inner,
        }
    }
}

/// Tower service that authenticates requests before forwarding them.
#[derive(Clone)]
pub struct AuthService<A, S> {
    authenticator: A,
    inner: S,
}

impl<A, S, B> tower::Service<Request<B>> for AuthService<A, S>
where
    A: Authenticator,
    S: tower::Service<Request<B>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Send,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let authenticator = self.authenticator.clone();
        let mut inner = self.inner.clone();
        // keep the service that was polled ready
        std::mem::swap(&mut self.inner, &mut inner);

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            match authenticator.authenticate(&parts).await {
                Ok(claims) => {
                    let mut req = Request::from_parts(parts, body);
                    req.extensions_mut().insert(claims);
                    inner.call(req).await
                }
                Err(err) => {
                    tracing::debug!(uri = %parts.uri, error = %err, "rejected unauthenticated request");
                    Ok(unauthorized(&err.to_string()))
                }
            }
        })
    }
}

fn unauthorized(message: &str) -> Response<Body> {
    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "error": { "code": UNAUTHORIZED_CODE, "message": message },
        "id": null,
    });
    (
        StatusCode::UNAUTHORIZED,
        [(header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
        .into_response()
}
