use crate::auth::TOKEN_HEADER;
use http::{HeaderName, Method, header};
use tower_http::cors::{Any, CorsLayer};

/// Browser clients may call the endpoint from any origin.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("mcp-session-id"),
            HeaderName::from_static(TOKEN_HEADER),
        ])
}
