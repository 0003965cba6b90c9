//! Streamable HTTP entry point for the Val Town MCP server.
//!
//! Every request carries its own Val Town token (see [`auth::TokenAuth`]);
//! CLI-only tools are not offered because there is no local `vt` here.
//!
//! ```rust,ignore
//! let server = ValTownServer::remote(&ApiConfig::default(), &PromptConfig::default())?;
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, vtmcp_http::router(server)).await?;
//! ```

use auth::{AuthLayer, TokenAuth};
use axum::Router;
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};
use vtmcp::ValTownServer;

pub mod auth;
pub mod cors;

/// Path of the MCP endpoint.
pub const MCP_PATH: &str = "/mcp";

/// The MCP endpoint behind token auth and CORS.
pub fn router(server: ValTownServer) -> Router {
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig::default(),
    );
    Router::new()
        .nest_service(MCP_PATH, service)
        .layer(AuthLayer::new(TokenAuth))
        .layer(cors::cors_layer())
}
