//! MCP server bridging the Val Town platform.
//!
//! Exposes Val Town's REST API as MCP tools. File and branch operations try
//! the local `vt` CLI against a private checkout first and fall back to the
//! API when any CLI step fails; see [`executor`].

pub use api::{ApiClient, ApiToken};
pub use error::Error;
pub use server::ValTownServer;

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod ops;
pub mod prompts;
pub mod schema;
pub mod server;
pub mod validate;
pub mod workspace;
