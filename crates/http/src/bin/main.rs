//! Binary entry point for the vtmcp streamable HTTP server.

use clap::Parser;
use std::net::SocketAddr;
use vtmcp::ValTownServer;
use vtmcp::config::{ApiConfig, PromptConfig};

/// Val Town MCP Server over streamable HTTP; callers bring their own token.
#[derive(Parser)]
#[command(name = "vtmcp-http", version, about)]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "VAL_TOWN_MCP_BIND", default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    #[command(flatten)]
    api: ApiConfig,

    #[command(flatten)]
    prompts: PromptConfig,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let server = ValTownServer::remote(&cli.api, &cli.prompts)?;
    let listener = tokio::net::TcpListener::bind(cli.bind).await?;
    tracing::info!(addr = %listener.local_addr()?, path = vtmcp_http::MCP_PATH, "serving vtmcp over http");
    axum::serve(listener, vtmcp_http::router(server))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;
    Ok(())
}
