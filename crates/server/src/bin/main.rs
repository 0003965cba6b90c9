//! Binary entry point for the vtmcp stdio MCP server.

use clap::Parser;
use rmcp::ServiceExt;
use vtmcp::config::{ApiConfig, CliConfig, PromptConfig};
use vtmcp::{ApiToken, ValTownServer};

/// Val Town MCP Server over stdio, with a local `vt` fast path.
#[derive(Parser)]
#[command(name = "vtmcp", version, about)]
struct Cli {
    /// Val Town API token.
    #[arg(long = "api-token", env = "VAL_TOWN_API_TOKEN", hide_env_values = true)]
    api_token: String,

    #[command(flatten)]
    api: ApiConfig,

    #[command(flatten)]
    cli: CliConfig,

    #[command(flatten)]
    prompts: PromptConfig,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    }
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let token = ApiToken::new(cli.api_token);
    let server = ValTownServer::local(token, &cli.api, &cli.cli, &cli.prompts)?;
    tracing::info!(prefer_cli = cli.cli.prefer_cli, "starting vtmcp on stdio");
    server
        .serve(rmcp::transport::stdio())
        .await?
        .waiting()
        .await?;
    Ok(())
}
