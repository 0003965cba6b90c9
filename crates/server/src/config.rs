//! Command-line and environment configuration.
//!
//! Each group is a [`clap::Args`] struct so the stdio and HTTP binaries can
//! flatten the parts they need. Every option falls back to an environment
//! variable; binaries load a `.env` file before parsing.

use crate::executor::ExecutionPreference;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

/// Production Val Town API.
pub const DEFAULT_API_BASE: &str = "https://api.val.town";

/// Where the Val Town REST API lives.
#[derive(Args, Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the Val Town REST API.
    #[arg(long = "api-base", env = "VAL_TOWN_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
        }
    }
}

/// How and whether the local `vt` CLI is used.
#[derive(Args, Debug, Clone)]
pub struct CliConfig {
    /// Try the local `vt` CLI before the API. Any value other than `false` enables it.
    #[arg(
        long = "prefer-cli",
        env = "VAL_TOWN_PREFER_CLI",
        default_value = "true",
        action = clap::ArgAction::Set,
        value_parser = parse_flag
    )]
    pub prefer_cli: bool,

    /// Path or name of the `vt` binary, resolved through `PATH` when bare.
    #[arg(long = "cli-path", env = "VAL_TOWN_CLI_PATH", default_value = "vt")]
    pub cli_path: PathBuf,

    /// Directory that holds per-operation val checkouts (defaults to the system temp dir).
    #[arg(long = "workspace-dir", env = "VAL_TOWN_WORKSPACE_DIR")]
    pub workspace_dir: Option<PathBuf>,

    /// Seconds a single `vt` invocation may run before it is killed.
    #[arg(long = "cli-timeout", env = "VAL_TOWN_CLI_TIMEOUT_SECS", default_value_t = 120)]
    pub cli_timeout_secs: u64,
}

impl CliConfig {
    pub fn preference(&self) -> ExecutionPreference {
        ExecutionPreference {
            prefer_cli: self.prefer_cli,
            cli_path: self.cli_path.clone(),
            command_timeout: Duration::from_secs(self.cli_timeout_secs),
        }
    }

    pub fn workspace_dir(&self) -> PathBuf {
        self.workspace_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            prefer_cli: true,
            cli_path: "vt".into(),
            workspace_dir: None,
            cli_timeout_secs: 120,
        }
    }
}

/// Prompt template overrides.
#[derive(Args, Debug, Clone, Default)]
pub struct PromptConfig {
    /// Directory containing `<prompt>.txt` files that replace the built-in templates.
    #[arg(long = "prompts-dir", env = "VAL_TOWN_PROMPTS_DIR")]
    pub prompts_dir: Option<PathBuf>,
}

/// Only the literal `false` turns a flag off.
fn parse_flag(value: &str) -> Result<bool, String> {
    Ok(value.trim() != "false")
}
