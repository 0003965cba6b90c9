//! Dual-path operation executor.
//!
//! An operation first tries the local `vt` CLI against a private checkout of
//! its val and falls back to the HTTP API when any CLI step fails:
//!
//! ```text
//! acquire -> [checkout <branch>] -> local action -> [push] -> release
//!    \___________ any Retryable failure ____________/
//!                         |
//!                   release, then HTTP
//! ```
//!
//! The fallback is single-hop: HTTP is the path of last resort and its error
//! is the one the caller sees.

use crate::cli::CliRunner;
use crate::error::Error;
use crate::workspace::{WorkspaceGuard, WorkspaceManager};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

/// Outcome of one CLI-path step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<T> {
    Ok(T),
    /// Give up on the CLI path and use the API.
    Retryable(String),
    /// Stop the operation; the API is not tried.
    Fatal(String),
}

impl<T> Step<T> {
    /// Turn a fallible local result into a step, treating errors as retryable.
    pub fn from_result<E: std::fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Step::Ok(value),
            Err(e) => Step::Retryable(e.to_string()),
        }
    }
}

/// Process-wide execution settings, fixed at startup.
#[derive(Debug, Clone)]
pub struct ExecutionPreference {
    pub prefer_cli: bool,
    pub cli_path: PathBuf,
    pub command_timeout: Duration,
}

impl ExecutionPreference {
    /// API only; the CLI is never probed.
    pub fn api_only() -> Self {
        Self {
            prefer_cli: false,
            cli_path: "vt".into(),
            command_timeout: Duration::from_secs(120),
        }
    }
}

/// One invocation of a supported operation.
#[derive(Debug, Clone)]
pub struct OperationContext {
    name: &'static str,
    params: Value,
    val_id: Option<String>,
    branch_id: Option<String>,
    mutates: bool,
}

impl OperationContext {
    /// Fails when `params` cannot be represented as JSON, e.g. a map with
    /// non-string keys.
    pub fn new(name: &'static str, params: &impl Serialize) -> Result<Self, Error> {
        Ok(Self {
            name,
            params: serde_json::to_value(params)?,
            val_id: None,
            branch_id: None,
            mutates: false,
        })
    }

    /// Target val of the operation.
    pub fn on_val(mut self, val_id: impl Into<String>) -> Self {
        self.val_id = Some(val_id.into());
        self
    }

    /// Branch to check out before the local action. `None` keeps the default branch.
    pub fn on_branch(mut self, branch_id: Option<&str>) -> Self {
        self.branch_id = branch_id.map(str::to_owned);
        self
    }

    /// The local action changes the val and must be pushed.
    pub fn mutating(mut self) -> Self {
        self.mutates = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn params(&self) -> &Value {
        &self.params
    }

    pub fn val_id(&self) -> Option<&str> {
        self.val_id.as_deref()
    }

    pub fn branch_id(&self) -> Option<&str> {
        self.branch_id.as_deref()
    }

    pub fn mutates(&self) -> bool {
        self.mutates
    }
}

/// Chooses between the CLI and the API for each operation.
#[derive(Debug, Clone)]
pub struct Executor<C, W> {
    preference: ExecutionPreference,
    cli: C,
    workspaces: W,
}

impl<C: CliRunner, W: WorkspaceManager> Executor<C, W> {
    pub fn new(preference: ExecutionPreference, cli: C, workspaces: W) -> Self {
        Self {
            preference,
            cli,
            workspaces,
        }
    }

    pub fn preference(&self) -> &ExecutionPreference {
        &self.preference
    }

    pub fn cli(&self) -> &C {
        &self.cli
    }

    pub fn workspaces(&self) -> &W {
        &self.workspaces
    }

    /// Run `op`, locally when possible and through `remote` otherwise.
    ///
    /// `local` receives the root of a fresh checkout of the operation's val.
    pub async fn run<T, L, LF, R, RF>(
        &self,
        op: &OperationContext,
        local: L,
        remote: R,
    ) -> Result<T, Error>
    where
        L: FnOnce(PathBuf) -> LF,
        LF: Future<Output = Step<T>>,
        R: FnOnce() -> RF,
        RF: Future<Output = Result<T, Error>>,
    {
        if self.cli_enabled().await {
            match self.local(op, local).await {
                Step::Ok(value) => return Ok(value),
                Step::Retryable(reason) => tracing::warn!(
                    operation = op.name(),
                    %reason,
                    "vt cli failed, falling back to the api"
                ),
                Step::Fatal(reason) => return Err(Error::Cli(reason)),
            }
        } else {
            tracing::debug!(operation = op.name(), "using the api");
        }
        remote().await
    }

    /// Run an operation that only exists on the CLI. Failures are surfaced.
    pub async fn run_local_only<T, L, LF>(
        &self,
        op: &OperationContext,
        local: L,
    ) -> Result<T, Error>
    where
        L: FnOnce(PathBuf) -> LF,
        LF: Future<Output = Step<T>>,
    {
        self.require_cli().await?;
        match self.local(op, local).await {
            Step::Ok(value) => Ok(value),
            Step::Retryable(reason) | Step::Fatal(reason) => Err(Error::Cli(reason)),
        }
    }

    /// Fail unless the CLI can be invoked.
    pub async fn require_cli(&self) -> Result<(), Error> {
        if self.cli.is_available().await {
            Ok(())
        } else {
            Err(Error::Cli(format!(
                "Val Town CLI is not available at {}; install it with `deno install -grAf jsr:@valtown/vt`",
                self.preference.cli_path.display()
            )))
        }
    }

    async fn cli_enabled(&self) -> bool {
        self.preference.prefer_cli && self.cli.is_available().await
    }

    async fn local<T, L, LF>(&self, op: &OperationContext, action: L) -> Step<T>
    where
        L: FnOnce(PathBuf) -> LF,
        LF: Future<Output = Step<T>>,
    {
        let Some(val_id) = op.val_id() else {
            return Step::Retryable(format!("{} has no target val", op.name()));
        };
        tracing::info!(operation = op.name(), val_id, "trying vt cli");

        let workspace = match self.workspaces.acquire(val_id).await {
            Ok(workspace) => workspace,
            Err(e) => return Step::Retryable(format!("checkout of {val_id} failed: {e}")),
        };
        let root = workspace.root().to_path_buf();
        let guard = WorkspaceGuard::new(&self.workspaces, workspace);

        if let Some(branch) = op.branch_id() {
            let out = self.cli.run(&["checkout", branch], Some(&root)).await;
            if !out.success {
                return Step::Retryable(format!(
                    "vt checkout {branch} failed: {}",
                    out.reason()
                ));
            }
        }

        let value = match action(root.clone()).await {
            Step::Ok(value) => value,
            failed => return failed,
        };

        if op.mutates() {
            let out = self.cli.run(&["push"], Some(&root)).await;
            if !out.success {
                return Step::Retryable(format!("vt push failed: {}", out.reason()));
            }
        }

        guard.release().await;
        Step::Ok(value)
    }
}
