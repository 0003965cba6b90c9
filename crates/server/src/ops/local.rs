//! Operations that only exist on the CLI.

use super::{Privacy, Session};
use crate::cli::CliRunner;
use crate::error::Error;
use crate::executor::{OperationContext, Step};
use crate::validate;
use crate::workspace::{WorkspaceGuard, WorkspaceManager};
use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetValStatusParams {
    /// ID of the val.
    pub val_id: String,
    /// ID of the branch (defaults to main).
    pub branch_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemixValParams {
    /// URI of the source val to remix (username/valname).
    pub source_val_uri: String,
    /// Name for the new val.
    pub new_val_name: String,
    /// Privacy setting for the new val.
    #[serde(default)]
    pub privacy: Privacy,
}

impl<C: CliRunner, W: WorkspaceManager> Session<'_, C, W> {
    /// Working tree status of a fresh checkout.
    pub async fn get_val_status(&self, params: &GetValStatusParams) -> Result<Value, Error> {
        validate::non_empty("valId", &params.val_id)?;
        let op = OperationContext::new("get-val-status", params)?
            .on_val(&params.val_id)
            .on_branch(params.branch_id.as_deref());
        let cli = self.executor.cli();

        self.executor
            .run_local_only(&op, |root| async move {
                let out = cli.run(&["status", "--json"], Some(&root)).await;
                if !out.success {
                    return Step::Retryable(format!("vt status failed: {}", out.reason()));
                }
                Step::Ok(
                    out.json()
                        .unwrap_or_else(|| Value::String(out.stdout.trim().to_string())),
                )
            })
            .await
    }

    /// `vt remix` runs in a scratch directory so its checkout is discarded.
    pub async fn remix_val(&self, params: &RemixValParams) -> Result<Value, Error> {
        validate::non_empty("sourceValUri", &params.source_val_uri)?;
        validate::non_empty("newValName", &params.new_val_name)?;
        self.executor.require_cli().await?;

        let source = params.source_val_uri.as_str();
        let name = params.new_val_name.as_str();
        let mut args = vec!["remix", source, name, "--json"];
        if params.privacy != Privacy::Public {
            args.extend(["--privacy", params.privacy.as_str()]);
        }

        let scratch = self.executor.workspaces().scratch()?;
        let root = scratch.root().to_path_buf();
        let guard = WorkspaceGuard::new(self.executor.workspaces(), scratch);
        tracing::info!(source, name, "remixing val");
        let out = self.executor.cli().run(&args, Some(&root)).await;
        guard.release().await;

        if !out.success {
            return Err(Error::Cli(format!("vt remix failed: {}", out.reason())));
        }
        Ok(out
            .json()
            .unwrap_or_else(|| Value::String(format!("Successfully remixed {source} to {name}."))))
    }
}
