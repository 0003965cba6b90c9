use super::Session;
use crate::cli::CliRunner;
use crate::error::Error;
use crate::executor::{OperationContext, Step};
use crate::schema::{Branch, Page};
use crate::validate::{self, Pagination};
use crate::workspace::WorkspaceManager;
use reqwest::Method;
use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListBranchesParams {
    /// ID of the val.
    pub val_id: String,
    /// Maximum number of results to return (1-100, default 20).
    pub limit: Option<i64>,
    /// Number of items to skip for pagination (default 0).
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetBranchParams {
    /// ID of the val.
    pub val_id: String,
    /// ID of the branch.
    pub branch_id: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBranchParams {
    /// ID of the val.
    pub val_id: String,
    /// Name for the branch.
    pub name: String,
    /// ID of the branch to fork from (defaults to main).
    pub branch_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBranchParams {
    /// ID of the val.
    pub val_id: String,
    /// ID of the branch to delete.
    pub branch_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewBranch<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch_id: Option<&'a str>,
}

impl<C: CliRunner, W: WorkspaceManager> Session<'_, C, W> {
    /// Branches of a val, from `vt branch` or the API.
    pub async fn list_branches(&self, params: &ListBranchesParams) -> Result<Value, Error> {
        validate::non_empty("valId", &params.val_id)?;
        let page = Pagination::new(params.limit, params.offset)?;
        let op = OperationContext::new("list-branches", params)?.on_val(&params.val_id);
        let cli = self.executor.cli();

        self.executor
            .run(
                &op,
                |root| async move {
                    let out = cli.run(&["branch", "--json"], Some(&root)).await;
                    if !out.success {
                        return Step::Retryable(format!("vt branch failed: {}", out.reason()));
                    }
                    match out.json() {
                        Some(Value::Array(items)) => Step::Ok(Value::Array(page.apply(items))),
                        Some(other) => Step::Ok(other),
                        None => Step::Retryable("vt branch printed no JSON".into()),
                    }
                },
                || async {
                    let branches: Page<Branch> = self
                        .api
                        .get(
                            &["v2", "vals", params.val_id.as_str(), "branches"],
                            &page.query(),
                        )
                        .await?;
                    Ok(serde_json::to_value(branches)?)
                },
            )
            .await
    }

    pub async fn get_branch(&self, params: &GetBranchParams) -> Result<Branch, Error> {
        validate::non_empty("valId", &params.val_id)?;
        validate::non_empty("branchId", &params.branch_id)?;
        self.api
            .get(
                &[
                    "v2",
                    "vals",
                    params.val_id.as_str(),
                    "branches",
                    params.branch_id.as_str(),
                ],
                &[],
            )
            .await
    }

    /// Fork a branch. The source branch is checked out before `vt checkout -b`.
    pub async fn create_branch(&self, params: &CreateBranchParams) -> Result<Value, Error> {
        validate::non_empty("valId", &params.val_id)?;
        validate::non_empty("name", &params.name)?;
        let op = OperationContext::new("create-branch", params)?
            .on_val(&params.val_id)
            .on_branch(params.branch_id.as_deref());
        let cli = self.executor.cli();
        let name = params.name.as_str();

        self.executor
            .run(
                &op,
                |root| async move {
                    let out = cli
                        .run(&["checkout", "-b", name, "--json"], Some(&root))
                        .await;
                    if !out.success {
                        return Step::Retryable(format!(
                            "vt checkout -b {name} failed: {}",
                            out.reason()
                        ));
                    }
                    Step::Ok(
                        out.json()
                            .unwrap_or_else(|| Value::String(format!("Created branch {name}"))),
                    )
                },
                || async {
                    let body = NewBranch {
                        name,
                        branch_id: params.branch_id.as_deref(),
                    };
                    let branch: Branch = self
                        .api
                        .call(
                            Method::POST,
                            &["v2", "vals", params.val_id.as_str(), "branches"],
                            &[],
                            Some(&body),
                        )
                        .await?;
                    Ok(serde_json::to_value(branch)?)
                },
            )
            .await
    }

    pub async fn delete_branch(&self, params: &DeleteBranchParams) -> Result<String, Error> {
        validate::non_empty("valId", &params.val_id)?;
        validate::non_empty("branchId", &params.branch_id)?;
        let op = OperationContext::new("delete-branch", params)?.on_val(&params.val_id);
        let cli = self.executor.cli();
        let branch_id = params.branch_id.as_str();

        self.executor
            .run(
                &op,
                |root| async move {
                    let out = cli
                        .run(&["branch", "-D", branch_id, "--json"], Some(&root))
                        .await;
                    if out.success {
                        Step::Ok(branch_deleted(branch_id))
                    } else {
                        Step::Retryable(format!("vt branch -D failed: {}", out.reason()))
                    }
                },
                || async {
                    self.api
                        .call::<Value, Value>(
                            Method::DELETE,
                            &["v2", "vals", params.val_id.as_str(), "branches", branch_id],
                            &[],
                            None,
                        )
                        .await?;
                    Ok(branch_deleted(branch_id))
                },
            )
            .await
    }
}

fn branch_deleted(branch_id: &str) -> String {
    format!("Branch {branch_id} deleted successfully.")
}
