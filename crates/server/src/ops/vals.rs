use super::{Privacy, Session};
use crate::cli::CliRunner;
use crate::error::Error;
use crate::schema::{Page, Val};
use crate::validate::{self, Pagination};
use crate::workspace::WorkspaceManager;
use reqwest::Method;
use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetValParams {
    /// Username of the val's owner.
    pub username: String,
    /// Name of the val.
    pub val_name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchValsParams {
    /// Search query.
    pub query: String,
    /// Maximum number of results to return (1-100, default 20).
    pub limit: Option<i64>,
    /// Number of items to skip for pagination (default 0).
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateValParams {
    /// Name for the val.
    pub name: String,
    /// Description for the val.
    pub description: Option<String>,
    /// Privacy setting: public, unlisted, or private.
    #[serde(default)]
    pub privacy: Privacy,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteValParams {
    /// ID of the val to delete.
    pub val_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListMyValsParams {
    /// Maximum number of results to return (1-100, default 20).
    pub limit: Option<i64>,
    /// Number of items to skip for pagination (default 0).
    pub offset: Option<i64>,
}

#[derive(Serialize)]
struct NewVal<'a> {
    name: &'a str,
    privacy: Privacy,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

impl<C: CliRunner, W: WorkspaceManager> Session<'_, C, W> {
    pub async fn get_val(&self, params: &GetValParams) -> Result<Val, Error> {
        validate::non_empty("username", &params.username)?;
        validate::non_empty("valName", &params.val_name)?;
        self.api
            .get(
                &["v2", "alias", "vals", params.username.as_str(), params.val_name.as_str()],
                &[],
            )
            .await
    }

    pub async fn search_vals(&self, params: &SearchValsParams) -> Result<Page<Val>, Error> {
        validate::search_query(&params.query)?;
        let page = Pagination::new(params.limit, params.offset)?;
        let mut query = vec![("query", params.query.clone())];
        query.extend(page.query());
        self.api.get(&["v1", "search", "vals"], &query).await
    }

    pub async fn create_val(&self, params: &CreateValParams) -> Result<Val, Error> {
        validate::non_empty("name", &params.name)?;
        let body = NewVal {
            name: &params.name,
            privacy: params.privacy,
            description: params.description.as_deref().filter(|d| !d.is_empty()),
        };
        self.api
            .call(Method::POST, &["v2", "vals"], &[], Some(&body))
            .await
    }

    pub async fn delete_val(&self, params: &DeleteValParams) -> Result<String, Error> {
        validate::uuid("valId", &params.val_id)?;
        self.api
            .call::<Value, Value>(Method::DELETE, &["v2", "vals", params.val_id.as_str()], &[], None)
            .await?;
        Ok(format!("Val {} deleted successfully.", params.val_id))
    }

    pub async fn list_my_vals(&self, params: &ListMyValsParams) -> Result<Page<Val>, Error> {
        let page = Pagination::new(params.limit, params.offset)?;
        self.api.get(&["v2", "me", "vals"], &page.query()).await
    }
}
