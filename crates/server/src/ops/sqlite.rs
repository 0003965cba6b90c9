use super::Session;
use crate::cli::CliRunner;
use crate::error::Error;
use crate::schema::ResultSet;
use crate::validate;
use crate::workspace::WorkspaceManager;
use reqwest::Method;
use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SqlMode {
    #[default]
    Read,
    Write,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ExecuteSqlParams {
    /// SQL statement to execute.
    pub statement: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ExecuteSqlBatchParams {
    /// SQL statements to execute.
    pub statements: Vec<String>,
    /// Mode of the statements (read or write).
    #[serde(default)]
    pub mode: SqlMode,
}

impl<C: CliRunner, W: WorkspaceManager> Session<'_, C, W> {
    pub async fn execute_sql(&self, params: &ExecuteSqlParams) -> Result<ResultSet, Error> {
        validate::non_empty("statement", &params.statement)?;
        self.api
            .call(Method::POST, &["v1", "sqlite", "execute"], &[], Some(params))
            .await
    }

    pub async fn execute_sql_batch(
        &self,
        params: &ExecuteSqlBatchParams,
    ) -> Result<Vec<ResultSet>, Error> {
        validate::statements(&params.statements)?;
        self.api
            .call(Method::POST, &["v1", "sqlite", "batch"], &[], Some(params))
            .await
    }
}
