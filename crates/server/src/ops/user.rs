use super::Session;
use crate::cli::CliRunner;
use crate::error::Error;
use crate::schema::User;
use crate::validate;
use crate::workspace::WorkspaceManager;
use rmcp::schemars::{self, JsonSchema};
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetUserParams {
    /// Username of the user to look for (without @ symbol).
    pub username: String,
}

impl<C: CliRunner, W: WorkspaceManager> Session<'_, C, W> {
    pub async fn get_user(&self, params: &GetUserParams) -> Result<User, Error> {
        let username = params.username.trim_start_matches('@');
        validate::non_empty("username", username)?;
        self.api.get(&["v1", "alias", username], &[]).await
    }

    pub async fn get_my_info(&self) -> Result<User, Error> {
        self.api.get(&["v1", "me"], &[]).await
    }
}
