//! The MCP server: tool and prompt routing on top of [`ops`](crate::ops).

use crate::api::{ApiClient, ApiToken};
use crate::cli::VtCli;
use crate::config::{ApiConfig, CliConfig, PromptConfig};
use crate::error::Error;
use crate::executor::{ExecutionPreference, Executor};
use crate::ops::blob::{BlobKeyParams, ListBlobsParams, StoreBlobParams};
use crate::ops::branch::{
    CreateBranchParams, DeleteBranchParams, GetBranchParams, ListBranchesParams,
};
use crate::ops::file::{
    CreateFileParams, DeleteFileParams, GetFileParams, ListFilesParams, UpdateFileParams,
};
use crate::ops::local::{GetValStatusParams, RemixValParams};
use crate::ops::sqlite::{ExecuteSqlBatchParams, ExecuteSqlParams};
use crate::ops::user::GetUserParams;
use crate::ops::vals::{
    CreateValParams, DeleteValParams, GetValParams, ListMyValsParams, SearchValsParams,
};
use crate::ops::{Session, ValTownExecutor, respond};
use crate::prompts::{PromptArgs, PromptLibrary};
use crate::workspace::CloneWorkspaces;
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    handler::server::{
        router::{prompt::PromptRouter, tool::ToolRouter},
        wrapper::Parameters,
    },
    model::{
        GetPromptRequestParams, GetPromptResult, Implementation, ListPromptsResult,
        PaginatedRequestParams, PromptMessage, PromptMessageRole, ServerCapabilities, ServerInfo,
    },
    prompt, prompt_handler, prompt_router,
    service::RequestContext,
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

/// Val Town tools and prompts over MCP.
#[derive(Debug, Clone)]
pub struct ValTownServer {
    api: ApiClient,
    token: Option<ApiToken>,
    executor: Arc<ValTownExecutor>,
    prompts: PromptLibrary,
    tool_router: ToolRouter<Self>,
    prompt_router: PromptRouter<Self>,
}

impl ValTownServer {
    /// Server for a local process: one fixed credential, API and CLI tools.
    pub fn local(
        token: ApiToken,
        api: &ApiConfig,
        cli: &CliConfig,
        prompts: &PromptConfig,
    ) -> Result<Self, Error> {
        let executor = executor(cli.preference(), cli.workspace_dir());
        Self::build(
            api,
            Some(token),
            executor,
            prompts,
            Self::api_router() + Self::cli_router(),
        )
    }

    /// Server behind the HTTP entry point: credential per request, API tools only.
    pub fn remote(api: &ApiConfig, prompts: &PromptConfig) -> Result<Self, Error> {
        let executor = executor(ExecutionPreference::api_only(), std::env::temp_dir());
        Self::build(api, None, executor, prompts, Self::api_router())
    }

    fn build(
        api: &ApiConfig,
        token: Option<ApiToken>,
        executor: ValTownExecutor,
        prompts: &PromptConfig,
        tool_router: ToolRouter<Self>,
    ) -> Result<Self, Error> {
        Ok(Self {
            api: ApiClient::new(&api.api_base)?,
            token,
            executor: Arc::new(executor),
            prompts: PromptLibrary::new(prompts.prompts_dir.clone()),
            tool_router,
            prompt_router: Self::prompt_router(),
        })
    }

    /// Resolve the caller's credential: the HTTP request first, then the fixed token.
    fn session(
        &self,
        context: &RequestContext<RoleServer>,
    ) -> Result<Session<'_, VtCli, CloneWorkspaces<VtCli>>, Error> {
        let token = context
            .extensions
            .get::<http::request::Parts>()
            .and_then(|parts| parts.extensions.get::<ApiToken>())
            .or(self.token.as_ref())
            .cloned()
            .ok_or(Error::MissingToken)?;
        Ok(Session::new(self.api.with_token(token), &self.executor))
    }

    async fn prompt_messages(
        &self,
        name: &str,
        request: &str,
    ) -> Result<Vec<PromptMessage>, McpError> {
        let text = self
            .prompts
            .render(name, request)
            .await
            .map_err(|e| McpError::internal_error(format!("Error processing prompt: {e}"), None))?;
        Ok(vec![PromptMessage::new_text(PromptMessageRole::User, text)])
    }
}

fn executor(preference: ExecutionPreference, workspace_dir: std::path::PathBuf) -> ValTownExecutor {
    let cli = VtCli::new(&preference.cli_path, preference.command_timeout);
    let workspaces = CloneWorkspaces::new(cli.clone(), workspace_dir);
    Executor::new(preference, cli, workspaces)
}

#[tool_router(router = api_router)]
impl ValTownServer {
    #[tool(name = "get-user", description = "Get basic details about a user by username")]
    async fn get_user(
        &self,
        Parameters(params): Parameters<GetUserParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, String> {
        respond("getting user", async {
            self.session(&context)?.get_user(&params).await
        })
        .await
    }

    #[tool(
        name = "get-my-info",
        description = "Get profile information for the current authenticated user"
    )]
    async fn get_my_info(&self, context: RequestContext<RoleServer>) -> Result<String, String> {
        respond("getting user info", async {
            self.session(&context)?.get_my_info().await
        })
        .await
    }

    #[tool(name = "get-val", description = "Get a val by username and val name")]
    async fn get_val(
        &self,
        Parameters(params): Parameters<GetValParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, String> {
        respond("getting val", async {
            self.session(&context)?.get_val(&params).await
        })
        .await
    }

    #[tool(name = "search-vals", description = "Search for vals across the Val Town platform")]
    async fn search_vals(
        &self,
        Parameters(params): Parameters<SearchValsParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, String> {
        respond("searching vals", async {
            self.session(&context)?.search_vals(&params).await
        })
        .await
    }

    #[tool(name = "create-val", description = "Create a new val")]
    async fn create_val(
        &self,
        Parameters(params): Parameters<CreateValParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, String> {
        respond("creating val", async {
            self.session(&context)?.create_val(&params).await
        })
        .await
    }

    #[tool(name = "delete-val", description = "Delete a val by ID")]
    async fn delete_val(
        &self,
        Parameters(params): Parameters<DeleteValParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, String> {
        respond("deleting val", async {
            self.session(&context)?.delete_val(&params).await
        })
        .await
    }

    #[tool(name = "list-my-vals", description = "List all vals for the authenticated user")]
    async fn list_my_vals(
        &self,
        Parameters(params): Parameters<ListMyValsParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, String> {
        respond("listing your vals", async {
            self.session(&context)?.list_my_vals(&params).await
        })
        .await
    }

    #[tool(name = "list-branches", description = "List all branches in a val")]
    async fn list_branches(
        &self,
        Parameters(params): Parameters<ListBranchesParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, String> {
        respond("listing branches", async {
            self.session(&context)?.list_branches(&params).await
        })
        .await
    }

    #[tool(name = "get-branch", description = "Get details about a specific branch")]
    async fn get_branch(
        &self,
        Parameters(params): Parameters<GetBranchParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, String> {
        respond("getting branch", async {
            self.session(&context)?.get_branch(&params).await
        })
        .await
    }

    #[tool(name = "create-branch", description = "Create a new branch in a val")]
    async fn create_branch(
        &self,
        Parameters(params): Parameters<CreateBranchParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, String> {
        respond("creating branch", async {
            self.session(&context)?.create_branch(&params).await
        })
        .await
    }

    #[tool(name = "delete-branch", description = "Delete a branch from a val")]
    async fn delete_branch(
        &self,
        Parameters(params): Parameters<DeleteBranchParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, String> {
        respond("deleting branch", async {
            self.session(&context)?.delete_branch(&params).await
        })
        .await
    }

    #[tool(name = "list-files", description = "List files in a val branch")]
    async fn list_files(
        &self,
        Parameters(params): Parameters<ListFilesParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, String> {
        respond("listing files", async {
            self.session(&context)?.list_files(&params).await
        })
        .await
    }

    #[tool(name = "get-file", description = "Get file content from a val branch")]
    async fn get_file(
        &self,
        Parameters(params): Parameters<GetFileParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, String> {
        respond("getting file content", async {
            self.session(&context)?.get_file(&params).await
        })
        .await
    }

    #[tool(
        name = "create-file-or-directory",
        description = "Create a new file or directory in a val branch"
    )]
    async fn create_file_or_directory(
        &self,
        Parameters(params): Parameters<CreateFileParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, String> {
        respond("creating file or directory", async {
            self.session(&context)?.create_file(&params).await
        })
        .await
    }

    #[tool(name = "update-file", description = "Update an existing file in a val branch")]
    async fn update_file(
        &self,
        Parameters(params): Parameters<UpdateFileParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, String> {
        respond("updating file", async {
            self.session(&context)?.update_file(&params).await
        })
        .await
    }

    #[tool(
        name = "delete-file-or-directory",
        description = "Delete a file or directory from a val branch"
    )]
    async fn delete_file_or_directory(
        &self,
        Parameters(params): Parameters<DeleteFileParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, String> {
        respond("deleting file or directory", async {
            self.session(&context)?.delete_file(&params).await
        })
        .await
    }

    #[tool(name = "execute-sql", description = "Execute a SQL query against a SQLite database")]
    async fn execute_sql(
        &self,
        Parameters(params): Parameters<ExecuteSqlParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, String> {
        respond("executing SQL", async {
            self.session(&context)?.execute_sql(&params).await
        })
        .await
    }

    #[tool(
        name = "execute-sql-batch",
        description = "Execute multiple SQL statements against a SQLite database"
    )]
    async fn execute_sql_batch(
        &self,
        Parameters(params): Parameters<ExecuteSqlBatchParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, String> {
        respond("executing SQL batch", async {
            self.session(&context)?.execute_sql_batch(&params).await
        })
        .await
    }

    #[tool(name = "list-blobs", description = "List blobs accessible to the current user")]
    async fn list_blobs(
        &self,
        Parameters(params): Parameters<ListBlobsParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, String> {
        respond("listing blobs", async {
            self.session(&context)?.list_blobs(&params).await
        })
        .await
    }

    #[tool(name = "get-blob", description = "Get a blob by key")]
    async fn get_blob(
        &self,
        Parameters(params): Parameters<BlobKeyParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, String> {
        respond("getting blob", async {
            self.session(&context)?.get_blob(&params).await
        })
        .await
    }

    #[tool(name = "store-blob", description = "Store a new blob")]
    async fn store_blob(
        &self,
        Parameters(params): Parameters<StoreBlobParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, String> {
        respond("storing blob", async {
            self.session(&context)?.store_blob(&params).await
        })
        .await
    }

    #[tool(name = "delete-blob", description = "Delete a blob by key")]
    async fn delete_blob(
        &self,
        Parameters(params): Parameters<BlobKeyParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, String> {
        respond("deleting blob", async {
            self.session(&context)?.delete_blob(&params).await
        })
        .await
    }
}

#[tool_router(router = cli_router)]
impl ValTownServer {
    #[tool(
        name = "get-val-status",
        description = "Show the working tree status of a val (requires the vt CLI)"
    )]
    async fn get_val_status(
        &self,
        Parameters(params): Parameters<GetValStatusParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, String> {
        respond("getting val status", async {
            self.session(&context)?.get_val_status(&params).await
        })
        .await
    }

    #[tool(
        name = "remix-val",
        description = "Remix an existing val to create a new one (requires the vt CLI)"
    )]
    async fn remix_val(
        &self,
        Parameters(params): Parameters<RemixValParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, String> {
        respond("remixing val", async {
            self.session(&context)?.remix_val(&params).await
        })
        .await
    }
}

#[prompt_router]
impl ValTownServer {
    #[prompt(name = "townie", description = "A simple prompt for basic Val Town operations")]
    async fn townie(
        &self,
        Parameters(args): Parameters<PromptArgs>,
    ) -> Result<Vec<PromptMessage>, McpError> {
        self.prompt_messages("townie", &args.request).await
    }

    #[prompt(
        name = "opentownie",
        description = "A comprehensive prompt for advanced Val Town workflows"
    )]
    async fn opentownie(
        &self,
        Parameters(args): Parameters<PromptArgs>,
    ) -> Result<Vec<PromptMessage>, McpError> {
        self.prompt_messages("opentownie", &args.request).await
    }
}

#[tool_handler]
#[prompt_handler]
impl ServerHandler for ValTownServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .build(),
            server_info: Implementation {
                name: "vtmcp".into(),
                title: Some("Val Town MCP Server".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Val Town server for vals, branches, files, SQLite and blobs. \
                 File and branch tools use the local vt CLI when available and the Val Town API otherwise."
                    .into(),
            ),
        }
    }
}
