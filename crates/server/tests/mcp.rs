//! The server driven by an MCP client over an in-memory transport.

mod common;

use common::{FakeApi, Reply, TOKEN};
use rmcp::model::{CallToolRequestParams, CallToolResult};
use rmcp::service::RunningService;
use rmcp::{RoleClient, ServiceExt};
use serde_json::{Value, json};
use std::borrow::Cow;
use vtmcp::config::{ApiConfig, CliConfig, PromptConfig};
use vtmcp::{ApiToken, ValTownServer};

async fn connect(api: &FakeApi) -> RunningService<RoleClient, ()> {
    let server = ValTownServer::local(
        ApiToken::new(TOKEN),
        &ApiConfig {
            api_base: api.base.clone(),
        },
        &CliConfig {
            prefer_cli: false,
            ..Default::default()
        },
        &PromptConfig::default(),
    )
    .unwrap();
    let (server_io, client_io) = tokio::io::duplex(64 * 1024);
    tokio::spawn(async move {
        let running = server.serve(server_io).await.unwrap();
        let _ = running.waiting().await;
    });
    ().serve(client_io).await.unwrap()
}

async fn call(client: &RunningService<RoleClient, ()>, name: &str, args: Value) -> CallToolResult {
    client
        .call_tool(CallToolRequestParams {
            meta: None,
            name: Cow::Owned(name.to_string()),
            arguments: args.as_object().cloned(),
            task: None,
        })
        .await
        .unwrap()
}

fn text(result: &CallToolResult) -> String {
    result.content[0].raw.as_text().unwrap().text.clone()
}

#[tokio::test]
async fn lists_every_tool_and_prompt() {
    let api = FakeApi::start().await;
    let client = connect(&api).await;

    let tools = client.list_all_tools().await.unwrap();
    let mut names: Vec<_> = tools.iter().map(|t| t.name.to_string()).collect();
    names.sort();
    assert_eq!(names.len(), 24);
    for expected in [
        "create-file-or-directory",
        "execute-sql-batch",
        "get-val-status",
        "list-branches",
        "remix-val",
        "store-blob",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {expected}");
    }

    let prompts = client.list_all_prompts().await.unwrap();
    let mut prompt_names: Vec<_> = prompts.iter().map(|p| p.name.to_string()).collect();
    prompt_names.sort();
    assert_eq!(prompt_names, ["opentownie", "townie"]);

    client.cancel().await.unwrap();
}

#[tokio::test]
async fn tool_call_renders_api_json() {
    let api = FakeApi::start().await;
    let body = json!({"data": [{"id": "b1", "name": "main"}]});
    api.reply("GET", "/v2/vals/R1/branches", Reply::json(body.clone()));
    let client = connect(&api).await;

    let result = call(&client, "list-branches", json!({"valId": "R1"})).await;

    assert_ne!(result.is_error, Some(true));
    let rendered: Value = serde_json::from_str(&text(&result)).unwrap();
    assert_eq!(rendered, body);
    assert_eq!(api.requests()[0].query.as_deref(), Some("limit=20&offset=0"));
    client.cancel().await.unwrap();
}

#[tokio::test]
async fn plain_messages_are_returned_verbatim() {
    let api = FakeApi::start().await;
    api.reply("DELETE", "/v1/blob/notes", Reply::no_content());
    let client = connect(&api).await;

    let result = call(&client, "delete-blob", json!({"key": "notes"})).await;

    assert_eq!(text(&result), "Blob deleted successfully");
    client.cancel().await.unwrap();
}

#[tokio::test]
async fn failures_are_error_results() {
    let api = FakeApi::start().await;
    let client = connect(&api).await;

    let result = call(&client, "get-user", json!({"username": "nobody"})).await;

    assert_eq!(result.is_error, Some(true));
    assert_eq!(
        text(&result),
        "Error getting user: API error (404): no such route"
    );

    let result = call(&client, "delete-val", json!({"valId": "nope"})).await;
    assert_eq!(result.is_error, Some(true));
    assert!(text(&result).contains("invalid input"));
    assert_eq!(api.requests().len(), 1);
    client.cancel().await.unwrap();
}
