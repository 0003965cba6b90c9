//! Operations exposed as MCP tools.
//!
//! Each operation validates its parameters, then either calls the API
//! directly or goes through the [`Executor`] when it also has a CLI path.
//! Tool entry points wrap every call in [`respond`], which renders the
//! result and turns errors and panics into a tool error message.

use crate::api::ApiClient;
use crate::cli::{CliRunner, VtCli};
use crate::error::Error;
use crate::executor::Executor;
use crate::workspace::{CloneWorkspaces, WorkspaceManager};
use futures::FutureExt;
use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::panic::AssertUnwindSafe;

pub mod blob;
pub mod branch;
pub mod file;
pub mod local;
pub mod sqlite;
pub mod user;
pub mod vals;

/// The executor wired to the real `vt` binary.
pub type ValTownExecutor = Executor<VtCli, CloneWorkspaces<VtCli>>;

/// An authenticated caller together with the executor serving it.
pub struct Session<'a, C, W> {
    pub(crate) api: ApiClient,
    pub(crate) executor: &'a Executor<C, W>,
}

impl<'a, C: CliRunner, W: WorkspaceManager> Session<'a, C, W> {
    pub fn new(api: ApiClient, executor: &'a Executor<C, W>) -> Self {
        Self { api, executor }
    }
}

/// Visibility of a val.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    #[default]
    Public,
    Unlisted,
    Private,
}

impl Privacy {
    pub fn as_str(self) -> &'static str {
        match self {
            Privacy::Public => "public",
            Privacy::Unlisted => "unlisted",
            Privacy::Private => "private",
        }
    }
}

/// Run an operation and render its outcome for the caller.
///
/// Errors become `Error <action>: <reason>`; a panic inside the operation is
/// reported the same way instead of tearing down the connection.
pub async fn respond<T, F>(action: &str, operation: F) -> Result<String, String>
where
    T: Serialize,
    F: Future<Output = Result<T, Error>>,
{
    let outcome = match AssertUnwindSafe(operation).catch_unwind().await {
        Ok(result) => result.and_then(|value| render(&value)),
        Err(panic) => Err(Error::Internal(panic_message(panic.as_ref()))),
    };
    outcome.map_err(|e| {
        tracing::error!(action, error = %e, "operation failed");
        format!("Error {action}: {e}")
    })
}

/// Plain strings are returned verbatim, everything else as pretty JSON.
pub fn render<T: Serialize>(value: &T) -> Result<String, Error> {
    match serde_json::to_value(value)? {
        Value::String(text) => Ok(text),
        other => Ok(serde_json::to_string_pretty(&other)?),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "operation panicked".into()
    }
}

#[cfg(test)]
mod tests {
    use super::{Privacy, render, respond};
    use crate::error::Error;
    use serde_json::json;

    #[test]
    fn renders_text_verbatim_and_json_pretty() {
        assert_eq!(render(&"Blob deleted successfully").unwrap(), "Blob deleted successfully");
        assert_eq!(
            render(&json!({"id": "a"})).unwrap(),
            "{\n  \"id\": \"a\"\n}"
        );
    }

    #[tokio::test]
    async fn errors_are_prefixed_with_the_action() {
        let out = respond("listing branches", async {
            Err::<(), _>(Error::Api {
                status: 500,
                body: "boom".into(),
            })
        })
        .await;
        assert_eq!(
            out.unwrap_err(),
            "Error listing branches: API error (500): boom"
        );
    }

    #[tokio::test]
    async fn panics_become_error_results() {
        let out = respond("getting file", async {
            if true {
                panic!("workspace vanished");
            }
            Ok::<_, Error>(())
        })
        .await;
        let message = out.unwrap_err();
        assert!(message.starts_with("Error getting file: "));
        assert!(message.contains("workspace vanished"));
    }

    #[test]
    fn privacy_is_lowercase() {
        assert_eq!(serde_json::to_value(Privacy::Unlisted).unwrap(), "unlisted");
        assert_eq!(Privacy::default().as_str(), "public");
    }
}
