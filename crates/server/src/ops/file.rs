//! Files of a val branch.
//!
//! On the CLI path these operate directly on the checkout; mutating ones are
//! published with `vt push` by the executor.

use super::Session;
use crate::cli::CliRunner;
use crate::error::Error;
use crate::executor::{OperationContext, Step};
use crate::schema::{Extra, FileEntry, Page};
use crate::validate::{self, Pagination};
use crate::workspace::{WorkspaceManager, check_relative, resolve};
use reqwest::Method;
use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// Kind of entry to create. Code files use one of the trigger types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    File,
    Interval,
    Http,
    Email,
    Script,
    Directory,
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileType::File => "file",
            FileType::Interval => "interval",
            FileType::Http => "http",
            FileType::Email => "email",
            FileType::Script => "script",
            FileType::Directory => "directory",
        })
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListFilesParams {
    /// ID of the val.
    pub val_id: String,
    /// Path to directory (leave empty for root).
    #[serde(default)]
    pub path: Option<String>,
    /// ID of the branch (defaults to main).
    pub branch_id: Option<String>,
    /// Whether to list files recursively.
    pub recursive: Option<bool>,
    /// Maximum number of results to return (1-100, default 20).
    pub limit: Option<i64>,
    /// Number of items to skip for pagination (default 0).
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetFileParams {
    /// ID of the val.
    pub val_id: String,
    /// Path to the file.
    pub path: String,
    /// ID of the branch (defaults to main).
    pub branch_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFileParams {
    /// ID of the val.
    pub val_id: String,
    /// Path to the new file or directory.
    pub path: String,
    /// Type of resource to create. Only use `file` for non code files; code
    /// files use `interval`, `http`, `email` or `script`.
    #[serde(rename = "type")]
    pub kind: FileType,
    /// Content for the file (not used for directories). Code must be TypeScript.
    pub content: Option<String>,
    /// ID of the branch (defaults to main).
    pub branch_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFileParams {
    /// ID of the val.
    pub val_id: String,
    /// Path to the file.
    pub path: String,
    /// New content for the file.
    pub content: String,
    /// ID of the branch (defaults to main).
    pub branch_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFileParams {
    /// ID of the val.
    pub val_id: String,
    /// Path to the file or directory.
    pub path: String,
    /// Whether to recursively delete all files in the directory.
    pub recursive: Option<bool>,
    /// ID of the branch (defaults to main).
    pub branch_id: Option<String>,
}

#[derive(Serialize)]
struct NewFile<'a> {
    #[serde(rename = "type")]
    kind: FileType,
    content: Option<&'a str>,
}

#[derive(Serialize)]
struct FileContent<'a> {
    content: &'a str,
}

impl<C: CliRunner, W: WorkspaceManager> Session<'_, C, W> {
    pub async fn list_files(&self, params: &ListFilesParams) -> Result<Page<FileEntry>, Error> {
        validate::non_empty("valId", &params.val_id)?;
        let dir = params.path.as_deref().unwrap_or("");
        check_relative(dir)?;
        let page = Pagination::new(params.limit, params.offset)?;
        let recursive = params.recursive.unwrap_or(false);
        let op = OperationContext::new("list-files", params)?
            .on_val(&params.val_id)
            .on_branch(params.branch_id.as_deref());

        self.executor
            .run(
                &op,
                |root| async move {
                    Step::from_result(list_local(&root, dir, recursive).await.map(|entries| Page {
                        data: page.apply(entries),
                        extra: Extra::new(),
                    }))
                },
                || async {
                    let mut query = vec![
                        ("path", dir.to_string()),
                        ("recursive", recursive.to_string()),
                    ];
                    query.extend(page.query());
                    query.extend(branch_query(params.branch_id.as_deref()));
                    self.api
                        .get(&["v2", "vals", params.val_id.as_str(), "files"], &query)
                        .await
                },
            )
            .await
    }

    pub async fn get_file(&self, params: &GetFileParams) -> Result<String, Error> {
        validate::non_empty("valId", &params.val_id)?;
        validate::val_path(&params.path)?;
        let path = params.path.as_str();
        let op = OperationContext::new("get-file", params)?
            .on_val(&params.val_id)
            .on_branch(params.branch_id.as_deref());

        self.executor
            .run(
                &op,
                |root| async move { Step::from_result(read_local(&root, path).await) },
                || async {
                    let mut query = vec![("path", path.to_string())];
                    query.extend(branch_query(params.branch_id.as_deref()));
                    self.api
                        .text(
                            &["v2", "vals", params.val_id.as_str(), "files", "content"],
                            &query,
                        )
                        .await
                },
            )
            .await
    }

    pub async fn create_file(&self, params: &CreateFileParams) -> Result<Value, Error> {
        validate::non_empty("valId", &params.val_id)?;
        validate::val_path(&params.path)?;
        let path = params.path.as_str();
        let kind = params.kind;
        let content = params.content.as_deref().unwrap_or("");
        let op = OperationContext::new("create-file-or-directory", params)?
            .on_val(&params.val_id)
            .on_branch(params.branch_id.as_deref())
            .mutating();

        self.executor
            .run(
                &op,
                |root| async move {
                    Step::from_result(
                        create_local(&root, path, kind, content)
                            .await
                            .map(|()| Value::String(format!("Created {kind} at {path}"))),
                    )
                },
                || async {
                    let body = NewFile {
                        kind,
                        content: (kind != FileType::Directory).then_some(content),
                    };
                    let mut query = vec![("path", path.to_string())];
                    query.extend(branch_query(params.branch_id.as_deref()));
                    let entry: FileEntry = self
                        .api
                        .call(
                            Method::POST,
                            &["v2", "vals", params.val_id.as_str(), "files"],
                            &query,
                            Some(&body),
                        )
                        .await?;
                    Ok(serde_json::to_value(entry)?)
                },
            )
            .await
    }

    /// Overwrite a file that already exists.
    pub async fn update_file(&self, params: &UpdateFileParams) -> Result<Value, Error> {
        validate::non_empty("valId", &params.val_id)?;
        validate::val_path(&params.path)?;
        let path = params.path.as_str();
        let content = params.content.as_str();
        let op = OperationContext::new("update-file", params)?
            .on_val(&params.val_id)
            .on_branch(params.branch_id.as_deref())
            .mutating();

        self.executor
            .run(
                &op,
                |root| async move {
                    Step::from_result(
                        update_local(&root, path, content)
                            .await
                            .map(|()| Value::String(format!("Updated file at {path}"))),
                    )
                },
                || async {
                    let mut query = vec![("path", path.to_string())];
                    query.extend(branch_query(params.branch_id.as_deref()));
                    let entry: FileEntry = self
                        .api
                        .call(
                            Method::PUT,
                            &["v2", "vals", params.val_id.as_str(), "files"],
                            &query,
                            Some(&FileContent { content }),
                        )
                        .await?;
                    Ok(serde_json::to_value(entry)?)
                },
            )
            .await
    }

    pub async fn delete_file(&self, params: &DeleteFileParams) -> Result<String, Error> {
        validate::non_empty("valId", &params.val_id)?;
        validate::val_path(&params.path)?;
        let path = params.path.as_str();
        let recursive = params.recursive.unwrap_or(false);
        let op = OperationContext::new("delete-file-or-directory", params)?
            .on_val(&params.val_id)
            .on_branch(params.branch_id.as_deref())
            .mutating();

        self.executor
            .run(
                &op,
                |root| async move {
                    Step::from_result(
                        delete_local(&root, path, recursive)
                            .await
                            .map(|()| file_deleted(path)),
                    )
                },
                || async {
                    let mut query = vec![
                        ("path", path.to_string()),
                        ("recursive", recursive.to_string()),
                    ];
                    query.extend(branch_query(params.branch_id.as_deref()));
                    self.api
                        .call::<Value, Value>(
                            Method::DELETE,
                            &["v2", "vals", params.val_id.as_str(), "files"],
                            &query,
                            None,
                        )
                        .await?;
                    Ok(file_deleted(path))
                },
            )
            .await
    }
}

fn branch_query(branch_id: Option<&str>) -> Option<(&'static str, String)> {
    branch_id.map(|id| ("branch_id", id.to_string()))
}

fn file_deleted(path: &str) -> String {
    format!("File or directory at path {path} deleted successfully.")
}

/// Entries below `dir`, with paths relative to the val root.
///
/// CLI bookkeeping (`.vt*`) is hidden.
pub async fn list_local(root: &Path, dir: &str, recursive: bool) -> Result<Vec<FileEntry>, Error> {
    let base = root.canonicalize()?;
    let start = resolve(&base, dir)?;
    let mut pending = vec![start];
    let mut entries = Vec::new();

    while let Some(current) = pending.pop() {
        let mut reader = tokio::fs::read_dir(&current).await?;
        while let Some(entry) = reader.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(".vt") {
                continue;
            }
            let path = entry.path();
            let relative = path
                .strip_prefix(&base)
                .map_err(|_| Error::invalid(format!("{} is outside the val", path.display())))?
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");

            let kind = if entry.file_type().await?.is_dir() {
                if recursive {
                    pending.push(path);
                }
                "directory"
            } else {
                file_kind(&name)
            };
            let mut extra = Extra::new();
            extra.insert("name".into(), Value::String(name));
            entries.push(FileEntry {
                path: relative,
                kind: kind.into(),
                extra,
            });
        }
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

/// Val Town file type implied by a file name.
pub fn file_kind(name: &str) -> &'static str {
    let lower = name.to_ascii_lowercase();
    if ![".ts", ".tsx", ".js", ".jsx"]
        .iter()
        .any(|ext| lower.ends_with(ext))
    {
        return "file";
    }
    if lower.contains(".http.") {
        "http"
    } else if lower.contains(".cron.") || lower.contains(".interval.") {
        "interval"
    } else if lower.contains(".email.") {
        "email"
    } else {
        "script"
    }
}

async fn read_local(root: &Path, path: &str) -> Result<String, Error> {
    Ok(tokio::fs::read_to_string(resolve(root, path)?).await?)
}

async fn create_local(root: &Path, path: &str, kind: FileType, content: &str) -> Result<(), Error> {
    let target = resolve(root, path)?;
    if kind == FileType::Directory {
        tokio::fs::create_dir_all(&target).await?;
        return Ok(());
    }
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&target, content).await?;
    Ok(())
}

async fn update_local(root: &Path, path: &str, content: &str) -> Result<(), Error> {
    let target = resolve(root, path)?;
    let is_file = tokio::fs::metadata(&target)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(Error::invalid(format!("{path} is not an existing file")));
    }
    tokio::fs::write(&target, content).await?;
    Ok(())
}

async fn delete_local(root: &Path, path: &str, recursive: bool) -> Result<(), Error> {
    let target = resolve(root, path)?;
    let metadata = tokio::fs::metadata(&target).await?;
    if !metadata.is_dir() {
        tokio::fs::remove_file(&target).await?;
    } else if recursive {
        tokio::fs::remove_dir_all(&target).await?;
    } else {
        tokio::fs::remove_dir(&target).await?;
    }
    Ok(())
}
