use super::Session;
use crate::cli::CliRunner;
use crate::error::Error;
use crate::schema::BlobEntry;
use crate::validate;
use crate::workspace::WorkspaceManager;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Method;
use rmcp::schemars::{self, JsonSchema};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListBlobsParams {
    /// Only include blobs whose key starts with this string.
    pub prefix: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct BlobKeyParams {
    /// Key that uniquely identifies this blob.
    pub key: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreBlobParams {
    /// Key that uniquely identifies this blob.
    pub key: String,
    /// Content to store (text or base64-encoded binary).
    pub data: String,
    /// Whether `data` is base64-encoded binary.
    #[serde(default)]
    pub is_base64: bool,
    /// Content type of the blob (default text/plain).
    pub content_type: Option<String>,
}

impl<C: CliRunner, W: WorkspaceManager> Session<'_, C, W> {
    pub async fn list_blobs(&self, params: &ListBlobsParams) -> Result<Vec<BlobEntry>, Error> {
        let query: Vec<_> = params
            .prefix
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| ("prefix", p.clone()))
            .collect();
        self.api.get(&["v1", "blob"], &query).await
    }

    /// Text blobs are returned as-is, anything else base64-encoded.
    pub async fn get_blob(&self, params: &BlobKeyParams) -> Result<String, Error> {
        validate::blob_key(&params.key)?;
        let (content_type, body) = self.api.bytes(&["v1", "blob", params.key.as_str()]).await?;
        let content = if is_text(&content_type) {
            String::from_utf8_lossy(&body).into_owned()
        } else {
            STANDARD.encode(&body)
        };
        Ok(format!("Content-Type: {content_type}\n\n{content}"))
    }

    pub async fn store_blob(&self, params: &StoreBlobParams) -> Result<String, Error> {
        validate::blob_key(&params.key)?;
        let body = if params.is_base64 {
            validate::base64(&params.data)?
        } else {
            params.data.clone().into_bytes()
        };
        let content_type = params.content_type.as_deref().unwrap_or("text/plain");
        self.api
            .upload(Method::POST, &["v1", "blob", params.key.as_str()], content_type, body)
            .await?;
        Ok("Blob stored successfully".into())
    }

    pub async fn delete_blob(&self, params: &BlobKeyParams) -> Result<String, Error> {
        validate::blob_key(&params.key)?;
        self.api
            .call::<Value, Value>(Method::DELETE, &["v1", "blob", params.key.as_str()], &[], None)
            .await?;
        Ok("Blob deleted successfully".into())
    }
}

fn is_text(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence.starts_with("text/") || essence == "application/json"
}
