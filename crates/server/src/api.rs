//! Authenticated client for the Val Town REST API.
//!
//! The HTTP path is the path of last resort: a non-success status ends the
//! operation with [`Error::Api`] and nothing is retried.

use crate::error::Error;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// Bearer credential for the Val Town API.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(***)")
    }
}

/// Query string pairs; values are percent-encoded when the URL is built.
pub type Query<'a> = [(&'a str, String)];

/// Client for the Val Town API.
///
/// Cloning is cheap: the connection pool is shared.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    token: Option<ApiToken>,
}

impl ApiClient {
    /// Create a client for the API rooted at `base`, without a credential.
    pub fn new(base: &str) -> Result<Self, Error> {
        let base = Url::parse(base).map_err(|e| Error::BaseUrl(format!("{base}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(Error::BaseUrl(base.to_string()));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            token: None,
        })
    }

    /// A copy of this client that authenticates as `token`.
    pub fn with_token(&self, token: ApiToken) -> Self {
        Self {
            token: Some(token),
            ..self.clone()
        }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Send a JSON request and decode the response into `T`.
    ///
    /// `204 No Content` and empty bodies decode from `null`.
    pub async fn call<T, B>(
        &self,
        method: Method,
        path: &[&str],
        query: &Query<'_>,
        body: Option<&B>,
    ) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut request = self
            .request(method, path, query)?
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = send(request).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(serde_json::from_value(Value::Null)?);
        }
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(serde_json::from_value(Value::Null)?);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// `GET` shorthand for [`call`](Self::call).
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &[&str],
        query: &Query<'_>,
    ) -> Result<T, Error> {
        self.call::<T, Value>(Method::GET, path, query, None).await
    }

    /// Fetch a body as text.
    pub async fn text(&self, path: &[&str], query: &Query<'_>) -> Result<String, Error> {
        let response = send(self.request(Method::GET, path, query)?).await?;
        Ok(response.text().await?)
    }

    /// Fetch a raw body together with its content type.
    pub async fn bytes(&self, path: &[&str]) -> Result<(String, Vec<u8>), Error> {
        let response = send(self.request(Method::GET, path, &[])?).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = response.bytes().await?;
        Ok((content_type, body.to_vec()))
    }

    /// Send a raw body with the caller's content type.
    pub async fn upload(
        &self,
        method: Method,
        path: &[&str],
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<(), Error> {
        let request = self
            .request(method, path, &[])?
            .header(CONTENT_TYPE, content_type)
            .body(body);
        send(request).await?;
        Ok(())
    }

    /// Build `<base>/<segments...>?<query>` with each segment encoded on its own.
    pub fn url(&self, path: &[&str], query: &Query<'_>) -> Result<Url, Error> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::BaseUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(path);
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        path: &[&str],
        query: &Query<'_>,
    ) -> Result<RequestBuilder, Error> {
        let token = self.token.as_ref().ok_or(Error::MissingToken)?;
        let url = self.url(path, query)?;
        tracing::debug!(%method, %url, "val town api request");
        Ok(self
            .http
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", token.as_str())))
    }
}

async fn send(request: RequestBuilder) -> Result<Response, Error> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::Api {
        status: status.as_u16(),
        body,
    })
}
