use crate::auth::Authenticator;
use vtmcp::{ApiToken, Error};

/// Header carrying a Val Town API token.
pub const TOKEN_HEADER: &str = "x-val-town-token";

/// Takes the caller's Val Town token from `X-Val-Town-Token`, else from
/// `Authorization: Bearer <token>`.
///
/// The token is not checked here; the Val Town API rejects bad ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenAuth;

impl Authenticator for TokenAuth {
    type Claims = ApiToken;
    type Error = Error;

    async fn authenticate(&self, parts: &http::request::Parts) -> Result<ApiToken, Error> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };
        header(TOKEN_HEADER)
            .or_else(|| {
                header(http::header::AUTHORIZATION.as_str())
                    .and_then(|v| v.strip_prefix("Bearer "))
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
            })
            .map(ApiToken::new)
            .ok_or(Error::MissingToken)
    }
}
