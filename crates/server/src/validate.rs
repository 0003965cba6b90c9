//! Input checks run before any execution path.

use crate::error::Error;
use crate::workspace::check_relative;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;
pub const MAX_QUERY_LEN: usize = 256;
pub const MAX_BLOB_KEY_LEN: usize = 512;

/// Validated `limit`/`offset` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Result<Self, Error> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        let offset = offset.unwrap_or(0);
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(Error::invalid(format!(
                "limit must be between 1 and {MAX_LIMIT}, got {limit}"
            )));
        }
        if offset < 0 {
            return Err(Error::invalid(format!("offset must be >= 0, got {offset}")));
        }
        Ok(Self { limit, offset })
    }

    pub fn query<'a>(&self) -> Vec<(&'a str, String)> {
        vec![
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
        ]
    }

    /// Window `items` the way the API would.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect()
    }
}

pub fn non_empty(field: &str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::invalid(format!("{field} must not be empty")));
    }
    Ok(())
}

pub fn search_query(query: &str) -> Result<(), Error> {
    let len = query.chars().count();
    if len == 0 || len > MAX_QUERY_LEN {
        return Err(Error::invalid(format!(
            "query must be 1 to {MAX_QUERY_LEN} characters"
        )));
    }
    Ok(())
}

pub fn uuid(field: &str, value: &str) -> Result<(), Error> {
    uuid::Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| Error::invalid(format!("{field} must be a UUID, got {value:?}")))
}

pub fn blob_key(key: &str) -> Result<(), Error> {
    if key.is_empty() || key.len() > MAX_BLOB_KEY_LEN {
        return Err(Error::invalid(format!(
            "blob key must be 1 to {MAX_BLOB_KEY_LEN} bytes"
        )));
    }
    Ok(())
}

/// A path inside a val.
pub fn val_path(path: &str) -> Result<(), Error> {
    non_empty("path", path)?;
    check_relative(path)
}

pub fn statements(statements: &[String]) -> Result<(), Error> {
    if statements.is_empty() {
        return Err(Error::invalid("statements must not be empty"));
    }
    for (i, statement) in statements.iter().enumerate() {
        non_empty(&format!("statements[{i}]"), statement)?;
    }
    Ok(())
}

pub fn base64(content: &str) -> Result<Vec<u8>, Error> {
    STANDARD
        .decode(content.trim())
        .map_err(|e| Error::invalid(format!("content is not valid base64: {e}")))
}
