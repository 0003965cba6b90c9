//! Response schemas for the Val Town API.
//!
//! Decoding at the client boundary rejects bodies that are not what the
//! operation expects. Fields we do not model are kept in `extra` so the
//! re-serialized value still matches what the API sent. Only fields the API
//! always sends with a non-null value are modelled; nullable ones such as
//! pagination links stay in `extra`, where `null` and absent remain distinct.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Unmodelled fields of a response object.
pub type Extra = Map<String, Value>;

/// A page of results from a paginated endpoint. `links` lives in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A user; `username` may be null and lives in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(flatten)]
    pub extra: Extra,
}

impl User {
    pub fn username(&self) -> Option<&str> {
        self.extra.get("username").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Val {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A file or directory inside a val.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobEntry {
    pub key: String,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Result of a single SQLite statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[cfg(test)]
mod tests {
    use super::{Branch, Page, User};
    use serde_json::json;

    #[test]
    fn page_round_trips_unknown_fields() {
        let body = json!({
            "data": [{"id": "b1", "name": "main", "version": 4}],
            "links": {
                "self": "https://api.val.town/v2/vals/x/branches?offset=0",
                "prev": null,
                "next": null
            }
        });
        let page: Page<Branch> = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(page.data[0].extra["version"], 4);
        assert_eq!(serde_json::to_value(&page).unwrap(), body);
    }

    #[test]
    fn null_and_absent_fields_stay_distinct() {
        for body in [
            json!({"data": [], "links": null}),
            json!({"data": []}),
        ] {
            let page: Page<Branch> = serde_json::from_value(body.clone()).unwrap();
            assert_eq!(serde_json::to_value(&page).unwrap(), body);
        }

        for body in [
            json!({"id": "u1", "username": null}),
            json!({"id": "u1"}),
        ] {
            let user: User = serde_json::from_value(body.clone()).unwrap();
            assert_eq!(user.username(), None);
            assert_eq!(serde_json::to_value(&user).unwrap(), body);
        }
    }

    #[test]
    fn rejects_body_of_wrong_shape() {
        let body = json!({"items": []});
        assert!(serde_json::from_value::<Page<Branch>>(body).is_err());
    }
}
