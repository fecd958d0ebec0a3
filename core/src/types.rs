//! Domain DTOs for the books API.
//!
//! # Design
//! These types are defined independently from the mock-server crate; the
//! integration tests catch schema drift between the two. Ids are opaque to
//! the client: the server may hand out strings or integers, and either way
//! they are carried as text and pasted back into `/books/{id}`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned book identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BookId(String);

impl BookId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for BookId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(id) => BookId(id),
            RawId::Signed(id) => BookId(id.to_string()),
            RawId::Unsigned(id) => BookId(id.to_string()),
        })
    }
}

/// A single book record returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request body for both create (`POST /books`) and full replacement
/// (`PUT /books/{id}`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookPayload {
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default)]
    pub description: String,
}
