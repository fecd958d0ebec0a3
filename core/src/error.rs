//! Error types for the bookshelf client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because a book deleted elsewhere is the
//! one API failure a caller may want to tell apart. All other non-2xx
//! responses land in `Http` with the raw status and body for the log.

use std::fmt;

use thiserror::Error;

use crate::form::ValidationError;

/// The host could not complete an HTTP round-trip (DNS, refused connection,
/// dropped socket...).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("transport failed: {0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors returned by `BooksClient` build/parse methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404; the book does not exist.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// The request a controller operation attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Load,
    Create,
    Update,
    Delete,
}

impl Action {
    /// User-facing alert text for a failed attempt.
    pub fn failure_message(self) -> &'static str {
        match self {
            Action::Load => "Failed to load books.",
            Action::Create => "Failed to create book.",
            Action::Update => "Failed to update book.",
            Action::Delete => "Failed to delete book.",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Load => write!(f, "load books"),
            Action::Create => write!(f, "create book"),
            Action::Update => write!(f, "update book"),
            Action::Delete => write!(f, "delete book"),
        }
    }
}

/// Outcome of a failed `BookListController` operation. By the time a caller
/// sees one of these the user has already been alerted.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to {action}: {source}")]
    Request {
        action: Action,
        #[source]
        source: ApiError,
    },
}

impl ActionError {
    pub fn action(&self) -> Option<Action> {
        match self {
            ActionError::Validation(_) => None,
            ActionError::Request { action, .. } => Some(*action),
        }
    }
}
