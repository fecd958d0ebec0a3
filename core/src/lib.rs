//! Client core for a single-screen book collection app.
//!
//! # Overview
//! `BookListController` holds the cached book list, the add/edit form and a
//! busy flag, and drives CRUD requests against the books REST API. The core
//! never opens a socket: it builds `HttpRequest` values, hands them to a
//! host-supplied `Transport`, and parses the `HttpResponse` that comes back.
//! Dialogs and redraws go through the host's `Screen`.
//!
//! # Design
//! - `BooksClient` is stateless; it holds only `base_url`.
//! - Each CRUD operation is split into `build_*` and `parse_*`, so the I/O
//!   boundary is explicit and testable without a server.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod form;
pub mod http;
pub mod types;
pub mod view;

pub use client::BooksClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use controller::BookListController;
pub use error::{Action, ActionError, ApiError, TransportError};
pub use form::{BookForm, FormField, ValidationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use types::{Book, BookId, BookPayload};
pub use view::{Screen, ViewState};
