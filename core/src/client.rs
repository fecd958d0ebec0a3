//! Stateless HTTP request builder and response parser for the books API.
//!
//! # Design
//! `BooksClient` holds only a `base_url`. Each CRUD operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method that
//! consumes an `HttpResponse`, so the core stays free of I/O.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{Book, BookId, BookPayload};

#[derive(Debug, Clone)]
pub struct BooksClient {
    base_url: String,
}

impl BooksClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn build_list_books(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/books", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_create_book(&self, input: &BookPayload) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/books", self.base_url),
            headers: json_headers(),
            body: Some(to_json(input)?),
        })
    }

    pub fn build_update_book(&self, id: &BookId, input: &BookPayload) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Put,
            path: format!("{}/books/{id}", self.base_url),
            headers: json_headers(),
            body: Some(to_json(input)?),
        })
    }

    pub fn build_delete_book(&self, id: &BookId) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: format!("{}/books/{id}", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn parse_list_books(&self, response: HttpResponse) -> Result<Vec<Book>, ApiError> {
        check_status(&response)?;
        from_json(&response.body)
    }

    /// The status alone decides success. The echoed book is `None` when the
    /// server sent no body or one that does not decode.
    pub fn parse_create_book(&self, response: HttpResponse) -> Result<Option<Book>, ApiError> {
        check_status(&response)?;
        Ok(echoed_book(&response))
    }

    /// Same contract as `parse_create_book`.
    pub fn parse_update_book(&self, response: HttpResponse) -> Result<Option<Book>, ApiError> {
        check_status(&response)?;
        Ok(echoed_book(&response))
    }

    /// Delete responses carry no required body; whatever is there is ignored.
    pub fn parse_delete_book(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }
}

fn json_headers() -> Vec<(String, String)> {
    vec![("content-type".to_string(), "application/json".to_string())]
}

fn to_json(input: &BookPayload) -> Result<String, ApiError> {
    serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))
}

fn from_json<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

fn echoed_book(response: &HttpResponse) -> Option<Book> {
    if response.body.trim().is_empty() {
        return None;
    }
    match from_json(&response.body) {
        Ok(book) => Some(book),
        Err(err) => {
            debug!(status = response.status, error = %err, "saved book not echoed back");
            None
        }
    }
}

/// Map non-2xx status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}
