//! Add/edit form state.
//!
//! Fields hold exactly what the user typed; `validate` is the only place text
//! turns into a `BookPayload`.

use thiserror::Error;

use crate::types::{Book, BookId, BookPayload};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("title and author are required")]
    MissingRequired,

    #[error("year must be a whole number, got {0:?}")]
    InvalidYear(String),
}

impl ValidationError {
    /// Text shown in the validation alert.
    pub fn notice(&self) -> &'static str {
        match self {
            ValidationError::MissingRequired => "Title and author are required.",
            ValidationError::InvalidYear(_) => "Year must be a number.",
        }
    }
}

/// Which form field a view binding refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Author,
    Year,
    Description,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookForm {
    pub title: String,
    pub author: String,
    pub year: String,
    pub description: String,
    /// `Some` while editing an existing book; `None` in create mode.
    pub editing_id: Option<BookId>,
}

impl BookForm {
    pub fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            year: book.year.map(|year| year.to_string()).unwrap_or_default(),
            description: book.description.clone().unwrap_or_default(),
            editing_id: Some(book.id.clone()),
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing_id.is_some()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn field(&self, field: FormField) -> &str {
        match field {
            FormField::Title => &self.title,
            FormField::Author => &self.author,
            FormField::Year => &self.year,
            FormField::Description => &self.description,
        }
    }

    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::Title => self.title = value,
            FormField::Author => self.author = value,
            FormField::Year => self.year = value,
            FormField::Description => self.description = value,
        }
    }

    pub fn validate(&self) -> Result<BookPayload, ValidationError> {
        let title = self.title.trim();
        let author = self.author.trim();
        if title.is_empty() || author.is_empty() {
            return Err(ValidationError::MissingRequired);
        }

        let year = match self.year.trim() {
            "" => None,
            raw => Some(
                raw.parse::<i32>()
                    .map_err(|_| ValidationError::InvalidYear(self.year.clone()))?,
            ),
        };

        Ok(BookPayload {
            title: title.to_string(),
            author: author.to_string(),
            year,
            description: self.description.clone(),
        })
    }
}
