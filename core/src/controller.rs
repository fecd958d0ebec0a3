//! The single-screen book list controller.
//!
//! # Design
//! `BookListController` owns the cached list, the form and the busy flag, and
//! is the only thing that mutates them. Every operation is one best-effort
//! round-trip through the `Transport`; a failure is logged, shown once via
//! `Screen::alert`, and handed back to the caller. The list is never patched
//! locally: after each successful mutation it is fetched again wholesale.

use tracing::{debug, error, info, warn};

use crate::client::BooksClient;
use crate::config::ClientConfig;
use crate::error::{Action, ActionError, ApiError};
use crate::form::{BookForm, FormField};
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::types::{Book, BookId};
use crate::view::{Screen, ViewState};

pub struct BookListController<T, S> {
    client: BooksClient,
    transport: T,
    screen: S,
    books: Vec<Book>,
    form: BookForm,
    busy: bool,
}

impl<T: Transport, S: Screen> BookListController<T, S> {
    pub fn new(config: &ClientConfig, transport: T, screen: S) -> Self {
        Self {
            client: BooksClient::new(&config.base_url),
            transport,
            screen,
            books: Vec::new(),
            form: BookForm::default(),
            busy: false,
        }
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn book(&self, id: &BookId) -> Option<&Book> {
        self.books.iter().find(|book| &book.id == id)
    }

    pub fn form(&self) -> &BookForm {
        &self.form
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn screen(&self) -> &S {
        &self.screen
    }

    pub fn view(&self) -> ViewState<'_> {
        ViewState {
            books: &self.books,
            form: &self.form,
            busy: self.busy,
        }
    }

    /// Text-input binding.
    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) {
        self.form.set_field(field, value);
        self.render();
    }

    /// Fetch the whole collection. On failure the cached list is kept.
    pub fn list(&mut self) -> Result<(), ActionError> {
        let request = self.client.build_list_books();
        let fetched = self
            .send(request)
            .and_then(|response| self.client.parse_list_books(response));

        match fetched {
            Ok(books) => {
                info!(count = books.len(), "book list refreshed");
                self.books = books;
                self.render();
                Ok(())
            }
            Err(source) => Err(self.fail(Action::Load, source)),
        }
    }

    /// Create or update from the current form, depending on `editing_id`.
    pub fn submit(&mut self) -> Result<(), ActionError> {
        let payload = match self.form.validate() {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "book form rejected");
                self.screen.alert("Validation", err.notice());
                return Err(err.into());
            }
        };

        let (action, request) = match &self.form.editing_id {
            Some(id) => (Action::Update, self.client.build_update_book(id, &payload)),
            None => (Action::Create, self.client.build_create_book(&payload)),
        };

        let saved = request
            .and_then(|request| self.send(request))
            .and_then(|response| match action {
                Action::Update => self.client.parse_update_book(response),
                _ => self.client.parse_create_book(response),
            });

        match saved {
            Ok(Some(book)) => info!(id = %book.id, %action, "book saved"),
            Ok(None) => info!(%action, "book saved"),
            Err(source) => return Err(self.fail(action, source)),
        }

        self.form.clear();
        self.refresh_after(action);
        Ok(())
    }

    /// Delete after a yes/no prompt. Returns `Ok(false)` when the user
    /// declines; nothing is sent in that case.
    pub fn remove(&mut self, id: &BookId) -> Result<bool, ActionError> {
        let message = match self.book(id) {
            Some(book) => format!("Are you sure you want to delete \"{}\"?", book.title),
            None => "Are you sure you want to delete this book?".to_string(),
        };
        if !self.screen.confirm("Delete book", &message) {
            debug!(%id, "delete declined");
            return Ok(false);
        }

        let request = self.client.build_delete_book(id);
        let deleted = self
            .send(request)
            .and_then(|response| self.client.parse_delete_book(response));
        if let Err(source) = deleted {
            return Err(self.fail(Action::Delete, source));
        }

        info!(%id, "book deleted");
        self.refresh_after(Action::Delete);
        Ok(true)
    }

    pub fn start_edit(&mut self, book: &Book) {
        self.form = BookForm::from_book(book);
        self.render();
    }

    pub fn reset_form(&mut self) {
        self.form.clear();
        self.render();
    }

    fn send(&mut self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = request.method.as_str(), path = %request.path, "sending request");
        self.set_busy(true);
        let result = self.transport.execute(request);
        self.set_busy(false);
        Ok(result?)
    }

    fn fail(&mut self, action: Action, source: ApiError) -> ActionError {
        error!(%action, error = %source, "book request failed");
        self.screen.alert("Error", action.failure_message());
        ActionError::Request { action, source }
    }

    /// A failed refresh has already alerted on its own; the mutation stands.
    fn refresh_after(&mut self, action: Action) {
        if let Err(err) = self.list() {
            debug!(%action, error = %err, "refresh after mutation failed");
        }
    }

    fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
        self.render();
    }

    fn render(&mut self) {
        let view = ViewState {
            books: &self.books,
            form: &self.form,
            busy: self.busy,
        };
        self.screen.render(&view);
    }
}
