//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Requests flow out of the library only for the duration of the host's
//! `execute` callback, so they are borrowed views over an `OwnedRequest`.
//! Books handed to the host are heap copies the host frees with
//! `bookshelf_free_book`. Conversion helpers live here to keep `lib.rs`
//! focused on the `extern "C"` surface.

use std::cell::{Cell, RefCell, UnsafeCell};
use std::ffi::{c_void, CString, NulError};
use std::os::raw::c_char;
use std::rc::Rc;

use bookshelf_core::{ActionError, Book, BookListController, FormField, HttpMethod, HttpRequest};

use crate::host::{HostScreen, HostTransport, ViewMirror};

/// Opaque handle to a controller. C callers receive a pointer to this and
/// pass it back into every `bookshelf_*` function.
///
/// `inner` is only reached through `with_controller`, which flags the handle
/// as `active` for the duration; queries read `view` instead.
pub struct FfiBookController {
    pub(crate) inner: UnsafeCell<BookListController<HostTransport, HostScreen>>,
    pub(crate) view: Rc<RefCell<ViewMirror>>,
    pub(crate) active: Cell<bool>,
}

// ---------------------------------------------------------------------------
// Host callbacks
// ---------------------------------------------------------------------------

/// Executes one HTTP request. Fill `response` and return true, or return
/// false if the round-trip could not be completed. `response->body` stays
/// owned by the host and must remain valid until the callback's next
/// invocation or until the controller is freed.
pub type FfiExecuteFn =
    extern "C" fn(context: *mut c_void, request: *const FfiHttpRequest, response: *mut FfiHttpResponse) -> bool;

/// Shows a modal alert and returns once it is dismissed.
pub type FfiAlertFn = extern "C" fn(context: *mut c_void, title: *const c_char, message: *const c_char);

/// Shows a modal yes/no prompt; true means yes.
pub type FfiConfirmFn =
    extern "C" fn(context: *mut c_void, title: *const c_char, message: *const c_char) -> bool;

/// Tells the host to redraw; `busy` drives the submit button state. The
/// query functions may be called from here to read the new state.
pub type FfiRenderFn = extern "C" fn(context: *mut c_void, busy: bool);

/// Everything the library calls back into. `context` is passed through
/// untouched. `execute`, `alert` and `confirm` are required; `render` may be
/// null.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct FfiHostCallbacks {
    pub context: *mut c_void,
    pub execute: Option<FfiExecuteFn>,
    pub alert: Option<FfiAlertFn>,
    pub confirm: Option<FfiConfirmFn>,
    pub render: Option<FfiRenderFn>,
}

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *const c_char,
    pub value: *const c_char,
}

/// An HTTP request lent to the host's `execute` callback. Every pointer is
/// valid only until the callback returns. `body` is null when there is none.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *const c_char,
    pub headers: *const FfiHeader,
    pub headers_len: u32,
    pub body: *const c_char,
}

/// Filled in by the host's `execute` callback. A null `body` reads as empty.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

/// Keeps the C strings behind an `FfiHttpRequest` alive.
pub(crate) struct OwnedRequest {
    method: FfiHttpMethod,
    url: CString,
    body: Option<CString>,
    _header_strings: Vec<(CString, CString)>,
    headers: Vec<FfiHeader>,
}

impl OwnedRequest {
    pub(crate) fn new(req: HttpRequest) -> Result<Self, NulError> {
        let header_strings = req
            .headers
            .into_iter()
            .map(|(k, v)| -> Result<(CString, CString), NulError> {
                Ok((CString::new(k)?, CString::new(v)?))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let headers = header_strings
            .iter()
            .map(|(k, v)| FfiHeader {
                key: k.as_ptr(),
                value: v.as_ptr(),
            })
            .collect();

        Ok(Self {
            method: req.method.into(),
            url: CString::new(req.path)?,
            body: req.body.map(CString::new).transpose()?,
            _header_strings: header_strings,
            headers,
        })
    }

    pub(crate) fn as_ffi(&self) -> FfiHttpRequest {
        FfiHttpRequest {
            method: self.method,
            url: self.url.as_ptr(),
            headers: if self.headers.is_empty() {
                std::ptr::null()
            } else {
                self.headers.as_ptr()
            },
            headers_len: self.headers.len() as u32,
            body: self
                .body
                .as_ref()
                .map_or(std::ptr::null(), |body| body.as_ptr()),
        }
    }
}

// ---------------------------------------------------------------------------
// Status and form fields
// ---------------------------------------------------------------------------

/// Result of every controller operation.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiStatus {
    Ok = 0,
    /// The user answered no to the delete prompt; nothing was sent.
    Declined = 1,
    Validation = 2,
    RequestFailed = 3,
    NullArg = 4,
    InvalidArg = 5,
    Panic = 6,
    /// Called from inside a host callback while another operation on the
    /// same handle is still running; nothing was done.
    Busy = 7,
}

impl From<&ActionError> for FfiStatus {
    fn from(err: &ActionError) -> Self {
        match err {
            ActionError::Validation(_) => FfiStatus::Validation,
            ActionError::Request { .. } => FfiStatus::RequestFailed,
        }
    }
}

impl From<Result<(), ActionError>> for FfiStatus {
    fn from(result: Result<(), ActionError>) -> Self {
        match result {
            Ok(()) => FfiStatus::Ok,
            Err(err) => FfiStatus::from(&err),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiFormField {
    Title = 0,
    Author = 1,
    Year = 2,
    Description = 3,
}

impl From<FfiFormField> for FormField {
    fn from(field: FfiFormField) -> Self {
        match field {
            FfiFormField::Title => FormField::Title,
            FfiFormField::Author => FormField::Author,
            FfiFormField::Year => FormField::Year,
            FfiFormField::Description => FormField::Description,
        }
    }
}

// ---------------------------------------------------------------------------
// Books
// ---------------------------------------------------------------------------

/// A book copied out to C. `description` is null when absent; `year` is
/// meaningful only when `has_year` is true.
#[repr(C)]
pub struct FfiBook {
    pub id: *mut c_char,
    pub title: *mut c_char,
    pub author: *mut c_char,
    pub year: i32,
    pub has_year: bool,
    pub description: *mut c_char,
}

impl FfiBook {
    pub(crate) fn from_core(book: &Book) -> *mut Self {
        Box::into_raw(Box::new(FfiBook {
            id: c_string(book.id.as_str()),
            title: c_string(&book.title),
            author: c_string(&book.author),
            year: book.year.unwrap_or_default(),
            has_year: book.year.is_some(),
            description: book
                .description
                .as_deref()
                .map_or(std::ptr::null_mut(), c_string),
        }))
    }
}

/// Heap C string for the host to free with `bookshelf_free_string`. Interior
/// NUL bytes are dropped.
pub(crate) fn c_string(s: &str) -> *mut c_char {
    CString::new(s.replace('\0', ""))
        .unwrap_or_default()
        .into_raw()
}
