//! C-ABI wrapper around `bookshelf-core`.
//!
//! # Overview
//! Lets a native mobile shell host the book list controller. The shell
//! registers callbacks for HTTP, alerts, confirmations and redraws; every
//! screen action (refresh, submit, delete, edit, cancel) is one
//! `bookshelf_*` call that runs the controller to completion.
//!
//! # Design
//! - Every `extern "C"` function runs controller and conversion code inside
//!   `catch_unwind` so panics never cross the FFI boundary. Only null and
//!   UTF-8 argument checks happen outside it.
//! - Operations return `FfiStatus`; the user has already been alerted about
//!   any failure by the time the call returns.
//! - A controller handle must not be used from two threads at once. Callbacks
//!   run on the calling thread.
//! - From inside a callback, only the query functions (`bookshelf_form_get`,
//!   `bookshelf_book_at` and the other getters) do anything: they read the
//!   state as of the last redraw. Operations on the same handle return
//!   `Busy`, and `bookshelf_controller_free` is ignored.
//! - Strings and books returned by the library are owned by the caller and
//!   released with `bookshelf_free_string` / `bookshelf_free_book`.

mod host;
pub mod types;

use std::cell::{Cell, RefCell, UnsafeCell};
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use bookshelf_core::{BookId, BookListController, ClientConfig};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use host::ViewMirror;
use types::*;
use types::c_string;

type Controller = BookListController<host::HostTransport, host::HostScreen>;

/// Run `op` against the controller behind `ctrl`, mapping null, re-entry and
/// panics to a status.
fn with_controller(ctrl: *mut FfiBookController, op: impl FnOnce(&mut Controller) -> FfiStatus) -> FfiStatus {
    if ctrl.is_null() {
        return FfiStatus::NullArg;
    }
    let handle = unsafe { &*ctrl };
    if handle.active.replace(true) {
        warn!("controller operation re-entered from a host callback");
        return FfiStatus::Busy;
    }
    // Sole `&mut` to the controller: `active` turns away every other path.
    let status = catch_unwind(AssertUnwindSafe(|| op(unsafe { &mut *handle.inner.get() }))).unwrap_or_else(|_| {
        error!("panic inside controller operation");
        FfiStatus::Panic
    });
    handle.active.set(false);
    status
}

/// Read the last rendered state behind `ctrl`, or `fallback` on null or
/// panic.
fn with_view<R>(ctrl: *const FfiBookController, fallback: R, read: impl FnOnce(&ViewMirror) -> R) -> R {
    if ctrl.is_null() {
        return fallback;
    }
    catch_unwind(AssertUnwindSafe(|| {
        let handle = unsafe { &*ctrl };
        let view = handle.view.borrow();
        read(&view)
    }))
    .unwrap_or(fallback)
}

fn read_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(s) }.to_str().ok()
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Install a `tracing` subscriber writing to stderr, filtered by `RUST_LOG`
/// (default `info`). Calling it more than once is harmless.
#[unsafe(no_mangle)]
pub extern "C" fn bookshelf_init_logging() {
    let _ = catch_unwind(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    });
}

// ---------------------------------------------------------------------------
// Controller lifecycle
// ---------------------------------------------------------------------------

/// Create a controller talking to `base_url` (null for the built-in address).
///
/// Returns null if `base_url` is not valid UTF-8, if `execute`, `alert` or
/// `confirm` is missing, or if an internal panic occurs. Free the result with
/// `bookshelf_controller_free`.
#[unsafe(no_mangle)]
pub extern "C" fn bookshelf_controller_new(
    base_url: *const c_char,
    callbacks: FfiHostCallbacks,
) -> *mut FfiBookController {
    catch_unwind(|| {
        let config = if base_url.is_null() {
            ClientConfig::default()
        } else {
            match read_str(base_url) {
                Some(url) => ClientConfig::with_base_url(url),
                None => return std::ptr::null_mut(),
            }
        };
        let view = Rc::new(RefCell::new(ViewMirror::default()));
        let Some((transport, screen)) = host::split(callbacks, Rc::clone(&view)) else {
            error!("controller created without required callbacks");
            return std::ptr::null_mut();
        };
        let inner = BookListController::new(&config, transport, screen);
        Box::into_raw(Box::new(FfiBookController {
            inner: UnsafeCell::new(inner),
            view,
            active: Cell::new(false),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a controller created by `bookshelf_controller_new`. Safe to call
/// with null. Ignored while an operation on `ctrl` is running.
#[unsafe(no_mangle)]
pub extern "C" fn bookshelf_controller_free(ctrl: *mut FfiBookController) {
    if ctrl.is_null() {
        return;
    }
    if unsafe { &*ctrl }.active.get() {
        warn!("controller free requested from a host callback; ignored");
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        drop(unsafe { Box::from_raw(ctrl) });
    }));
}

// ---------------------------------------------------------------------------
// Screen actions
// ---------------------------------------------------------------------------

/// Reload the whole list. On failure the previous list is kept.
#[unsafe(no_mangle)]
pub extern "C" fn bookshelf_refresh(ctrl: *mut FfiBookController) -> FfiStatus {
    with_controller(ctrl, |c| c.list().into())
}

/// Create or update from the current form.
#[unsafe(no_mangle)]
pub extern "C" fn bookshelf_submit(ctrl: *mut FfiBookController) -> FfiStatus {
    with_controller(ctrl, |c| c.submit().into())
}

/// Ask for confirmation, then delete the book with `id`.
///
/// Returns `Declined` if the user said no.
#[unsafe(no_mangle)]
pub extern "C" fn bookshelf_remove(ctrl: *mut FfiBookController, id: *const c_char) -> FfiStatus {
    if id.is_null() {
        return FfiStatus::NullArg;
    }
    let Some(id) = read_str(id) else {
        return FfiStatus::InvalidArg;
    };
    let id = BookId::new(id);
    with_controller(ctrl, |c| match c.remove(&id) {
        Ok(true) => FfiStatus::Ok,
        Ok(false) => FfiStatus::Declined,
        Err(err) => FfiStatus::from(&err),
    })
}

/// Load the book at `index` of the current list into the form for editing.
#[unsafe(no_mangle)]
pub extern "C" fn bookshelf_start_edit(ctrl: *mut FfiBookController, index: u32) -> FfiStatus {
    with_controller(ctrl, |c| {
        let Some(book) = c.books().get(index as usize).cloned() else {
            return FfiStatus::InvalidArg;
        };
        c.start_edit(&book);
        FfiStatus::Ok
    })
}

/// Clear the form and leave edit mode.
#[unsafe(no_mangle)]
pub extern "C" fn bookshelf_reset_form(ctrl: *mut FfiBookController) -> FfiStatus {
    with_controller(ctrl, |c| {
        c.reset_form();
        FfiStatus::Ok
    })
}

// ---------------------------------------------------------------------------
// Form bindings
// ---------------------------------------------------------------------------

/// Set a form field to `value` as typed. Null `value` clears the field.
#[unsafe(no_mangle)]
pub extern "C" fn bookshelf_form_set(
    ctrl: *mut FfiBookController,
    field: FfiFormField,
    value: *const c_char,
) -> FfiStatus {
    let value = if value.is_null() {
        ""
    } else {
        match read_str(value) {
            Some(v) => v,
            None => return FfiStatus::InvalidArg,
        }
    };
    with_controller(ctrl, |c| {
        c.set_field(field.into(), value);
        FfiStatus::Ok
    })
}

/// Current text of a form field. Returns null if `ctrl` is null.
#[unsafe(no_mangle)]
pub extern "C" fn bookshelf_form_get(ctrl: *const FfiBookController, field: FfiFormField) -> *mut c_char {
    with_view(ctrl, std::ptr::null_mut(), |view| c_string(view.form.field(field.into())))
}

/// The `id` of the book being edited, or null in create mode.
#[unsafe(no_mangle)]
pub extern "C" fn bookshelf_editing_id(ctrl: *const FfiBookController) -> *mut c_char {
    with_view(ctrl, std::ptr::null_mut(), |view| {
        view.form
            .editing_id
            .as_ref()
            .map_or(std::ptr::null_mut(), |id| c_string(id.as_str()))
    })
}

// ---------------------------------------------------------------------------
// State queries
// ---------------------------------------------------------------------------

/// True while a request is outstanding; submission should be disabled.
#[unsafe(no_mangle)]
pub extern "C" fn bookshelf_is_busy(ctrl: *const FfiBookController) -> bool {
    with_view(ctrl, false, |view| view.busy)
}

#[unsafe(no_mangle)]
pub extern "C" fn bookshelf_is_editing(ctrl: *const FfiBookController) -> bool {
    with_view(ctrl, false, |view| view.form.is_editing())
}

#[unsafe(no_mangle)]
pub extern "C" fn bookshelf_book_count(ctrl: *const FfiBookController) -> u32 {
    with_view(ctrl, 0, |view| view.books.len() as u32)
}

/// Copy of the book at `index`, or null if out of range. Free with
/// `bookshelf_free_book`.
#[unsafe(no_mangle)]
pub extern "C" fn bookshelf_book_at(ctrl: *const FfiBookController, index: u32) -> *mut FfiBook {
    with_view(ctrl, std::ptr::null_mut(), |view| {
        view.books
            .get(index as usize)
            .map_or(std::ptr::null_mut(), FfiBook::from_core)
    })
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiBook` returned by `bookshelf_book_at`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn bookshelf_free_book(book: *mut FfiBook) {
    if book.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let book = unsafe { Box::from_raw(book) };
        for s in [book.id, book.title, book.author, book.description] {
            if !s.is_null() {
                drop(unsafe { CString::from_raw(s) });
            }
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn bookshelf_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OwnedRequest;
    use std::collections::VecDeque;
    use std::ffi::c_void;

    /// Scripted host: canned HTTP replies, recorded dialogs.
    #[derive(Default)]
    struct Host {
        replies: VecDeque<(u16, &'static str)>,
        body: CString,
        sent: Vec<(FfiHttpMethod, String, Option<String>)>,
        alerts: Vec<String>,
        prompts: u32,
        answer: bool,
        busy_renders: u32,
        /// Handle to call back into from `render`.
        reenter: Option<*mut FfiBookController>,
        reentry: Vec<FfiStatus>,
        seen: Vec<(u32, bool)>,
    }

    extern "C" fn host_execute(
        context: *mut c_void,
        request: *const FfiHttpRequest,
        response: *mut FfiHttpResponse,
    ) -> bool {
        let host = unsafe { &mut *(context as *mut Host) };
        let request = unsafe { &*request };
        let url = unsafe { CStr::from_ptr(request.url) }.to_str().unwrap().to_string();
        let body = (!request.body.is_null())
            .then(|| unsafe { CStr::from_ptr(request.body) }.to_str().unwrap().to_string());
        host.sent.push((request.method, url, body));

        let Some((status, body)) = host.replies.pop_front() else {
            return false;
        };
        host.body = CString::new(body).unwrap();
        unsafe {
            (*response).status = status;
            (*response).body = host.body.as_ptr();
        }
        true
    }

    extern "C" fn host_alert(context: *mut c_void, _title: *const c_char, message: *const c_char) {
        let host = unsafe { &mut *(context as *mut Host) };
        let message = unsafe { CStr::from_ptr(message) }.to_str().unwrap();
        host.alerts.push(message.to_string());
    }

    extern "C" fn host_confirm(context: *mut c_void, _title: *const c_char, _message: *const c_char) -> bool {
        let host = unsafe { &mut *(context as *mut Host) };
        host.prompts += 1;
        host.answer
    }

    extern "C" fn host_render(context: *mut c_void, busy: bool) {
        let host = unsafe { &mut *(context as *mut Host) };
        if busy {
            host.busy_renders += 1;
        }
        if let Some(ctrl) = host.reenter {
            host.seen.push((bookshelf_book_count(ctrl), bookshelf_is_busy(ctrl)));
            if busy {
                host.reentry.push(bookshelf_submit(ctrl));
                bookshelf_controller_free(ctrl);
            }
        }
    }

    fn callbacks(host: *mut Host) -> FfiHostCallbacks {
        FfiHostCallbacks {
            context: host as *mut c_void,
            execute: Some(host_execute),
            alert: Some(host_alert),
            confirm: Some(host_confirm),
            render: Some(host_render),
        }
    }

    /// Controller plus the leaked host it calls back into.
    fn setup(replies: &[(u16, &'static str)], answer: bool) -> (*mut FfiBookController, *mut Host) {
        let host = Box::into_raw(Box::new(Host {
            replies: replies.iter().copied().collect(),
            answer,
            ..Host::default()
        }));
        let url = CString::new("http://localhost:3000").unwrap();
        let ctrl = bookshelf_controller_new(url.as_ptr(), callbacks(host));
        assert!(!ctrl.is_null());
        (ctrl, host)
    }

    fn teardown(ctrl: *mut FfiBookController, host: *mut Host) {
        bookshelf_controller_free(ctrl);
        drop(unsafe { Box::from_raw(host) });
    }

    fn set(ctrl: *mut FfiBookController, field: FfiFormField, value: &str) {
        let value = CString::new(value).unwrap();
        assert_eq!(bookshelf_form_set(ctrl, field, value.as_ptr()), FfiStatus::Ok);
    }

    fn take_string(s: *mut c_char) -> String {
        assert!(!s.is_null());
        let owned = unsafe { CStr::from_ptr(s) }.to_str().unwrap().to_string();
        bookshelf_free_string(s);
        owned
    }

    const LIST: &str = r#"[{"id":1,"title":"Dune","author":"Herbert","year":1965,"description":""},{"id":2,"title":"Emma","author":"Austen"}]"#;

    #[test]
    fn controller_new_with_null_url_uses_default() {
        let mut host = Host::default();
        let ctrl = bookshelf_controller_new(std::ptr::null(), callbacks(&mut host));
        assert!(!ctrl.is_null());
        bookshelf_controller_free(ctrl);
    }

    #[test]
    fn controller_new_without_execute_returns_null() {
        let mut host = Host::default();
        let mut cbs = callbacks(&mut host);
        cbs.execute = None;
        let ctrl = bookshelf_controller_new(std::ptr::null(), cbs);
        assert!(ctrl.is_null());
    }

    #[test]
    fn controller_free_null_is_safe() {
        bookshelf_controller_free(std::ptr::null_mut());
    }

    #[test]
    fn null_controller_is_reported() {
        assert_eq!(bookshelf_refresh(std::ptr::null_mut()), FfiStatus::NullArg);
        assert_eq!(bookshelf_submit(std::ptr::null_mut()), FfiStatus::NullArg);
        assert_eq!(bookshelf_book_count(std::ptr::null()), 0);
        assert!(!bookshelf_is_busy(std::ptr::null()));
        assert!(bookshelf_book_at(std::ptr::null(), 0).is_null());
        assert!(bookshelf_form_get(std::ptr::null(), FfiFormField::Title).is_null());
    }

    #[test]
    fn refresh_exposes_books() {
        let (ctrl, host) = setup(&[(200, LIST)], true);

        assert_eq!(bookshelf_refresh(ctrl), FfiStatus::Ok);
        assert_eq!(bookshelf_book_count(ctrl), 2);
        assert!(!bookshelf_is_busy(ctrl));

        let book = bookshelf_book_at(ctrl, 0);
        assert!(!book.is_null());
        let b = unsafe { &*book };
        assert_eq!(unsafe { CStr::from_ptr(b.id) }.to_str().unwrap(), "1");
        assert_eq!(unsafe { CStr::from_ptr(b.title) }.to_str().unwrap(), "Dune");
        assert!(b.has_year);
        assert_eq!(b.year, 1965);
        bookshelf_free_book(book);

        let book = bookshelf_book_at(ctrl, 1);
        let b = unsafe { &*book };
        assert!(!b.has_year);
        assert!(b.description.is_null());
        bookshelf_free_book(book);

        assert!(bookshelf_book_at(ctrl, 2).is_null());
        assert_eq!(unsafe { &*host }.busy_renders, 1);
        teardown(ctrl, host);
    }

    #[test]
    fn callbacks_can_query_but_not_re_enter() {
        let (ctrl, host) = setup(&[(200, LIST)], true);
        unsafe { (*host).reenter = Some(ctrl) };

        assert_eq!(bookshelf_refresh(ctrl), FfiStatus::Ok);

        let h = unsafe { &*host };
        assert_eq!(h.reentry, vec![FfiStatus::Busy]);
        assert_eq!(h.seen, vec![(0, true), (0, false), (2, false)]);
        assert_eq!(h.sent.len(), 1);
        assert_eq!(bookshelf_book_count(ctrl), 2);
        assert_eq!(bookshelf_submit(ctrl), FfiStatus::Validation);
        teardown(ctrl, host);
    }

    #[test]
    fn refresh_transport_failure_alerts_once() {
        let (ctrl, host) = setup(&[], true);

        assert_eq!(bookshelf_refresh(ctrl), FfiStatus::RequestFailed);
        assert_eq!(unsafe { &*host }.alerts, vec!["Failed to load books.".to_string()]);
        teardown(ctrl, host);
    }

    #[test]
    fn submit_builds_create_request() {
        let created = r#"{"id":3,"title":"Dune","author":"Herbert","year":1965,"description":""}"#;
        let (ctrl, host) = setup(&[(201, created), (200, "[]")], true);
        set(ctrl, FfiFormField::Title, "Dune");
        set(ctrl, FfiFormField::Author, "Herbert");
        set(ctrl, FfiFormField::Year, "1965");

        assert_eq!(bookshelf_submit(ctrl), FfiStatus::Ok);

        let sent = &unsafe { &*host }.sent;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, FfiHttpMethod::Post);
        assert_eq!(sent[0].1, "http://localhost:3000/books");
        let body: serde_json::Value = serde_json::from_str(sent[0].2.as_deref().unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"title": "Dune", "author": "Herbert", "year": 1965, "description": ""})
        );
        assert_eq!(take_string(bookshelf_form_get(ctrl, FfiFormField::Title)), "");
        teardown(ctrl, host);
    }

    #[test]
    fn submit_empty_form_is_validation() {
        let (ctrl, host) = setup(&[], true);

        assert_eq!(bookshelf_submit(ctrl), FfiStatus::Validation);
        let h = unsafe { &*host };
        assert!(h.sent.is_empty());
        assert_eq!(h.alerts, vec!["Title and author are required.".to_string()]);
        teardown(ctrl, host);
    }

    #[test]
    fn start_edit_then_reset() {
        let (ctrl, host) = setup(&[(200, LIST)], true);
        bookshelf_refresh(ctrl);

        assert_eq!(bookshelf_start_edit(ctrl, 1), FfiStatus::Ok);
        assert!(bookshelf_is_editing(ctrl));
        assert_eq!(take_string(bookshelf_editing_id(ctrl)), "2");
        assert_eq!(take_string(bookshelf_form_get(ctrl, FfiFormField::Author)), "Austen");

        assert_eq!(bookshelf_reset_form(ctrl), FfiStatus::Ok);
        assert!(!bookshelf_is_editing(ctrl));
        assert!(bookshelf_editing_id(ctrl).is_null());
        assert_eq!(bookshelf_start_edit(ctrl, 9), FfiStatus::InvalidArg);
        teardown(ctrl, host);
    }

    #[test]
    fn declined_remove_sends_nothing() {
        let (ctrl, host) = setup(&[], false);
        let id = CString::new("1").unwrap();

        assert_eq!(bookshelf_remove(ctrl, id.as_ptr()), FfiStatus::Declined);
        let h = unsafe { &*host };
        assert_eq!(h.prompts, 1);
        assert!(h.sent.is_empty());
        teardown(ctrl, host);
    }

    #[test]
    fn confirmed_remove_deletes_and_refreshes() {
        let (ctrl, host) = setup(&[(204, ""), (200, "[]")], true);
        let id = CString::new("1").unwrap();

        assert_eq!(bookshelf_remove(ctrl, id.as_ptr()), FfiStatus::Ok);
        let sent = &unsafe { &*host }.sent;
        assert_eq!(sent[0].0, FfiHttpMethod::Delete);
        assert_eq!(sent[0].1, "http://localhost:3000/books/1");
        assert_eq!(sent[1].0, FfiHttpMethod::Get);
        teardown(ctrl, host);
    }

    #[test]
    fn remove_null_id_is_reported() {
        let (ctrl, host) = setup(&[], true);
        assert_eq!(bookshelf_remove(ctrl, std::ptr::null()), FfiStatus::NullArg);
        teardown(ctrl, host);
    }

    #[test]
    fn owned_request_exposes_headers_and_body() {
        let req = bookshelf_core::HttpRequest {
            method: bookshelf_core::HttpMethod::Put,
            path: "http://localhost:3000/books/1".to_string(),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some("{}".to_string()),
        };
        let owned = OwnedRequest::new(req).unwrap();
        let ffi = owned.as_ffi();
        assert_eq!(ffi.method, FfiHttpMethod::Put);
        assert_eq!(ffi.headers_len, 1);
        let header = unsafe { &*ffi.headers };
        assert_eq!(unsafe { CStr::from_ptr(header.key) }.to_str().unwrap(), "content-type");
        assert_eq!(unsafe { CStr::from_ptr(ffi.body) }.to_str().unwrap(), "{}");
    }

    #[test]
    fn free_null_is_safe() {
        bookshelf_free_book(std::ptr::null_mut());
        bookshelf_free_string(std::ptr::null_mut());
    }
}
