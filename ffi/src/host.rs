//! `Transport` and `Screen` implementations that forward to host callbacks.
//!
//! Callbacks run while the controller is mutably borrowed, so `HostScreen`
//! copies every rendered view into a `ViewMirror` first. The query functions
//! read the mirror and never touch the controller.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::rc::Rc;

use bookshelf_core::{Book, BookForm, HttpRequest, HttpResponse, Screen, Transport, TransportError, ViewState};
use tracing::warn;

use crate::types::{FfiAlertFn, FfiConfirmFn, FfiExecuteFn, FfiHostCallbacks, FfiHttpResponse, OwnedRequest};

pub struct HostTransport {
    context: *mut std::ffi::c_void,
    execute: FfiExecuteFn,
}

pub struct HostScreen {
    callbacks: FfiHostCallbacks,
    alert: FfiAlertFn,
    confirm: FfiConfirmFn,
    mirror: Rc<RefCell<ViewMirror>>,
}

/// Owned copy of the last rendered `ViewState`.
#[derive(Debug, Default)]
pub(crate) struct ViewMirror {
    pub(crate) books: Vec<Book>,
    pub(crate) form: BookForm,
    pub(crate) busy: bool,
}

impl ViewMirror {
    fn update(&mut self, view: &ViewState<'_>) {
        self.books.clear();
        self.books.extend_from_slice(view.books);
        self.form.clone_from(view.form);
        self.busy = view.busy;
    }
}

/// Split the callback table into the two seams. `None` if a required
/// callback is missing.
pub(crate) fn split(
    callbacks: FfiHostCallbacks,
    mirror: Rc<RefCell<ViewMirror>>,
) -> Option<(HostTransport, HostScreen)> {
    let transport = HostTransport {
        context: callbacks.context,
        execute: callbacks.execute?,
    };
    let screen = HostScreen {
        callbacks,
        alert: callbacks.alert?,
        confirm: callbacks.confirm?,
        mirror,
    };
    Some((transport, screen))
}

impl Transport for HostTransport {
    fn execute(&mut self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let owned = OwnedRequest::new(request)
            .map_err(|e| TransportError::new(format!("request not representable in C: {e}")))?;
        let ffi_request = owned.as_ffi();
        let mut response = FfiHttpResponse {
            status: 0,
            body: std::ptr::null(),
        };

        if !(self.execute)(self.context, &ffi_request, &mut response) {
            return Err(TransportError::new("host reported transport failure"));
        }

        let body = if response.body.is_null() {
            String::new()
        } else {
            unsafe { CStr::from_ptr(response.body) }
                .to_string_lossy()
                .into_owned()
        };
        Ok(HttpResponse::new(response.status, body))
    }
}

impl Screen for HostScreen {
    fn alert(&mut self, title: &str, message: &str) {
        let (title, message) = (dialog_text(title), dialog_text(message));
        (self.alert)(self.callbacks.context, title.as_ptr(), message.as_ptr());
    }

    fn confirm(&mut self, title: &str, message: &str) -> bool {
        let (title, message) = (dialog_text(title), dialog_text(message));
        (self.confirm)(self.callbacks.context, title.as_ptr(), message.as_ptr())
    }

    fn render(&mut self, view: &ViewState<'_>) {
        self.mirror.borrow_mut().update(view);
        if let Some(render) = self.callbacks.render {
            render(self.callbacks.context, view.busy);
        }
    }
}

fn dialog_text(text: &str) -> CString {
    CString::new(text).unwrap_or_else(|_| {
        warn!("dialog text contained a NUL byte");
        CString::new(text.replace('\0', "")).unwrap_or_default()
    })
}
