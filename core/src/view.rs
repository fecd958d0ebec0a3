//! The controller's view binding.

use crate::form::BookForm;
use crate::types::Book;

/// Dialogs and redraws the controller asks of the host UI.
///
/// `alert` and `confirm` are modal: they return once the user has dismissed
/// the dialog.
pub trait Screen {
    fn alert(&mut self, title: &str, message: &str);

    fn confirm(&mut self, title: &str, message: &str) -> bool;

    /// Called after every state transition.
    fn render(&mut self, _view: &ViewState<'_>) {}
}

impl<S: Screen + ?Sized> Screen for &mut S {
    fn alert(&mut self, title: &str, message: &str) {
        (**self).alert(title, message)
    }

    fn confirm(&mut self, title: &str, message: &str) -> bool {
        (**self).confirm(title, message)
    }

    fn render(&mut self, view: &ViewState<'_>) {
        (**self).render(view)
    }
}

/// Borrowed snapshot of everything the screen draws.
#[derive(Debug, Clone, Copy)]
pub struct ViewState<'a> {
    pub books: &'a [Book],
    pub form: &'a BookForm,
    pub busy: bool,
}

impl ViewState<'_> {
    pub fn submit_label(&self) -> &'static str {
        if self.form.is_editing() {
            "Update Book"
        } else {
            "Add Book"
        }
    }

    /// Submission buttons are disabled while a request is outstanding.
    pub fn can_submit(&self) -> bool {
        !self.busy
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BookId;

    #[test]
    fn label_follows_edit_mode() {
        let mut form = BookForm::default();
        let view = ViewState {
            books: &[],
            form: &form,
            busy: false,
        };
        assert_eq!(view.submit_label(), "Add Book");
        assert!(view.can_submit());
        assert!(view.is_empty());

        form.editing_id = Some(BookId::new("1"));
        let view = ViewState {
            books: &[],
            form: &form,
            busy: true,
        };
        assert_eq!(view.submit_label(), "Update Book");
        assert!(!view.can_submit());
    }
}
