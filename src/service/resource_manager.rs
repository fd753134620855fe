//! Per-admin view state for one content table.
//!
//! [`ResourceManager`] holds what one admin tab shows: the listed rows, the
//! form, which row is being edited, which row is armed for deletion and
//! the last notice. Every mutation is one backend call followed by one
//! refresh read; nothing is updated optimistically.

use serde::Serialize;

use super::ResourceTable;
use crate::backend::AccessToken;
use crate::domain::{RecordId, Resource, ResourceDraft};
use crate::error::SiteError;

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// The action succeeded.
    Success,
    /// The action failed; the message is the backend's or the validator's.
    Error,
}

/// Toast-style message shown after an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Short heading, e.g. "Error creating Service".
    pub title: String,
    /// Detail; for errors, the underlying message verbatim.
    pub message: String,
}

impl Notice {
    /// A success notice with no detail.
    #[must_use]
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            message: String::new(),
        }
    }

    /// An error notice carrying `err`'s message.
    #[must_use]
    pub fn error(title: impl Into<String>, err: &SiteError) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            message: err.to_string(),
        }
    }
}

/// View state of one admin tab for resource `R`.
#[derive(Debug)]
pub struct ResourceManager<R: Resource> {
    table: ResourceTable<R>,
    rows: Vec<R>,
    draft: R::Draft,
    form_open: bool,
    editing: Option<RecordId>,
    pending_delete: Option<RecordId>,
    notice: Option<Notice>,
}

impl<R: Resource> ResourceManager<R> {
    /// Creates an empty manager. Call [`ResourceManager::refresh`] to load.
    #[must_use]
    pub fn new(table: ResourceTable<R>) -> Self {
        Self {
            table,
            rows: Vec::new(),
            draft: R::Draft::default(),
            form_open: false,
            editing: None,
            pending_delete: None,
            notice: None,
        }
    }

    /// Rows from the last successful refresh.
    #[must_use]
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    /// Current form contents.
    #[must_use]
    pub fn draft(&self) -> &R::Draft {
        &self.draft
    }

    /// Whether the create/edit form is shown.
    #[must_use]
    pub const fn form_open(&self) -> bool {
        self.form_open
    }

    /// Row the form is editing, if in edit mode.
    #[must_use]
    pub const fn editing(&self) -> Option<RecordId> {
        self.editing
    }

    /// Row armed for deletion, awaiting confirmation.
    #[must_use]
    pub const fn pending_delete(&self) -> Option<RecordId> {
        self.pending_delete
    }

    /// Last notice, if any.
    #[must_use]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Takes the last notice, clearing it.
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    fn row(&self, id: RecordId) -> Option<&R> {
        self.rows.iter().find(|r| r.id() == id)
    }

    fn reset_form(&mut self) {
        self.draft = R::Draft::default();
        self.form_open = false;
        self.editing = None;
    }

    /// Re-reads every row. On failure the prior rows stay and an error
    /// notice is raised.
    pub async fn refresh(&mut self, auth: Option<&AccessToken>) {
        match self.table.list(auth).await {
            Ok(rows) => self.rows = rows,
            Err(err) => {
                tracing::warn!(table = R::TABLE, error = %err, "refresh failed");
                self.notice = Some(Notice::error(format!("Error fetching {}", R::LABEL), &err));
            }
        }
    }

    /// Opens an empty create form.
    pub fn begin_create(&mut self) {
        self.draft = R::Draft::default();
        self.editing = None;
        self.form_open = true;
    }

    /// Opens the form pre-filled from row `id`. Returns `false` when the
    /// row is not in the current list.
    pub fn begin_edit(&mut self, id: RecordId) -> bool {
        let Some(draft) = self.row(id).map(<R::Draft as ResourceDraft<R>>::from_record) else {
            return false;
        };
        self.draft = draft;
        self.editing = Some(id);
        self.form_open = true;
        true
    }

    /// Replaces the form contents without submitting (e.g. after an
    /// upload filled a URL field). Opens the form.
    pub fn set_draft(&mut self, draft: R::Draft) {
        self.draft = draft;
        self.form_open = true;
    }

    /// Raises a notice.
    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    /// Closes the form and resets it to defaults.
    pub fn cancel_edit(&mut self) {
        self.reset_form();
    }

    /// Validates and submits `draft`: an update when in edit mode, a create
    /// otherwise. On success the form resets and the list refreshes. On
    /// failure the form keeps `draft` and an error notice carries the
    /// message.
    pub async fn submit(&mut self, auth: Option<&AccessToken>, draft: R::Draft) {
        self.draft = draft;
        self.form_open = true;
        let verb = if self.editing.is_some() {
            "updating"
        } else {
            "creating"
        };

        let values = match self.draft.to_row() {
            Ok(values) => values,
            Err(err) => {
                self.notice = Some(Notice::error(format!("Error {verb} {}", R::LABEL), &err));
                return;
            }
        };

        let result = match self.editing {
            Some(id) => self.table.update(auth, id, values).await,
            None => self.table.create(auth, values).await.map(|_| ()),
        };
        match result {
            Ok(()) => {
                let done = if self.editing.is_some() {
                    "updated"
                } else {
                    "created"
                };
                self.notice = Some(Notice::success(format!("{} {done} successfully", R::LABEL)));
                self.reset_form();
                self.refresh(auth).await;
            }
            Err(err) => {
                self.notice = Some(Notice::error(format!("Error {verb} {}", R::LABEL), &err));
            }
        }
    }

    /// Arms the delete confirmation for `id`. No backend call.
    pub fn request_delete(&mut self, id: RecordId) {
        self.pending_delete = Some(id);
    }

    /// Disarms any pending delete.
    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Deletes `id` if and only if it is the armed row. Returns whether a
    /// delete was issued.
    pub async fn confirm_delete(&mut self, auth: Option<&AccessToken>, id: RecordId) -> bool {
        if self.pending_delete != Some(id) {
            return false;
        }
        self.pending_delete = None;
        match self.table.delete(auth, id).await {
            Ok(()) => {
                self.notice = Some(Notice::success(format!("{} deleted successfully", R::LABEL)));
                if self.editing == Some(id) {
                    self.reset_form();
                }
                self.refresh(auth).await;
            }
            Err(err) => {
                self.notice = Some(Notice::error(format!("Error deleting {}", R::LABEL), &err));
            }
        }
        true
    }

    /// Commits an inline edit of one field of row `id`. Returns whether an
    /// update was issued; an unchanged value issues nothing.
    pub async fn commit_inline(
        &mut self,
        auth: Option<&AccessToken>,
        id: RecordId,
        field: &str,
        raw: &str,
    ) -> bool {
        let Some(row) = self.row(id) else {
            self.notice = Some(Notice::error(
                format!("Error updating {}", R::LABEL),
                &SiteError::NotFound(format!("{} {id}", R::TABLE)),
            ));
            return false;
        };
        let values = match row.inline_update(field, raw) {
            Ok(Some(values)) => values,
            Ok(None) => return false,
            Err(err) => {
                self.notice = Some(Notice::error(format!("Error updating {}", R::LABEL), &err));
                return false;
            }
        };
        match self.table.update(auth, id, values).await {
            Ok(()) => {
                self.notice = Some(Notice::success(format!("{} updated successfully", R::LABEL)));
                self.refresh(auth).await;
            }
            Err(err) => {
                self.notice = Some(Notice::error(format!("Error updating {}", R::LABEL), &err));
            }
        }
        true
    }
}
