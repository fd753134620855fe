//! Edit form for a single-row table (contact info, site settings).

use super::{Notice, ResourceTable};
use crate::backend::AccessToken;
use crate::domain::{Resource, ResourceDraft};

/// View state of a singleton admin tab.
///
/// A failed load is logged and otherwise silent: the form keeps whatever
/// it held before. Saving requires a loaded row, since updates are keyed by
/// its id. Concurrent edits from two admins are last write wins.
#[derive(Debug)]
pub struct SingletonManager<R: Resource> {
    table: ResourceTable<R>,
    record: Option<R>,
    draft: R::Draft,
    notice: Option<Notice>,
}

impl<R: Resource> SingletonManager<R> {
    /// Creates an unloaded manager.
    #[must_use]
    pub fn new(table: ResourceTable<R>) -> Self {
        Self {
            table,
            record: None,
            draft: R::Draft::default(),
            notice: None,
        }
    }

    /// The loaded row, if any.
    #[must_use]
    pub fn record(&self) -> Option<&R> {
        self.record.as_ref()
    }

    /// Current form contents.
    #[must_use]
    pub fn draft(&self) -> &R::Draft {
        &self.draft
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

    /// Replaces the form contents without saving.
    pub fn set_draft(&mut self, draft: R::Draft) {
        self.draft = draft;
    }

    /// Raises a notice.
    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    /// Fetches the row and pre-fills the form from it.
    pub async fn load(&mut self, auth: Option<&AccessToken>) {
        match self.table.fetch_single(auth).await {
            Ok(record) => {
                self.draft = <R::Draft as ResourceDraft<R>>::from_record(&record);
                self.record = Some(record);
            }
            Err(err) => {
                tracing::error!(table = R::TABLE, error = %err, "error fetching singleton row");
            }
        }
    }

    /// Saves `draft` over the loaded row and reloads. Does nothing when no
    /// row has been loaded. Returns whether an update was issued.
    pub async fn submit(&mut self, auth: Option<&AccessToken>, draft: R::Draft) -> bool {
        let Some(id) = self.record.as_ref().map(Resource::id) else {
            tracing::debug!(table = R::TABLE, "submit ignored: no row loaded");
            return false;
        };
        self.draft = draft;
        let values = match self.draft.to_row() {
            Ok(values) => values,
            Err(err) => {
                self.notice = Some(Notice::error(format!("Error updating {}", R::LABEL), &err));
                return false;
            }
        };
        match self.table.update(auth, id, values).await {
            Ok(()) => {
                self.notice = Some(Notice::success(format!("{} updated successfully", R::LABEL)));
                self.load(auth).await;
            }
            Err(err) => {
                self.notice = Some(Notice::error(format!("Error updating {}", R::LABEL), &err));
            }
        }
        true
    }
}
