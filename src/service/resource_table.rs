//! Stateless, table-scoped data access for one [`Resource`].
//!
//! Every method is exactly one backend call. Successful mutations publish
//! a [`SiteEvent::ContentChanged`] on the site event bus.

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;

use crate::backend::{AccessToken, BackendError, DataBackend, Row, Select};
use crate::domain::{ContentAction, EventBus, RecordId, Resource, SiteEvent};
use crate::error::SiteError;

/// Data backend plus the site event bus: everything needed to build a
/// [`ResourceTable`] for any entity.
#[derive(Debug, Clone)]
pub struct ContentStore {
    data: Arc<dyn DataBackend>,
    events: EventBus<SiteEvent>,
}

impl ContentStore {
    /// Creates a store over `data`, publishing mutations on `events`.
    #[must_use]
    pub fn new(data: Arc<dyn DataBackend>, events: EventBus<SiteEvent>) -> Self {
        Self { data, events }
    }

    /// Table access for resource `R`.
    #[must_use]
    pub fn table<R: Resource>(&self) -> ResourceTable<R> {
        ResourceTable {
            data: Arc::clone(&self.data),
            events: self.events.clone(),
            _resource: PhantomData,
        }
    }

    /// The underlying data backend.
    #[must_use]
    pub fn data(&self) -> &Arc<dyn DataBackend> {
        &self.data
    }

    /// The site event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus<SiteEvent> {
        &self.events
    }
}

/// Typed access to the table of resource `R`.
#[derive(Debug)]
pub struct ResourceTable<R> {
    data: Arc<dyn DataBackend>,
    events: EventBus<SiteEvent>,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceTable<R> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            events: self.events.clone(),
            _resource: PhantomData,
        }
    }
}

fn decode<R: Resource>(row: Row) -> Result<R, SiteError> {
    serde_json::from_value(Value::Object(row))
        .map_err(|e| SiteError::Backend(BackendError::Decode(format!("{}: {e}", R::TABLE))))
}

impl<R: Resource> ResourceTable<R> {
    fn list_query() -> Select {
        let query = Select::from(R::TABLE);
        match R::ORDER {
            Some(order) => query.order(order),
            None => query,
        }
    }

    fn publish(&self, action: ContentAction, id: RecordId) {
        let _ = self
            .events
            .publish(SiteEvent::content_changed(R::TABLE, action, id));
    }

    /// Every row, in the resource's display order.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Backend`] when the read fails or a row does not
    /// decode.
    pub async fn list(&self, auth: Option<&AccessToken>) -> Result<Vec<R>, SiteError> {
        let rows = self.data.select(auth, &Self::list_query()).await?;
        rows.into_iter().map(decode::<R>).collect()
    }

    /// Rows visible on public pages, in display order.
    ///
    /// # Errors
    ///
    /// Same as [`ResourceTable::list`].
    pub async fn list_visible(&self, auth: Option<&AccessToken>) -> Result<Vec<R>, SiteError> {
        let mut rows = self.list(auth).await?;
        rows.retain(R::is_public);
        Ok(rows)
    }

    /// Reads the single row of a singleton table (`limit 1` + single).
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Backend`] when zero or several rows exist, or
    /// the read fails.
    pub async fn fetch_single(&self, auth: Option<&AccessToken>) -> Result<R, SiteError> {
        let row = self
            .data
            .select_single(auth, &Select::from(R::TABLE).limit(1))
            .await?;
        decode(row)
    }

    /// Inserts a row and returns it as stored.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Backend`] when the backend rejects the insert.
    pub async fn create(&self, auth: Option<&AccessToken>, values: Row) -> Result<R, SiteError> {
        let stored = self.data.insert(auth, R::TABLE, values).await?;
        let record = decode::<R>(stored)?;
        self.publish(ContentAction::Created, record.id());
        tracing::info!(table = R::TABLE, id = %record.id(), "row created");
        Ok(record)
    }

    /// Updates the given columns of row `id`.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Backend`] when the backend rejects the update.
    pub async fn update(
        &self,
        auth: Option<&AccessToken>,
        id: RecordId,
        values: Row,
    ) -> Result<(), SiteError> {
        self.data.update(auth, R::TABLE, id, values).await?;
        self.publish(ContentAction::Updated, id);
        tracing::info!(table = R::TABLE, %id, "row updated");
        Ok(())
    }

    /// Deletes row `id`. Permanent.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Backend`] when the backend rejects the delete.
    pub async fn delete(&self, auth: Option<&AccessToken>, id: RecordId) -> Result<(), SiteError> {
        self.data.delete(auth, R::TABLE, id).await?;
        self.publish(ContentAction::Deleted, id);
        tracing::info!(table = R::TABLE, %id, "row deleted");
        Ok(())
    }
}
