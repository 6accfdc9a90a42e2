use bson::Document;

use crate::error::StoreError;
use crate::filter::Filter;
use crate::query::FindQuery;
use crate::update::Update;

/// A single collection of documents.
///
/// Calls are synchronous; async callers run them on a blocking pool.
/// Every method fails with [`StoreError::Closed`] once [`close`](Self::close)
/// has returned.
pub trait DocumentStore: Send + Sync {
    /// Persist `doc`, assigning `_id` when absent. Returns the stored document.
    fn insert_one(&self, doc: Document) -> Result<Document, StoreError>;

    /// Persist all documents atomically; nothing is written if any is rejected.
    fn insert_many(&self, docs: Vec<Document>) -> Result<usize, StoreError>;

    fn find(&self, query: &FindQuery) -> Result<Vec<Document>, StoreError>;

    /// First match in natural (insertion) order.
    fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StoreError>;

    fn count(&self, filter: &Filter) -> Result<u64, StoreError>;

    /// Update the first match and return its post-update state.
    fn find_one_and_update(
        &self,
        filter: &Filter,
        update: &Update,
    ) -> Result<Option<Document>, StoreError>;

    /// Remove the first match and return it.
    fn find_one_and_delete(&self, filter: &Filter) -> Result<Option<Document>, StoreError>;

    /// Flush any durable state and release the handle.
    fn close(&self) -> Result<(), StoreError>;
}
