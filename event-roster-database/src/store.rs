use async_trait::async_trait;

use crate::document::{Collection, Document, Filter, Update};
use crate::error::DatabaseError;
use crate::models::{Record, RecordId};

/// A document store with per-document atomicity and nothing more. Callers that touch several
/// documents see every intermediate state.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, DatabaseError>;

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<Document>, DatabaseError>;

    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, DatabaseError>;

    async fn insert_one(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<(), DatabaseError>;

    /// Applies `update` to the first matching document and returns the number of matched
    /// documents (zero or one).
    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> Result<u64, DatabaseError>;

    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<u64, DatabaseError>;

    async fn delete_many(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<u64, DatabaseError>;
}

pub async fn get_record<R: Record>(
    store: &dyn RecordStore,
    id: RecordId,
) -> Result<Option<R>, DatabaseError> {
    store
        .find_one(R::COLLECTION, &Filter::by_id(id))
        .await?
        .map(R::from_document)
        .transpose()
}

pub async fn find_records<R: Record>(
    store: &dyn RecordStore,
    filter: &Filter,
) -> Result<Vec<R>, DatabaseError> {
    store
        .find(R::COLLECTION, filter)
        .await?
        .into_iter()
        .map(R::from_document)
        .collect()
}

pub async fn insert_record<R: Record>(
    store: &dyn RecordStore,
    record: &R,
) -> Result<(), DatabaseError> {
    store.insert_one(R::COLLECTION, record.to_document()?).await
}
