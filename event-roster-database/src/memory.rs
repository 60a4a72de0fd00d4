//! In-process record store. Every call takes one lock, which gives the same per-call
//! atomicity a document store gives per document and nothing across calls.

use core::time::Duration;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::document::{fields, Collection, Document, Filter, Operation, Update};
use crate::error::DatabaseError;
use crate::store::RecordStore;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<Mutex<HashMap<Collection, Vec<Document>>>>,
    failures: Arc<Mutex<HashSet<(Collection, Operation)>>>,
    latency: Option<Duration>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every call, for exercising deadlines.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Makes every following `operation` on `collection` fail until [`Self::recover`].
    pub fn fail(&self, collection: Collection, operation: Operation) {
        lock(&self.failures).insert((collection, operation));
    }

    pub fn recover(&self, collection: Collection, operation: Operation) {
        lock(&self.failures).remove(&(collection, operation));
    }

    #[must_use]
    pub fn len(&self, collection: Collection) -> usize {
        lock(&self.collections).get(&collection).map_or(0, Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }

    async fn enter(
        &self,
        operation: Operation,
        collection: Collection,
    ) -> Result<MutexGuard<'_, HashMap<Collection, Vec<Document>>>, DatabaseError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if lock(&self.failures).contains(&(collection, operation)) {
            return Err(DatabaseError::Unavailable {
                operation,
                collection,
            });
        }
        Ok(lock(&self.collections))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, DatabaseError> {
        let collections = self.enter(Operation::FindOne, collection).await?;
        Ok(collections
            .get(&collection)
            .and_then(|documents| documents.iter().find(|document| filter.matches(document)))
            .cloned())
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<Document>, DatabaseError> {
        let collections = self.enter(Operation::Find, collection).await?;
        Ok(collections
            .get(&collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|document| filter.matches(document))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, DatabaseError> {
        let collections = self.enter(Operation::Count, collection).await?;
        let count = collections.get(&collection).map_or(0, |documents| {
            documents
                .iter()
                .filter(|document| filter.matches(document))
                .count()
        });
        Ok(count as u64)
    }

    async fn insert_one(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<(), DatabaseError> {
        let mut collections = self.enter(Operation::InsertOne, collection).await?;
        let documents = collections.entry(collection).or_default();
        if let Some(id) = document.get(fields::ID) {
            if documents
                .iter()
                .any(|existing| existing.get(fields::ID) == Some(id))
            {
                return Err(DatabaseError::DuplicateKey {
                    collection,
                    id: id.to_string(),
                });
            }
        }
        documents.push(document);
        Ok(())
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> Result<u64, DatabaseError> {
        let mut collections = self.enter(Operation::UpdateOne, collection).await?;
        let Some(document) = collections
            .get_mut(&collection)
            .and_then(|documents| documents.iter_mut().find(|document| filter.matches(document)))
        else {
            return Ok(0);
        };
        // apply to a copy so a rejected update leaves the document untouched
        let mut updated = document.clone();
        update.apply(&mut updated)?;
        *document = updated;
        Ok(1)
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<u64, DatabaseError> {
        let mut collections = self.enter(Operation::DeleteOne, collection).await?;
        let Some(documents) = collections.get_mut(&collection) else {
            return Ok(0);
        };
        match documents.iter().position(|document| filter.matches(document)) {
            Some(index) => {
                documents.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_many(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<u64, DatabaseError> {
        let mut collections = self.enter(Operation::DeleteMany, collection).await?;
        let Some(documents) = collections.get_mut(&collection) else {
            return Ok(0);
        };
        let before = documents.len();
        documents.retain(|document| !filter.matches(document));
        Ok((before - documents.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    fn document(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn find_count_and_delete_by_filter() -> Result<(), DatabaseError> {
        let store = MemoryStore::new();
        for (id, role) in [("1", "a"), ("2", "a"), ("3", "b")] {
            store
                .insert_one(
                    Collection::Assignments,
                    document(json!({ "_id": id, "role_id": role })),
                )
                .await?;
        }

        let by_role = Filter::new().eq("role_id", "a");
        assert_eq!(store.count(Collection::Assignments, &by_role).await?, 2);
        assert_eq!(store.find(Collection::Assignments, &by_role).await?.len(), 2);
        assert!(store
            .find_one(Collection::Assignments, &Filter::new().eq("_id", "4"))
            .await?
            .is_none());

        assert_eq!(store.delete_many(Collection::Assignments, &by_role).await?, 2);
        assert_eq!(store.len(Collection::Assignments), 1);
        assert_eq!(
            store
                .delete_one(Collection::Assignments, &Filter::new().eq("_id", "3"))
                .await?,
            1
        );
        assert!(store.is_empty(Collection::Assignments));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_primary_key_is_rejected() -> Result<(), DatabaseError> {
        let store = MemoryStore::new();
        store
            .insert_one(Collection::Events, document(json!({ "_id": "1" })))
            .await?;
        let error = store
            .insert_one(Collection::Events, document(json!({ "_id": "1" })))
            .await
            .unwrap_err();
        assert!(matches!(error, DatabaseError::DuplicateKey { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn update_reports_matches_and_keeps_document_on_rejection() -> Result<(), DatabaseError> {
        let store = MemoryStore::new();
        store
            .insert_one(
                Collection::Teachers,
                document(json!({ "_id": "1", "points": 3, "name": "Ada" })),
            )
            .await?;

        let by_id = Filter::new().eq("_id", "1");
        assert_eq!(
            store
                .update_one(Collection::Teachers, &by_id, &Update::inc("points", 4))
                .await?,
            1
        );
        assert_eq!(
            store
                .update_one(
                    Collection::Teachers,
                    &Filter::new().eq("_id", "2"),
                    &Update::inc("points", 4)
                )
                .await?,
            0
        );
        assert!(store
            .update_one(Collection::Teachers, &by_id, &Update::inc("name", 1))
            .await
            .is_err());

        let teacher = store
            .find_one(Collection::Teachers, &by_id)
            .await?
            .unwrap();
        assert_eq!(teacher["points"], json!(7));
        assert_eq!(teacher["name"], json!("Ada"));
        Ok(())
    }

    #[tokio::test]
    async fn injected_failures_hit_only_their_operation() -> Result<(), DatabaseError> {
        let store = MemoryStore::new();
        store.fail(Collection::Teachers, Operation::UpdateOne);

        store
            .insert_one(Collection::Teachers, document(json!({ "_id": "1" })))
            .await?;
        let error = store
            .update_one(
                Collection::Teachers,
                &Filter::new(),
                &Update::inc("points", 1),
            )
            .await
            .unwrap_err();
        assert!(matches!(error, DatabaseError::Unavailable { .. }));

        store.recover(Collection::Teachers, Operation::UpdateOne);
        assert_eq!(
            store
                .update_one(
                    Collection::Teachers,
                    &Filter::new(),
                    &Update::inc("points", 1)
                )
                .await?,
            1
        );
        Ok(())
    }
}
