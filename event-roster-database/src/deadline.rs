use core::future::Future;
use core::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::document::{Collection, Document, Filter, Operation, Update};
use crate::error::DatabaseError;
use crate::store::RecordStore;

/// Bounds every call of the wrapped store. A call that misses the deadline fails with
/// [`DatabaseError::Timeout`]; nothing is retried.
#[derive(Debug, Clone)]
pub struct DeadlineStore<S> {
    inner: S,
    deadline: Duration,
}

impl<S: RecordStore> DeadlineStore<S> {
    pub const fn new(inner: S, deadline: Duration) -> Self {
        Self { inner, deadline }
    }

    pub const fn inner(&self) -> &S {
        &self.inner
    }

    async fn bounded<T: Send>(
        &self,
        operation: Operation,
        collection: Collection,
        call: impl Future<Output = Result<T, DatabaseError>> + Send,
    ) -> Result<T, DatabaseError> {
        if let Ok(result) = tokio::time::timeout(self.deadline, call).await {
            result
        } else {
            warn!(%operation, %collection, deadline = ?self.deadline, "record store call timed out");
            Err(DatabaseError::Timeout {
                operation,
                collection,
                after: self.deadline,
            })
        }
    }
}

#[async_trait]
impl<S: RecordStore> RecordStore for DeadlineStore<S> {
    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, DatabaseError> {
        self.bounded(
            Operation::FindOne,
            collection,
            self.inner.find_one(collection, filter),
        )
        .await
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<Document>, DatabaseError> {
        self.bounded(
            Operation::Find,
            collection,
            self.inner.find(collection, filter),
        )
        .await
    }

    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, DatabaseError> {
        self.bounded(
            Operation::Count,
            collection,
            self.inner.count(collection, filter),
        )
        .await
    }

    async fn insert_one(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<(), DatabaseError> {
        self.bounded(
            Operation::InsertOne,
            collection,
            self.inner.insert_one(collection, document),
        )
        .await
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> Result<u64, DatabaseError> {
        self.bounded(
            Operation::UpdateOne,
            collection,
            self.inner.update_one(collection, filter, update),
        )
        .await
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<u64, DatabaseError> {
        self.bounded(
            Operation::DeleteOne,
            collection,
            self.inner.delete_one(collection, filter),
        )
        .await
    }

    async fn delete_many(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<u64, DatabaseError> {
        self.bounded(
            Operation::DeleteMany,
            collection,
            self.inner.delete_many(collection, filter),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use super::*;
    use crate::memory::MemoryStore;

    #[tokio::test]
    async fn slow_calls_fail_with_timeout() {
        let store = DeadlineStore::new(
            MemoryStore::new().with_latency(Duration::from_millis(500)),
            Duration::from_millis(20),
        );
        let error = store
            .count(Collection::Roles, &Filter::new())
            .await
            .unwrap_err();
        assert!(error.is_timeout());
        assert!(matches!(
            error,
            DatabaseError::Timeout {
                operation: Operation::Count,
                collection: Collection::Roles,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn fast_calls_pass_through() -> Result<(), DatabaseError> {
        let store = DeadlineStore::new(MemoryStore::new(), Duration::from_secs(1));
        assert_eq!(store.count(Collection::Roles, &Filter::new()).await?, 0);
        assert_eq!(store.inner().len(Collection::Roles), 0);
        Ok(())
    }
}
