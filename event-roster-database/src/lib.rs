pub mod deadline;
pub mod document;
pub mod error;
pub mod memory;
pub mod models;
#[cfg(feature = "mongodb")]
pub mod mongo;
pub mod store;

use core::time::Duration;
use std::sync::Arc;

pub use deadline::DeadlineStore;
pub use document::{fields, Collection, Document, Filter, Operation, Update};
pub use error::{DatabaseError, InvalidRecordId};
pub use memory::MemoryStore;
pub use store::{find_records, get_record, insert_record, RecordStore};
use tracing::info;

pub const MEMORY_URL: &str = "memory://";

/// Shared handle to the record store. Opened once at startup and handed to every component.
pub type Store = Arc<dyn RecordStore>;

/// Opens the store behind `url` and bounds each of its calls by `deadline`.
pub async fn connect(url: &str, database: &str, deadline: Duration) -> Result<Store, DatabaseError> {
    if url.starts_with(MEMORY_URL) {
        info!(?deadline, "using in-memory record store");
        return Ok(Arc::new(DeadlineStore::new(MemoryStore::new(), deadline)));
    }
    connect_remote(url, database, deadline).await
}

#[cfg(feature = "mongodb")]
async fn connect_remote(
    url: &str,
    database: &str,
    deadline: Duration,
) -> Result<Store, DatabaseError> {
    if !url.starts_with("mongodb://") && !url.starts_with("mongodb+srv://") {
        return Err(DatabaseError::UnsupportedUrl(url.to_owned()));
    }
    let store = tokio::time::timeout(deadline, mongo::MongoStore::connect(url, database))
        .await
        .map_err(|_| DatabaseError::ConnectTimeout(deadline))??;
    Ok(Arc::new(DeadlineStore::new(store, deadline)))
}

#[cfg(not(feature = "mongodb"))]
#[allow(clippy::unused_async)]
async fn connect_remote(
    url: &str,
    _database: &str,
    _deadline: Duration,
) -> Result<Store, DatabaseError> {
    Err(DatabaseError::UnsupportedUrl(url.to_owned()))
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use super::*;

    #[tokio::test]
    async fn memory_url_opens_an_empty_store() -> Result<(), DatabaseError> {
        let store = connect("memory://", "schoolEvents", Duration::from_secs(1)).await?;
        assert_eq!(store.count(Collection::Events, &Filter::new()).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_scheme_is_rejected() {
        let error = connect("postgres://localhost", "schoolEvents", Duration::from_secs(1))
            .await
            .err();
        assert!(matches!(error, Some(DatabaseError::UnsupportedUrl(_))));
    }
}
