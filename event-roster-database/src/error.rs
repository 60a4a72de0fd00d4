use core::time::Duration;

use thiserror::Error;

use crate::document::{Collection, Operation};

#[allow(clippy::module_name_repetitions)]
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("unsupported store url {0}, expected memory:// or mongodb://")]
    UnsupportedUrl(String),
    #[error("{operation} on {collection} timed out after {after:?}")]
    Timeout {
        operation: Operation,
        collection: Collection,
        after: Duration,
    },
    #[error("connecting to the record store timed out after {0:?}")]
    ConnectTimeout(Duration),
    #[error("{operation} on {collection} failed")]
    Unavailable {
        operation: Operation,
        collection: Collection,
    },
    #[error("a document with _id {id} already exists in {collection}")]
    DuplicateKey { collection: Collection, id: String },
    #[error("cannot {operation} field {field}: {reason}")]
    InvalidUpdate {
        operation: &'static str,
        field: String,
        reason: &'static str,
    },
    #[error("record did not serialize to a document")]
    NotADocument,
    #[error("document (de)serialization failed {0}")]
    Serialization(#[from] serde_json::Error),
    #[cfg(feature = "mongodb")]
    #[error("mongodb error {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[cfg(feature = "mongodb")]
    #[error("bson conversion failed {0}")]
    Bson(#[from] mongodb::bson::ser::Error),
}

impl DatabaseError {
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::ConnectTimeout(_))
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid record id {0:?}, expected 24 hex characters")]
pub struct InvalidRecordId(pub String);
