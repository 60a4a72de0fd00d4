use async_trait::async_trait;
use futures_util::TryStreamExt as _;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, doc, Bson, Document as BsonDocument};
use mongodb::{Client, Database};
use serde_json::Value;
use tracing::info;

use crate::document::{Collection, Document, Filter, Update};
use crate::error::DatabaseError;
use crate::store::RecordStore;

#[derive(Debug, Clone)]
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    pub async fn connect(url: &str, database: &str) -> Result<Self, DatabaseError> {
        let client = Client::with_uri_str(url).await?;
        let database = client.database(database);
        database.run_command(doc! { "ping": 1 }, None).await?;
        info!(database = database.name(), "connected to mongodb");
        Ok(Self { database })
    }

    fn collection(&self, collection: Collection) -> mongodb::Collection<BsonDocument> {
        self.database.collection(collection.name())
    }
}

/// Fields holding record ids: `_id`, every `*_id` reference and the `id` of embedded summaries.
fn is_id_field(field: &str) -> bool {
    field == "id" || field.ends_with("_id")
}

/// Replaces hex ids under id fields with native object ids. Strings that are not valid ids
/// are kept as they are.
fn store_object_ids(value: &mut Bson, field: &str) {
    match value {
        Bson::String(hex) => {
            if is_id_field(field) {
                if let Ok(id) = ObjectId::parse_str(hex.as_str()) {
                    *value = Bson::ObjectId(id);
                }
            }
        }
        Bson::Document(document) => {
            for (key, nested) in document.iter_mut() {
                store_object_ids(nested, key);
            }
        }
        Bson::Array(items) => {
            for item in items {
                store_object_ids(item, field);
            }
        }
        _ => {}
    }
}

fn load_object_ids(value: &mut Bson) {
    match value {
        Bson::ObjectId(id) => {
            let hex = id.to_hex();
            *value = Bson::String(hex);
        }
        Bson::Document(document) => {
            for (_, nested) in document.iter_mut() {
                load_object_ids(nested);
            }
        }
        Bson::Array(items) => items.iter_mut().for_each(load_object_ids),
        _ => {}
    }
}

fn to_bson(document: &Document) -> Result<BsonDocument, DatabaseError> {
    let mut document = bson::to_document(document)?;
    for (field, value) in document.iter_mut() {
        store_object_ids(value, field);
    }
    Ok(document)
}

fn from_bson(document: BsonDocument) -> Result<Document, DatabaseError> {
    let mut document = Bson::Document(document);
    load_object_ids(&mut document);
    match document.into_relaxed_extjson() {
        Value::Object(document) => Ok(document),
        _ => Err(DatabaseError::NotADocument),
    }
}

fn filter_to_bson(filter: &Filter) -> Result<BsonDocument, DatabaseError> {
    let mut query = BsonDocument::new();
    for (field, value) in filter.conditions() {
        let mut value = bson::to_bson(value)?;
        store_object_ids(&mut value, field);
        query.insert(field.clone(), value);
    }
    Ok(query)
}

fn update_to_bson(update: &Update) -> Result<BsonDocument, DatabaseError> {
    let (operator, body) = match update {
        Update::Set(values) => ("$set", to_bson(values)?),
        Update::Inc { field, by } => {
            let mut body = BsonDocument::new();
            body.insert(field.clone(), Bson::Int64(*by));
            ("$inc", body)
        }
        Update::Push { field, value } => {
            let mut value = bson::to_bson(value)?;
            store_object_ids(&mut value, field);
            let mut body = BsonDocument::new();
            body.insert(field.clone(), value);
            ("$push", body)
        }
        Update::Pull { field, matching } => {
            let mut body = BsonDocument::new();
            body.insert(field.clone(), filter_to_bson(matching)?);
            ("$pull", body)
        }
    };
    let mut modification = BsonDocument::new();
    modification.insert(operator, body);
    Ok(modification)
}

#[async_trait]
impl RecordStore for MongoStore {
    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, DatabaseError> {
        self.collection(collection)
            .find_one(filter_to_bson(filter)?, None)
            .await?
            .map(from_bson)
            .transpose()
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<Document>, DatabaseError> {
        let documents: Vec<BsonDocument> = self
            .collection(collection)
            .find(filter_to_bson(filter)?, None)
            .await?
            .try_collect()
            .await?;
        documents.into_iter().map(from_bson).collect()
    }

    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, DatabaseError> {
        Ok(self
            .collection(collection)
            .count_documents(filter_to_bson(filter)?, None)
            .await?)
    }

    async fn insert_one(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<(), DatabaseError> {
        self.collection(collection)
            .insert_one(to_bson(&document)?, None)
            .await?;
        Ok(())
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> Result<u64, DatabaseError> {
        let result = self
            .collection(collection)
            .update_one(filter_to_bson(filter)?, update_to_bson(update)?, None)
            .await?;
        Ok(result.matched_count)
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<u64, DatabaseError> {
        let result = self
            .collection(collection)
            .delete_one(filter_to_bson(filter)?, None)
            .await?;
        Ok(result.deleted_count)
    }

    async fn delete_many(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<u64, DatabaseError> {
        let result = self
            .collection(collection)
            .delete_many(filter_to_bson(filter)?, None)
            .await?;
        Ok(result.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn updates_translate_to_operators() -> Result<(), DatabaseError> {
        assert_eq!(
            update_to_bson(&Update::inc("points", -10))?,
            doc! { "$inc": { "points": -10_i64 } }
        );
        assert_eq!(
            update_to_bson(&Update::pull(
                "assigned_teachers",
                Filter::new().eq("assignment_id", "abc")
            ))?,
            doc! { "$pull": { "assigned_teachers": { "assignment_id": "abc" } } }
        );
        assert_eq!(
            update_to_bson(&Update::push("roles", json!({ "id": "1", "name": "Usher" })))?,
            doc! { "$push": { "roles": { "id": "1", "name": "Usher" } } }
        );
        Ok(())
    }

    #[test]
    fn record_ids_are_stored_as_object_ids() -> Result<(), DatabaseError> {
        let assignment = "65f1c0ffee0000000000002a";
        let teacher = "65f1c0ffee0000000000002b";
        let document = json!({
            "_id": teacher,
            "name": "Ada",
            "assigned_roles": [{ "assignment_id": assignment, "role_name": "Judge" }],
        });
        let Value::Object(document) = document else {
            unreachable!()
        };

        let stored = to_bson(&document)?;
        assert_eq!(
            stored,
            doc! {
                "_id": ObjectId::parse_str(teacher).unwrap(),
                "name": "Ada",
                "assigned_roles": [{
                    "assignment_id": ObjectId::parse_str(assignment).unwrap(),
                    "role_name": "Judge",
                }],
            }
        );
        assert_eq!(from_bson(stored)?, document);

        assert_eq!(
            filter_to_bson(&Filter::new().eq("teacher_id", teacher).eq("name", teacher))?,
            doc! { "teacher_id": ObjectId::parse_str(teacher).unwrap(), "name": teacher }
        );
        Ok(())
    }
}
