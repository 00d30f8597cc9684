//! MongoDB-backed document store.
//!
//! # Responsibilities
//! - Build the driver client once from [`StoreConfig`] (URI, database, TLS)
//! - Translate [`RecordId`] and [`Projection`] into BSON filters and projections
//! - Return documents as [`Record`]s through their relaxed extended JSON form
//!
//! The driver connects lazily, so an unreachable server surfaces on the
//! first query as [`StoreError::Unavailable`], not at startup.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{self, Bson, Document};
use mongodb::error::{Error as MongoError, ErrorKind as MongoErrorKind};
use mongodb::options::{ClientOptions, FindOptions, Tls, TlsOptions};
use mongodb::{Client, Database};
use serde_json::Value;

use crate::config::schema::{StoreConfig, TlsConfig};
use crate::store::record::ID_FIELD;
use crate::store::{DocumentStore, Projection, Record, RecordId, StoreError};

#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(config.uri.as_str()).await.map_err(classify)?;
        if let Some(tls) = tls_options(&config.tls) {
            options.tls = Some(tls);
        }
        let client = Client::with_options(options).map_err(classify)?;
        tracing::info!(database = %config.database, tls = config.tls.enabled, "Store client ready");
        Ok(Self {
            db: client.database(&config.database),
        })
    }
}

/// Driver TLS settings. `None` leaves whatever the URI asks for.
fn tls_options(config: &TlsConfig) -> Option<Tls> {
    config.enabled.then(|| {
        Tls::Enabled(
            TlsOptions::builder()
                .allow_invalid_certificates(config.allow_invalid_certificates)
                .build(),
        )
    })
}

fn id_filter(id: &RecordId) -> Document {
    let value = match id {
        RecordId::Native(oid) => Bson::ObjectId(bson::oid::ObjectId::from_bytes(oid.bytes())),
        RecordId::Literal(s) => Bson::String(s.clone()),
    };
    let mut filter = Document::new();
    filter.insert(ID_FIELD, value);
    filter
}

fn projection_document(projection: &Projection) -> Option<Document> {
    let mut doc = Document::new();
    for field in projection.excluded() {
        doc.insert(field, 0);
    }
    (!doc.is_empty()).then_some(doc)
}

fn to_json(doc: Document) -> Value {
    Bson::Document(doc).into_relaxed_extjson()
}

fn classify(err: MongoError) -> StoreError {
    match err.kind.as_ref() {
        MongoErrorKind::ServerSelection { .. }
        | MongoErrorKind::Io(_)
        | MongoErrorKind::DnsResolve { .. } => StoreError::Unavailable(err.to_string()),
        _ => StoreError::Query(err.to_string()),
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn find_one(&self, collection: &str, id: &RecordId) -> Result<Option<Record>, StoreError> {
        let doc = self
            .db
            .collection::<Document>(collection)
            .find_one(id_filter(id), None)
            .await
            .map_err(classify)?;
        doc.map(|d| Record::from_document(to_json(d))).transpose()
    }

    async fn find(&self, collection: &str, projection: &Projection) -> Result<Vec<Record>, StoreError> {
        let options = FindOptions::builder()
            .projection(projection_document(projection))
            .build();
        let docs: Vec<Document> = self
            .db
            .collection::<Document>(collection)
            .find(None, options)
            .await
            .map_err(classify)?
            .try_collect()
            .await
            .map_err(classify)?;
        docs.into_iter()
            .map(|d| Record::from_projected(to_json(d), projection))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Classify, ErrorKind};
    use serde_json::json;

    #[test]
    fn test_id_filter_uses_native_type_for_object_ids() {
        let native = id_filter(&RecordId::parse("65f1a2b3c4d5e6f708192a3b"));
        assert!(matches!(native.get(ID_FIELD), Some(Bson::ObjectId(_))));

        let literal = id_filter(&RecordId::parse("user-42"));
        assert_eq!(literal.get_str(ID_FIELD).unwrap(), "user-42");
    }

    #[test]
    fn test_projection_document() {
        assert!(projection_document(&Projection::all()).is_none());
        let doc = projection_document(&Projection::excluding([ID_FIELD])).unwrap();
        assert_eq!(doc.get_i32(ID_FIELD).unwrap(), 0);
    }

    #[test]
    fn test_extended_json_keeps_object_id_shape() {
        let mut doc = id_filter(&RecordId::parse("65f1a2b3c4d5e6f708192a3b"));
        doc.insert("name", "alpha");
        let record = Record::from_document(to_json(doc)).unwrap();
        assert!(record.id().unwrap().is_native());
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"_id": "65f1a2b3c4d5e6f708192a3b", "name": "alpha"})
        );
    }

    #[test]
    fn test_tls_only_when_enabled() {
        assert!(tls_options(&TlsConfig::default()).is_none());
        let tls = tls_options(&TlsConfig {
            enabled: true,
            allow_invalid_certificates: true,
        });
        match tls {
            Some(Tls::Enabled(options)) => assert_eq!(options.allow_invalid_certificates, Some(true)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        let config = StoreConfig {
            uri: "mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=200&connectTimeoutMS=200".into(),
            ..StoreConfig::default()
        };
        let store = MongoStore::connect(&config).await.unwrap();
        let err = store
            .find_one("collection", &RecordId::parse("user-42"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(err.kind(), ErrorKind::Unreachable);
    }
}
