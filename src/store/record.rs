//! Records, identifiers and projections.

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::store::object_id::ObjectId;
use crate::store::StoreError;

/// Field holding a document's identifier.
pub const ID_FIELD: &str = "_id";

/// Identifier used for a point lookup.
///
/// Identifiers arrive as strings. A string that is a valid native
/// identifier is looked up by the native type, everything else by the
/// literal string, so a literal key that happens to look like a native
/// identifier is not reachable through the route.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordId {
    Native(ObjectId),
    Literal(String),
}

impl RecordId {
    pub fn parse(raw: &str) -> Self {
        match ObjectId::parse_str(raw) {
            Ok(oid) => RecordId::Native(oid),
            Err(_) => RecordId::Literal(raw.to_string()),
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, RecordId::Native(_))
    }

    /// Read an identifier from its stored JSON form: `{"$oid": "<hex>"}` or a string.
    pub fn from_json(value: &Value) -> Result<Self, StoreError> {
        match value {
            Value::String(s) => Ok(RecordId::Literal(s.clone())),
            Value::Object(map) => {
                let hex = map
                    .get("$oid")
                    .and_then(Value::as_str)
                    .ok_or_else(|| StoreError::InvalidDocument("`_id` object without `$oid`".into()))?;
                ObjectId::parse_str(hex)
                    .map(RecordId::Native)
                    .map_err(|e| StoreError::InvalidDocument(format!("bad `$oid`: {}", e)))
            }
            other => Err(StoreError::InvalidDocument(format!(
                "unsupported `_id` value: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Native(oid) => fmt::Display::fmt(oid, f),
            RecordId::Literal(s) => f.write_str(s),
        }
    }
}

/// A document returned by the store.
///
/// Serializes as a flat JSON object with the identifier normalized to a
/// string under `_id`. The identifier is absent when a projection removed it.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: Option<RecordId>,
    fields: Map<String, Value>,
}

impl Record {
    /// Build a record from a stored JSON document. The document must be an
    /// object with an `_id`.
    pub fn from_document(doc: Value) -> Result<Self, StoreError> {
        let Value::Object(mut fields) = doc else {
            return Err(StoreError::InvalidDocument("document is not an object".into()));
        };
        let raw_id = fields
            .remove(ID_FIELD)
            .ok_or_else(|| StoreError::InvalidDocument("document has no `_id`".into()))?;
        let id = RecordId::from_json(&raw_id)?;
        Ok(Self { id: Some(id), fields })
    }

    /// Build a record from a document the store already projected. The
    /// identifier is only required when `projection` keeps it.
    pub fn from_projected(doc: Value, projection: &Projection) -> Result<Self, StoreError> {
        if !projection.excludes(ID_FIELD) {
            return Self::from_document(doc);
        }
        let Value::Object(mut fields) = doc else {
            return Err(StoreError::InvalidDocument("document is not an object".into()));
        };
        fields.remove(ID_FIELD);
        Ok(Self { id: None, fields })
    }

    pub fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.fields.len() + usize::from(self.id.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(id) = &self.id {
            map.serialize_entry(ID_FIELD, &id.to_string())?;
        }
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Field exclusion applied to listing queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    exclude: Vec<String>,
}

impl Projection {
    /// Return every field.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn excluding<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            exclude: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn excludes(&self, field: &str) -> bool {
        self.exclude.iter().any(|f| f == field)
    }

    pub fn excluded(&self) -> impl Iterator<Item = &str> {
        self.exclude.iter().map(String::as_str)
    }

    pub fn apply(&self, record: &Record) -> Record {
        let id = if self.excludes(ID_FIELD) {
            None
        } else {
            record.id.clone()
        };
        let fields = record
            .fields
            .iter()
            .filter(|(k, _)| !self.excludes(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Record { id, fields }
    }
}
