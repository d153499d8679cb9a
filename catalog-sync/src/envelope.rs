use std::fmt;

use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::EntityId;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("empty message")]
    Empty,
    #[error("invalid change event: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported operation type: {0}")]
    UnsupportedOperation(String),
    #[error("missing subject id")]
    MissingSubjectId,
    #[error("invalid subject id: {0}")]
    InvalidSubjectId(String),
    #[error("change event carries no document")]
    MissingPayload,
    #[error("invalid {kind} document: {source}")]
    Payload {
        kind: &'static str,
        source: serde_json::Error,
    },
    #[error("unreadable {kind} status: {reason}")]
    InvalidStatus { kind: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Insert,
    Update,
    /// Whole document replacement, routed like an update
    Replace,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Replace => "replace",
            Operation::Delete => "delete",
        }
    }

    fn parse(raw: &str) -> Result<Self, DecodeError> {
        match raw {
            "insert" => Ok(Operation::Insert),
            "update" => Ok(Operation::Update),
            "replace" => Ok(Operation::Replace),
            "delete" => Ok(Operation::Delete),
            other => Err(DecodeError::UnsupportedOperation(other.to_owned())),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UpdateDiff {
    #[serde(rename = "updatedFields", default)]
    pub updated_fields: Map<String, Value>,
    #[serde(rename = "removedFields", default)]
    pub removed_fields: Vec<String>,
    #[serde(rename = "truncatedArrays", default)]
    pub truncated_arrays: Vec<TruncatedArray>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TruncatedArray {
    pub field: String,
    #[serde(rename = "newSize")]
    pub new_size: u32,
}

impl UpdateDiff {
    /// Every dotted field path the update touched.
    pub fn changed_paths(&self) -> impl Iterator<Item = &str> {
        self.updated_fields
            .keys()
            .map(String::as_str)
            .chain(self.removed_fields.iter().map(String::as_str))
            .chain(self.truncated_arrays.iter().map(|t| t.field.as_str()))
    }

    /// True when catalog membership of any sub-collection may have changed,
    /// which is what makes the cached catalog info on a collection stale.
    pub fn touches_sub_collection_catalogs(&self) -> bool {
        self.changed_paths().any(is_sub_collection_catalogs_path)
    }
}

// Matches sub_collections, sub_collections.<n>, sub_collections.<n>.catalog_ids
// and sub_collections.<n>.catalog_ids.<m>. Replacing a whole sub-collection
// (or the whole array) replaces its catalog ids too.
fn is_sub_collection_catalogs_path(path: &str) -> bool {
    let mut segments = path.split('.');
    if segments.next() != Some("sub_collections") {
        return false;
    }
    match segments.next() {
        None => return true,
        Some(index) if index.parse::<usize>().is_err() => return false,
        Some(_) => {}
    }
    match segments.next() {
        None => true,
        Some("catalog_ids") => match segments.next() {
            None => true,
            Some(index) => index.parse::<usize>().is_ok() && segments.next().is_none(),
        },
        Some(_) => false,
    }
}

/// One decoded change event. Lives for the handling of a single message.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEnvelope {
    pub operation: Operation,
    pub subject_id: EntityId,
    pub payload: Option<Value>,
    pub update_diff: Option<UpdateDiff>,
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(rename = "operationType")]
    operation_type: String,
    #[serde(rename = "documentKey", default)]
    document_key: Option<DocumentKey>,
    #[serde(rename = "fullDocument", default)]
    full_document: Option<Value>,
    #[serde(rename = "fullDocumentBeforeChange", default)]
    full_document_before_change: Option<Value>,
    #[serde(rename = "updateDescription", default)]
    update_description: Option<UpdateDiff>,
}

#[derive(Deserialize)]
struct DocumentKey {
    #[serde(rename = "_id", default)]
    id: Option<Value>,
}

/// Parses a raw change stream message.
///
/// Some connectors publish the change document as a JSON encoded string
/// rather than an object; both are accepted. The payload is the post-image,
/// falling back to the pre-image so deletes of owned records (discounts,
/// inventory) still say which catalog they belonged to.
pub fn decode(raw: &[u8]) -> Result<ChangeEnvelope, DecodeError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Err(DecodeError::Empty);
    }

    let value: Value = match serde_json::from_slice(raw)? {
        Value::String(inner) => serde_json::from_str(&inner)?,
        other => other,
    };
    let envelope: RawEnvelope = serde_json::from_value(value)?;

    let operation = Operation::parse(&envelope.operation_type)?;

    let id = envelope
        .document_key
        .and_then(|key| key.id)
        .ok_or(DecodeError::MissingSubjectId)?;
    let subject_id = EntityId::deserialize(&id)
        .map_err(|e: serde_json::Error| DecodeError::InvalidSubjectId(e.to_string()))?;

    Ok(ChangeEnvelope {
        operation,
        subject_id,
        payload: envelope
            .full_document
            .or(envelope.full_document_before_change),
        update_diff: envelope.update_description,
    })
}

impl ChangeEnvelope {
    /// Decodes the carried document into the typed shape `kind` guarantees.
    pub fn payload_as<T: DeserializeOwned>(&self, kind: &'static str) -> Result<T, DecodeError> {
        let payload = self.payload.as_ref().ok_or(DecodeError::MissingPayload)?;
        T::deserialize(payload).map_err(|source| DecodeError::Payload { kind, source })
    }
}
