use std::fmt;

use serde::Deserialize;

use crate::envelope::{ChangeEnvelope, DecodeError, Operation};
use crate::types::{EntityId, Status};

/// The input topics the service consumes, one consumer loop each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Catalog,
    Discount,
    Inventory,
    Content,
    Group,
    Collection,
}

impl Topic {
    pub const ALL: [Topic; 6] = [
        Topic::Catalog,
        Topic::Discount,
        Topic::Inventory,
        Topic::Content,
        Topic::Group,
        Topic::Collection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Catalog => "catalog",
            Topic::Discount => "discount",
            Topic::Inventory => "inventory",
            Topic::Content => "content",
            Topic::Group => "group",
            Topic::Collection => "collection",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const CATALOG_CONTENT_TYPE: &str = "catalog_content";

#[derive(Debug, Clone, Deserialize)]
struct CatalogDocument {
    status: String,
}

#[derive(Debug, Clone, Deserialize)]
struct OwnedByCatalog {
    catalog_id: EntityId,
}

#[derive(Debug, Clone, Deserialize)]
struct ContentDocument {
    #[serde(rename = "type")]
    content_type: String,
    catalog_id: EntityId,
}

#[derive(Debug, Clone, Deserialize)]
struct GroupDocument {
    status: Status,
    #[serde(default)]
    catalog_ids: Vec<EntityId>,
}

#[derive(Debug, Clone, Deserialize)]
struct CollectionDocument {
    status: Status,
}

/// A change event narrowed to what its topic guarantees. Decoded once per
/// message; routers never look at untyped documents.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    Catalog(CatalogEvent),
    Discount(OwnedChange),
    Inventory(OwnedChange),
    Content(ContentEvent),
    Group(GroupEvent),
    Collection(CollectionEvent),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEvent {
    Deleted {
        subject_id: EntityId,
    },
    Changed {
        subject_id: EntityId,
        /// `None` for a status string we don't recognise, which is handled
        /// like any other unpublished status.
        status: Option<Status>,
    },
}

/// A change to a record that belongs to a single catalog (discount, inventory).
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedChange {
    pub subject_id: EntityId,
    pub catalog_id: EntityId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentEvent {
    pub subject_id: EntityId,
    pub content_type: String,
    pub catalog_id: EntityId,
}

impl ContentEvent {
    pub fn is_catalog_content(&self) -> bool {
        self.content_type == CATALOG_CONTENT_TYPE
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupEvent {
    pub subject_id: EntityId,
    pub status: Status,
    pub catalog_ids: Vec<EntityId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CollectionEvent {
    Deleted {
        subject_id: EntityId,
    },
    Changed {
        subject_id: EntityId,
        operation: Operation,
        /// The update diff touched `sub_collections[*].catalog_ids`
        catalogs_changed: bool,
        /// Read lazily so an unreadable document never blocks the membership
        /// side effects.
        status: DocumentStatus,
    },
}

/// The publish status a collection event's document claims.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentStatus {
    Known(Status),
    /// The event carried no document
    Missing,
    /// The document was there but its status couldn't be read
    Invalid(String),
}

impl DocumentStatus {
    pub fn into_status(self) -> Result<Status, DecodeError> {
        match self {
            DocumentStatus::Known(status) => Ok(status),
            DocumentStatus::Missing => Err(DecodeError::MissingPayload),
            DocumentStatus::Invalid(reason) => Err(DecodeError::InvalidStatus {
                kind: "collection",
                reason,
            }),
        }
    }
}

impl CollectionEvent {
    pub fn needs_catalog_attach(&self) -> bool {
        match self {
            CollectionEvent::Deleted { .. } => false,
            CollectionEvent::Changed {
                operation,
                catalogs_changed,
                ..
            } => *operation == Operation::Insert || *catalogs_changed,
        }
    }
}

impl ChangeEvent {
    pub fn from_envelope(topic: Topic, envelope: &ChangeEnvelope) -> Result<Self, DecodeError> {
        let subject_id = envelope.subject_id;
        let deleted = envelope.operation == Operation::Delete;

        let event = match topic {
            Topic::Catalog if deleted => ChangeEvent::Catalog(CatalogEvent::Deleted { subject_id }),
            Topic::Catalog => {
                let doc: CatalogDocument = envelope.payload_as("catalog")?;
                ChangeEvent::Catalog(CatalogEvent::Changed {
                    subject_id,
                    status: doc.status.parse().ok(),
                })
            }
            Topic::Discount => {
                let doc: OwnedByCatalog = envelope.payload_as("discount")?;
                ChangeEvent::Discount(OwnedChange {
                    subject_id,
                    catalog_id: doc.catalog_id,
                })
            }
            Topic::Inventory => {
                let doc: OwnedByCatalog = envelope.payload_as("inventory")?;
                ChangeEvent::Inventory(OwnedChange {
                    subject_id,
                    catalog_id: doc.catalog_id,
                })
            }
            Topic::Content => {
                let doc: ContentDocument = envelope.payload_as("content")?;
                ChangeEvent::Content(ContentEvent {
                    subject_id,
                    content_type: doc.content_type,
                    catalog_id: doc.catalog_id,
                })
            }
            Topic::Group => {
                let doc: GroupDocument = envelope.payload_as("group")?;
                ChangeEvent::Group(GroupEvent {
                    subject_id,
                    status: doc.status,
                    catalog_ids: doc.catalog_ids,
                })
            }
            Topic::Collection if deleted => {
                ChangeEvent::Collection(CollectionEvent::Deleted { subject_id })
            }
            Topic::Collection => {
                let status = match envelope.payload_as::<CollectionDocument>("collection") {
                    Ok(doc) => DocumentStatus::Known(doc.status),
                    Err(DecodeError::MissingPayload) => DocumentStatus::Missing,
                    Err(DecodeError::Payload { source, .. }) => {
                        DocumentStatus::Invalid(source.to_string())
                    }
                    Err(e) => DocumentStatus::Invalid(e.to_string()),
                };
                let catalogs_changed = envelope
                    .update_diff
                    .as_ref()
                    .is_some_and(|diff| diff.touches_sub_collection_catalogs());
                ChangeEvent::Collection(CollectionEvent::Changed {
                    subject_id,
                    operation: envelope.operation,
                    catalogs_changed,
                    status,
                })
            }
        };

        Ok(event)
    }
}
