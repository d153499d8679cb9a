use crate::envelope::decode;
use crate::error::{PipelineError, ProcessError};
use crate::event::{ChangeEvent, Topic};
use crate::types::EntityId;

mod catalog;
mod collection;

pub use catalog::CatalogRouter;
pub use collection::CollectionRouter;

/// What handling one change event amounted to.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Upserted { key: EntityId },
    Tombstoned { key: EntityId },
    /// A resync was requested; its result arrives later as a catalog event.
    ResyncRequested { catalog_ids: Vec<EntityId> },
    Skipped { reason: &'static str },
}

impl Outcome {
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Upserted { .. } => "upserted",
            Outcome::Tombstoned { .. } => "tombstoned",
            Outcome::ResyncRequested { .. } => "resync_requested",
            Outcome::Skipped { .. } => "skipped",
        }
    }
}

#[derive(Debug)]
pub struct Processed {
    pub outcome: Outcome,
    /// Side effects that failed without preventing the outcome.
    pub side_effect_errors: Vec<PipelineError>,
}

impl From<Outcome> for Processed {
    fn from(outcome: Outcome) -> Self {
        Self {
            outcome,
            side_effect_errors: Vec::new(),
        }
    }
}

/// Entry point for a raw message: decode, narrow to the topic's event type,
/// hand to the owning router.
pub struct Dispatcher {
    catalog: CatalogRouter,
    collection: CollectionRouter,
}

impl Dispatcher {
    pub fn new(catalog: CatalogRouter, collection: CollectionRouter) -> Self {
        Self {
            catalog,
            collection,
        }
    }

    pub async fn dispatch(
        &self,
        topic: Topic,
        payload: Option<&[u8]>,
    ) -> Result<Processed, ProcessError> {
        let failed = |operation, subject_id, source: PipelineError| ProcessError {
            topic,
            operation,
            subject_id,
            source,
        };

        let envelope = decode(payload.unwrap_or_default())
            .map_err(|e| failed(None, None, e.into()))?;
        let operation = Some(envelope.operation);
        let subject_id = Some(envelope.subject_id);

        let event = ChangeEvent::from_envelope(topic, &envelope)
            .map_err(|e| failed(operation, subject_id, e.into()))?;

        let result = match event {
            ChangeEvent::Catalog(event) => self.catalog.on_catalog(event).await,
            ChangeEvent::Discount(event) => self.catalog.on_discount(event).await,
            ChangeEvent::Inventory(event) => self.catalog.on_inventory(event).await,
            ChangeEvent::Content(event) => self.catalog.on_content(event).await,
            ChangeEvent::Group(event) => self.catalog.on_group(event).await,
            ChangeEvent::Collection(event) => self.collection.on_collection(event).await,
        };

        result.map_err(|e| failed(operation, subject_id, e))
    }
}
