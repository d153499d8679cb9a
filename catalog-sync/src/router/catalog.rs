use std::sync::Arc;

use super::{Outcome, Processed};
use crate::clients::{CatalogKeeper, CollectionService};
use crate::emitter::Emitter;
use crate::error::PipelineError;
use crate::event::{CatalogEvent, ContentEvent, GroupEvent, OwnedChange};

/// Handles the catalog topic and the topics of records that hang off a
/// catalog (discount, inventory, content, group).
///
/// Only catalog events publish anything. Every other topic asks the Catalog
/// Keeper for a resync, and the resync comes back around as a catalog event.
pub struct CatalogRouter {
    keeper: Arc<dyn CatalogKeeper>,
    collections: Arc<dyn CollectionService>,
    emitter: Emitter,
}

impl CatalogRouter {
    pub fn new(
        keeper: Arc<dyn CatalogKeeper>,
        collections: Arc<dyn CollectionService>,
        emitter: Emitter,
    ) -> Self {
        Self {
            keeper,
            collections,
            emitter,
        }
    }

    pub async fn on_catalog(&self, event: CatalogEvent) -> Result<Processed, PipelineError> {
        let (subject_id, status) = match event {
            CatalogEvent::Deleted { subject_id } => {
                self.emitter.emit_tombstone(subject_id).await?;
                return Ok(Outcome::Tombstoned { key: subject_id }.into());
            }
            CatalogEvent::Changed { subject_id, status } => (subject_id, status),
        };

        // Anything not published must leave the index, no join needed for that
        if !status.is_some_and(|s| s.is_published()) {
            self.emitter.emit_tombstone(subject_id).await?;
            return Ok(Outcome::Tombstoned { key: subject_id }.into());
        }

        let view = self.keeper.get_all_catalog_info(subject_id).await?;
        // The keeper is authoritative for identity, key on what it returned
        let key = view.id;
        self.emitter.emit_view(key, &view).await?;

        let mut processed = Processed::from(Outcome::Upserted { key });
        if let Err(e) = self.collections.update_collection_catalog_info(key).await {
            processed.side_effect_errors.push(e.into());
        }
        Ok(processed)
    }

    pub async fn on_discount(&self, event: OwnedChange) -> Result<Processed, PipelineError> {
        self.resync(event).await
    }

    pub async fn on_inventory(&self, event: OwnedChange) -> Result<Processed, PipelineError> {
        self.resync(event).await
    }

    pub async fn on_content(&self, event: ContentEvent) -> Result<Processed, PipelineError> {
        if !event.is_catalog_content() {
            return Ok(Outcome::Skipped {
                reason: "not catalog content",
            }
            .into());
        }

        self.keeper.sync_catalog_content(event.catalog_id).await?;
        Ok(Outcome::ResyncRequested {
            catalog_ids: vec![event.catalog_id],
        }
        .into())
    }

    pub async fn on_group(&self, event: GroupEvent) -> Result<Processed, PipelineError> {
        if !event.status.is_published() {
            return Ok(Outcome::Skipped {
                reason: "group not published",
            }
            .into());
        }
        if event.catalog_ids.is_empty() {
            return Ok(Outcome::Skipped {
                reason: "group has no catalogs",
            }
            .into());
        }

        self.keeper.sync_catalogs(&event.catalog_ids).await?;
        Ok(Outcome::ResyncRequested {
            catalog_ids: event.catalog_ids,
        }
        .into())
    }

    async fn resync(&self, event: OwnedChange) -> Result<Processed, PipelineError> {
        self.keeper.sync_catalog(event.catalog_id).await?;
        Ok(Outcome::ResyncRequested {
            catalog_ids: vec![event.catalog_id],
        }
        .into())
    }
}
