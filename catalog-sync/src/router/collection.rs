use std::sync::Arc;

use super::{Outcome, Processed};
use crate::clients::CollectionService;
use crate::emitter::Emitter;
use crate::error::PipelineError;
use crate::event::CollectionEvent;
use crate::resolver::resolve;

/// Handles the collection topic. Unlike catalogs, the join happens here: the
/// stored collection is read back and flattened by the resolver.
pub struct CollectionRouter {
    collections: Arc<dyn CollectionService>,
    emitter: Emitter,
}

impl CollectionRouter {
    pub fn new(collections: Arc<dyn CollectionService>, emitter: Emitter) -> Self {
        Self {
            collections,
            emitter,
        }
    }

    pub async fn on_collection(&self, event: CollectionEvent) -> Result<Processed, PipelineError> {
        let needs_attach = event.needs_catalog_attach();
        let (subject_id, status) = match event {
            CollectionEvent::Deleted { subject_id } => {
                self.emitter.emit_tombstone(subject_id).await?;
                return Ok(Outcome::Tombstoned { key: subject_id }.into());
            }
            CollectionEvent::Changed {
                subject_id, status, ..
            } => (subject_id, status),
        };

        let mut side_effect_errors = Vec::new();

        // Inserts have no cached catalog info yet, and a membership change
        // makes the cached info stale. The attach is awaited and the
        // collection is read only afterwards, so the view below sees the
        // attached state as long as the service applies it before answering.
        // If the service only queues it, the write it eventually makes is a
        // new collection event that converges the index.
        if needs_attach {
            if let Err(e) = self
                .collections
                .add_catalog_info_to_collection(subject_id)
                .await
            {
                side_effect_errors.push(e.into());
            }
        }

        let status = status.into_status()?;
        // Unpublished collections are left alone, only deletes tombstone them
        if !status.is_published() {
            return Ok(Processed {
                outcome: Outcome::Skipped {
                    reason: "collection not published",
                },
                side_effect_errors,
            });
        }

        let snapshot = self.collections.get_collection(subject_id).await?;
        // The stored document may have moved on since the event was emitted
        if !snapshot.status.is_published() {
            return Ok(Processed {
                outcome: Outcome::Skipped {
                    reason: "collection no longer published",
                },
                side_effect_errors,
            });
        }

        let view = resolve(&snapshot);
        self.emitter.emit_view(view.id, &view).await?;

        Ok(Processed {
            outcome: Outcome::Upserted { key: view.id },
            side_effect_errors,
        })
    }
}
