use std::time::Duration;

use async_trait::async_trait;

use super::{JoinError, ServiceClient};
use crate::types::{CollectionSnapshot, EntityId};

/// Owner of collection documents and of the catalog snapshots cached on them.
#[async_trait]
pub trait CollectionService: Send + Sync {
    /// Current stored collection, with its cached catalog info.
    async fn get_collection(&self, id: EntityId) -> Result<CollectionSnapshot, JoinError>;

    /// Rebuilds the cached catalog info of every sub-collection of `id`.
    async fn add_catalog_info_to_collection(&self, id: EntityId) -> Result<(), JoinError>;

    /// Refreshes the cached copy of `catalog_id` in every collection holding it.
    async fn update_collection_catalog_info(&self, catalog_id: EntityId)
        -> Result<(), JoinError>;
}

pub struct HttpCollectionService {
    inner: ServiceClient,
}

impl HttpCollectionService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, JoinError> {
        Ok(Self {
            inner: ServiceClient::new(base_url, timeout)?,
        })
    }
}

#[async_trait]
impl CollectionService for HttpCollectionService {
    async fn get_collection(&self, id: EntityId) -> Result<CollectionSnapshot, JoinError> {
        self.inner
            .get_json(&format!("collections/{id}"), "collection", id)
            .await
    }

    async fn add_catalog_info_to_collection(&self, id: EntityId) -> Result<(), JoinError> {
        self.inner
            .post::<()>(&format!("collections/{id}/catalog-info"), None)
            .await
    }

    async fn update_collection_catalog_info(
        &self,
        catalog_id: EntityId,
    ) -> Result<(), JoinError> {
        self.inner
            .post::<()>(&format!("catalogs/{catalog_id}/collection-info"), None)
            .await
    }
}
