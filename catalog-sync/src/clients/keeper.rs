use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::{JoinError, ServiceClient};
use crate::types::{CatalogMaterializedView, EntityId};

/// The service that owns catalog data and its joins (brand, discount,
/// variants, content).
///
/// The `sync_*` calls only request a resync. Their effect shows up later as a
/// fresh event on the catalog topic, never as a return value.
#[async_trait]
pub trait CatalogKeeper: Send + Sync {
    async fn get_all_catalog_info(
        &self,
        id: EntityId,
    ) -> Result<CatalogMaterializedView, JoinError>;

    async fn sync_catalog(&self, id: EntityId) -> Result<(), JoinError>;

    async fn sync_catalogs(&self, ids: &[EntityId]) -> Result<(), JoinError>;

    async fn sync_catalog_content(&self, id: EntityId) -> Result<(), JoinError>;
}

pub struct HttpCatalogKeeper {
    inner: ServiceClient,
}

#[derive(Serialize)]
struct SyncCatalogsRequest<'a> {
    ids: &'a [EntityId],
}

impl HttpCatalogKeeper {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, JoinError> {
        Ok(Self {
            inner: ServiceClient::new(base_url, timeout)?,
        })
    }
}

#[async_trait]
impl CatalogKeeper for HttpCatalogKeeper {
    async fn get_all_catalog_info(
        &self,
        id: EntityId,
    ) -> Result<CatalogMaterializedView, JoinError> {
        self.inner
            .get_json(&format!("catalogs/{id}/info"), "catalog", id)
            .await
    }

    async fn sync_catalog(&self, id: EntityId) -> Result<(), JoinError> {
        self.inner
            .post::<()>(&format!("catalogs/{id}/sync"), None)
            .await
    }

    async fn sync_catalogs(&self, ids: &[EntityId]) -> Result<(), JoinError> {
        self.inner
            .post("catalogs/sync", Some(&SyncCatalogsRequest { ids }))
            .await
    }

    async fn sync_catalog_content(&self, id: EntityId) -> Result<(), JoinError> {
        self.inner
            .post::<()>(&format!("catalogs/{id}/content/sync"), None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method, MockServer};
    use serde_json::json;

    const CATALOG: &str = "65a1f0c2e4b0a1b2c3d4e5f6";
    const BRAND: &str = "65a1f0c2e4b0a1b2c3d4e5f7";
    const VARIANT: &str = "65a1f0c2e4b0a1b2c3d4e5f8";

    fn keeper(server: &MockServer) -> HttpCatalogKeeper {
        // Base with a path prefix, to check joins keep it
        HttpCatalogKeeper::new(&server.url("/keeper"), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn fetches_catalog_info() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(Method::GET)
                .path(format!("/keeper/catalogs/{CATALOG}/info"));
            then.status(200).json_body(json!({
                "id": CATALOG,
                "name": "Linen shirt",
                "brand_info": { "id": BRAND, "name": "Acme" },
                "base_price": 100.0,
                "retail_price": 120.0,
                "status": "Publish",
                "variants": [{ "id": VARIANT, "sku": "LS-M", "attributes": { "size": "M" } }],
                "discount_info": null
            }));
        });

        let view = keeper(&server)
            .get_all_catalog_info(CATALOG.parse().unwrap())
            .await
            .unwrap();

        mock.assert();
        assert_eq!(view.id.to_string(), CATALOG);
        assert_eq!(view.brand_info.name, "Acme");
        assert_eq!(view.variants[0].attributes["size"], "M");
        assert!(!view.variants[0].is_deleted);
        assert!(view.discount_info.is_none());
    }

    #[tokio::test]
    async fn missing_catalog_is_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(Method::GET);
            then.status(404);
        });

        let result = keeper(&server)
            .get_all_catalog_info(CATALOG.parse().unwrap())
            .await;
        assert!(matches!(
            result,
            Err(JoinError::NotFound {
                entity: "catalog",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn resync_requests() {
        let server = MockServer::start();
        let single = server.mock(|when, then| {
            when.method(Method::POST)
                .path(format!("/keeper/catalogs/{CATALOG}/sync"));
            then.status(202);
        });
        let batch = server.mock(|when, then| {
            when.method(Method::POST)
                .path("/keeper/catalogs/sync")
                .json_body(json!({ "ids": [CATALOG, BRAND] }));
            then.status(202);
        });
        let content = server.mock(|when, then| {
            when.method(Method::POST)
                .path(format!("/keeper/catalogs/{CATALOG}/content/sync"));
            then.status(500);
        });

        let keeper = keeper(&server);
        let catalog = CATALOG.parse().unwrap();
        keeper.sync_catalog(catalog).await.unwrap();
        keeper
            .sync_catalogs(&[catalog, BRAND.parse().unwrap()])
            .await
            .unwrap();
        let failed = keeper.sync_catalog_content(catalog).await;

        single.assert();
        batch.assert();
        content.assert();
        assert!(matches!(failed, Err(JoinError::Status { status, .. }) if status.as_u16() == 500));
    }
}
