use std::time::Duration;

use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::types::EntityId;

mod collection_service;
mod keeper;

pub use collection_service::{CollectionService, HttpCollectionService};
pub use keeper::{CatalogKeeper, HttpCatalogKeeper};

#[derive(Debug, Error)]
pub enum JoinError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: EntityId },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status { status: StatusCode, url: String },
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

/// Shared plumbing for the JSON-over-HTTP collaborators.
#[derive(Clone)]
struct ServiceClient {
    client: reqwest::Client,
    base: Url,
}

impl ServiceClient {
    fn new(base_url: &str, timeout: Duration) -> Result<Self, JoinError> {
        // Url::join drops the last path segment unless the base ends in '/'
        let base = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{base_url}/"))?
        };
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }

    fn url(&self, path: &str) -> Result<Url, JoinError> {
        Ok(self.base.join(path)?)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        entity: &'static str,
        id: EntityId,
    ) -> Result<T, JoinError> {
        let url = self.url(path)?;
        let response = self.client.get(url.clone()).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(JoinError::NotFound { entity, id }),
            status if status.is_success() => Ok(response.json().await?),
            status => Err(JoinError::Status {
                status,
                url: url.to_string(),
            }),
        }
    }

    async fn post<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), JoinError> {
        let url = self.url(path)?;
        let mut request = self.client.post(url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(JoinError::Status {
                status,
                url: url.to_string(),
            })
        }
    }
}
