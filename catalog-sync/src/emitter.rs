use std::sync::Arc;

use async_trait::async_trait;
use common_kafka::kafka_producer::{send_keyed_to_kafka, KafkaContext, KafkaProduceError};
use rdkafka::producer::FutureProducer;
use serde::Serialize;
use thiserror::Error;

use crate::types::EntityId;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to serialize document: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Produce(#[from] KafkaProduceError),
}

/// The produce side of the transport. A `None` value is the tombstone the
/// indexer reads as "drop this key".
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, value: Option<&[u8]>)
        -> Result<(), PublishError>;
}

pub struct KafkaPublisher {
    producer: FutureProducer<KafkaContext>,
}

impl KafkaPublisher {
    pub fn new(producer: FutureProducer<KafkaContext>) -> Self {
        Self { producer }
    }
}

#[async_trait]
impl Publisher for KafkaPublisher {
    async fn publish(
        &self,
        topic: &str,
        key: &str,
        value: Option<&[u8]>,
    ) -> Result<(), PublishError> {
        send_keyed_to_kafka(&self.producer, topic, key, value).await?;
        Ok(())
    }
}

/// Republishes materialized views onto one output topic, keyed by entity id
/// so a later upsert or tombstone replaces whatever the index holds.
///
/// Every call waits for delivery before returning, which keeps messages for
/// the same key in order within a consumer loop.
#[derive(Clone)]
pub struct Emitter {
    publisher: Arc<dyn Publisher>,
    topic: String,
}

impl Emitter {
    pub fn new(publisher: Arc<dyn Publisher>, topic: impl Into<String>) -> Self {
        Self {
            publisher,
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub async fn emit_upsert(&self, key: EntityId, document: &[u8]) -> Result<(), PublishError> {
        self.publisher
            .publish(&self.topic, &key.to_hex(), Some(document))
            .await
    }

    pub async fn emit_tombstone(&self, key: EntityId) -> Result<(), PublishError> {
        self.publisher.publish(&self.topic, &key.to_hex(), None).await
    }

    /// Marshals `view` and upserts it under `key`.
    pub async fn emit_view<T: Serialize + Sync>(
        &self,
        key: EntityId,
        view: &T,
    ) -> Result<(), PublishError> {
        let document = serde_json::to_vec(view)?;
        self.emit_upsert(key, &document).await
    }
}
