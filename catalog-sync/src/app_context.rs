use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use common_kafka::kafka_consumer::SingleTopicConsumer;
use common_kafka::kafka_producer::create_kafka_producer;
use health::{HealthHandle, HealthRegistry};
use tracing::info;

use crate::clients::{CatalogKeeper, CollectionService, HttpCatalogKeeper, HttpCollectionService};
use crate::config::Config;
use crate::consumer::ConsumerLoop;
use crate::emitter::{Emitter, KafkaPublisher, Publisher};
use crate::event::Topic;
use crate::router::{CatalogRouter, CollectionRouter, Dispatcher};

/// Everything the process needs, wired once at startup.
pub struct AppContext {
    pub health_registry: HealthRegistry,
    pub loops: Vec<ConsumerLoop<SingleTopicConsumer>>,
    pub config: Config,
}

impl AppContext {
    pub async fn new(config: Config) -> Result<Self> {
        let health_registry = HealthRegistry::new("liveness");

        let producer_liveness =
            health_registry.register("rdkafka_producer", Duration::from_secs(30));
        let producer = create_kafka_producer(&config.kafka, producer_liveness).await?;
        let publisher: Arc<dyn Publisher> = Arc::new(KafkaPublisher::new(producer));

        let keeper: Arc<dyn CatalogKeeper> = Arc::new(HttpCatalogKeeper::new(
            &config.catalog_keeper_url,
            config.request_timeout(),
        )?);
        let collections: Arc<dyn CollectionService> = Arc::new(HttpCollectionService::new(
            &config.collection_service_url,
            config.request_timeout(),
        )?);

        let catalog_emitter = Emitter::new(publisher.clone(), &config.catalog_output_topic);
        let collection_emitter = Emitter::new(publisher, &config.collection_output_topic);

        let dispatcher = Arc::new(Dispatcher::new(
            CatalogRouter::new(keeper, collections.clone(), catalog_emitter),
            CollectionRouter::new(collections, collection_emitter),
        ));

        let mut loops = Vec::with_capacity(Topic::ALL.len());
        for topic in Topic::ALL {
            let name = config.input_topic(topic);
            let consumer = SingleTopicConsumer::new(&config.kafka, &config.consumer, name)?;
            let liveness = loop_liveness(&health_registry, topic, config.loop_liveness_deadline());
            info!(%topic, input = consumer.topic(), "subscribed");
            loops.push(ConsumerLoop::new(
                topic,
                consumer,
                dispatcher.clone(),
                liveness,
                config.consumer_idle_timeout(),
            ));
        }

        Ok(Self {
            health_registry,
            loops,
            config,
        })
    }
}

fn loop_liveness(registry: &HealthRegistry, topic: Topic, deadline: Duration) -> HealthHandle {
    registry.register(format!("{topic}_loop"), deadline)
}
