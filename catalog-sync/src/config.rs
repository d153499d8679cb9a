use std::time::Duration;

use common_kafka::config::{ConsumerConfig, KafkaConfig};
use envconfig::Envconfig;

use crate::event::Topic;

#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    #[envconfig(from = "BIND_HOST", default = "::")]
    pub host: String,

    #[envconfig(from = "BIND_PORT", default = "3310")]
    pub port: u16,

    #[envconfig(nested = true)]
    pub kafka: KafkaConfig,

    #[envconfig(nested = true)]
    pub consumer: ConsumerConfig,

    #[envconfig(default = "catalog_changes")]
    pub catalog_topic: String,

    #[envconfig(default = "discount_changes")]
    pub discount_topic: String,

    #[envconfig(default = "inventory_changes")]
    pub inventory_topic: String,

    #[envconfig(default = "catalog_content_changes")]
    pub content_topic: String,

    #[envconfig(default = "group_changes")]
    pub group_topic: String,

    #[envconfig(default = "collection_changes")]
    pub collection_topic: String,

    #[envconfig(default = "clean_catalogs")]
    pub catalog_output_topic: String,

    #[envconfig(default = "clean_collections")]
    pub collection_output_topic: String,

    #[envconfig(default = "http://localhost:8001")]
    pub catalog_keeper_url: String,

    #[envconfig(default = "http://localhost:8002")]
    pub collection_service_url: String,

    #[envconfig(default = "5000")]
    pub request_timeout_ms: u64,

    // Loops report liveness at least this often, even with no traffic
    #[envconfig(default = "10")]
    pub consumer_idle_report_secs: u64,

    #[envconfig(default = "60")]
    pub loop_liveness_deadline_secs: u64,

    #[envconfig(default = "text")]
    pub log_format: String, // text, json
}

impl Config {
    pub fn bind(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn input_topic(&self, topic: Topic) -> &str {
        match topic {
            Topic::Catalog => &self.catalog_topic,
            Topic::Discount => &self.discount_topic,
            Topic::Inventory => &self.inventory_topic,
            Topic::Content => &self.content_topic,
            Topic::Group => &self.group_topic,
            Topic::Collection => &self.collection_topic,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn consumer_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.consumer_idle_report_secs)
    }

    pub fn log_json(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }

    pub fn loop_liveness_deadline(&self) -> Duration {
        Duration::from_secs(self.loop_liveness_deadline_secs)
    }
}
