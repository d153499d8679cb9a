pub mod app_context;
pub mod clients;
pub mod config;
pub mod consumer;
pub mod emitter;
pub mod envelope;
pub mod error;
pub mod event;
pub mod metrics_consts;
pub mod readiness;
pub mod resolver;
pub mod router;
pub mod types;
