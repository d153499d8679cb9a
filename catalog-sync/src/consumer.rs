use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use common_kafka::kafka_consumer::{Offset, OffsetErr, RecvErr, SingleTopicConsumer};
use health::HealthHandle;
use metrics::{counter, histogram};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::event::Topic;
use crate::metrics_consts::{
    HANDLE_TIME, MESSAGES_DROPPED, MESSAGES_HANDLED, MESSAGES_RECEIVED, OFFSET_STORE_ERRORS,
    RECV_ERRORS, SIDE_EFFECT_FAILURES,
};
use crate::router::Dispatcher;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Recv(#[from] RecvErr),
    #[error(transparent)]
    Offset(#[from] OffsetErr),
}

/// Acknowledges one received message. Dropping it without acking leaves the
/// message to be redelivered.
pub trait Receipt: Send {
    fn ack(self) -> Result<(), SourceError>;
}

/// The consume side of the transport: raw messages, one at a time, from a
/// single topic subscription.
#[async_trait]
pub trait MessageSource: Send + Sync {
    type Receipt: Receipt;

    async fn recv(&self) -> Result<(Option<Vec<u8>>, Self::Receipt), SourceError>;
}

impl Receipt for Offset {
    fn ack(self) -> Result<(), SourceError> {
        Ok(self.store()?)
    }
}

#[async_trait]
impl MessageSource for SingleTopicConsumer {
    type Receipt = Offset;

    async fn recv(&self) -> Result<(Option<Vec<u8>>, Offset), SourceError> {
        Ok(SingleTopicConsumer::recv(self).await?)
    }
}

// Transport errors are usually broker trouble; don't spin on them
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Sequentially drains one input topic.
///
/// Every message is acked after it is handled, whether or not handling
/// succeeded: a bad event costs one stale index entry, never a stuck
/// partition.
pub struct ConsumerLoop<S> {
    topic: Topic,
    source: S,
    dispatcher: Arc<Dispatcher>,
    liveness: HealthHandle,
    idle_timeout: Duration,
}

impl<S: MessageSource> ConsumerLoop<S> {
    pub fn new(
        topic: Topic,
        source: S,
        dispatcher: Arc<Dispatcher>,
        liveness: HealthHandle,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            topic,
            source,
            dispatcher,
            liveness,
            idle_timeout,
        }
    }

    /// Runs until `shutdown` is cancelled. A message already received when
    /// that happens is still handled and acked before returning.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(topic = %self.topic, "starting consumer loop");

        loop {
            self.liveness.report_healthy();

            let received = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                received = tokio::time::timeout(self.idle_timeout, self.source.recv()) => received,
            };

            let (payload, receipt) = match received {
                // Nothing arrived, we only woke up to report liveness
                Err(_) => continue,
                Ok(Err(e)) => {
                    error!(topic = %self.topic, error = %e, "failed to receive message");
                    counter!(RECV_ERRORS, "topic" => self.topic.as_str()).increment(1);
                    tokio::time::sleep(RECV_ERROR_BACKOFF).await;
                    continue;
                }
                Ok(Ok(message)) => message,
            };

            self.handle(payload.as_deref()).await;

            if let Err(e) = receipt.ack() {
                error!(topic = %self.topic, error = %e, "failed to store offset");
                counter!(OFFSET_STORE_ERRORS, "topic" => self.topic.as_str()).increment(1);
            }
        }

        info!(topic = %self.topic, "consumer loop stopped");
    }

    /// The one place a change event's result is logged.
    async fn handle(&self, payload: Option<&[u8]>) {
        let topic = self.topic.as_str();
        counter!(MESSAGES_RECEIVED, "topic" => topic).increment(1);
        let start = Instant::now();

        match self.dispatcher.dispatch(self.topic, payload).await {
            Ok(processed) => {
                for e in &processed.side_effect_errors {
                    warn!(topic, error = %e, kind = e.kind(), "side effect failed");
                    counter!(SIDE_EFFECT_FAILURES, "topic" => topic, "kind" => e.kind())
                        .increment(1);
                }
                debug!(topic, outcome = ?processed.outcome, "handled change event");
                counter!(MESSAGES_HANDLED, "topic" => topic, "outcome" => processed.outcome.kind())
                    .increment(1);
            }
            Err(e) => {
                error!(
                    topic,
                    operation = e.operation.map(|o| o.as_str()).unwrap_or("unknown"),
                    subject_id = %e.subject_id.map(|id| id.to_hex()).unwrap_or_default(),
                    payload = %String::from_utf8_lossy(payload.unwrap_or_default()),
                    kind = e.kind(),
                    error = %e.source,
                    "dropping change event"
                );
                counter!(MESSAGES_DROPPED, "topic" => topic, "kind" => e.kind()).increment(1);
            }
        }

        histogram!(HANDLE_TIME, "topic" => topic).record(start.elapsed().as_millis() as f64);
    }
}
