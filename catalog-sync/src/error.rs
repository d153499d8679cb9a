use thiserror::Error;

use crate::clients::JoinError;
use crate::emitter::PublishError;
use crate::envelope::{DecodeError, Operation};
use crate::event::Topic;
use crate::types::EntityId;

/// Anything that can go wrong while handling one change event. All of them
/// end the same way: logged once, message dropped, offset stored.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Join(#[from] JoinError),
    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl PipelineError {
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Decode(_) => "decode",
            PipelineError::Join(_) => "join",
            PipelineError::Publish(_) => "publish",
        }
    }
}

/// A `PipelineError` with what is known about the event that caused it.
#[derive(Debug, Error)]
#[error("failed to handle {topic} change: {source}")]
pub struct ProcessError {
    pub topic: Topic,
    pub operation: Option<Operation>,
    pub subject_id: Option<EntityId>,
    #[source]
    pub source: PipelineError,
}

impl ProcessError {
    pub fn kind(&self) -> &'static str {
        self.source.kind()
    }
}
