use crate::{codec::EncodingError, transform::StageError};
use thiserror::Error;

/// Everything that can stop a pipeline, from building it to draining it.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unknown stage `{0}`")]
    UnknownStage(String),

    #[error("invalid option `{option}` for stage `{stage}`: {reason}")]
    StageConfiguration {
        stage: String,
        option: String,
        reason: String,
    },

    #[error("stage `{stage}` failed on item {index}: {source}")]
    TransformFailure {
        stage: String,
        /// Zero-based position of the item in the stage's input.
        index: usize,
        #[source]
        source: StageError,
    },

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("could not start {workers} workers for stage `{stage}`: {source}")]
    WorkerPool {
        stage: String,
        workers: usize,
        #[source]
        source: rayon::ThreadPoolBuildError,
    },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
