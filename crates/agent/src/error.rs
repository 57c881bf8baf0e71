use crate::client::QueueClientError;
use crate::driver::DriverError;

/// Errors raised while a worker slot executes a job.
///
/// Everything except [`WorkerError::Queue`] is scoped to one chapter and is
/// turned into a failed outcome rather than aborting the job.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// The capability driver rejected or failed an operation.
    #[error("Driver failure: {0}")]
    Driver(#[from] DriverError),

    /// The stability detector hit its sample ceiling without a verdict.
    #[error("Generation did not settle within {samples} samples")]
    DetectionTimeout { samples: u32 },

    /// The generation settled on empty output.
    #[error("Generation produced no text")]
    EmptyOutput,

    /// The assignment carried a kind this worker does not implement.
    #[error("Unknown job kind: {0}")]
    UnknownJobKind(String),

    /// The assignment named a known kind but its payload could not be read.
    #[error("Malformed {0} assignment")]
    MalformedAssignment(String),

    /// The queue service could not be reached.
    #[error(transparent)]
    Queue(#[from] QueueClientError),
}
