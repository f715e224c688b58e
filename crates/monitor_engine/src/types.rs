use std::path::PathBuf;

use thiserror::Error;

pub type JobId = u64;

/// What the engine needs to know about one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculationJob {
    pub job_id: JobId,
    pub output_path: PathBuf,
    pub generate_html: bool,
}

/// Signals pushed from the calculation toward the monitor, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Progress { job_id: JobId, text: String },
    Issue { job_id: JobId, text: String },
    Completed { job_id: JobId, result_path: PathBuf },
    Cancelled { job_id: JobId },
    Failed { job_id: JobId, error: CalculationError },
}

impl EngineEvent {
    pub fn job_id(&self) -> JobId {
        match self {
            EngineEvent::Progress { job_id, .. }
            | EngineEvent::Issue { job_id, .. }
            | EngineEvent::Completed { job_id, .. }
            | EngineEvent::Cancelled { job_id }
            | EngineEvent::Failed { job_id, .. } => *job_id,
        }
    }

    /// True for the last event a job emits.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EngineEvent::Completed { .. } | EngineEvent::Cancelled { .. } | EngineEvent::Failed { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalculationError {
    #[error("cancelled")]
    Cancelled,
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("output file {0:?} is in use by another job")]
    OutputInUse(PathBuf),
    #[error("io error: {0}")]
    Io(String),
    #[error("calculation failed: {0}")]
    Engine(String),
    #[error("engine worker unavailable")]
    WorkerUnavailable,
}

impl From<std::io::Error> for CalculationError {
    fn from(err: std::io::Error) -> Self {
        CalculationError::Io(err.to_string())
    }
}
