//! Run monitor engine: lease registry, calculation worker and the file and
//! viewer plumbing around a finished job.
mod engine;
mod registry;
mod report;
mod result;
mod task;
mod types;
mod viewer;

pub use engine::EngineHandle;
pub use registry::{OutputFileLease, OutputFileRegistry, RegistryError};
pub use report::{ensure_report_dir, IssueReport, IssueReportWriter, ReportError};
pub use result::{load_result_document, ResultReadError, DEFAULT_RESULT_MAX_BYTES};
pub use task::{CalculationTask, ChannelProgressSink, ProgressSink};
pub use types::{CalculationError, CalculationJob, EngineEvent, JobId};
pub use viewer::{ResultViewer, SystemViewer, ViewerError};
pub use tokio_util::sync::CancellationToken;
