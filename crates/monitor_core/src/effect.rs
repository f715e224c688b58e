use std::path::PathBuf;

use crate::{JobId, JobSpec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Take a lease on the job's output path before anything writes to it.
    AcquireLease { path: PathBuf },
    StartCalculation { job: JobSpec },
    /// Trip the job's cancellation token; the engine stops at its next checkpoint.
    CancelCalculation { job_id: JobId },
    ReleaseLease { path: PathBuf },
    LoadResult { path: PathBuf },
    OpenInViewer { path: PathBuf },
    WriteIssueReport { report: IssueReportDraft },
    CloseWindow,
}

/// Everything needed to file a report about the warnings a job produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueReportDraft {
    pub job_id: JobId,
    pub title: String,
    pub output_path: PathBuf,
    pub issues: Vec<String>,
}
