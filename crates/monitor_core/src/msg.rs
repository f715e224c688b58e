use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The monitor window is up; acquire the lease and launch the calculation.
    JobStarted,
    /// Engine progress text (may span several lines).
    ProgressPushed(String),
    /// Engine warning or error text.
    IssuePushed(String),
    /// User clicked Cancel.
    CancelClicked,
    /// Engine acknowledged cancellation.
    JobCancelled,
    /// Engine finished and wrote its result file.
    JobCompleted { result_path: PathBuf },
    /// Engine aborted with an error.
    JobFailed { reason: String },
    /// Result document read back from disk.
    ResultLoaded { content: String },
    /// Result document could not be read.
    ResultUnavailable { reason: String },
    /// The external viewer could not be launched.
    ViewerFailed { path: PathBuf, reason: String },
    /// The display surface rejected an edit.
    DisplayEditFailed { reason: String },
    /// User clicked "Report issue".
    ReportIssueClicked,
    ReportWritten { path: PathBuf },
    ReportFailed { reason: String },
    /// User acknowledged the blocking notice.
    NoticeDismissed,
    /// User asked to close the monitor window.
    CloseRequested,
    /// The monitor is being torn down without a close request.
    Disposed,
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
