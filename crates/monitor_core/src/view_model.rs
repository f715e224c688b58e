use crate::JobState;

/// Progress lines kept on screen before the oldest are dropped.
pub const DEFAULT_PROGRESS_LINES: usize = 999;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MonitorViewModel {
    pub title: String,
    pub job_state: JobState,
    pub progress_lines: Vec<String>,
    pub issue_lines: Vec<String>,
    pub evicted_lines: u64,
    pub can_cancel: bool,
    pub can_close: bool,
    pub report_enabled: bool,
    pub result_shown: bool,
    /// Blocking message the user must dismiss.
    pub notice: Option<String>,
    pub closed: bool,
    pub dirty: bool,
}
