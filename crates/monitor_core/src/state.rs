use std::path::{Path, PathBuf};

use crate::effect::IssueReportDraft;
use crate::view_model::{MonitorViewModel, DEFAULT_PROGRESS_LINES};
use crate::BoundedLog;

pub type JobId = u64;

/// Lifecycle of the job a monitor is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Running,
    CancelRequested,
    Cancelled,
    Completed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Cancelled | JobState::Completed)
    }
}

/// One invocation of the analysis engine, tied to one output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub job_id: JobId,
    pub title: String,
    pub output_path: PathBuf,
    pub generate_html: bool,
}

/// Path of the HTML rendering written next to a result file.
pub fn html_companion_path(output_path: &Path) -> PathBuf {
    output_path.with_extension("html")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorState {
    job: JobSpec,
    job_state: JobState,
    started: bool,
    progress: BoundedLog,
    issues: BoundedLog,
    has_issues: bool,
    can_close: bool,
    lease_held: bool,
    result_shown: bool,
    closed: bool,
    notice: Option<String>,
    dirty: bool,
}

impl MonitorState {
    pub fn new(job: JobSpec) -> Self {
        Self::with_progress_capacity(job, DEFAULT_PROGRESS_LINES)
    }

    pub fn with_progress_capacity(job: JobSpec, max_progress_lines: usize) -> Self {
        Self {
            job,
            job_state: JobState::Running,
            started: false,
            progress: BoundedLog::bounded(max_progress_lines),
            issues: BoundedLog::unbounded(),
            has_issues: false,
            can_close: false,
            lease_held: false,
            result_shown: false,
            closed: false,
            notice: None,
            dirty: true,
        }
    }

    pub fn job(&self) -> &JobSpec {
        &self.job
    }

    pub fn job_state(&self) -> JobState {
        self.job_state
    }

    pub fn has_issues(&self) -> bool {
        self.has_issues
    }

    pub fn can_close(&self) -> bool {
        self.can_close
    }

    pub fn lease_held(&self) -> bool {
        self.lease_held
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn progress(&self) -> &BoundedLog {
        &self.progress
    }

    pub fn issues(&self) -> &BoundedLog {
        &self.issues
    }

    pub fn view(&self) -> MonitorViewModel {
        MonitorViewModel {
            title: self.job.title.clone(),
            job_state: self.job_state,
            progress_lines: self.progress.lines().map(ToOwned::to_owned).collect(),
            issue_lines: self.issues.lines().map(ToOwned::to_owned).collect(),
            evicted_lines: self.progress.evicted(),
            can_cancel: self.job_state == JobState::Running && !self.closed,
            can_close: self.can_close && !self.closed,
            report_enabled: self.has_issues,
            result_shown: self.result_shown,
            notice: self.notice.clone(),
            closed: self.closed,
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn mark_started(&mut self) -> bool {
        if self.started || self.job_state != JobState::Running {
            return false;
        }
        self.started = true;
        self.lease_held = true;
        true
    }

    pub(crate) fn set_job_state(&mut self, next: JobState) {
        if self.job_state != next {
            self.job_state = next;
            self.mark_dirty();
        }
    }

    pub(crate) fn append_progress(&mut self, text: &str) {
        if self.progress.push_text(text) > 0 {
            self.mark_dirty();
        }
    }

    /// Any issue signal enables reporting, even one without text.
    pub(crate) fn append_issue(&mut self, text: &str) {
        self.issues.push_text(text);
        self.has_issues = true;
        self.mark_dirty();
    }

    pub(crate) fn show_document(&mut self, text: &str) {
        self.progress.replace_with_text(text);
        self.result_shown = true;
        self.mark_dirty();
    }

    pub(crate) fn allow_close(&mut self) {
        if !self.can_close {
            self.can_close = true;
            self.mark_dirty();
        }
    }

    /// Hands back the leased path exactly once; later calls return `None`.
    pub(crate) fn take_lease(&mut self) -> Option<PathBuf> {
        if std::mem::take(&mut self.lease_held) {
            Some(self.job.output_path.clone())
        } else {
            None
        }
    }

    pub(crate) fn set_notice(&mut self, notice: Option<String>) {
        if self.notice != notice {
            self.notice = notice;
            self.mark_dirty();
        }
    }

    pub(crate) fn mark_closed(&mut self) {
        self.closed = true;
        self.mark_dirty();
    }

    pub(crate) fn issue_report(&self) -> IssueReportDraft {
        IssueReportDraft {
            job_id: self.job.job_id,
            title: self.job.title.clone(),
            output_path: self.job.output_path.clone(),
            issues: self.issues.lines().map(ToOwned::to_owned).collect(),
        }
    }
}
