//! Run monitor core: pure state machine and view-model helpers.
mod bounded_log;
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use bounded_log::BoundedLog;
pub use effect::{Effect, IssueReportDraft};
pub use msg::Msg;
pub use state::{html_companion_path, JobId, JobSpec, JobState, MonitorState};
pub use update::update;
pub use view_model::{MonitorViewModel, DEFAULT_PROGRESS_LINES};
