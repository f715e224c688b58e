use monitor_core::{JobState, MonitorViewModel};

/// One instruction for the display surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayCommand {
    UpdateStatus {
        title: String,
        state: &'static str,
        actions: Vec<&'static str>,
    },
    /// Full progress snapshot; `first_line` is the absolute index of `lines[0]`.
    SetProgress {
        lines: Vec<String>,
        first_line: u64,
        result_shown: bool,
    },
    SetIssues { lines: Vec<String> },
    SetNotice { text: Option<String> },
}

pub fn state_label(state: JobState) -> &'static str {
    match state {
        JobState::Running => "Running",
        JobState::CancelRequested => "Cancelling",
        JobState::Cancelled => "Cancelled",
        JobState::Completed => "Completed",
    }
}

pub fn render(view: &MonitorViewModel) -> Vec<DisplayCommand> {
    let mut actions = Vec::new();
    if view.can_cancel {
        actions.push("cancel");
    }
    if view.can_close {
        actions.push("close");
    }
    if view.report_enabled {
        actions.push("report issue");
    }

    vec![
        DisplayCommand::UpdateStatus {
            title: view.title.clone(),
            state: state_label(view.job_state),
            actions,
        },
        DisplayCommand::SetProgress {
            lines: view.progress_lines.clone(),
            first_line: view.evicted_lines,
            result_shown: view.result_shown,
        },
        DisplayCommand::SetIssues {
            lines: view.issue_lines.clone(),
        },
        DisplayCommand::SetNotice {
            text: view.notice.clone(),
        },
    ]
}
