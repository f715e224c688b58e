use std::path::Path;

use crate::{html_companion_path, Effect, JobState, MonitorState, Msg};

const CANCEL_NOTICE: &str = "Job cancelled by user.";
const CANCEL_NOTICE_WITH_ISSUES: &str =
    "Job cancelled. Please review the 'Warnings/Errors' window below.";
const FAILED_NOTICE: &str =
    "The analysis terminated unexpectedly. Please review the 'Warnings/Errors' window below.";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: MonitorState, msg: Msg) -> (MonitorState, Vec<Effect>) {
    if state.is_closed() {
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::JobStarted => {
            if state.mark_started() {
                state.mark_dirty();
                vec![
                    Effect::AcquireLease {
                        path: state.job().output_path.clone(),
                    },
                    Effect::StartCalculation {
                        job: state.job().clone(),
                    },
                ]
            } else {
                Vec::new()
            }
        }
        Msg::ProgressPushed(text) => {
            state.append_progress(&text);
            Vec::new()
        }
        Msg::IssuePushed(text) => {
            state.append_issue(&text);
            Vec::new()
        }
        Msg::CancelClicked => request_cancel(&mut state),
        Msg::JobCancelled => {
            if state.job_state().is_terminal() {
                return (state, Vec::new());
            }
            state.set_job_state(JobState::Cancelled);
            state.allow_close();
            release_lease(&mut state)
        }
        Msg::JobCompleted { result_path } => {
            if state.job_state().is_terminal() {
                return (state, Vec::new());
            }
            state.set_job_state(JobState::Completed);
            state.allow_close();
            // The lease stays held while the result is on screen.
            let mut effects = vec![Effect::LoadResult { path: result_path }];
            if state.job().generate_html {
                effects.push(Effect::OpenInViewer {
                    path: html_companion_path(&state.job().output_path),
                });
            }
            effects
        }
        Msg::JobFailed { reason } => {
            if state.job_state().is_terminal() {
                return (state, Vec::new());
            }
            state.append_issue(&reason);
            state.append_progress(FAILED_NOTICE);
            state.set_job_state(JobState::Completed);
            state.allow_close();
            release_lease(&mut state)
        }
        Msg::ResultLoaded { content } => {
            if state.job_state() == JobState::Completed {
                state.show_document(&content);
            }
            Vec::new()
        }
        Msg::ResultUnavailable { reason } => {
            if state.job_state() == JobState::Completed {
                let fallback = result_fallback(&state.job().output_path, &reason);
                state.show_document(&fallback);
            }
            Vec::new()
        }
        Msg::ViewerFailed { path, reason } => {
            state.append_issue(&format!(
                "Unable to open '{}' in the default viewer: {}",
                path.display(),
                reason
            ));
            Vec::new()
        }
        Msg::DisplayEditFailed { .. } => {
            // Never leave the user stuck with a window that refuses to close.
            state.allow_close();
            Vec::new()
        }
        Msg::ReportIssueClicked => {
            if state.has_issues() {
                vec![Effect::WriteIssueReport {
                    report: state.issue_report(),
                }]
            } else {
                Vec::new()
            }
        }
        Msg::ReportWritten { path } => {
            state.append_progress(&format!("Issue report saved to {}", path.display()));
            Vec::new()
        }
        Msg::ReportFailed { reason } => {
            state.set_notice(Some(format!("Unable to create the issue report: {reason}")));
            Vec::new()
        }
        Msg::NoticeDismissed => {
            state.set_notice(None);
            Vec::new()
        }
        Msg::CloseRequested => {
            if state.can_close() {
                // Forced closable while the engine is still going.
                let mut effects = abandon_running_job(&mut state);
                effects.extend(release_lease(&mut state));
                state.mark_closed();
                effects.push(Effect::CloseWindow);
                effects
            } else if state.job_state() == JobState::Running {
                request_cancel(&mut state)
            } else {
                Vec::new()
            }
        }
        Msg::Disposed => {
            let mut effects = abandon_running_job(&mut state);
            effects.extend(release_lease(&mut state));
            state.mark_closed();
            effects
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn request_cancel(state: &mut MonitorState) -> Vec<Effect> {
    if state.job_state() != JobState::Running {
        return Vec::new();
    }
    state.set_job_state(JobState::CancelRequested);
    let notice = if state.has_issues() {
        CANCEL_NOTICE_WITH_ISSUES
    } else {
        CANCEL_NOTICE
    };
    state.append_progress(notice);

    let mut effects = vec![Effect::CancelCalculation {
        job_id: state.job().job_id,
    }];
    // Released before the engine confirms so a winding-down job blocks nothing.
    effects.extend(release_lease(state));
    effects
}

fn abandon_running_job(state: &mut MonitorState) -> Vec<Effect> {
    if state.job_state() != JobState::Running {
        return Vec::new();
    }
    state.set_job_state(JobState::CancelRequested);
    vec![Effect::CancelCalculation {
        job_id: state.job().job_id,
    }]
}

fn release_lease(state: &mut MonitorState) -> Vec<Effect> {
    state
        .take_lease()
        .map(|path| Effect::ReleaseLease { path })
        .into_iter()
        .collect()
}

fn result_fallback(output_path: &Path, reason: &str) -> String {
    format!(
        "Unable to display the analysis results ({reason}).\n\
         The results were written to: {}",
        output_path.display()
    )
}
