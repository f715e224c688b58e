use std::path::PathBuf;
use std::sync::Once;

use monitor_core::{update, Effect, JobSpec, JobState, MonitorState, Msg};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn job() -> JobSpec {
    JobSpec {
        job_id: 7,
        title: "Tree scan".to_string(),
        output_path: PathBuf::from("/out/result.txt"),
        generate_html: false,
    }
}

fn started(capacity: usize) -> MonitorState {
    let state = MonitorState::with_progress_capacity(job(), capacity);
    let (state, _) = update(state, Msg::JobStarted);
    state
}

#[test]
fn job_started_acquires_lease_then_starts_calculation() {
    init_logging();
    let (state, effects) = update(MonitorState::new(job()), Msg::JobStarted);

    assert_eq!(
        effects,
        vec![
            Effect::AcquireLease {
                path: PathBuf::from("/out/result.txt"),
            },
            Effect::StartCalculation { job: job() },
        ]
    );
    assert!(state.lease_held());
    assert_eq!(state.job_state(), JobState::Running);

    let (_, effects) = update(state, Msg::JobStarted);
    assert!(effects.is_empty());
}

#[test]
fn progress_is_capped_with_fifo_eviction() {
    init_logging();
    let mut state = started(5);
    for i in 1..=7 {
        let (next, effects) = update(state, Msg::ProgressPushed(format!("step {i}")));
        assert!(effects.is_empty());
        assert!(next.progress().len() <= 5);
        state = next;
    }

    let view = state.view();
    assert_eq!(
        view.progress_lines,
        vec!["step 3", "step 4", "step 5", "step 6", "step 7"]
    );
    assert_eq!(view.evicted_lines, 2);
}

#[test]
fn default_progress_cap_is_999() {
    init_logging();
    let mut state = MonitorState::new(job());
    let text: String = (0..1200).map(|i| format!("line {i}\n")).collect();
    let (next, _) = update(state, Msg::ProgressPushed(text));
    state = next;

    let view = state.view();
    assert_eq!(view.progress_lines.len(), 999);
    assert_eq!(view.progress_lines.first().map(String::as_str), Some("line 201"));
    assert_eq!(view.progress_lines.last().map(String::as_str), Some("line 1199"));
}

#[test]
fn first_issue_enables_report_action() {
    init_logging();
    let state = started(10);
    assert!(!state.view().report_enabled);

    let (state, _) = update(state, Msg::IssuePushed("Warning: sparse cuts".to_string()));
    let view = state.view();
    assert!(state.has_issues());
    assert!(view.report_enabled);
    assert_eq!(view.issue_lines, vec!["Warning: sparse cuts"]);
    assert!(view.progress_lines.is_empty());
}

#[test]
fn empty_issue_still_enables_report() {
    init_logging();
    let (state, _) = update(started(10), Msg::IssuePushed(String::new()));
    assert!(state.has_issues());
    assert!(state.view().report_enabled);
    assert!(state.view().issue_lines.is_empty());

    let (_, effects) = update(state, Msg::ReportIssueClicked);
    assert!(matches!(effects.as_slice(), [Effect::WriteIssueReport { .. }]));
}

#[test]
fn issue_log_is_not_capped() {
    init_logging();
    let mut state = started(3);
    for i in 0..50 {
        let (next, _) = update(state, Msg::IssuePushed(format!("issue {i}")));
        state = next;
    }
    assert_eq!(state.issues().len(), 50);
}

#[test]
fn completion_makes_monitor_closable_and_loads_result() {
    init_logging();
    let (state, effects) = update(
        started(10),
        Msg::JobCompleted {
            result_path: PathBuf::from("/out/result.txt"),
        },
    );

    assert_eq!(state.job_state(), JobState::Completed);
    assert!(state.can_close());
    assert!(state.lease_held());
    assert_eq!(
        effects,
        vec![Effect::LoadResult {
            path: PathBuf::from("/out/result.txt"),
        }]
    );
}

#[test]
fn completion_with_html_opens_companion_in_viewer() {
    init_logging();
    let mut spec = job();
    spec.generate_html = true;
    let (state, _) = update(MonitorState::new(spec), Msg::JobStarted);

    let (_, effects) = update(
        state,
        Msg::JobCompleted {
            result_path: PathBuf::from("/out/result.txt"),
        },
    );

    assert_eq!(
        effects,
        vec![
            Effect::LoadResult {
                path: PathBuf::from("/out/result.txt"),
            },
            Effect::OpenInViewer {
                path: PathBuf::from("/out/result.html"),
            },
        ]
    );
}

#[test]
fn close_is_ignored_for_terminal_job_until_closable() {
    init_logging();
    let (state, _) = update(started(10), Msg::CancelClicked);
    let (state, effects) = update(state, Msg::CloseRequested);

    assert!(effects.is_empty());
    assert!(!state.is_closed());
    assert_eq!(state.job_state(), JobState::CancelRequested);
}

#[test]
fn close_after_completion_releases_lease_once() {
    init_logging();
    let (state, _) = update(
        started(10),
        Msg::JobCompleted {
            result_path: PathBuf::from("/out/result.txt"),
        },
    );
    let (state, effects) = update(state, Msg::CloseRequested);

    assert_eq!(
        effects,
        vec![
            Effect::ReleaseLease {
                path: PathBuf::from("/out/result.txt"),
            },
            Effect::CloseWindow,
        ]
    );
    assert!(state.is_closed());
    assert!(!state.lease_held());

    let (_, effects) = update(state, Msg::Disposed);
    assert!(effects.is_empty());
}

#[test]
fn display_edit_failure_forces_closable() {
    init_logging();
    let (state, effects) = update(
        started(10),
        Msg::DisplayEditFailed {
            reason: "stdout closed".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert!(state.can_close());
    assert_eq!(state.job_state(), JobState::Running);

    let (state, effects) = update(state, Msg::CloseRequested);
    assert!(state.is_closed());
    assert_eq!(
        effects,
        vec![
            Effect::CancelCalculation { job_id: 7 },
            Effect::ReleaseLease {
                path: PathBuf::from("/out/result.txt"),
            },
            Effect::CloseWindow,
        ]
    );
    assert_eq!(state.job_state(), JobState::CancelRequested);
}

#[test]
fn dispose_releases_a_held_lease() {
    init_logging();
    let (state, effects) = update(started(10), Msg::Disposed);
    assert_eq!(
        effects,
        vec![
            Effect::CancelCalculation { job_id: 7 },
            Effect::ReleaseLease {
                path: PathBuf::from("/out/result.txt"),
            },
        ]
    );
    assert!(state.is_closed());
}

#[test]
fn dirty_flag_tracks_visible_changes() {
    init_logging();
    let mut state = started(10);
    assert!(state.consume_dirty());
    assert!(!state.consume_dirty());

    let (mut state, _) = update(state, Msg::Tick);
    assert!(!state.consume_dirty());

    let (mut state, _) = update(state, Msg::ProgressPushed("tick".to_string()));
    assert!(state.consume_dirty());
}
