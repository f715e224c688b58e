use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::thread;
use std::time::{Duration, Instant};

use monitor_app::{run_monitor, MonitorSettings, SimulatedCalculation, SimulationSettings};
use monitor_core::JobState;
use monitor_engine::{
    CalculationError, CalculationJob, CalculationTask, CancellationToken, OutputFileRegistry,
    ProgressSink, ResultViewer, ViewerError,
};
use tempfile::TempDir;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

#[derive(Default)]
struct RecordingViewer {
    opened: Mutex<Vec<PathBuf>>,
    fail: bool,
}

impl ResultViewer for RecordingViewer {
    fn open(&self, path: &Path) -> Result<(), ViewerError> {
        self.opened.lock().unwrap().push(path.to_path_buf());
        if self.fail {
            Err(ViewerError::Missing)
        } else {
            Ok(())
        }
    }
}

fn settings(temp: &TempDir, simulation: SimulationSettings) -> MonitorSettings {
    MonitorSettings {
        output_path: temp.path().join("out").join("results.txt"),
        report_dir: temp.path().join("reports"),
        simulation,
        ..MonitorSettings::default()
    }
}

fn quick(steps: u32) -> SimulationSettings {
    SimulationSettings {
        steps,
        step_delay_ms: 1,
        ..SimulationSettings::default()
    }
}

fn simulated(settings: &MonitorSettings) -> Arc<SimulatedCalculation> {
    Arc::new(SimulatedCalculation::new(settings.simulation.clone()))
}

#[test]
fn completed_job_shows_result_and_releases_lease_on_close() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let settings = settings(&temp, quick(3));
    let registry = OutputFileRegistry::new();
    let viewer = Arc::new(RecordingViewer::default());

    let outcome = run_monitor(
        &settings,
        1,
        registry.clone(),
        simulated(&settings),
        viewer.clone(),
        Vec::new(),
    );

    assert_eq!(outcome.view.job_state, JobState::Completed);
    assert!(outcome.view.closed);
    assert!(outcome.view.result_shown);
    assert_eq!(outcome.view.progress_lines[0], "Tree scan results");
    assert!(!registry.is_leased(&settings.output_path));
    assert!(viewer.opened.lock().unwrap().is_empty());

    let printed = String::from_utf8(outcome.output).unwrap();
    assert!(printed.contains("-- results --"), "output was {printed}");
    assert!(printed.contains("[Completed]"));
}

#[test]
fn html_companion_is_opened_and_viewer_failure_becomes_issue() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let mut settings = settings(&temp, quick(2));
    settings.generate_html = true;
    let viewer = Arc::new(RecordingViewer {
        fail: true,
        ..RecordingViewer::default()
    });

    let outcome = run_monitor(
        &settings,
        2,
        OutputFileRegistry::new(),
        simulated(&settings),
        viewer.clone(),
        Vec::new(),
    );

    let html = settings.output_path.with_extension("html");
    assert!(html.exists());
    assert_eq!(*viewer.opened.lock().unwrap(), vec![html]);
    assert_eq!(outcome.view.job_state, JobState::Completed);
    assert!(outcome.view.report_enabled);
    assert!(outcome.view.issue_lines[0].starts_with("Unable to open"));
}

#[test]
fn cancel_stops_the_job_cooperatively() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let settings = settings(
        &temp,
        SimulationSettings {
            steps: 10_000,
            step_delay_ms: 2,
            cancel_after_lines: Some(3),
            ..SimulationSettings::default()
        },
    );
    let registry = OutputFileRegistry::new();

    let outcome = run_monitor(
        &settings,
        3,
        registry.clone(),
        simulated(&settings),
        Arc::new(RecordingViewer::default()),
        Vec::new(),
    );

    assert_eq!(outcome.view.job_state, JobState::Cancelled);
    assert!(outcome
        .view
        .progress_lines
        .iter()
        .any(|line| line == "Job cancelled by user."));
    assert!(!registry.is_leased(&settings.output_path));
    assert!(!settings.output_path.exists());
}

#[test]
fn engine_failure_is_shown_as_issue() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let settings = settings(
        &temp,
        SimulationSettings {
            fail_at_step: Some(2),
            ..quick(5)
        },
    );

    let outcome = run_monitor(
        &settings,
        4,
        OutputFileRegistry::new(),
        simulated(&settings),
        Arc::new(RecordingViewer::default()),
        Vec::new(),
    );

    assert_eq!(outcome.view.job_state, JobState::Completed);
    assert_eq!(
        outcome.view.issue_lines,
        vec!["calculation failed: simulated failure at step 2"]
    );
}

/// Claims success but never writes the result file.
struct NoResult;

#[async_trait::async_trait]
impl CalculationTask for NoResult {
    async fn run(
        &self,
        job: &CalculationJob,
        sink: &dyn ProgressSink,
        _cancel: &CancellationToken,
    ) -> Result<PathBuf, CalculationError> {
        sink.push_progress(job.job_id, "done");
        Ok(job.output_path.clone())
    }
}

#[test]
fn unreadable_result_falls_back_to_output_path_message() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let settings = settings(&temp, quick(1));

    let outcome = run_monitor(
        &settings,
        5,
        OutputFileRegistry::new(),
        Arc::new(NoResult),
        Arc::new(RecordingViewer::default()),
        Vec::new(),
    );

    let text = outcome.view.progress_lines.join("\n");
    assert!(
        text.contains(&settings.output_path.display().to_string()),
        "progress was {text:?}"
    );
    assert!(text.contains("result file not found"));
}

#[test]
fn output_leased_elsewhere_is_not_overwritten() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let settings = settings(&temp, quick(2));
    let registry = OutputFileRegistry::new();
    registry.acquire(&settings.output_path);

    let outcome = run_monitor(
        &settings,
        6,
        registry.clone(),
        simulated(&settings),
        Arc::new(RecordingViewer::default()),
        Vec::new(),
    );

    assert_eq!(outcome.view.job_state, JobState::Completed);
    assert!(outcome.view.issue_lines[0].contains("in use by another job"));
    assert!(!settings.output_path.exists());
    assert_eq!(registry.lease_count(&settings.output_path), 1);
}

#[test]
fn warnings_produce_an_issue_report_when_auto_report_is_on() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let mut settings = settings(
        &temp,
        SimulationSettings {
            warn_every: 2,
            ..quick(4)
        },
    );
    settings.auto_report = true;

    let outcome = run_monitor(
        &settings,
        7,
        OutputFileRegistry::new(),
        simulated(&settings),
        Arc::new(RecordingViewer::default()),
        Vec::new(),
    );

    assert_eq!(outcome.view.issue_lines.len(), 2);
    let report = fs::read_to_string(settings.report_dir.join("issue-report-7.txt")).unwrap();
    assert!(report.contains("Warnings/Errors (2):"));
    assert!(report.contains("Warning: cut 4 has fewer than 5 expected cases."));
}

/// Every write fails, as if the terminal went away.
struct BrokenTerminal;

impl std::io::Write for BrokenTerminal {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn display_failure_lets_the_monitor_close_without_waiting() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let settings = settings(
        &temp,
        SimulationSettings {
            steps: 100_000,
            step_delay_ms: 5,
            ..SimulationSettings::default()
        },
    );
    let registry = OutputFileRegistry::new();

    let outcome = run_monitor(
        &settings,
        8,
        registry.clone(),
        simulated(&settings),
        Arc::new(RecordingViewer::default()),
        BrokenTerminal,
    );

    assert!(outcome.view.closed);
    assert_eq!(outcome.view.job_state, JobState::CancelRequested);
    assert!(!registry.is_leased(&settings.output_path));
}

/// Never expected to run; records when the engine lets go of it.
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl CalculationTask for DropFlag {
    async fn run(
        &self,
        job: &CalculationJob,
        _sink: &dyn ProgressSink,
        _cancel: &CancellationToken,
    ) -> Result<PathBuf, CalculationError> {
        Ok(job.output_path.clone())
    }
}

#[test]
fn rejected_job_still_shuts_the_engine_down() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let settings = settings(&temp, quick(1));
    let registry = OutputFileRegistry::new();
    registry.acquire(&settings.output_path);
    let dropped = Arc::new(AtomicBool::new(false));

    let outcome = run_monitor(
        &settings,
        9,
        registry,
        Arc::new(DropFlag(dropped.clone())),
        Arc::new(RecordingViewer::default()),
        Vec::new(),
    );
    assert!(outcome.view.closed);

    let deadline = Instant::now() + Duration::from_secs(2);
    while !dropped.load(Ordering::SeqCst) && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    assert!(dropped.load(Ordering::SeqCst), "engine worker kept the task alive");
}
