use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::Utc;
use engine_logging::{engine_error, engine_info, engine_warn};
use monitor_core::{Effect, IssueReportDraft, JobId, JobSpec, Msg};
use monitor_engine::{
    load_result_document, CalculationError, CalculationJob, EngineEvent, EngineHandle,
    IssueReport, IssueReportWriter, OutputFileRegistry, RegistryError, ResultViewer,
};

use super::settings::MonitorSettings;

const FORWARD_POLL: Duration = Duration::from_millis(100);

/// Executes monitor effects and feeds their outcomes back as messages.
pub struct EffectRunner {
    engine: EngineHandle,
    registry: OutputFileRegistry,
    viewer: Arc<dyn ResultViewer>,
    report_writer: IssueReportWriter,
    result_max_bytes: u64,
    msg_tx: mpsc::Sender<Msg>,
    output_conflict: Option<RegistryError>,
}

impl EffectRunner {
    pub fn new(
        engine: EngineHandle,
        registry: OutputFileRegistry,
        viewer: Arc<dyn ResultViewer>,
        settings: &MonitorSettings,
        msg_tx: mpsc::Sender<Msg>,
    ) -> Self {
        Self {
            engine,
            registry,
            viewer,
            report_writer: IssueReportWriter::new(settings.report_dir.clone()),
            result_max_bytes: settings.result_max_bytes,
            msg_tx,
            output_conflict: None,
        }
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::AcquireLease { path } => {
                    // Acquired even on conflict so the monitor's release stays balanced.
                    self.output_conflict = self.registry.try_acquire(&path).err();
                }
                Effect::StartCalculation { job } => self.start(job),
                Effect::CancelCalculation { job_id } => {
                    self.engine.cancel(job_id);
                }
                Effect::ReleaseLease { path } => {
                    self.registry.release(&path);
                }
                Effect::LoadResult { path } => {
                    let msg = match load_result_document(&path, self.result_max_bytes) {
                        Ok(content) => Msg::ResultLoaded { content },
                        Err(err) => {
                            engine_warn!("Failed to load result {:?}: {}", path, err);
                            Msg::ResultUnavailable {
                                reason: err.to_string(),
                            }
                        }
                    };
                    self.post(msg);
                }
                Effect::OpenInViewer { path } => {
                    if let Err(err) = self.viewer.open(&path) {
                        engine_warn!("Failed to open {:?}: {}", path, err);
                        self.post(Msg::ViewerFailed {
                            path,
                            reason: err.to_string(),
                        });
                    }
                }
                Effect::WriteIssueReport { report } => {
                    let msg = match self.report_writer.write(&issue_report(report)) {
                        Ok(path) => Msg::ReportWritten { path },
                        Err(err) => {
                            engine_error!("Failed to write issue report: {}", err);
                            Msg::ReportFailed {
                                reason: err.to_string(),
                            }
                        }
                    };
                    self.post(msg);
                }
                Effect::CloseWindow => {
                    engine_info!("Monitor window closed");
                }
            }
        }
    }

    fn start(&mut self, job: JobSpec) {
        if let Some(conflict) = self.output_conflict.take() {
            engine_warn!("Job {} not started: {}", job.job_id, conflict);
            let error = CalculationError::OutputInUse(job.output_path);
            self.post(Msg::JobFailed {
                reason: error.to_string(),
            });
            return;
        }
        engine_info!(
            "StartCalculation job_id={} output={:?} html={}",
            job.job_id,
            job.output_path,
            job.generate_html
        );
        if let Err(err) = self.engine.start(calculation_job(job)) {
            self.post(Msg::JobFailed {
                reason: err.to_string(),
            });
        }
    }

    fn post(&self, msg: Msg) {
        let _ = self.msg_tx.send(msg);
    }
}

/// Background thread that moves engine events for one job onto the
/// monitor's message channel.
pub struct EventForwarder {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl EventForwarder {
    /// Starts forwarding. The thread ends after the job's terminal event, when
    /// the monitor's receiver is gone, or on `shutdown`.
    pub fn spawn(engine: EngineHandle, job_id: JobId, msg_tx: mpsc::Sender<Msg>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();
        let handle = thread::spawn(move || {
            while !thread_stop.load(Ordering::Acquire) {
                let Some(event) = engine.recv_timeout(FORWARD_POLL) else {
                    continue;
                };
                if event.job_id() != job_id {
                    continue;
                }
                let terminal = event.is_terminal();
                if msg_tx.send(map_event(event)).is_err() || terminal {
                    break;
                }
            }
        });
        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Stops the thread and waits for it, dropping its engine handle.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                engine_error!("Engine event forwarder panicked");
            }
        }
    }
}

impl Drop for EventForwarder {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Progress { text, .. } => Msg::ProgressPushed(text),
        EngineEvent::Issue { text, .. } => Msg::IssuePushed(text),
        EngineEvent::Completed { result_path, .. } => Msg::JobCompleted { result_path },
        EngineEvent::Cancelled { .. } => Msg::JobCancelled,
        EngineEvent::Failed { error, .. } => Msg::JobFailed {
            reason: error.to_string(),
        },
    }
}

fn calculation_job(job: JobSpec) -> CalculationJob {
    CalculationJob {
        job_id: job.job_id,
        output_path: job.output_path,
        generate_html: job.generate_html,
    }
}

fn issue_report(draft: IssueReportDraft) -> IssueReport {
    IssueReport {
        job_id: draft.job_id,
        title: draft.title,
        output_path: draft.output_path,
        issues: draft.issues,
        created_utc: Utc::now().to_rfc3339(),
    }
}
