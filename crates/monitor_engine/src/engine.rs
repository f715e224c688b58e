use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use tokio_util::sync::CancellationToken;

use crate::task::{CalculationTask, ChannelProgressSink, ProgressSink};
use crate::{CalculationError, CalculationJob, EngineEvent, JobId};

/// How long in-flight jobs get to reach a checkpoint once the last handle is dropped.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

enum EngineCommand {
    Start {
        job: CalculationJob,
        cancel: CancellationToken,
    },
}

type TokenMap = Arc<Mutex<HashMap<JobId, CancellationToken>>>;

/// Handle to the background worker that runs calculations.
///
/// Events from every job arrive on one channel in the order each job emitted
/// them. Cancellation is cooperative: `cancel` trips the job's token and the
/// task stops at its next checkpoint.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
    tokens: TokenMap,
}

impl EngineHandle {
    pub fn new(task: Arc<dyn CalculationTask>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let tokens: TokenMap = Arc::new(Mutex::new(HashMap::new()));

        let worker_tokens = tokens.clone();
        thread::spawn(move || run_worker(task, cmd_rx, event_tx, worker_tokens));

        Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
            tokens,
        }
    }

    /// Queues `job` for execution.
    pub fn start(&self, job: CalculationJob) -> Result<(), CalculationError> {
        let cancel = CancellationToken::new();
        let job_id = job.job_id;
        lock_tokens(&self.tokens).insert(job_id, cancel.clone());
        engine_info!("Starting job {} -> {:?}", job_id, job.output_path);

        if self.cmd_tx.send(EngineCommand::Start { job, cancel }).is_err() {
            lock_tokens(&self.tokens).remove(&job_id);
            engine_error!("Engine worker is gone; job {} not started", job_id);
            return Err(CalculationError::WorkerUnavailable);
        }
        Ok(())
    }

    /// Requests cancellation. Returns false when the job is unknown or already finished.
    pub fn cancel(&self, job_id: JobId) -> bool {
        match lock_tokens(&self.tokens).get(&job_id) {
            Some(token) => {
                engine_info!("Cancellation requested for job {}", job_id);
                token.cancel();
                true
            }
            None => {
                engine_debug!("Cancel for unknown or finished job {}", job_id);
                false
            }
        }
    }

    pub fn is_running(&self, job_id: JobId) -> bool {
        lock_tokens(&self.tokens).contains_key(&job_id)
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .try_recv()
            .ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recv_timeout(timeout)
            .ok()
    }
}

fn lock_tokens(
    tokens: &TokenMap,
) -> std::sync::MutexGuard<'_, HashMap<JobId, CancellationToken>> {
    tokens.lock().unwrap_or_else(PoisonError::into_inner)
}

fn run_worker(
    task: Arc<dyn CalculationTask>,
    cmd_rx: mpsc::Receiver<EngineCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
    tokens: TokenMap,
) {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            engine_error!("Failed to start engine runtime: {}", err);
            while let Ok(EngineCommand::Start { job, .. }) = cmd_rx.recv() {
                lock_tokens(&tokens).remove(&job.job_id);
                let _ = event_tx.send(EngineEvent::Failed {
                    job_id: job.job_id,
                    error: CalculationError::WorkerUnavailable,
                });
            }
            return;
        }
    };

    while let Ok(command) = cmd_rx.recv() {
        let task = task.clone();
        let event_tx = event_tx.clone();
        let tokens = tokens.clone();
        runtime.spawn(async move {
            handle_command(task.as_ref(), command, event_tx, tokens).await;
        });
    }

    for token in lock_tokens(&tokens).values() {
        token.cancel();
    }
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
}

async fn handle_command(
    task: &dyn CalculationTask,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
    tokens: TokenMap,
) {
    match command {
        EngineCommand::Start { job, cancel } => {
            let job_id = job.job_id;
            let sink = ChannelProgressSink::new(event_tx);
            let result = if cancel.is_cancelled() {
                Err(CalculationError::Cancelled)
            } else {
                task.run(&job, &sink, &cancel).await
            };
            lock_tokens(&tokens).remove(&job_id);
            sink.emit(terminal_event(job_id, result));
        }
    }
}

fn terminal_event(
    job_id: JobId,
    result: Result<std::path::PathBuf, CalculationError>,
) -> EngineEvent {
    match result {
        Ok(result_path) => {
            engine_info!("Job {} completed: {:?}", job_id, result_path);
            EngineEvent::Completed {
                job_id,
                result_path,
            }
        }
        Err(CalculationError::Cancelled) => {
            engine_info!("Job {} cancelled", job_id);
            EngineEvent::Cancelled { job_id }
        }
        Err(error) => {
            engine_warn!("Job {} failed: {}", job_id, error);
            EngineEvent::Failed { job_id, error }
        }
    }
}
