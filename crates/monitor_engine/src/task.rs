use std::path::PathBuf;
use std::sync::mpsc;

use tokio_util::sync::CancellationToken;

use crate::{CalculationError, CalculationJob, EngineEvent, JobId};

/// Where a running calculation sends its output. Emitting never blocks.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);

    fn push_progress(&self, job_id: JobId, text: &str) {
        self.emit(EngineEvent::Progress {
            job_id,
            text: text.to_owned(),
        });
    }

    fn push_issue(&self, job_id: JobId, text: &str) {
        self.emit(EngineEvent::Issue {
            job_id,
            text: text.to_owned(),
        });
    }
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        // A closed receiver means nobody is watching any more.
        let _ = self.tx.send(event);
    }
}

/// The external analysis engine.
///
/// Implementations check `cancel` at their own checkpoints and return
/// `CalculationError::Cancelled` once they have stopped. On success they
/// return the path of the result document they wrote.
#[async_trait::async_trait]
pub trait CalculationTask: Send + Sync {
    async fn run(
        &self,
        job: &CalculationJob,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, CalculationError>;
}
