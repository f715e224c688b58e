use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use monitor_core::html_companion_path;
use monitor_engine::{
    CalculationError, CalculationJob, CalculationTask, CancellationToken, ProgressSink,
};

use super::settings::SimulationSettings;

/// Stand-in for the native analysis engine.
///
/// Walks through a fixed number of steps, checking for cancellation between
/// each, and writes a small result document (plus an HTML rendering when
/// asked) to the job's output path.
pub struct SimulatedCalculation {
    settings: SimulationSettings,
}

impl SimulatedCalculation {
    pub fn new(settings: SimulationSettings) -> Self {
        Self { settings }
    }
}

#[async_trait::async_trait]
impl CalculationTask for SimulatedCalculation {
    async fn run(
        &self,
        job: &CalculationJob,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, CalculationError> {
        let job_id = job.job_id;
        let steps = self.settings.steps;
        if steps == 0 {
            return Err(CalculationError::InvalidParameters(
                "number of steps must be positive".to_string(),
            ));
        }
        sink.push_progress(job_id, "Reading the tree structure ...");

        let mut warnings = 0;
        for step in 1..=steps {
            if cancel.is_cancelled() {
                sink.push_progress(job_id, "Calculation stopped.");
                return Err(CalculationError::Cancelled);
            }
            if self.settings.fail_at_step == Some(step) {
                return Err(CalculationError::Engine(format!(
                    "simulated failure at step {step}"
                )));
            }
            sink.push_progress(job_id, &format!("Evaluating cut {step} of {steps}"));
            if self.settings.warn_every > 0 && step % self.settings.warn_every == 0 {
                warnings += 1;
                sink.push_issue(
                    job_id,
                    &format!("Warning: cut {step} has fewer than 5 expected cases."),
                );
            }
            tokio::time::sleep(Duration::from_millis(self.settings.step_delay_ms)).await;
        }

        sink.push_progress(job_id, "Writing results ...");
        let report = format!(
            "Tree scan results\n\
             Cuts evaluated: {steps}\n\
             Warnings: {warnings}\n"
        );
        if let Some(parent) = job.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&job.output_path, &report)?;
        if job.generate_html {
            let html = format!("<html><body><pre>{report}</pre></body></html>\n");
            fs::write(html_companion_path(&job.output_path), html)?;
        }
        Ok(job.output_path.clone())
    }
}
