use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use engine_logging::{engine_info, engine_warn, parse_level};
use monitor_core::{update, Effect, JobId, JobSpec, MonitorState, MonitorViewModel, Msg};
use monitor_engine::{
    CalculationTask, EngineHandle, OutputFileRegistry, ResultViewer, SystemViewer,
};

use super::effects::{EffectRunner, EventForwarder};
use super::settings::{read_settings, MonitorSettings, SETTINGS_FILENAME};
use super::simulated::SimulatedCalculation;
use super::ui::display::TerminalDisplay;
use super::ui::render::render;

const TICK_INTERVAL: Duration = Duration::from_millis(75);

pub fn run_app() -> anyhow::Result<()> {
    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILENAME));
    let (settings, settings_error) = match read_settings(&settings_path) {
        Ok(settings) => (settings, None),
        Err(err) => (MonitorSettings::default(), Some(err)),
    };
    engine_logging::initialize(
        settings.log_destination.into(),
        parse_level(&settings.log_level),
        &settings.log_file,
    );
    match settings_error {
        Some(err) => engine_warn!("{}; using defaults", err),
        None => engine_info!("Settings taken from {:?}", settings_path),
    }

    if let Some(parent) = settings.output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output directory {parent:?}"))?;
        }
    }

    let task = Arc::new(SimulatedCalculation::new(settings.simulation.clone()));
    let outcome = run_monitor(
        &settings,
        1,
        OutputFileRegistry::new(),
        task,
        Arc::new(SystemViewer),
        io::stdout(),
    );
    engine_info!("Monitor finished with job {:?}", outcome.view.job_state);
    Ok(())
}

pub struct MonitorOutcome<W> {
    pub view: MonitorViewModel,
    pub output: W,
}

/// Runs one job under a monitor until the monitor closes.
///
/// All state changes happen on the calling thread, in the order messages
/// arrive. The engine, the ticker and the effect runner only post messages.
/// Without an interactive user, the monitor cancels after
/// `simulation.cancel_after_lines` progress lines when configured, and closes
/// itself once closing is allowed.
pub fn run_monitor<W: Write>(
    settings: &MonitorSettings,
    job_id: JobId,
    registry: OutputFileRegistry,
    task: Arc<dyn CalculationTask>,
    viewer: Arc<dyn ResultViewer>,
    out: W,
) -> MonitorOutcome<W> {
    let job = JobSpec {
        job_id,
        title: settings.title.clone(),
        output_path: settings.output_path.clone(),
        generate_html: settings.generate_html,
    };
    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();

    let engine = EngineHandle::new(task);
    let forwarder = EventForwarder::spawn(engine.clone(), job_id, msg_tx.clone());
    let mut runner = EffectRunner::new(engine, registry, viewer, settings, msg_tx.clone());
    let mut display = TerminalDisplay::new(out);

    // Background tick to throttle rendering.
    let tick_tx = msg_tx.clone();
    thread::spawn(move || {
        while tick_tx.send(Msg::Tick).is_ok() {
            thread::sleep(TICK_INTERVAL);
        }
    });

    let mut state = MonitorState::with_progress_capacity(job, settings.max_progress_lines);
    let _ = msg_tx.send(Msg::JobStarted);

    let mut progress_seen = 0usize;
    let mut cancel_sent = false;
    let mut wrap_up_sent = false;
    let mut close_sent = false;

    while let Ok(msg) = msg_rx.recv() {
        let is_tick = msg == Msg::Tick;
        if matches!(msg, Msg::ProgressPushed(_)) {
            progress_seen += 1;
        }

        let (next, effects) = update(state, msg);
        state = next;
        let closing = effects.contains(&Effect::CloseWindow);
        runner.enqueue(effects);

        if (is_tick || closing) && state.consume_dirty() {
            if let Err(err) = display.apply(render(&state.view())) {
                engine_warn!("Display update failed: {}", err);
                let _ = msg_tx.send(Msg::DisplayEditFailed {
                    reason: err.to_string(),
                });
            }
        }
        if closing {
            break;
        }

        if let Some(limit) = settings.simulation.cancel_after_lines {
            if !cancel_sent && progress_seen >= limit {
                cancel_sent = true;
                let _ = msg_tx.send(Msg::CancelClicked);
            }
        }

        if is_tick && state.can_close() {
            if !wrap_up_sent {
                wrap_up_sent = true;
                if settings.auto_report && state.has_issues() {
                    let _ = msg_tx.send(Msg::ReportIssueClicked);
                }
            } else if !close_sent {
                close_sent = true;
                let _ = msg_tx.send(Msg::CloseRequested);
            }
        }
    }

    if !state.is_closed() {
        let (next, effects) = update(state, Msg::Disposed);
        state = next;
        runner.enqueue(effects);
    }

    // The engine worker stops once its last handle is gone.
    forwarder.shutdown();
    drop(runner);

    MonitorOutcome {
        view: state.view(),
        output: display.into_inner(),
    }
}
