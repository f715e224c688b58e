mod app;
mod effects;
mod settings;
mod simulated;
mod ui;

pub use app::{run_app, run_monitor, MonitorOutcome};
pub use effects::EffectRunner;
pub use settings::{
    read_settings, LogTarget, MonitorSettings, SettingsError, SimulationSettings,
    SETTINGS_FILENAME,
};
pub use simulated::SimulatedCalculation;
pub use ui::display::TerminalDisplay;
pub use ui::render::{render, state_label, DisplayCommand};
