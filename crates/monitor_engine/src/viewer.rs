use std::io;
use std::path::Path;
use std::process::Command;
use std::thread;

use engine_logging::{engine_info, engine_warn};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("file does not exist")]
    Missing,
    #[error("could not launch {program}: {source}")]
    Launch {
        program: &'static str,
        #[source]
        source: io::Error,
    },
}

/// Opens a document outside the monitor, typically in a browser.
pub trait ResultViewer: Send + Sync {
    fn open(&self, path: &Path) -> Result<(), ViewerError>;
}

/// Hands the file to the desktop's default opener.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemViewer;

impl ResultViewer for SystemViewer {
    fn open(&self, path: &Path) -> Result<(), ViewerError> {
        if !path.exists() {
            return Err(ViewerError::Missing);
        }
        let (program, mut command) = opener_command(path);
        engine_info!("Opening {:?} with {}", path, program);
        let mut child = command
            .spawn()
            .map_err(|source| ViewerError::Launch { program, source })?;
        // Reaped off-thread; the caller is the monitor's message loop.
        thread::spawn(move || match child.wait() {
            Ok(status) if !status.success() => {
                engine_warn!("{} exited with {}", program, status);
            }
            Ok(_) => {}
            Err(err) => engine_warn!("Failed to wait for {}: {}", program, err),
        });
        Ok(())
    }
}

#[cfg(target_os = "windows")]
fn opener_command(path: &Path) -> (&'static str, Command) {
    let mut command = Command::new("cmd");
    command.arg("/C").arg("start").arg("").arg(path);
    ("cmd", command)
}

#[cfg(target_os = "macos")]
fn opener_command(path: &Path) -> (&'static str, Command) {
    let mut command = Command::new("open");
    command.arg(path);
    ("open", command)
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn opener_command(path: &Path) -> (&'static str, Command) {
    let mut command = Command::new("xdg-open");
    command.arg(path);
    ("xdg-open", command)
}
