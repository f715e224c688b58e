use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

/// Result documents larger than this are not loaded into the monitor.
pub const DEFAULT_RESULT_MAX_BYTES: u64 = 8 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ResultReadError {
    #[error("result file not found")]
    NotFound,
    #[error("result file too large to display ({actual} bytes, limit {max_bytes})")]
    TooLarge { max_bytes: u64, actual: u64 },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Reads a result document for display.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected; engines
/// often write results in the platform's legacy encoding.
pub fn load_result_document(path: &Path, max_bytes: u64) -> Result<String, ResultReadError> {
    let meta = fs::metadata(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => ResultReadError::NotFound,
        _ => ResultReadError::Io(err),
    })?;
    if meta.len() > max_bytes {
        return Err(ResultReadError::TooLarge {
            max_bytes,
            actual: meta.len(),
        });
    }
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
