use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::JobId;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report directory missing or not writable: {0}")]
    ReportDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Warnings and errors a job produced, packaged for the user to send on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueReport {
    pub job_id: JobId,
    pub title: String,
    pub output_path: PathBuf,
    pub issues: Vec<String>,
    pub created_utc: String,
}

impl IssueReport {
    pub fn file_name(&self) -> String {
        format!("issue-report-{}.txt", self.job_id)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Analysis: {}", self.title);
        let _ = writeln!(out, "Job: {}", self.job_id);
        let _ = writeln!(out, "Output file: {}", self.output_path.display());
        let _ = writeln!(out, "Created: {}", self.created_utc);
        let _ = writeln!(out);
        let _ = writeln!(out, "Warnings/Errors ({}):", self.issues.len());
        for issue in &self.issues {
            let _ = writeln!(out, "  {issue}");
        }
        out
    }
}

/// Ensure the report directory exists; create if missing.
pub fn ensure_report_dir(dir: &Path) -> Result<(), ReportError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| ReportError::ReportDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(ReportError::ReportDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| ReportError::ReportDir(e.to_string()))?;
    }
    Ok(())
}

/// Writes issue reports into one directory, replacing older reports for the same job.
pub struct IssueReportWriter {
    dir: PathBuf,
}

impl IssueReportWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, report: &IssueReport) -> Result<PathBuf, ReportError> {
        ensure_report_dir(&self.dir)?;

        let target = self.dir.join(report.file_name());
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(report.render().as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        tmp.persist(&target).map_err(|e| ReportError::Io(e.error))?;
        Ok(target)
    }
}
