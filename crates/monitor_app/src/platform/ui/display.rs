use std::io::{self, Write};

use super::render::DisplayCommand;

/// Prints monitor updates to a text stream, only writing what changed.
pub struct TerminalDisplay<W: Write> {
    out: W,
    status: Option<String>,
    printed_progress: u64,
    printed_issues: usize,
    result_printed: bool,
    notice: Option<String>,
}

impl<W: Write> TerminalDisplay<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            status: None,
            printed_progress: 0,
            printed_issues: 0,
            result_printed: false,
            notice: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn apply(&mut self, commands: Vec<DisplayCommand>) -> io::Result<()> {
        for command in commands {
            match command {
                DisplayCommand::UpdateStatus {
                    title,
                    state,
                    actions,
                } => {
                    let status = format!("== {title} [{state}] actions: {}", actions.join(", "));
                    if self.status.as_ref() != Some(&status) {
                        writeln!(self.out, "{status}")?;
                        self.status = Some(status);
                    }
                }
                DisplayCommand::SetProgress {
                    lines,
                    first_line,
                    result_shown,
                } => self.write_progress(&lines, first_line, result_shown)?,
                DisplayCommand::SetIssues { lines } => {
                    for line in lines.iter().skip(self.printed_issues) {
                        writeln!(self.out, "!! {line}")?;
                    }
                    self.printed_issues = self.printed_issues.max(lines.len());
                }
                DisplayCommand::SetNotice { text } => {
                    if text != self.notice {
                        if let Some(text) = &text {
                            writeln!(self.out, "*** {text} ***")?;
                        }
                        self.notice = text;
                    }
                }
            }
        }
        self.out.flush()
    }

    fn write_progress(
        &mut self,
        lines: &[String],
        first_line: u64,
        result_shown: bool,
    ) -> io::Result<()> {
        let end = first_line + lines.len() as u64;
        if result_shown && !self.result_printed {
            writeln!(self.out, "-- results --")?;
            for line in lines {
                writeln!(self.out, "{line}")?;
            }
            self.result_printed = true;
            self.printed_progress = end;
            return Ok(());
        }

        if self.printed_progress < first_line {
            writeln!(
                self.out,
                "... {} line(s) dropped",
                first_line - self.printed_progress
            )?;
            self.printed_progress = first_line;
        }
        let skip = (self.printed_progress - first_line) as usize;
        for line in lines.iter().skip(skip) {
            writeln!(self.out, "{line}")?;
        }
        self.printed_progress = self.printed_progress.max(end);
        Ok(())
    }
}
