use std::io::{self, Write};
use std::sync::Mutex;

use crate::domain::percent;
use crate::pipeline::RunSummary;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Phase(String),
    Page {
        processed: usize,
        total: usize,
    },
    ChunkFailed {
        first_id: String,
        size: usize,
        attempts: usize,
        reason: String,
    },
    Finished(RunSummary),
}

/// Diagnostic side channel. Implementations must never touch primary output.
pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn event(&self, _event: ProgressEvent) {}
}

/// Human-readable progress lines, stderr by default. A quiet reporter still
/// prints chunk failures.
pub struct TextProgress<W: Write> {
    out: Mutex<W>,
    quiet: bool,
}

impl TextProgress<io::Stderr> {
    pub fn stderr(quiet: bool) -> Self {
        Self::new(io::stderr(), quiet)
    }
}

impl<W: Write> TextProgress<W> {
    pub fn new(out: W, quiet: bool) -> Self {
        Self {
            out: Mutex::new(out),
            quiet,
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write> ProgressSink for TextProgress<W> {
    fn event(&self, event: ProgressEvent) {
        if self.quiet && !matches!(event, ProgressEvent::ChunkFailed { .. }) {
            return;
        }
        let line = format_event(&event);
        if let Ok(mut out) = self.out.lock() {
            // best effort
            let _ = writeln!(out, "{line}");
        }
    }
}

pub fn format_event(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::Phase(message) => message.clone(),
        ProgressEvent::Page { processed, total } => format!(
            "Processed {processed}/{total} ({}%)",
            percent(*processed, *total)
        ),
        ProgressEvent::ChunkFailed {
            first_id,
            size,
            attempts,
            reason,
        } => format!(
            "Failed to fetch chunk of {size} genes starting at id {first_id} after {attempts} attempts: {reason}"
        ),
        ProgressEvent::Finished(summary) => format!(
            "Done: {} gene names written ({} chunks ok, {} failed, {} pages)",
            summary.records_written, summary.chunks_ok, summary.chunks_failed, summary.pages
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_line_uses_truncated_percent() {
        let line = format_event(&ProgressEvent::Page {
            processed: 5000,
            total: 6000,
        });
        assert_eq!(line, "Processed 5000/6000 (83%)");
    }

    #[test]
    fn last_page_line_may_pass_total() {
        let line = format_event(&ProgressEvent::Page {
            processed: 10000,
            total: 6000,
        });
        assert_eq!(line, "Processed 10000/6000 (166%)");
    }

    #[test]
    fn writes_one_line_per_event() {
        let progress = TextProgress::new(Vec::new(), false);
        progress.event(ProgressEvent::Phase("Searching".to_string()));
        progress.event(ProgressEvent::Page {
            processed: 3,
            total: 3,
        });
        let text = String::from_utf8(progress.into_inner()).unwrap();
        assert_eq!(text, "Searching\nProcessed 3/3 (100%)\n");
    }

    #[test]
    fn quiet_keeps_failures_only() {
        let progress = TextProgress::new(Vec::new(), true);
        progress.event(ProgressEvent::Phase("Searching".to_string()));
        progress.event(ProgressEvent::ChunkFailed {
            first_id: "42".to_string(),
            size: 7,
            attempts: 3,
            reason: "boom".to_string(),
        });
        let text = String::from_utf8(progress.into_inner()).unwrap();
        assert_eq!(
            text,
            "Failed to fetch chunk of 7 genes starting at id 42 after 3 attempts: boom\n"
        );
    }
}
