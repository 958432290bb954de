use std::fs::File;
use std::io::{self, BufWriter, Write};

use camino::Utf8Path;
use serde::Serialize;

use crate::domain::{GeneRecord, OutputFormat};
use crate::error::HarvestError;
use crate::pipeline::RunSummary;

/// Pass-through writer for extracted gene names. Records are written in the
/// order they arrive and flushed after every batch.
pub struct OutputSink<W: Write> {
    out: W,
    format: OutputFormat,
    written: usize,
}

impl OutputSink<Box<dyn Write>> {
    /// Truncates and opens `path`, or falls back to stdout when no path is given.
    pub fn open(path: Option<&Utf8Path>, format: OutputFormat) -> Result<Self, HarvestError> {
        let out: Box<dyn Write> = match path {
            Some(path) => {
                let file = File::create(path.as_std_path())
                    .map_err(|err| HarvestError::Output(format!("create {path}: {err}")))?;
                Box::new(BufWriter::new(file))
            }
            None => Box::new(io::stdout().lock()),
        };
        Ok(Self::new(out, format))
    }
}

impl<W: Write> OutputSink<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            written: 0,
        }
    }

    pub fn emit(&mut self, records: &[GeneRecord]) -> Result<usize, HarvestError> {
        for record in records {
            let line = match self.format {
                OutputFormat::Names => writeln!(self.out, "{}", record.name),
                OutputFormat::Tsv => writeln!(self.out, "{}\t{}", record.id, record.name),
            };
            line.map_err(|err| HarvestError::Output(err.to_string()))?;
        }
        self.out
            .flush()
            .map_err(|err| HarvestError::Output(err.to_string()))?;
        self.written += records.len();
        Ok(records.len())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

pub struct JsonOutput;

impl JsonOutput {
    /// Run summaries go to stderr so they never mix with gene names on stdout.
    pub fn print_summary(summary: &RunSummary) -> io::Result<()> {
        Self::print_json(io::stderr().lock(), summary)
    }

    pub fn print_json<T: Serialize>(mut out: impl Write, value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        out.write_all(json.as_bytes())?;
        out.write_all(b"\n")?;
        Ok(())
    }
}
