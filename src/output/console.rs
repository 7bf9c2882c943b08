//! Console sink with an optional transcript file.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use super::{Level, Sink};

/// Writes messages to stdout and, when configured, a transcript file.
#[derive(Debug)]
pub struct ConsoleSink {
    verbose: u8,
    transcript: Option<BufWriter<File>>,
}

impl ConsoleSink {
    /// Console-only sink.
    #[must_use]
    pub fn new(verbose: u8) -> Self {
        Self {
            verbose,
            transcript: None,
        }
    }

    /// Sink that also writes a transcript to `path` (created or truncated).
    ///
    /// # Errors
    ///
    /// Fails if the transcript file cannot be created.
    pub fn with_transcript(verbose: u8, path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            verbose,
            transcript: Some(BufWriter::new(file)),
        })
    }
}

impl Sink for ConsoleSink {
    fn emit(&mut self, level: Level, message: &str) {
        if self.verbose >= level.console_threshold() {
            println!("{message}");
        }

        let transcribe = level
            .transcript_threshold()
            .is_some_and(|threshold| self.verbose >= threshold);
        if transcribe {
            if let Some(out) = self.transcript.as_mut() {
                if let Err(e) = writeln!(out, "{message}") {
                    log::warn!("Unable to write transcript, disabling it: {}", e);
                    self.transcript = None;
                }
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(out) = self.transcript.as_mut() {
            out.flush()?;
        }
        io::stdout().flush()
    }
}
