//! Count command implementation.
//!
//! Forks one worker per file. Each child reads its file and writes
//! `"<bytes> <lines> <words>"` into the channel; a child that cannot read
//! its file writes nothing.

use std::io::Write;

use anyhow::Context;
use greendots_core::Worker;

use crate::output::{CountReport, print_json, print_plain};

/// Counts for a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileCounts {
    pub bytes: u64,
    pub lines: u64,
    pub words: u64,
}

impl FileCounts {
    /// Count the contents of a buffer.
    pub fn of(contents: &[u8]) -> Self {
        Self {
            bytes: contents.len() as u64,
            lines: contents.iter().filter(|&&b| b == b'\n').count() as u64,
            words: contents
                .split(|b| b.is_ascii_whitespace())
                .filter(|word| !word.is_empty())
                .count() as u64,
        }
    }

    /// Encode as the text a worker writes.
    pub fn encode(&self) -> String {
        format!("{} {} {}", self.bytes, self.lines, self.words)
    }

    /// Decode a worker's payload. `None` for an empty or malformed payload.
    pub fn decode(payload: &[u8]) -> Option<Self> {
        let text = std::str::from_utf8(payload).ok()?;
        let mut fields = text.split_whitespace().map(str::parse::<u64>);
        let counts = Self {
            bytes: fields.next()?.ok()?,
            lines: fields.next()?.ok()?,
            words: fields.next()?.ok()?,
        };
        fields.next().is_none().then_some(counts)
    }
}

/// Execute the count command.
pub fn execute(files: &[String], json: bool) -> anyhow::Result<()> {
    let mut workers = Vec::with_capacity(files.len());
    for path in files {
        let worker = Worker::fork(|writer| {
            if let Ok(contents) = std::fs::read(path) {
                let _ = writer.write_all(FileCounts::of(&contents).encode().as_bytes());
            }
        })
        .with_context(|| format!("Failed to fork worker for {}", path))?;
        tracing::debug!(pid = worker.pid(), path = %path, "counting");
        workers.push(worker);
    }

    let mut reports = Vec::with_capacity(files.len());
    for (path, worker) in files.iter().zip(workers) {
        let payload = worker
            .wait()
            .with_context(|| format!("Failed to wait for worker counting {}", path))?;
        let counts = FileCounts::decode(&payload);
        if counts.is_none() {
            tracing::warn!("Could not read {}", path);
        }
        reports.push(CountReport::new(path, counts));
    }

    if json {
        print_json(&reports)?;
    } else {
        print_plain(&reports);
    }

    let unreadable = reports.iter().filter(|r| r.error.is_some()).count();
    if unreadable > 0 {
        anyhow::bail!("{} of {} files could not be read", unreadable, reports.len());
    }

    Ok(())
}
