//! Output formatting for CLI results.

use serde::Serialize;

use crate::count::FileCounts;

/// One row of `count` output.
#[derive(Debug, Serialize)]
pub struct CountReport {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub words: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl CountReport {
    /// Build a report from a worker's decoded counts.
    pub fn new(path: &str, counts: Option<FileCounts>) -> Self {
        match counts {
            Some(c) => Self {
                path: path.to_string(),
                bytes: Some(c.bytes),
                lines: Some(c.lines),
                words: Some(c.words),
                error: None,
            },
            None => Self {
                path: path.to_string(),
                bytes: None,
                lines: None,
                words: None,
                error: Some("unreadable"),
            },
        }
    }
}

/// Print reports as `wc`-style columns: lines, words, bytes, path.
pub fn print_plain(reports: &[CountReport]) {
    for report in reports {
        match (report.lines, report.words, report.bytes) {
            (Some(lines), Some(words), Some(bytes)) => {
                println!("{:>8} {:>8} {:>8} {}", lines, words, bytes, report.path)
            }
            _ => println!("{:>26} {}", "unreadable", report.path),
        }
    }
}

/// Print reports as a pretty JSON array.
pub fn print_json(reports: &[CountReport]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(reports)?);
    Ok(())
}
