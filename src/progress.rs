//! Progress decoding for fetch tool output
//!
//! The fetch tool prints many informational lines; only `[download] NN.N%` style
//! lines carry progress. Decoding is a tolerant line classifier: anything that
//! does not look like a progress line is dropped, never reported as an error.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Marker that identifies a transfer progress line
const DOWNLOAD_MARKER: &str = "[download]";

/// Payload of the terminal stream frame
pub const COMPLETE_TOKEN: &str = "complete";

#[allow(clippy::expect_used)]
static PERCENT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)%").expect("percent pattern is valid"));

/// A percentage as printed by the tool
///
/// `text` is the matched figure exactly as it appeared in the output (`100`,
/// `12.50`); `value` is its numeric reading for status snapshots.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Percentage {
    pub value: f64,
    pub text: String,
}

impl Percentage {
    /// Read a bare figure such as `57.0`
    pub fn parse(text: &str) -> Option<Self> {
        let value = text.parse::<f64>().ok()?;
        Some(Self {
            value,
            text: text.to_string(),
        })
    }
}

/// A decoded unit of job progress
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Percentage complete as reported by the tool
    Percent(Percentage),
    /// The tool process has exited; always the last event of a job
    Completed,
}

impl ProgressEvent {
    /// Text carried in the `data:` field of the push frame
    pub fn payload(&self) -> String {
        match self {
            ProgressEvent::Percent(percentage) => percentage.text.clone(),
            ProgressEvent::Completed => COMPLETE_TOKEN.to_string(),
        }
    }

    /// Numeric percentage, if this is a progress event
    pub fn percent(&self) -> Option<f64> {
        match self {
            ProgressEvent::Percent(percentage) => Some(percentage.value),
            ProgressEvent::Completed => None,
        }
    }

    /// Whether this event ends the sequence
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::Completed)
    }
}

/// Extract the percentage from a single line of tool output
///
/// Returns `None` for lines without the download marker or without a
/// `\d+(\.\d+)?%` figure.
pub fn parse_progress_line(line: &str) -> Option<Percentage> {
    if !line.contains(DOWNLOAD_MARKER) || !line.contains('%') {
        return None;
    }

    PERCENT_PATTERN
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| Percentage::parse(m.as_str()))
}

/// Incremental decoder turning output lines into [`ProgressEvent`]s
///
/// The sequence it produces is finite and non-restartable: once
/// [`finish`](Self::finish) has yielded `Completed`, further input is ignored.
#[derive(Debug, Default)]
pub struct ProgressDecoder {
    finished: bool,
    last_percent: Option<f64>,
}

impl ProgressDecoder {
    /// Create a decoder at the start of a job's output
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line of output (without its terminator)
    pub fn decode_line(&mut self, line: &str) -> Option<ProgressEvent> {
        if self.finished {
            return None;
        }

        let percentage = parse_progress_line(line)?;
        self.last_percent = Some(percentage.value);
        Some(ProgressEvent::Percent(percentage))
    }

    /// Signal that the process has exited; yields `Completed` exactly once
    pub fn finish(&mut self) -> Option<ProgressEvent> {
        if self.finished {
            return None;
        }
        self.finished = true;
        Some(ProgressEvent::Completed)
    }

    /// Last percentage seen, if any
    pub fn last_percent(&self) -> Option<f64> {
        self.last_percent
    }

    /// Whether `Completed` has been produced
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
