use std::fmt;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Categories of chart hydration failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartErrorKind {
    /// Connection failure, bad URL, or body read error
    Transport,
    /// Connection timeout or request timeout
    Timeout,
    /// Non-success HTTP status from the data source
    HttpStatus,
    /// Response body is not a chart document
    Parse,
    /// The rendering service rejected the chart
    Render,
    /// The hydration task itself died
    Task,
}

impl fmt::Display for ChartErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartErrorKind::Transport => write!(f, "transport"),
            ChartErrorKind::Timeout => write!(f, "timeout"),
            ChartErrorKind::HttpStatus => write!(f, "http_status"),
            ChartErrorKind::Parse => write!(f, "parse"),
            ChartErrorKind::Render => write!(f, "render"),
            ChartErrorKind::Task => write!(f, "task"),
        }
    }
}

/// Failure of a single chart. Never affects sibling charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartError {
    /// Error category
    pub kind: ChartErrorKind,
    /// One-line reason, shown inside the chart surface
    pub message: String,
}

impl ChartError {
    pub fn new(kind: ChartErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(status: StatusCode) -> Self {
        Self::new(ChartErrorKind::HttpStatus, format!("HTTP {status}"))
    }

    /// Creates a parse error from a JSON failure.
    pub fn parse(e: &serde_json::Error) -> Self {
        Self::new(ChartErrorKind::Parse, format!("Invalid chart data: {e}"))
    }

    /// Creates a render error from the rendering service.
    pub fn render(e: &anyhow::Error) -> Self {
        Self::new(ChartErrorKind::Render, format!("Render failed: {e:#}"))
    }
}

impl fmt::Display for ChartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ChartError {}

pub(crate) fn classify_reqwest_error(e: &reqwest::Error) -> ChartError {
    if e.is_timeout() {
        ChartError::new(ChartErrorKind::Timeout, format!("Request timed out: {e}"))
    } else if e.is_connect() {
        ChartError::new(ChartErrorKind::Transport, format!("Connection failed: {e}"))
    } else if e.is_decode() || e.is_body() {
        ChartError::new(ChartErrorKind::Transport, format!("Failed to read response: {e}"))
    } else {
        ChartError::new(ChartErrorKind::Transport, format!("Network error: {e}"))
    }
}
