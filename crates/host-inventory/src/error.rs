//! Error taxonomy for query execution and normalization.
//!
//! An empty response is not an error: it normalizes to an empty list or an
//! absent record. Everything else that goes wrong surfaces here.

use std::time::Duration;

use thiserror::Error;

/// Longest slice of offending input rendered by `Display`.
const INPUT_PREVIEW_CHARS: usize = 120;

#[derive(Debug, Error)]
pub enum QueryError {
    /// The interpreter, session or process could not run the query or exited
    /// abnormally.
    #[error("query execution failed: {detail}")]
    Execution { detail: String },

    /// The isolated process overran its allotted duration and was terminated.
    #[error("query timed out after {}ms", .after.as_millis())]
    Timeout { after: Duration },

    /// Non-empty output did not decode into the expected shape or key table.
    #[error("failed decoding query output: {reason} (input: {})", preview(.input))]
    Decode { reason: String, input: String },

    /// A timeout of zero was supplied.
    #[error("invalid query timeout {}ms: must be greater than zero", .0.as_millis())]
    InvalidTimeout(Duration),
}

impl QueryError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// Short machine-readable label for reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Execution { .. } => "execution",
            Self::Timeout { .. } => "timeout",
            Self::Decode { .. } => "decode",
            Self::InvalidTimeout(_) => "invalid_timeout",
        }
    }

    pub(crate) fn decode(reason: impl Into<String>, input: &str) -> Self {
        Self::Decode {
            reason: reason.into(),
            input: input.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;

fn preview(input: &str) -> String {
    let mut chars = input.chars();
    let head: String = chars.by_ref().take(INPUT_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
