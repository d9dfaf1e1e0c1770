//! Query execution strategies.
//!
//! Three executors share one output type, [`RawResponse`]:
//! - [`SessionBoundExecutor`] runs on a caller-owned [`InterpreterSession`],
//! - [`AutoManagedExecutor`] opens a session for a single query and closes it,
//! - [`IsolatedExecutor`] spawns a fresh interpreter per query under a timeout.
//!
//! Only the isolated executor is safe to drive from many threads at once.
//! Session-based strategies go through a [`SessionLauncher`], whose
//! configuration is process-wide mutable state: opening a session needs
//! exclusive access to the launcher and running a query needs exclusive
//! access to the session. Sharing a session across threads behind a lock is
//! the caller's responsibility; under concurrent load such callers may see
//! execution failures.

mod auto;
mod interpreter;
mod isolated;
mod session;
mod terminate;

pub use auto::AutoManagedExecutor;
pub use interpreter::{InterpreterConfig, SessionDialect};
pub use isolated::IsolatedExecutor;
pub use session::{InterpreterSession, SessionBoundExecutor, SessionLauncher};
pub use terminate::{ProcessTerminator, SystemTerminator, Termination};

use std::time::Duration;

use crate::error::{QueryError, Result};

/// Prefix of the text carried by a timed-out response.
pub const TIMEOUT_MARKER: &str = "query timed out";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Succeeded,
    Failed,
    TimedOut { after: Duration },
}

/// Output of one query execution. Consumed by normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    text: String,
    status: ResponseStatus,
}

impl RawResponse {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: ResponseStatus::Succeeded,
        }
    }

    /// Failed execution; `diagnostic` describes what went wrong.
    pub fn failure(diagnostic: impl Into<String>) -> Self {
        Self {
            text: diagnostic.into(),
            status: ResponseStatus::Failed,
        }
    }

    /// Timed-out execution. Carries the timeout marker, never partial output.
    pub fn timeout(after: Duration) -> Self {
        Self {
            text: format!("{TIMEOUT_MARKER} after {}ms", after.as_millis()),
            status: ResponseStatus::TimedOut { after },
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.status, ResponseStatus::Succeeded)
    }

    pub fn timed_out(&self) -> bool {
        matches!(self.status, ResponseStatus::TimedOut { .. })
    }

    pub fn status(&self) -> ResponseStatus {
        self.status
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Wall-clock limit for an isolated execution. Always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct QueryTimeout(Duration);

impl QueryTimeout {
    pub fn new(duration: Duration) -> Result<Self> {
        if duration.is_zero() {
            return Err(QueryError::InvalidTimeout(duration));
        }
        Ok(Self(duration))
    }

    pub fn from_millis(millis: u64) -> Result<Self> {
        Self::new(Duration::from_millis(millis))
    }

    pub fn duration(self) -> Duration {
        self.0
    }
}

impl TryFrom<Duration> for QueryTimeout {
    type Error = QueryError;

    fn try_from(duration: Duration) -> Result<Self> {
        Self::new(duration)
    }
}

/// Which strategy runs a query, chosen by the caller per call.
#[derive(Debug)]
pub enum ExecutionContext<'a> {
    /// No caller context: a short-lived session is opened and closed.
    None,
    /// Run on a session the caller opened and will close.
    CallerSession(&'a mut InterpreterSession),
    /// Run in an isolated process bounded by a timeout.
    TimeoutBound(QueryTimeout),
}

impl ExecutionContext<'_> {
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::None => "auto",
            Self::CallerSession(_) => "session",
            Self::TimeoutBound(_) => "isolated",
        }
    }
}
