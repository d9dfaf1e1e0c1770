use std::sync::Arc;

use super::session::{SessionBoundExecutor, SessionLauncher};
use super::terminate::ProcessTerminator;
use super::{InterpreterConfig, RawResponse};
use crate::query::Query;

/// Runs each query on a session of its own, opened just before the query and
/// closed right after, whatever the outcome.
#[derive(Debug, Default)]
pub struct AutoManagedExecutor {
    launcher: SessionLauncher,
}

impl AutoManagedExecutor {
    pub fn new(config: InterpreterConfig) -> Self {
        Self {
            launcher: SessionLauncher::new(config),
        }
    }

    pub fn with_terminator(config: InterpreterConfig, terminator: Arc<dyn ProcessTerminator>) -> Self {
        Self {
            launcher: SessionLauncher::with_terminator(config, terminator),
        }
    }

    pub fn launcher(&self) -> &SessionLauncher {
        &self.launcher
    }

    pub fn launcher_mut(&mut self) -> &mut SessionLauncher {
        &mut self.launcher
    }

    pub fn run(&mut self, query: &Query) -> RawResponse {
        let mut session = match self.launcher.open() {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(query = query.name(), error = %err, "failed to open interpreter session");
                return RawResponse::failure(err.to_string());
            }
        };
        let response = SessionBoundExecutor.run(&mut session, query);
        session.close();
        response
    }
}
