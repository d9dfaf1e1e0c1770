//! Typed entry points chaining an executor with the normalizer.
//!
//! Each call runs synchronously on the calling thread and never retries.
//! `get` and `get_in_session` need exclusive access (`&mut`) to the launcher
//! or the session; `get_with_timeout` takes `&self` and may be called from
//! any number of threads at once.

use std::sync::Arc;

use crate::entity::Entity;
use crate::error::Result;
use crate::exec::{
    AutoManagedExecutor, ExecutionContext, InterpreterConfig, InterpreterSession,
    IsolatedExecutor, ProcessTerminator, QueryTimeout, RawResponse, SessionBoundExecutor,
    SessionLauncher,
};
use crate::query::{EntityQuery, Query, Shape};

#[derive(Debug)]
pub struct QueryService {
    auto: AutoManagedExecutor,
    isolated: IsolatedExecutor,
}

impl QueryService {
    pub fn new(config: InterpreterConfig) -> Self {
        Self {
            auto: AutoManagedExecutor::new(config.clone()),
            isolated: IsolatedExecutor::new(config),
        }
    }

    pub fn with_terminator(config: InterpreterConfig, terminator: Arc<dyn ProcessTerminator>) -> Self {
        Self {
            auto: AutoManagedExecutor::with_terminator(config.clone(), Arc::clone(&terminator)),
            isolated: IsolatedExecutor::with_terminator(config, terminator),
        }
    }

    /// Launcher used for auto-managed sessions and for opening caller sessions.
    pub fn launcher_mut(&mut self) -> &mut SessionLauncher {
        self.auto.launcher_mut()
    }

    pub fn open_session(&mut self) -> Result<InterpreterSession> {
        self.auto.launcher_mut().open()
    }

    pub fn isolated(&self) -> &IsolatedExecutor {
        &self.isolated
    }

    /// Run on a short-lived session opened and closed for this query.
    pub fn get<E: Entity, S: Shape>(&mut self, query: &EntityQuery<E, S>) -> Result<S::Output<E>> {
        query.decode(self.auto.run(query.query()))
    }

    /// Run on a session the caller owns. The session stays open.
    pub fn get_in_session<E: Entity, S: Shape>(
        &self,
        session: &mut InterpreterSession,
        query: &EntityQuery<E, S>,
    ) -> Result<S::Output<E>> {
        query.decode(SessionBoundExecutor.run(session, query.query()))
    }

    /// Run in a fresh interpreter process killed once `timeout` elapses.
    pub fn get_with_timeout<E: Entity, S: Shape>(
        &self,
        query: &EntityQuery<E, S>,
        timeout: QueryTimeout,
    ) -> Result<S::Output<E>> {
        query.decode(self.isolated.run(query.query(), timeout))
    }

    /// Run with the strategy selected by `context`.
    pub fn execute<E: Entity, S: Shape>(
        &mut self,
        query: &EntityQuery<E, S>,
        context: ExecutionContext<'_>,
    ) -> Result<S::Output<E>> {
        query.decode(self.execute_raw(query.query(), context))
    }

    /// Run an untyped query and hand back the response without decoding it.
    pub fn execute_raw(&mut self, query: &Query, context: ExecutionContext<'_>) -> RawResponse {
        tracing::debug!(
            query = query.name(),
            shape = query.shape().as_str(),
            strategy = context.strategy(),
            "executing query"
        );
        match context {
            ExecutionContext::None => self.auto.run(query),
            ExecutionContext::CallerSession(session) => SessionBoundExecutor.run(session, query),
            ExecutionContext::TimeoutBound(timeout) => self.isolated.run(query, timeout),
        }
    }
}

impl Default for QueryService {
    fn default() -> Self {
        Self::new(InterpreterConfig::default())
    }
}
