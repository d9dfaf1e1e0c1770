//! Long-lived interpreter sessions driven over stdin/stdout pipes.

use std::fmt;
use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdin, ChildStdout};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use wait_timeout::ChildExt;

use super::interpreter::{InterpreterConfig, SessionDialect};
use super::terminate::{terminate_tree, ProcessTerminator, SystemTerminator};
use super::RawResponse;
use crate::error::{QueryError, Result};
use crate::query::Query;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Completion markers are echoed on stdout (with the status) and on stderr.
const MARKER_PREFIX: &str = "__eguard_query_done_";

/// Opens interpreter sessions from one mutable launch configuration.
///
/// The launcher is an unshared resource: `open` and `config_mut` take
/// `&mut self`, so threads that want sessions must hand the launcher around
/// or put it behind a lock of their own. Sessions opened from the same
/// launcher are not guaranteed independent under concurrent load.
pub struct SessionLauncher {
    config: InterpreterConfig,
    terminator: Arc<dyn ProcessTerminator>,
    opened: u64,
}

impl SessionLauncher {
    pub fn new(config: InterpreterConfig) -> Self {
        Self::with_terminator(config, Arc::new(SystemTerminator))
    }

    /// Sessions opened by this launcher are stopped through `terminator`
    /// when they close.
    pub fn with_terminator(config: InterpreterConfig, terminator: Arc<dyn ProcessTerminator>) -> Self {
        Self {
            config,
            terminator,
            opened: 0,
        }
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut InterpreterConfig {
        &mut self.config
    }

    /// Number of sessions this launcher has opened so far.
    pub fn sessions_opened(&self) -> u64 {
        self.opened
    }

    pub fn open(&mut self) -> Result<InterpreterSession> {
        let mut child = self.config.session_command().spawn().map_err(|err| {
            QueryError::Execution {
                detail: format!(
                    "failed to spawn interpreter session {}: {err}",
                    self.config.program.display()
                ),
            }
        })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let (Some(stdin), Some(stdout)) = (stdin, stdout) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(QueryError::Execution {
                detail: "interpreter session pipes unavailable".to_string(),
            });
        };

        let stderr = Arc::new(StderrSink::default());
        let stderr_thread = child
            .stderr
            .take()
            .map(|pipe| spawn_stderr_drain(pipe, Arc::clone(&stderr)));
        if stderr_thread.is_none() {
            stderr.update(|state| state.closed = true);
        }

        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        self.opened += 1;

        let mut session = InterpreterSession {
            id,
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
            stderr,
            stderr_thread,
            terminator: Arc::clone(&self.terminator),
            dialect: self.config.dialect,
            kill_grace: self.config.kill_grace,
            sequence: 0,
            open: true,
        };
        tracing::debug!(session = id, pid = session.pid(), "interpreter session opened");

        if let Some(preamble) = self.config.dialect.preamble() {
            let response = session.submit(preamble);
            if !response.succeeded() {
                return Err(QueryError::Execution {
                    detail: format!("interpreter session preamble failed: {}", response.text()),
                });
            }
        }

        Ok(session)
    }
}

impl Default for SessionLauncher {
    fn default() -> Self {
        Self::new(InterpreterConfig::default())
    }
}

impl fmt::Debug for SessionLauncher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionLauncher")
            .field("config", &self.config)
            .field("opened", &self.opened)
            .finish_non_exhaustive()
    }
}

/// An open interpreter process accepting commands on stdin.
///
/// Commands run strictly one after another. Dropping the session closes it:
/// stdin is closed and the process gets `kill_grace` to exit. Its process
/// group is then killed, which also takes down jobs queries left running in
/// the background, and the interpreter is reaped.
pub struct InterpreterSession {
    id: u64,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    stderr: Arc<StderrSink>,
    stderr_thread: Option<JoinHandle<()>>,
    terminator: Arc<dyn ProcessTerminator>,
    dialect: SessionDialect,
    kill_grace: Duration,
    sequence: u64,
    open: bool,
}

impl InterpreterSession {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Run one command and block until the interpreter reports completion.
    pub(crate) fn submit(&mut self, text: &str) -> RawResponse {
        if !self.open {
            return RawResponse::failure("interpreter session is closed");
        }

        self.sequence += 1;
        let marker = format!("{MARKER_PREFIX}{}_{}__", self.id, self.sequence);
        let needle = format!("{marker}:");
        let payload = self.dialect.submission(text, &marker);
        self.take_stderr();

        let written = match self.stdin.as_mut() {
            Some(stdin) => stdin
                .write_all(payload.as_bytes())
                .and_then(|()| stdin.flush()),
            None => return RawResponse::failure("interpreter session is closed"),
        };
        if let Err(err) = written {
            self.close();
            return RawResponse::failure(format!("failed writing to interpreter session: {err}"));
        }

        let mut lines: Vec<String> = Vec::new();
        let mut line = String::new();
        loop {
            line.clear();
            match self.stdout.read_line(&mut line) {
                Ok(0) => {
                    self.close();
                    let output = lines.join("\n");
                    let stderr = self.take_stderr();
                    return RawResponse::failure(diagnostic(
                        "interpreter session exited before the command completed",
                        &output,
                        &stderr,
                    ));
                }
                Ok(_) => {
                    let current = line.trim_end_matches(['\r', '\n']);
                    let Some(at) = current.find(needle.as_str()) else {
                        lines.push(current.to_string());
                        continue;
                    };

                    // Output without a trailing newline shares the marker's line.
                    if at > 0 {
                        lines.push(current[..at].to_string());
                    }
                    let status = &current[at + needle.len()..];
                    let output = lines.join("\n");
                    let stderr = self.settle_stderr(&marker);
                    if self.dialect.status_succeeded(status) {
                        return RawResponse::success(output);
                    }
                    return RawResponse::failure(diagnostic(
                        &format!("interpreter reported failure (status {})", status.trim()),
                        &output,
                        &stderr,
                    ));
                }
                Err(err) => {
                    self.close();
                    return RawResponse::failure(format!(
                        "failed reading from interpreter session: {err}"
                    ));
                }
            }
        }
    }

    /// Close the session and reap the interpreter. Idempotent.
    ///
    /// Returns within about two `kill_grace` periods even when a background
    /// job keeps the interpreter's pipes open.
    pub fn close(&mut self) {
        if !self.open && self.stdin.is_none() && self.stderr_thread.is_none() {
            return;
        }
        self.open = false;
        drop(self.stdin.take());

        let pid = self.child.id();
        match self.child.wait_timeout(self.kill_grace) {
            Ok(Some(_)) => {
                // Background jobs outlive the interpreter inside its group.
                if let Err(err) = self.terminator.force_kill(pid) {
                    tracing::trace!(session = self.id, pid, error = %err, "session group sweep found nothing");
                }
            }
            Ok(None) | Err(_) => {
                tracing::warn!(
                    session = self.id,
                    pid,
                    "interpreter session did not exit after stdin closed, terminating"
                );
                terminate_tree(&mut self.child, self.terminator.as_ref(), self.kill_grace);
            }
        }

        self.release_stderr_drain();
        tracing::debug!(session = self.id, "interpreter session closed");
    }

    /// Join the stderr drain once the pipe closes, or detach it when a
    /// process outside the group still holds the pipe after `kill_grace`.
    fn release_stderr_drain(&mut self) {
        let Some(handle) = self.stderr_thread.take() else {
            return;
        };
        let deadline = Instant::now() + self.kill_grace;
        if self.stderr.wait_until(deadline, |state| state.closed) {
            let _ = handle.join();
        } else {
            tracing::debug!(session = self.id, "stderr still held open, detaching drain thread");
        }
    }

    /// Stderr written by the command that echoed `marker`. The interpreter
    /// writes the marker to stderr before stdout, so it is normally already
    /// drained; waiting is bounded by `kill_grace`.
    fn settle_stderr(&self, marker: &str) -> String {
        let deadline = Instant::now() + self.kill_grace;
        let settled = self.stderr.wait_until(deadline, |state| {
            state.closed || state.marker.as_deref() == Some(marker)
        });
        if !settled {
            tracing::debug!(session = self.id, marker, "stderr marker not seen before deadline");
        }
        self.take_stderr()
    }

    fn take_stderr(&self) -> String {
        std::mem::take(&mut self.stderr.lock().text)
    }
}

impl Drop for InterpreterSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for InterpreterSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterpreterSession")
            .field("id", &self.id)
            .field("pid", &self.child.id())
            .field("dialect", &self.dialect)
            .field("open", &self.open)
            .finish()
    }
}

/// Runs queries on a caller-owned session. Never opens or closes sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionBoundExecutor;

impl SessionBoundExecutor {
    pub fn run(&self, session: &mut InterpreterSession, query: &Query) -> RawResponse {
        let started = Instant::now();
        let response = session.submit(query.text());
        let elapsed_ms = started.elapsed().as_millis() as u64;
        if response.succeeded() {
            tracing::debug!(
                query = query.name(),
                session = session.id(),
                elapsed_ms,
                "session query completed"
            );
        } else {
            tracing::warn!(
                query = query.name(),
                session = session.id(),
                elapsed_ms,
                detail = response.text(),
                "session query failed"
            );
        }
        response
    }
}

#[derive(Debug, Default)]
struct StderrState {
    text: String,
    /// Last completion marker seen on stderr.
    marker: Option<String>,
    closed: bool,
}

#[derive(Debug, Default)]
struct StderrSink {
    state: Mutex<StderrState>,
    changed: Condvar,
}

impl StderrSink {
    fn lock(&self) -> MutexGuard<'_, StderrState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, apply: impl FnOnce(&mut StderrState)) {
        apply(&mut self.lock());
        self.changed.notify_all();
    }

    /// Block until `done` holds or `deadline` passes. Returns whether `done` held.
    fn wait_until(&self, deadline: Instant, done: impl Fn(&StderrState) -> bool) -> bool {
        let mut state = self.lock();
        loop {
            if done(&state) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            state = match self.changed.wait_timeout(state, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }
}

fn spawn_stderr_drain<R>(pipe: R, sink: Arc<StderrSink>) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    std::thread::spawn(move || {
        let mut reader = BufReader::new(pipe);
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => sink.update(|state| match line.find(MARKER_PREFIX) {
                    Some(at) => {
                        state.text.push_str(&line[..at]);
                        state.marker = Some(line[at..].trim_end().to_string());
                    }
                    None => state.text.push_str(&line),
                }),
            }
        }
        sink.update(|state| state.closed = true);
    })
}

fn diagnostic(summary: &str, stdout: &str, stderr: &str) -> String {
    let mut text = summary.to_string();
    for part in [stdout.trim(), stderr.trim()] {
        if !part.is_empty() {
            text.push('\n');
            text.push_str(part);
        }
    }
    text
}
