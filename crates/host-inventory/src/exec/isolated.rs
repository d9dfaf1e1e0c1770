//! One fresh interpreter process per query, bounded by a timeout.
//!
//! Nothing is shared between calls, which makes this the executor to use
//! from worker pools and parallel collectors.

use std::io::Read;
use std::process::{Child, ExitStatus};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use wait_timeout::ChildExt;

use super::interpreter::InterpreterConfig;
use super::terminate::{isolate_process_tree, terminate_tree, ProcessTerminator, SystemTerminator};
use super::{QueryTimeout, RawResponse};
use crate::query::Query;

#[derive(Clone)]
pub struct IsolatedExecutor {
    config: InterpreterConfig,
    terminator: Arc<dyn ProcessTerminator>,
}

impl IsolatedExecutor {
    pub fn new(config: InterpreterConfig) -> Self {
        Self::with_terminator(config, Arc::new(SystemTerminator))
    }

    pub fn with_terminator(config: InterpreterConfig, terminator: Arc<dyn ProcessTerminator>) -> Self {
        Self { config, terminator }
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn run(&self, query: &Query, timeout: QueryTimeout) -> RawResponse {
        let started = Instant::now();
        let deadline = started + timeout.duration();

        let mut command = self.config.one_shot_command(query.text());
        isolate_process_tree(&mut command);
        let child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                tracing::warn!(
                    query = query.name(),
                    program = %self.config.program.display(),
                    error = %err,
                    "failed to spawn isolated interpreter"
                );
                return RawResponse::failure(format!(
                    "failed to spawn interpreter {}: {err}",
                    self.config.program.display()
                ));
            }
        };

        let mut process = Supervised::new(child, self.terminator.as_ref(), self.config.kill_grace);
        let pid = process.pid();
        let stdout = process.child.stdout.take().map(PipeCapture::start);
        let stderr = process.child.stderr.take().map(PipeCapture::start);

        let status = match process.child.wait_timeout(timeout.duration()) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let termination = process.terminate();
                tracing::warn!(
                    query = query.name(),
                    pid,
                    timeout_ms = timeout.duration().as_millis() as u64,
                    ?termination,
                    "isolated query timed out"
                );
                return RawResponse::timeout(timeout.duration());
            }
            Err(err) => {
                process.terminate();
                return RawResponse::failure(format!(
                    "failed waiting for interpreter process {pid}: {err}"
                ));
            }
        };
        process.mark_reaped();

        // Descendants can keep the output pipes open after the interpreter
        // exits; they get the rest of the deadline and are then torn down.
        let drained = [stdout.as_ref(), stderr.as_ref()]
            .into_iter()
            .flatten()
            .all(|capture| capture.wait_closed(deadline));
        if !drained {
            let _ = self.terminator.force_kill(pid);
            tracing::warn!(
                query = query.name(),
                pid,
                "isolated query output still open at deadline"
            );
            return RawResponse::timeout(timeout.duration());
        }

        let out = stdout.map(|c| c.into_string()).unwrap_or_default();
        let err = stderr.map(|c| c.into_string()).unwrap_or_default();
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if status.success() {
            tracing::debug!(query = query.name(), pid, elapsed_ms, "isolated query completed");
            RawResponse::success(out)
        } else {
            tracing::warn!(
                query = query.name(),
                pid,
                elapsed_ms,
                %status,
                "isolated query failed"
            );
            RawResponse::failure(exit_diagnostic(status, &out, &err))
        }
    }
}

impl std::fmt::Debug for IsolatedExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IsolatedExecutor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Owns a spawned interpreter until it has been reaped, terminating the tree
/// on every early exit path.
struct Supervised<'a> {
    child: Child,
    terminator: &'a dyn ProcessTerminator,
    grace: Duration,
    reaped: bool,
}

impl<'a> Supervised<'a> {
    fn new(child: Child, terminator: &'a dyn ProcessTerminator, grace: Duration) -> Self {
        Self {
            child,
            terminator,
            grace,
            reaped: false,
        }
    }

    fn pid(&self) -> u32 {
        self.child.id()
    }

    fn mark_reaped(&mut self) {
        self.reaped = true;
    }

    fn terminate(&mut self) -> super::Termination {
        self.reaped = true;
        terminate_tree(&mut self.child, self.terminator, self.grace)
    }
}

impl Drop for Supervised<'_> {
    fn drop(&mut self) {
        if !self.reaped {
            terminate_tree(&mut self.child, self.terminator, self.grace);
        }
    }
}

/// Incremental capture of one output pipe on a background thread.
struct PipeCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
    closed: Receiver<()>,
}

impl PipeCapture {
    fn start<R>(mut pipe: R) -> Self
    where
        R: Read + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);
        let (closed_tx, closed) = mpsc::channel();

        std::thread::spawn(move || {
            let mut chunk = [0u8; 8192];
            loop {
                match pipe.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => match sink.lock() {
                        Ok(mut buffer) => buffer.extend_from_slice(&chunk[..n]),
                        Err(_) => break,
                    },
                    Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
            let _ = closed_tx.send(());
        });

        Self { buffer, closed }
    }

    /// Wait for end-of-stream until `deadline`. Returns whether it closed.
    fn wait_closed(&self, deadline: Instant) -> bool {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match self.closed.recv_timeout(remaining) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) => false,
        }
    }

    fn into_string(self) -> String {
        let bytes = match self.buffer.lock() {
            Ok(mut buffer) => std::mem::take(&mut *buffer),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

fn exit_diagnostic(status: ExitStatus, stdout: &str, stderr: &str) -> String {
    let mut text = match status.code() {
        Some(code) => format!("interpreter exited with code {code}"),
        None => format!("interpreter terminated abnormally ({status})"),
    };
    for part in [stderr.trim(), stdout.trim()] {
        if !part.is_empty() {
            text.push('\n');
            text.push_str(part);
        }
    }
    text
}
