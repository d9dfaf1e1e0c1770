//! Logging setup. Logs go to stderr so stdout carries only the snapshot.
//!
//! Logging starts before the configuration is loaded, so warnings about bad
//! config values are not lost. The filter is swapped for the configured level
//! once it is known.

use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{reload, EnvFilter, Registry};

const FALLBACK_LEVEL: &str = "info";

/// Handle to the installed filter.
pub struct LogHandle {
    filter: reload::Handle<EnvFilter, Registry>,
    /// `RUST_LOG` was set and keeps precedence over the configured level.
    from_env: bool,
}

impl LogHandle {
    /// Switch to the configured `level` unless `RUST_LOG` is in charge.
    pub fn apply_level(&self, level: &str) {
        if self.from_env {
            return;
        }
        if let Err(err) = self.filter.reload(level_filter(level)) {
            tracing::warn!(error = %err, level, "failed to apply configured log level");
        }
    }
}

/// `RUST_LOG` wins when set; otherwise `bootstrap` until
/// [`LogHandle::apply_level`] installs the configured level.
pub fn init_stderr_logging(bootstrap: &str) -> LogHandle {
    let (subscriber, handle) =
        stderr_subscriber(EnvFilter::try_from_default_env().ok(), bootstrap, std::io::stderr);
    subscriber.init();
    handle
}

fn stderr_subscriber<W>(
    env_filter: Option<EnvFilter>,
    bootstrap: &str,
    writer: W,
) -> (impl Subscriber + Send + Sync + 'static, LogHandle)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let from_env = env_filter.is_some();
    let filter = env_filter.unwrap_or_else(|| level_filter(bootstrap));
    let (filter, handle) = reload::Layer::new(filter);
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false));
    (
        subscriber,
        LogHandle {
            filter: handle,
            from_env,
        },
    )
}

fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(FALLBACK_LEVEL))
}

/// Run `f` under a subscriber at `bootstrap` level that writes into a buffer;
/// returns the captured log text.
#[cfg(test)]
pub(crate) fn capture_logs(bootstrap: &str, f: impl FnOnce(&LogHandle)) -> String {
    capture_with(None, bootstrap, f)
}

#[cfg(test)]
fn capture_with(
    env_filter: Option<EnvFilter>,
    bootstrap: &str,
    f: impl FnOnce(&LogHandle),
) -> String {
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Buffer {
        fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
            if let Ok(mut inner) = self.0.lock() {
                inner.extend_from_slice(bytes);
            }
            Ok(bytes.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let buffer = Buffer::default();
    let sink = buffer.clone();
    let (subscriber, handle) = stderr_subscriber(env_filter, bootstrap, move || sink.clone());
    tracing::subscriber::with_default(subscriber, || f(&handle));

    let bytes = buffer.0.lock().map(|inner| inner.clone()).unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}
