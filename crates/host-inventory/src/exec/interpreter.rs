//! How to reach the external command interpreter.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;

use super::terminate::isolate_process_tree;
use crate::windows_cmd::{POSIX_SHELL, POWERSHELL_EXE};

const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(2);

/// Per-session statements run once before the first query.
const POWERSHELL_PREAMBLE: &str =
    "$ProgressPreference='SilentlyContinue'; [Console]::OutputEncoding=[System.Text.Encoding]::UTF8";

/// Interpreter language spoken over a session pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionDialect {
    PowerShell,
    Posix,
}

impl SessionDialect {
    pub(crate) fn preamble(self) -> Option<&'static str> {
        match self {
            Self::PowerShell => Some(POWERSHELL_PREAMBLE),
            Self::Posix => None,
        }
    }

    /// Bytes written to the session for one command: the command itself,
    /// then statements writing `<marker>` to stderr and
    /// `<marker>:<status of the command>` to stdout, in that order.
    pub(crate) fn submission(self, text: &str, marker: &str) -> String {
        match self {
            // A blank line closes any multi-line statement in `-Command -` mode.
            Self::PowerShell => format!(
                "{text}\n\n$__eguardOk = $?; [Console]::Error.WriteLine('{marker}'); \
                 Write-Output \"{marker}:$__eguardOk\"\n"
            ),
            Self::Posix => format!(
                "{text}\n__eguard_status=$?; echo '{marker}' >&2; echo \"{marker}:$__eguard_status\"\n"
            ),
        }
    }

    /// Whether the status token echoed after a command means success.
    pub(crate) fn status_succeeded(self, token: &str) -> bool {
        let token = token.trim();
        match self {
            Self::PowerShell => token.eq_ignore_ascii_case("true"),
            Self::Posix => token == "0",
        }
    }

    /// Script passed as the command-line argument of a one-shot process.
    pub(crate) fn one_shot_script(self, text: &str) -> String {
        match self.preamble() {
            Some(preamble) => format!("{preamble}; {text}"),
            None => text.to_string(),
        }
    }
}

/// Launch parameters shared by sessions and isolated processes.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpreterConfig {
    pub program: PathBuf,
    /// Arguments that make the program read commands from stdin.
    pub session_args: Vec<String>,
    /// Arguments preceding the query text in a one-shot invocation.
    pub command_args: Vec<String>,
    pub dialect: SessionDialect,
    pub env: Vec<(String, String)>,
    /// Time between a termination request and a forced kill.
    pub kill_grace: Duration,
}

impl InterpreterConfig {
    pub fn powershell() -> Self {
        Self {
            program: PathBuf::from(POWERSHELL_EXE),
            session_args: to_args(&["-NoLogo", "-NoProfile", "-NonInteractive", "-Command", "-"]),
            command_args: to_args(&["-NoLogo", "-NoProfile", "-NonInteractive", "-Command"]),
            dialect: SessionDialect::PowerShell,
            env: Vec::new(),
            kill_grace: DEFAULT_KILL_GRACE,
        }
    }

    pub fn posix_shell() -> Self {
        Self {
            program: PathBuf::from(POSIX_SHELL),
            session_args: to_args(&["-s"]),
            command_args: to_args(&["-c"]),
            dialect: SessionDialect::Posix,
            env: Vec::new(),
            kill_grace: DEFAULT_KILL_GRACE,
        }
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// The session interpreter leads its own process group so closing the
    /// session can reach what its queries left running.
    pub(crate) fn session_command(&self) -> Command {
        let mut command = self.base_command();
        command
            .args(&self.session_args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        isolate_process_tree(&mut command);
        command
    }

    pub(crate) fn one_shot_command(&self, text: &str) -> Command {
        let mut command = self.base_command();
        command
            .args(&self.command_args)
            .arg(self.dialect.one_shot_script(text))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }

    fn base_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        command
    }
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self::powershell()
    }
}

fn to_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| arg.to_string()).collect()
}
