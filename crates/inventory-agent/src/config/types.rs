use std::path::PathBuf;
use std::time::Duration;

use host_inventory::InterpreterConfig;

/// How catalogue queries are dispatched to the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One short-lived session per query, run sequentially.
    Auto,
    /// One session opened up front and reused for every query.
    Session,
    /// One isolated process per query, spread over worker threads.
    Isolated,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Session => "session",
            Self::Isolated => "isolated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpreterKind {
    PowerShell,
    Posix,
}

#[derive(Debug, Clone)]
pub struct InventoryConfig {
    pub strategy: Strategy,
    pub timeout_ms: u64,
    pub kill_grace_ms: u64,
    pub workers: usize,
    pub interpreter: InterpreterKind,
    pub interpreter_path: Option<String>,
    /// Catalogue query names to run; empty means all.
    pub queries: Vec<String>,
    /// Snapshot destination; stdout when unset.
    pub output: Option<PathBuf>,
    pub log_level: String,
}

impl InventoryConfig {
    pub fn interpreter_config(&self) -> InterpreterConfig {
        let mut config = match self.interpreter {
            InterpreterKind::PowerShell => InterpreterConfig::powershell(),
            InterpreterKind::Posix => InterpreterConfig::posix_shell(),
        };
        if let Some(path) = &self.interpreter_path {
            config = config.with_program(path);
        }
        config.with_kill_grace(Duration::from_millis(self.kill_grace_ms))
    }
}
