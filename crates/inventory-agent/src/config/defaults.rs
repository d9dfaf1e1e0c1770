use super::constants::{
    DEFAULT_KILL_GRACE_MS, DEFAULT_LOG_LEVEL, DEFAULT_TIMEOUT_MS, DEFAULT_WORKERS,
};
use super::types::{InterpreterKind, InventoryConfig, Strategy};

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Isolated,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            kill_grace_ms: DEFAULT_KILL_GRACE_MS,
            workers: DEFAULT_WORKERS,
            interpreter: InterpreterKind::PowerShell,
            interpreter_path: None,
            queries: Vec::new(),
            output: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}
