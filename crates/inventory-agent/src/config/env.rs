use super::types::InventoryConfig;
use super::util::{env_non_empty, env_parsed, parse_interpreter, parse_strategy, split_csv};

impl InventoryConfig {
    /// Environment overrides. Unparseable values are logged and ignored.
    pub(super) fn apply_env_overrides(&mut self) {
        self.apply_env_collection();
        self.apply_env_interpreter();
        if let Some(v) = env_non_empty("EGUARD_INVENTORY_LOG_LEVEL") {
            self.log_level = v;
        }
    }

    fn apply_env_collection(&mut self) {
        if let Some(strategy) = env_parsed("EGUARD_INVENTORY_STRATEGY", parse_strategy) {
            self.strategy = strategy;
        }
        if let Some(ms) = env_parsed("EGUARD_INVENTORY_TIMEOUT_MS", |v| v.parse::<u64>().ok()) {
            self.timeout_ms = ms;
        }
        if let Some(workers) = env_parsed("EGUARD_INVENTORY_WORKERS", |v| v.parse::<usize>().ok()) {
            self.workers = workers;
        }
        if let Some(v) = env_non_empty("EGUARD_INVENTORY_QUERIES") {
            self.queries = split_csv(&v);
        }
        if let Some(v) = env_non_empty("EGUARD_INVENTORY_OUTPUT") {
            self.output = Some(v.into());
        }
    }

    fn apply_env_interpreter(&mut self) {
        if let Some(kind) = env_parsed("EGUARD_INVENTORY_INTERPRETER", parse_interpreter) {
            self.interpreter = kind;
        }
        if let Some(v) = env_non_empty("EGUARD_INVENTORY_INTERPRETER_PATH") {
            self.interpreter_path = Some(v);
        }
        if let Some(ms) = env_parsed("EGUARD_INVENTORY_KILL_GRACE_MS", |v| v.parse::<u64>().ok()) {
            self.kill_grace_ms = ms;
        }
    }
}
