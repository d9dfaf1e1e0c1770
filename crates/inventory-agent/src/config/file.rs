use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::paths::resolve_config_path;
use super::types::InventoryConfig;
use super::util::{non_empty, parse_interpreter, parse_strategy};

impl InventoryConfig {
    pub(super) fn apply_file_config(&mut self, explicit: Option<&Path>) -> Result<bool> {
        let Some(path) = resolve_config_path(explicit)? else {
            return Ok(false);
        };

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed reading config file {}", path.display()))?;
        let file_cfg: FileConfig = toml::from_str(&raw)
            .with_context(|| format!("failed parsing TOML config {}", path.display()))?;

        self.apply_file_collection(file_cfg.collection)
            .with_context(|| format!("invalid [collection] in {}", path.display()))?;
        self.apply_file_interpreter(file_cfg.interpreter)
            .with_context(|| format!("invalid [interpreter] in {}", path.display()))?;
        self.apply_file_logging(file_cfg.logging);

        tracing::debug!(path = %path.display(), "inventory config file applied");
        Ok(true)
    }

    fn apply_file_collection(&mut self, collection: Option<FileCollectionConfig>) -> Result<()> {
        let Some(collection) = collection else {
            return Ok(());
        };

        if let Some(v) = non_empty(collection.strategy) {
            self.strategy =
                parse_strategy(&v).with_context(|| format!("unknown strategy `{v}`"))?;
        }
        if let Some(v) = collection.timeout_ms {
            self.timeout_ms = v;
        }
        if let Some(v) = collection.workers {
            self.workers = v;
        }
        if let Some(v) = collection.queries {
            self.queries = v
                .into_iter()
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty())
                .collect();
        }
        if let Some(v) = non_empty(collection.output) {
            self.output = Some(v.into());
        }
        Ok(())
    }

    fn apply_file_interpreter(&mut self, interpreter: Option<FileInterpreterConfig>) -> Result<()> {
        let Some(interpreter) = interpreter else {
            return Ok(());
        };

        if let Some(v) = non_empty(interpreter.kind) {
            self.interpreter =
                parse_interpreter(&v).with_context(|| format!("unknown interpreter `{v}`"))?;
        }
        if let Some(v) = non_empty(interpreter.path) {
            self.interpreter_path = Some(v);
        }
        if let Some(v) = interpreter.kill_grace_ms {
            self.kill_grace_ms = v;
        }
        Ok(())
    }

    fn apply_file_logging(&mut self, logging: Option<FileLoggingConfig>) {
        let Some(logging) = logging else {
            return;
        };
        if let Some(v) = non_empty(logging.level) {
            self.log_level = v;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    collection: Option<FileCollectionConfig>,
    #[serde(default)]
    interpreter: Option<FileInterpreterConfig>,
    #[serde(default)]
    logging: Option<FileLoggingConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct FileCollectionConfig {
    #[serde(default)]
    strategy: Option<String>,
    #[serde(default)]
    timeout_ms: Option<u64>,
    #[serde(default)]
    workers: Option<usize>,
    #[serde(default)]
    queries: Option<Vec<String>>,
    #[serde(default)]
    output: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct FileInterpreterConfig {
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    kill_grace_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct FileLoggingConfig {
    #[serde(default)]
    level: Option<String>,
}
