use std::path::Path;

use anyhow::{Context, Result};
use host_inventory::query::catalogue;
use host_inventory::QueryTimeout;

use super::constants::MAX_WORKERS;
use super::types::InventoryConfig;

impl InventoryConfig {
    /// Defaults, then the TOML file (explicit path, `EGUARD_INVENTORY_CONFIG`,
    /// or the first existing candidate), then environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_file_config(explicit)?;
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// Reject settings no collection could run with. Clamps `workers`.
    pub fn validate(&mut self) -> Result<()> {
        self.query_timeout()?;
        self.workers = self.workers.clamp(1, MAX_WORKERS);
        for name in &self.queries {
            if catalogue::find(name).is_none() {
                anyhow::bail!("unknown inventory query `{name}`");
            }
        }
        Ok(())
    }

    pub fn query_timeout(&self) -> Result<QueryTimeout> {
        QueryTimeout::from_millis(self.timeout_ms)
            .with_context(|| format!("invalid timeout_ms {}", self.timeout_ms))
    }
}
