use std::path::{Path, PathBuf};

use anyhow::Result;

use super::constants::{CONFIG_PATH_ENV, INVENTORY_CONFIG_CANDIDATES};

pub(super) fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("config file does not exist: {}", path.display());
        }
        return Ok(Some(path.to_path_buf()));
    }
    resolve_path_from_env_or_candidates(CONFIG_PATH_ENV, &INVENTORY_CONFIG_CANDIDATES)
}

fn resolve_path_from_env_or_candidates(
    env_var: &str,
    candidates: &[&str],
) -> Result<Option<PathBuf>> {
    if let Ok(p) = std::env::var(env_var) {
        let p = p.trim();
        if !p.is_empty() {
            let path = PathBuf::from(p);
            if !path.exists() {
                anyhow::bail!("configured {} does not exist: {}", env_var, path.display());
            }
            return Ok(Some(path));
        }
    }

    for candidate in candidates {
        let p = Path::new(candidate);
        if p.exists() {
            return Ok(Some(p.to_path_buf()));
        }
    }

    Ok(None)
}
