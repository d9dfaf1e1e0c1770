mod cli;
mod config;
mod logging;
mod snapshot;

use std::io::Write;

use anyhow::{Context, Result};
use tracing::info;

use cli::Cli;
use config::InventoryConfig;

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    if cli.list_queries {
        for entry in host_inventory::query::catalogue::all() {
            println!("{}\t{}\t{}", entry.name(), entry.query.shape().as_str(), entry.entity);
        }
        return Ok(());
    }

    let log = logging::init_stderr_logging(cli.log_level.as_deref().unwrap_or("info"));
    let mut cfg = InventoryConfig::load(cli.config.as_deref())?;
    cli.apply_to(&mut cfg);
    log.apply_level(&cfg.log_level);
    cfg.validate()?;

    info!(
        strategy = cfg.strategy.as_str(),
        interpreter = ?cfg.interpreter,
        timeout_ms = cfg.timeout_ms,
        workers = cfg.workers,
        "eguard-inventory started"
    );

    let snapshot = snapshot::collect(&cfg)?;
    let rendered =
        serde_json::to_string_pretty(&snapshot).context("failed serializing inventory snapshot")?;

    match &cfg.output {
        Some(path) => std::fs::write(path, rendered.as_bytes())
            .with_context(|| format!("failed writing snapshot to {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{rendered}").context("failed writing snapshot to stdout")?;
        }
    }

    info!(failures = snapshot.failures.len(), "eguard-inventory finished");
    Ok(())
}
