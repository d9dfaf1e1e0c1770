//! Command-line flags. Every flag overrides the file and environment layers.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{parse_interpreter, parse_strategy, InterpreterKind, InventoryConfig, Strategy};

/// Collect a host inventory snapshot as JSON.
#[derive(Parser, Debug, Default)]
#[command(name = "eguard-inventory")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path (overrides EGUARD_INVENTORY_CONFIG)
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Execution strategy: auto, session or isolated
    #[arg(short = 's', long, value_name = "STRATEGY", value_parser = strategy_arg)]
    pub strategy: Option<Strategy>,

    /// Per-query timeout for the isolated strategy
    #[arg(short = 't', long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Grace period between a stop request and a forced kill
    #[arg(long, value_name = "MS")]
    pub kill_grace_ms: Option<u64>,

    /// Worker threads for the isolated strategy
    #[arg(short = 'w', long, value_name = "N")]
    pub workers: Option<usize>,

    /// Interpreter dialect: powershell or posix
    #[arg(long, value_name = "KIND", value_parser = interpreter_arg)]
    pub interpreter: Option<InterpreterKind>,

    /// Interpreter executable
    #[arg(long, value_name = "PATH")]
    pub interpreter_path: Option<String>,

    /// Comma-separated catalogue query names (default: all)
    #[arg(short = 'q', long, value_name = "NAMES", value_delimiter = ',')]
    pub queries: Vec<String>,

    /// Write the snapshot to a file instead of stdout
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset (e.g. info, debug)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Print the catalogue query names and exit
    #[arg(long)]
    pub list_queries: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn apply_to(&self, cfg: &mut InventoryConfig) {
        if let Some(v) = self.strategy {
            cfg.strategy = v;
        }
        if let Some(v) = self.timeout_ms {
            cfg.timeout_ms = v;
        }
        if let Some(v) = self.kill_grace_ms {
            cfg.kill_grace_ms = v;
        }
        if let Some(v) = self.workers {
            cfg.workers = v;
        }
        if let Some(v) = self.interpreter {
            cfg.interpreter = v;
        }
        if let Some(v) = &self.interpreter_path {
            cfg.interpreter_path = Some(v.clone());
        }
        let queries: Vec<String> = self
            .queries
            .iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect();
        if !queries.is_empty() {
            cfg.queries = queries;
        }
        if let Some(v) = &self.output {
            cfg.output = Some(v.clone());
        }
        if let Some(v) = &self.log_level {
            cfg.log_level = v.clone();
        }
    }
}

fn strategy_arg(raw: &str) -> Result<Strategy, String> {
    parse_strategy(raw)
        .ok_or_else(|| format!("invalid strategy: {raw}. Expected: auto, session, or isolated"))
}

fn interpreter_arg(raw: &str) -> Result<InterpreterKind, String> {
    parse_interpreter(raw)
        .ok_or_else(|| format!("invalid interpreter: {raw}. Expected: powershell or posix"))
}
