use super::*;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn clear_env() {
    let vars = [
        "EGUARD_INVENTORY_CONFIG",
        "EGUARD_INVENTORY_STRATEGY",
        "EGUARD_INVENTORY_TIMEOUT_MS",
        "EGUARD_INVENTORY_WORKERS",
        "EGUARD_INVENTORY_QUERIES",
        "EGUARD_INVENTORY_OUTPUT",
        "EGUARD_INVENTORY_INTERPRETER",
        "EGUARD_INVENTORY_INTERPRETER_PATH",
        "EGUARD_INVENTORY_KILL_GRACE_MS",
        "EGUARD_INVENTORY_LOG_LEVEL",
    ];
    for v in vars {
        std::env::remove_var(v);
    }
}

fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("inventory.conf");
    let mut f = std::fs::File::create(&path).expect("create file");
    f.write_all(body.as_bytes()).expect("write file");
    path
}

#[test]
fn defaults_apply_without_file_or_env() {
    let _guard = env_lock().lock().expect("env lock");
    clear_env();

    let cfg = InventoryConfig::load(None).expect("load config");
    assert_eq!(cfg.strategy, Strategy::Isolated);
    assert_eq!(cfg.interpreter, InterpreterKind::PowerShell);
    assert_eq!(cfg.timeout_ms, 30_000);
    assert_eq!(cfg.workers, 4);
    assert!(cfg.queries.is_empty());
    assert!(cfg.output.is_none());
}

#[test]
fn file_config_is_loaded() {
    let _guard = env_lock().lock().expect("env lock");
    clear_env();

    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_config(
        &dir,
        "[collection]\nstrategy=\"session\"\ntimeout_ms=5000\nworkers=2\nqueries=[\"bios\", \" hot_fixes \"]\noutput=\"/tmp/snapshot.json\"\n[interpreter]\nkind=\"posix\"\npath=\"/bin/sh\"\nkill_grace_ms=250\n[logging]\nlevel=\"debug\"\n",
    );
    std::env::set_var("EGUARD_INVENTORY_CONFIG", &path);

    let cfg = InventoryConfig::load(None).expect("load config");
    assert_eq!(cfg.strategy, Strategy::Session);
    assert_eq!(cfg.timeout_ms, 5000);
    assert_eq!(cfg.workers, 2);
    assert_eq!(cfg.queries, vec!["bios".to_string(), "hot_fixes".to_string()]);
    assert_eq!(cfg.output, Some(PathBuf::from("/tmp/snapshot.json")));
    assert_eq!(cfg.interpreter, InterpreterKind::Posix);
    assert_eq!(cfg.interpreter_path.as_deref(), Some("/bin/sh"));
    assert_eq!(cfg.kill_grace_ms, 250);
    assert_eq!(cfg.log_level, "debug");

    let interpreter = cfg.interpreter_config();
    assert_eq!(interpreter.program, PathBuf::from("/bin/sh"));
    assert_eq!(interpreter.kill_grace, std::time::Duration::from_millis(250));

    clear_env();
}

#[test]
fn env_overrides_file_config() {
    let _guard = env_lock().lock().expect("env lock");
    clear_env();

    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_config(&dir, "[collection]\nstrategy=\"session\"\ntimeout_ms=5000\n");
    std::env::set_var("EGUARD_INVENTORY_CONFIG", &path);
    std::env::set_var("EGUARD_INVENTORY_STRATEGY", "auto");
    std::env::set_var("EGUARD_INVENTORY_TIMEOUT_MS", "750");
    std::env::set_var("EGUARD_INVENTORY_QUERIES", "bios, processors,,");
    std::env::set_var("EGUARD_INVENTORY_INTERPRETER", "sh");

    let cfg = InventoryConfig::load(None).expect("load config");
    assert_eq!(cfg.strategy, Strategy::Auto);
    assert_eq!(cfg.timeout_ms, 750);
    assert_eq!(cfg.queries, vec!["bios".to_string(), "processors".to_string()]);
    assert_eq!(cfg.interpreter, InterpreterKind::Posix);

    clear_env();
}

#[test]
fn unparseable_env_values_are_ignored() {
    let _guard = env_lock().lock().expect("env lock");
    clear_env();

    std::env::set_var("EGUARD_INVENTORY_STRATEGY", "parallel");
    std::env::set_var("EGUARD_INVENTORY_WORKERS", "many");

    let cfg = InventoryConfig::load(None).expect("load config");
    assert_eq!(cfg.strategy, Strategy::Isolated);
    assert_eq!(cfg.workers, 4);

    clear_env();
}

#[test]
fn every_unparseable_env_value_is_logged() {
    let _guard = env_lock().lock().expect("env lock");
    clear_env();

    std::env::set_var("EGUARD_INVENTORY_STRATEGY", "parallel");
    std::env::set_var("EGUARD_INVENTORY_TIMEOUT_MS", "soon");
    std::env::set_var("EGUARD_INVENTORY_WORKERS", "many");
    std::env::set_var("EGUARD_INVENTORY_INTERPRETER", "cmd");
    std::env::set_var("EGUARD_INVENTORY_KILL_GRACE_MS", "-1");

    let logs = crate::logging::capture_logs("warn", |_| {
        let cfg = InventoryConfig::load(None).expect("load config");
        assert_eq!(cfg.timeout_ms, 30_000);
        assert_eq!(cfg.kill_grace_ms, 2_000);
    });
    for var in [
        "EGUARD_INVENTORY_STRATEGY",
        "EGUARD_INVENTORY_TIMEOUT_MS",
        "EGUARD_INVENTORY_WORKERS",
        "EGUARD_INVENTORY_INTERPRETER",
        "EGUARD_INVENTORY_KILL_GRACE_MS",
    ] {
        assert!(logs.contains(var), "no warning for {var}: {logs}");
    }
    assert_eq!(logs.matches("ignoring invalid environment override").count(), 5);

    clear_env();
}

#[test]
fn invalid_file_values_fail_loading() {
    let _guard = env_lock().lock().expect("env lock");
    clear_env();

    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_config(&dir, "[collection]\nstrategy=\"parallel\"\n");
    let err = InventoryConfig::load(Some(&path)).expect_err("unknown strategy");
    assert!(format!("{err:#}").contains("unknown strategy `parallel`"));

    let path = write_config(&dir, "[collection\n");
    let err = InventoryConfig::load(Some(&path)).expect_err("bad toml");
    assert!(err.to_string().contains("failed parsing TOML config"));
}

#[test]
fn missing_config_path_is_an_error() {
    let _guard = env_lock().lock().expect("env lock");
    clear_env();

    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("absent.conf");
    assert!(InventoryConfig::load(Some(&missing)).is_err());

    std::env::set_var("EGUARD_INVENTORY_CONFIG", &missing);
    let err = InventoryConfig::load(None).expect_err("missing env path");
    assert!(err.to_string().contains("EGUARD_INVENTORY_CONFIG"));

    clear_env();
}

#[test]
fn validate_rejects_zero_timeout_and_unknown_queries() {
    let mut cfg = InventoryConfig {
        timeout_ms: 0,
        ..InventoryConfig::default()
    };
    assert!(cfg.validate().is_err());

    cfg.timeout_ms = 1000;
    cfg.queries = vec!["bios".to_string(), "registry_dump".to_string()];
    let err = cfg.validate().expect_err("unknown query");
    assert!(err.to_string().contains("registry_dump"));

    cfg.queries.clear();
    cfg.workers = 0;
    cfg.validate().expect("valid config");
    assert_eq!(cfg.workers, 1);

    cfg.workers = 10_000;
    cfg.validate().expect("valid config");
    assert_eq!(cfg.workers, 64);
}

#[test]
fn strategy_and_interpreter_names_parse_case_insensitively() {
    assert_eq!(parse_strategy(" Isolated "), Some(Strategy::Isolated));
    assert_eq!(parse_strategy("SESSION"), Some(Strategy::Session));
    assert_eq!(parse_strategy("pool"), None);
    assert_eq!(parse_interpreter("PowerShell"), Some(InterpreterKind::PowerShell));
    assert_eq!(parse_interpreter("posix"), Some(InterpreterKind::Posix));
    assert_eq!(Strategy::Auto.as_str(), "auto");
}
