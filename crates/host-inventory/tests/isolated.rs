#![cfg(unix)]

use std::path::Path;
use std::time::{Duration, Instant};

use host_inventory::exec::IsolatedExecutor;
use host_inventory::{
    inventory_entity, EntityQuery, InterpreterConfig, List, Query, QueryService, QueryShape,
    QueryTimeout,
};

inventory_entity! {
    struct Row: "Row" {
        "A" => field_a: String,
    }
}

fn shell() -> InterpreterConfig {
    InterpreterConfig::posix_shell().with_kill_grace(Duration::from_millis(500))
}

fn generous() -> QueryTimeout {
    QueryTimeout::from_millis(10_000).expect("timeout")
}

#[test]
fn concurrent_isolated_queries_do_not_interfere() {
    const N: usize = 8;
    let service = QueryService::new(shell());

    let results: Vec<(usize, Vec<Row>)> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..N)
            .map(|i| {
                let service = &service;
                scope.spawn(move || {
                    let query: EntityQuery<Row, List> = EntityQuery::with_text(
                        "row",
                        format!(r#"sleep 0.1; echo '[{{"A":"{i}"}}]'"#),
                    );
                    (i, service.get_with_timeout(&query, generous()).expect("isolated query"))
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("worker thread"))
            .collect()
    });

    assert_eq!(results.len(), N);
    for (i, rows) in results {
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].field_a.as_deref(), Some(i.to_string().as_str()));
    }
}

fn read_pid(path: &Path) -> u32 {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(text) = std::fs::read_to_string(path) {
            if let Ok(pid) = text.trim().parse() {
                return pid;
            }
        }
        assert!(Instant::now() < deadline, "pid file {} never written", path.display());
        std::thread::sleep(Duration::from_millis(10));
    }
}

/// A process counts as gone once it no longer exists or is a zombie awaiting
/// its (re)parent's reap.
fn process_gone(pid: u32) -> bool {
    let stat = match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        Ok(stat) => stat,
        Err(_) => return true,
    };
    stat.rsplit_once(')')
        .map(|(_, rest)| rest.trim_start().starts_with('Z'))
        .unwrap_or(false)
}

fn wait_gone(pid: u32) -> bool {
    let deadline = Instant::now() + Duration::from_secs(3);
    while Instant::now() < deadline {
        if process_gone(pid) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    process_gone(pid)
}

#[cfg(target_os = "linux")]
#[test]
fn timeout_terminates_interpreter_and_descendants() {
    let dir = tempfile::tempdir().expect("tempdir");
    let shell_pid = dir.path().join("shell.pid");
    let child_pid = dir.path().join("child.pid");

    let text = format!(
        "echo $$ > {}; sleep 30 & echo $! > {}; wait",
        shell_pid.display(),
        child_pid.display()
    );
    let query = Query::new("slow", text, QueryShape::List);
    let executor = IsolatedExecutor::new(shell());

    let started = Instant::now();
    let response = executor.run(&query, QueryTimeout::from_millis(300).expect("timeout"));
    assert!(response.timed_out(), "{response:?}");
    assert!(started.elapsed() < Duration::from_secs(10));

    let shell = read_pid(&shell_pid);
    let child = read_pid(&child_pid);
    assert!(wait_gone(shell), "interpreter {shell} still running");
    assert!(wait_gone(child), "descendant {child} still running");
}

#[cfg(target_os = "linux")]
#[test]
fn stop_request_ignored_escalates_to_kill() {
    let dir = tempfile::tempdir().expect("tempdir");
    let shell_pid = dir.path().join("shell.pid");

    let text = format!("trap '' TERM; echo $$ > {}; while :; do sleep 1; done", shell_pid.display());
    let query = Query::new("stubborn", text, QueryShape::Single);
    let grace = Duration::from_millis(300);
    let executor = IsolatedExecutor::new(shell().with_kill_grace(grace));

    let started = Instant::now();
    let response = executor.run(&query, QueryTimeout::from_millis(300).expect("timeout"));
    assert!(response.timed_out());
    assert!(started.elapsed() >= Duration::from_millis(600));

    let shell = read_pid(&shell_pid);
    assert!(wait_gone(shell), "interpreter {shell} survived forced kill");
}

#[test]
fn lingering_descendant_holding_stdout_counts_as_timeout() {
    let executor = IsolatedExecutor::new(shell());
    let query = Query::from_static("lingering", "(sleep 30) & echo started", QueryShape::List);

    let started = Instant::now();
    let response = executor.run(&query, QueryTimeout::from_millis(300).expect("timeout"));
    assert!(response.timed_out(), "{response:?}");
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[cfg(target_os = "linux")]
#[test]
fn auto_managed_run_returns_without_waiting_for_background_jobs() {
    let grace = Duration::from_millis(200);
    let mut executor = host_inventory::exec::AutoManagedExecutor::new(shell().with_kill_grace(grace));
    let query = Query::from_static("background", "sleep 30 & echo $!", QueryShape::Single);

    let started = Instant::now();
    let response = executor.run(&query);
    let elapsed = started.elapsed();
    assert!(response.succeeded(), "{response:?}");
    assert!(elapsed < Duration::from_secs(2), "run took {elapsed:?}");

    let job: u32 = response.text().trim().parse().expect("background pid");
    assert!(wait_gone(job), "background job {job} outlived its session");
}

#[cfg(target_os = "linux")]
#[test]
fn dropping_a_session_kills_jobs_it_started() {
    let mut launcher =
        host_inventory::exec::SessionLauncher::new(shell().with_kill_grace(Duration::from_millis(200)));
    let mut session = launcher.open().expect("open session");
    let query = Query::from_static("background", "sleep 30 & echo $!", QueryShape::Single);
    let response = host_inventory::exec::SessionBoundExecutor.run(&mut session, &query);
    let job: u32 = response.text().trim().parse().expect("background pid");

    let started = Instant::now();
    drop(session);
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(wait_gone(job), "background job {job} outlived its session");
}
