//! Snapshot collection: runs catalogue queries with the configured strategy
//! and aggregates their normalized output.
//!
//! A failing query never aborts the run; it is recorded under `failures`
//! and its key is left out of the snapshot.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use anyhow::Result;
use host_inventory::query::catalogue::{self, CatalogueEntry};
use host_inventory::{ExecutionContext, QueryError, QueryService, QueryTimeout};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::{InventoryConfig, Strategy};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryFailure {
    pub query: String,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Default, Serialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub results: Map<String, Value>,
    pub failures: Vec<QueryFailure>,
}

impl Snapshot {
    fn record(&mut self, entry: &CatalogueEntry, outcome: host_inventory::Result<Value>) {
        match outcome {
            Ok(value) => {
                self.results.insert(entry.name().to_string(), value);
            }
            Err(err) => {
                tracing::warn!(query = entry.name(), kind = err.kind(), error = %err, "inventory query failed");
                self.failures.push(QueryFailure {
                    query: entry.name().to_string(),
                    kind: err.kind(),
                    message: err.to_string(),
                });
            }
        }
    }
}

/// Catalogue entries named in `names`, in catalogue order; all when empty.
pub fn selected_entries(names: &[String]) -> Vec<CatalogueEntry> {
    catalogue::all()
        .into_iter()
        .filter(|entry| names.is_empty() || names.iter().any(|n| n == entry.name()))
        .collect()
}

pub fn collect(cfg: &InventoryConfig) -> Result<Snapshot> {
    let timeout = cfg.query_timeout()?;
    let mut service = QueryService::new(cfg.interpreter_config());
    let entries = selected_entries(&cfg.queries);
    Ok(collect_entries(&mut service, &entries, cfg.strategy, timeout, cfg.workers))
}

pub fn collect_entries(
    service: &mut QueryService,
    entries: &[CatalogueEntry],
    strategy: Strategy,
    timeout: QueryTimeout,
    workers: usize,
) -> Snapshot {
    let started = Instant::now();
    let snapshot = match strategy {
        Strategy::Auto => collect_auto(service, entries),
        Strategy::Session => collect_session(service, entries),
        Strategy::Isolated => collect_isolated(service, entries, timeout, workers),
    };
    tracing::info!(
        strategy = strategy.as_str(),
        queries = entries.len(),
        failures = snapshot.failures.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "inventory snapshot collected"
    );
    snapshot
}

fn run_entry(
    service: &mut QueryService,
    entry: &CatalogueEntry,
    context: ExecutionContext<'_>,
) -> host_inventory::Result<Value> {
    (entry.normalize)(service.execute_raw(entry.query, context))
}

fn collect_auto(service: &mut QueryService, entries: &[CatalogueEntry]) -> Snapshot {
    let mut snapshot = Snapshot::default();
    for entry in entries {
        let outcome = run_entry(service, entry, ExecutionContext::None);
        snapshot.record(entry, outcome);
    }
    snapshot
}

fn collect_session(service: &mut QueryService, entries: &[CatalogueEntry]) -> Snapshot {
    let mut snapshot = Snapshot::default();
    let mut session = match service.open_session() {
        Ok(session) => session,
        Err(err) => {
            let detail = err.to_string();
            for entry in entries {
                snapshot.record(entry, Err(QueryError::Execution { detail: detail.clone() }));
            }
            return snapshot;
        }
    };

    for entry in entries {
        let outcome = run_entry(service, entry, ExecutionContext::CallerSession(&mut session));
        snapshot.record(entry, outcome);
    }
    session.close();
    snapshot
}

/// Isolated queries on up to `workers` scoped threads pulling from a shared
/// index. Results are recorded in catalogue order.
fn collect_isolated(
    service: &QueryService,
    entries: &[CatalogueEntry],
    timeout: QueryTimeout,
    workers: usize,
) -> Snapshot {
    let next = AtomicUsize::new(0);
    let outcomes: Mutex<Vec<(usize, host_inventory::Result<Value>)>> =
        Mutex::new(Vec::with_capacity(entries.len()));
    let workers = workers.clamp(1, entries.len().max(1));

    std::thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let index = next.fetch_add(1, Ordering::Relaxed);
                let Some(entry) = entries.get(index) else {
                    break;
                };
                let outcome = (entry.normalize)(service.isolated().run(entry.query, timeout));
                if let Ok(mut outcomes) = outcomes.lock() {
                    outcomes.push((index, outcome));
                }
            });
        }
    });

    let mut outcomes = match outcomes.into_inner() {
        Ok(outcomes) => outcomes,
        Err(poisoned) => poisoned.into_inner(),
    };
    outcomes.sort_by_key(|(index, _)| *index);

    let mut snapshot = Snapshot::default();
    for (index, outcome) in outcomes {
        snapshot.record(&entries[index], outcome);
    }
    snapshot
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use host_inventory::query::{List, Query, QueryShape, Single};
    use host_inventory::{inventory_entity, normalize, InterpreterConfig, Shape};
    use host_inventory::Entity;

    inventory_entity! {
        struct Item: "Item" {
            "Id" => id: u32,
        }
    }

    static ITEMS: Query = Query::from_static(
        "items",
        r#"echo '[{"Id":1},{"Id":2}]'"#,
        QueryShape::List,
    );
    static ONE: Query = Query::from_static("one", r#"echo '{"Id":7}'"#, QueryShape::Single);
    static BROKEN: Query = Query::from_static("broken", "echo '{oops'", QueryShape::Single);
    static FAILING: Query = Query::from_static("failing", "echo nope >&2; exit 5", QueryShape::List);

    fn as_json<S: Shape>(raw: host_inventory::RawResponse) -> host_inventory::Result<Value> {
        let output = normalize::<Item>(raw, S::KIND).map(S::extract)?;
        Ok(S::output_to_json::<Item>(&output))
    }

    fn entry(query: &'static Query) -> CatalogueEntry {
        CatalogueEntry {
            query,
            entity: Item::NAME,
            normalize: match query.shape() {
                QueryShape::List => as_json::<List>,
                QueryShape::Single => as_json::<Single>,
            },
        }
    }

    fn entries() -> Vec<CatalogueEntry> {
        vec![entry(&ITEMS), entry(&ONE), entry(&BROKEN), entry(&FAILING)]
    }

    fn check(snapshot: &Snapshot) {
        assert_eq!(snapshot.results.get("items"), Some(&serde_json::json!([{"Id":1},{"Id":2}])));
        assert_eq!(snapshot.results.get("one"), Some(&serde_json::json!({"Id":7})));
        assert!(!snapshot.results.contains_key("broken"));

        let kinds: Vec<_> = snapshot
            .failures
            .iter()
            .map(|f| (f.query.as_str(), f.kind))
            .collect();
        assert_eq!(kinds, vec![("broken", "decode"), ("failing", "execution")]);
    }

    fn timeout() -> QueryTimeout {
        QueryTimeout::from_millis(5_000).expect("timeout")
    }

    #[test]
    fn every_strategy_yields_the_same_snapshot() {
        for strategy in [Strategy::Auto, Strategy::Session, Strategy::Isolated] {
            let mut service = QueryService::new(InterpreterConfig::posix_shell());
            let snapshot = collect_entries(&mut service, &entries(), strategy, timeout(), 3);
            check(&snapshot);
        }
    }

    #[test]
    fn snapshot_serializes_results_beside_failures() {
        let mut service = QueryService::new(InterpreterConfig::posix_shell());
        let snapshot = collect_entries(&mut service, &entries(), Strategy::Isolated, timeout(), 2);
        let value = serde_json::to_value(&snapshot).expect("serialize");

        assert_eq!(value["one"], serde_json::json!({"Id":7}));
        assert_eq!(value["failures"][0]["query"], "broken");
        assert_eq!(value["failures"][1]["kind"], "execution");
    }

    #[test]
    fn session_open_failure_fails_every_query() {
        let config = InterpreterConfig::posix_shell().with_program("/nonexistent/sh");
        let mut service = QueryService::new(config);
        let snapshot = collect_entries(&mut service, &entries(), Strategy::Session, timeout(), 1);
        assert!(snapshot.results.is_empty());
        assert_eq!(snapshot.failures.len(), 4);
        assert!(snapshot.failures.iter().all(|f| f.kind == "execution"));
    }

    #[test]
    fn selection_keeps_catalogue_order() {
        let names = vec!["hot_fixes".to_string(), "bios".to_string()];
        let picked: Vec<_> = selected_entries(&names).iter().map(CatalogueEntry::name).collect();
        assert_eq!(picked, vec!["bios", "hot_fixes"]);
        assert_eq!(selected_entries(&[]).len(), catalogue::all().len());
    }
}
