use super::types::{InterpreterKind, Strategy};

pub(super) fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

pub(super) fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|v| non_empty(Some(v)))
}

/// `name` run through `parse`. A set but unparseable value is logged and
/// yields `None`, leaving the lower layer in place.
pub(super) fn env_parsed<T>(name: &str, parse: impl FnOnce(&str) -> Option<T>) -> Option<T> {
    let raw = env_non_empty(name)?;
    let parsed = parse(raw.trim());
    if parsed.is_none() {
        tracing::warn!(var = name, value = %raw, "ignoring invalid environment override");
    }
    parsed
}

pub(super) fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .collect()
}

pub(crate) fn parse_strategy(raw: &str) -> Option<Strategy> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "auto" => Some(Strategy::Auto),
        "session" => Some(Strategy::Session),
        "isolated" => Some(Strategy::Isolated),
        _ => None,
    }
}

pub(crate) fn parse_interpreter(raw: &str) -> Option<InterpreterKind> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "powershell" | "pwsh" => Some(InterpreterKind::PowerShell),
        "posix" | "sh" => Some(InterpreterKind::Posix),
        _ => None,
    }
}
