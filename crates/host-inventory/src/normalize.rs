//! Response normalization.
//!
//! Turns one [`RawResponse`] into typed records:
//! - a failed execution propagates as an error and is never decoded,
//! - empty or whitespace-only output is "nothing found" (empty list or
//!   absent record), never an error,
//! - anything else must be a JSON array of objects (list shape) or a single
//!   JSON object (single shape); any other input is a decode error carrying
//!   the offending text, and no partial result is returned.
//!
//! Decoding is pure: the same text always yields the same records.

use serde_json::Value;

use crate::entity::{json_type_name, Entity};
use crate::error::{QueryError, Result};
use crate::exec::{RawResponse, ResponseStatus};
use crate::query::QueryShape;

#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedResult<T> {
    List(Vec<T>),
    Single(Option<T>),
}

impl<T> NormalizedResult<T> {
    pub fn shape(&self) -> QueryShape {
        match self {
            Self::List(_) => QueryShape::List,
            Self::Single(_) => QueryShape::Single,
        }
    }

    pub fn into_list(self) -> Vec<T> {
        match self {
            Self::List(items) => items,
            Self::Single(item) => item.into_iter().collect(),
        }
    }

    /// First record, if any.
    pub fn into_single(self) -> Option<T> {
        match self {
            Self::List(items) => items.into_iter().next(),
            Self::Single(item) => item,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::List(items) => items.len(),
            Self::Single(item) => usize::from(item.is_some()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn normalize<E: Entity>(raw: RawResponse, shape: QueryShape) -> Result<NormalizedResult<E>> {
    match shape {
        QueryShape::List => normalize_list(raw).map(NormalizedResult::List),
        QueryShape::Single => normalize_single(raw).map(NormalizedResult::Single),
    }
}

pub fn normalize_list<E: Entity>(raw: RawResponse) -> Result<Vec<E>> {
    let Some(text) = successful_text(raw)? else {
        return Ok(Vec::new());
    };

    let items = match parse(&text)? {
        Value::Array(items) => items,
        other => {
            return Err(QueryError::decode(
                format!("expected a JSON array, found {}", json_type_name(&other)),
                &text,
            ))
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(object) => E::from_json_object(object)
                .map_err(|reason| QueryError::decode(format!("element {index}: {reason}"), &text)),
            other => Err(QueryError::decode(
                format!(
                    "element {index}: expected a JSON object, found {}",
                    json_type_name(other)
                ),
                &text,
            )),
        })
        .collect()
}

pub fn normalize_single<E: Entity>(raw: RawResponse) -> Result<Option<E>> {
    let Some(text) = successful_text(raw)? else {
        return Ok(None);
    };

    match parse(&text)? {
        Value::Object(object) => E::from_json_object(&object)
            .map(Some)
            .map_err(|reason| QueryError::decode(reason, &text)),
        other => Err(QueryError::decode(
            format!("expected a JSON object, found {}", json_type_name(&other)),
            &text,
        )),
    }
}

/// Trimmed output of a successful execution, `None` when it is empty.
fn successful_text(raw: RawResponse) -> Result<Option<String>> {
    let status = raw.status();
    let text = raw.into_text();
    match status {
        ResponseStatus::Succeeded => {}
        ResponseStatus::Failed => return Err(QueryError::Execution { detail: text }),
        ResponseStatus::TimedOut { after } => return Err(QueryError::Timeout { after }),
    }

    // Windows PowerShell may prefix redirected UTF-8 output with a BOM.
    let trimmed = text.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

fn parse(text: &str) -> Result<Value> {
    serde_json::from_str(text)
        .map_err(|err| QueryError::decode(format!("malformed JSON: {err}"), text))
}
