//! Host-inventory crate: runs inventory queries through an external command
//! interpreter and normalizes their JSON output into typed records.
//!
//! Three execution strategies are offered (caller-owned session, auto-managed
//! session, isolated process with timeout), all feeding the same normalizer.
//! [`QueryService`] composes them per query; the [`query::catalogue`] holds
//! the built-in Windows inventory queries.

pub mod entity;
pub mod error;
pub mod exec;
pub mod normalize;
pub mod query;
pub mod service;

mod windows_cmd;

pub use entity::{Entity, Property};
pub use error::{QueryError, Result};
pub use exec::{
    ExecutionContext, InterpreterConfig, InterpreterSession, QueryTimeout, RawResponse,
    ResponseStatus,
};
pub use normalize::{normalize, NormalizedResult};
pub use query::{EntityQuery, List, Query, QueryShape, Shape, Single};
pub use service::QueryService;

#[doc(hidden)]
pub mod __private {
    pub use serde;
    pub use serde_json;
}
