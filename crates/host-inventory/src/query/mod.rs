//! Query definitions.
//!
//! A [`Query`] is the untyped text plus its expected shape. An
//! [`EntityQuery`] binds a query to the entity it decodes into and encodes
//! the shape in its type, so `List` queries yield `Vec<E>` and `Single`
//! queries yield `Option<E>`.

pub mod catalogue;

use std::borrow::Cow;
use std::marker::PhantomData;

use serde_json::Value;

use crate::entity::Entity;
use crate::error::Result;
use crate::exec::RawResponse;
use crate::normalize::{normalize, NormalizedResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryShape {
    Single,
    List,
}

impl QueryShape {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::List => "list",
        }
    }
}

/// Immutable query: a stable name, the interpreter text, and the shape of
/// its JSON output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    name: &'static str,
    text: Cow<'static, str>,
    shape: QueryShape,
}

impl Query {
    pub const fn from_static(name: &'static str, text: &'static str, shape: QueryShape) -> Self {
        Self {
            name,
            text: Cow::Borrowed(text),
            shape,
        }
    }

    pub fn new(name: &'static str, text: impl Into<Cow<'static, str>>, shape: QueryShape) -> Self {
        Self {
            name,
            text: text.into(),
            shape,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn shape(&self) -> QueryShape {
        self.shape
    }
}

/// Type-level query shape.
pub trait Shape {
    const KIND: QueryShape;

    type Output<E>;

    fn extract<E>(result: NormalizedResult<E>) -> Self::Output<E>;

    fn output_to_json<E: Entity>(output: &Self::Output<E>) -> Value;
}

/// Zero or more records.
#[derive(Debug)]
pub enum List {}

/// Zero or one record.
#[derive(Debug)]
pub enum Single {}

impl Shape for List {
    const KIND: QueryShape = QueryShape::List;

    type Output<E> = Vec<E>;

    fn extract<E>(result: NormalizedResult<E>) -> Vec<E> {
        result.into_list()
    }

    fn output_to_json<E: Entity>(output: &Vec<E>) -> Value {
        Value::Array(output.iter().map(Entity::to_json).collect())
    }
}

impl Shape for Single {
    const KIND: QueryShape = QueryShape::Single;

    type Output<E> = Option<E>;

    fn extract<E>(result: NormalizedResult<E>) -> Option<E> {
        result.into_single()
    }

    fn output_to_json<E: Entity>(output: &Option<E>) -> Value {
        output.as_ref().map(Entity::to_json).unwrap_or(Value::Null)
    }
}

/// A query bound to the entity its output decodes into.
pub struct EntityQuery<E, S> {
    query: Query,
    _marker: PhantomData<fn() -> (E, S)>,
}

impl<E: Entity, S: Shape> EntityQuery<E, S> {
    pub const fn new(name: &'static str, text: &'static str) -> Self {
        Self {
            query: Query::from_static(name, text, S::KIND),
            _marker: PhantomData,
        }
    }

    /// Bind owned query text, e.g. a query assembled at runtime.
    pub fn with_text(name: &'static str, text: impl Into<Cow<'static, str>>) -> Self {
        Self {
            query: Query::new(name, text, S::KIND),
            _marker: PhantomData,
        }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn name(&self) -> &'static str {
        self.query.name()
    }

    /// Normalize one response of this query into its typed output.
    pub fn decode(&self, raw: RawResponse) -> Result<S::Output<E>> {
        normalize::<E>(raw, S::KIND).map(S::extract)
    }
}

impl<E, S> std::fmt::Debug for EntityQuery<E, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityQuery")
            .field("query", &self.query)
            .finish()
    }
}
