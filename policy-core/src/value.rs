//! The memo value model: a tagged sum type over everything a resolved
//! variable segment can hold. Never a general boxed value — see
//! a tagged variant, never a general boxed value.

use serde_json::{Map, Value};

/// A parsed JSON object annotated with the URI (or literal JSON blob) it
/// was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedObject {
    /// The source this object was resolved from: an HTTP URL if fetched,
    /// or the literal JSON text if parsed in place.
    pub src: String,
    /// The parsed JSON object.
    pub object: Map<String, Value>,
}

/// Everything a memo entry can hold at a given path.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue {
    /// A single literal string.
    Literal(String),
    /// A single resolved JSON object.
    Object(AnnotatedObject),
    /// A list of literal strings.
    Strings(Vec<String>),
    /// A list of resolved JSON objects.
    Objects(Vec<AnnotatedObject>),
    /// Terminal empty value — distinct from "missing". Drilling further
    /// into an empty value always yields empty again, never an error.
    Empty,
}

impl ResolvedValue {
    /// Materialize this value into a deduplicated list of strings,
    /// preserving first-seen order, per the final materialization
    /// step.
    #[must_use]
    pub fn into_string_list(self) -> Vec<String> {
        match self {
            Self::Literal(s) => vec![s],
            Self::Object(o) => vec![o.src],
            Self::Strings(list) => dedup_preserving_order(list),
            Self::Objects(list) => dedup_preserving_order(list.into_iter().map(|o| o.src).collect()),
            Self::Empty => Vec::new(),
        }
    }
}

/// Deduplicate a list of strings, preserving first-seen order.
#[must_use]
pub fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::with_capacity(items.len());
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        if seen.insert(item.clone()) {
            out.push(item);
        }
    }
    out
}
