//! JSON stringification with a cycle guard
//!
//! Used for debug logging of arbitrary response data. Every container node
//! is emitted once; meeting the same node again (a cycle, or a shared
//! reference) emits `"[Circular]"` instead of recursing.

use serde_json::{Map, Value};
use std::collections::HashSet;

/// Marker emitted in place of an already visited node
pub const CIRCULAR: &str = "[Circular]";

/// Shape of one node in an object graph
pub enum Shape<N> {
    Leaf(Value),
    Array(Vec<N>),
    Object(Vec<(String, N)>),
}

/// A node of a possibly cyclic object graph
pub trait GraphNode: Sized {
    /// Stable identity of container nodes; `None` for leaves
    fn identity(&self) -> Option<usize>;

    fn shape(&self) -> Shape<Self>;
}

impl<'a> GraphNode for &'a Value {
    fn identity(&self) -> Option<usize> {
        match self {
            Value::Array(_) | Value::Object(_) => Some(*self as *const Value as usize),
            _ => None,
        }
    }

    fn shape(&self) -> Shape<Self> {
        let value: &'a Value = self;
        match value {
            Value::Array(items) => Shape::Array(items.iter().collect()),
            Value::Object(map) => Shape::Object(map.iter().map(|(k, v)| (k.clone(), v)).collect()),
            leaf => Shape::Leaf(leaf.clone()),
        }
    }
}

fn guard<N: GraphNode>(node: N, seen: &mut HashSet<usize>) -> Value {
    if let Some(id) = node.identity() {
        if !seen.insert(id) {
            return Value::String(CIRCULAR.to_string());
        }
    }

    match node.shape() {
        Shape::Leaf(value) => value,
        Shape::Array(items) => Value::Array(items.into_iter().map(|n| guard(n, seen)).collect()),
        Shape::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(k, n)| (k, guard(n, seen)))
                .collect::<Map<_, _>>(),
        ),
    }
}

/// Copy a graph into a JSON tree, replacing revisited nodes with `"[Circular]"`
pub fn to_value_with_cycle_guard<N: GraphNode>(root: N) -> Value {
    guard(root, &mut HashSet::new())
}

/// Serialize a graph to a JSON string, replacing revisited nodes with `"[Circular]"`
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use sn_package_registration::core::safe_json::to_string_with_cycle_guard;
///
/// let body = json!({"result": {"errorMessage": "bad creds"}});
/// assert_eq!(
///     to_string_with_cycle_guard(&body),
///     r#"{"result":{"errorMessage":"bad creds"}}"#
/// );
/// ```
pub fn to_string_with_cycle_guard<N: GraphNode>(root: N) -> String {
    to_value_with_cycle_guard(root).to_string()
}
