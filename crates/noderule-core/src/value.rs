//! Native values and their lowering to literal nodes

use crate::node::Node;
use thiserror::Error;

/// Errors raised while lowering a value to a literal node
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("Invalid value: cannot lower {type_name} to a literal node")]
    InvalidValue { type_name: String },

    #[error("Invalid array key: cannot use {type_name} as a literal key")]
    InvalidKey { type_name: String },
}

/// A native value that can be lowered into a literal expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Ordered sequence; keys 0, 1, 2, ... are implied
    List(Vec<Value>),
    /// Mapping in encounter order
    Map(Vec<(Value, Value)>),
    /// Already a tree node
    Node(Node),
    /// Foreign value with no literal form, named by its type
    Opaque(String),
}

impl Value {
    /// Name of the value's type, used in error messages
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Node(_) => "node",
            Value::Opaque(name) => name,
        }
    }

    /// The wrapped node, if this value is one
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Value::Node(node)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<serde_yaml::Value> for Value {
    fn from(yaml: serde_yaml::Value) -> Self {
        use serde_yaml::Value as Yaml;

        match yaml {
            Yaml::Null => Value::Null,
            Yaml::Bool(b) => Value::Bool(b),
            Yaml::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => match n.as_f64() {
                    Some(x) => Value::Float(x),
                    None => Value::Opaque("yaml number".to_string()),
                },
            },
            Yaml::String(s) => Value::Str(s),
            Yaml::Sequence(items) => Value::List(items.into_iter().map(Value::from).collect()),
            Yaml::Mapping(map) => Value::Map(
                map.into_iter()
                    .map(|(key, value)| (Value::from(key), Value::from(value)))
                    .collect(),
            ),
            Yaml::Tagged(tagged) => Value::Opaque(format!("yaml tag {}", tagged.tag)),
        }
    }
}

/// Lower a value into a literal expression node
///
/// Nodes pass through unchanged. Lists and maps become an array literal.
/// Item keys are left off while the keys run 0, 1, 2, ... in encounter
/// order; from the first key that breaks the run, every following item
/// carries an explicit key, even if it happens to be the next integer.
pub fn normalize_value(value: impl Into<Value>) -> Result<Node, NormalizeError> {
    match value.into() {
        Value::Node(node) => Ok(node),
        Value::Null => Ok(Node::null_const()),
        Value::Bool(b) => Ok(Node::bool_const(b)),
        Value::Int(i) => Ok(Node::int(i)),
        Value::Float(x) => Ok(Node::float(x)),
        Value::Str(s) => Ok(Node::string(s)),
        Value::List(items) => {
            let items = items
                .into_iter()
                .map(|item| normalize_value(item).map(|node| Node::array_item(node, None)))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Node::array(items))
        }
        Value::Map(entries) => normalize_map(entries),
        Value::Opaque(type_name) => Err(NormalizeError::InvalidValue { type_name }),
    }
}

fn normalize_map(entries: Vec<(Value, Value)>) -> Result<Node, NormalizeError> {
    let mut items = Vec::with_capacity(entries.len());
    // Next key that keeps the positional run going; None once the run broke
    let mut next_key: Option<i64> = Some(0);

    for (key, value) in entries {
        let value = normalize_value(value)?;

        let positional = matches!((next_key, &key), (Some(expected), Value::Int(k)) if *k == expected);
        if positional {
            next_key = next_key.map(|k| k + 1);
            items.push(Node::array_item(value, None));
        } else {
            next_key = None;
            let key = match key {
                Value::List(_) | Value::Map(_) => {
                    return Err(NormalizeError::InvalidKey {
                        type_name: key.type_name().to_string(),
                    })
                }
                other => normalize_value(other)?,
            };
            items.push(Node::array_item(value, Some(key)));
        }
    }

    Ok(Node::array(items))
}
