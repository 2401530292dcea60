//! Owned syntax tree model
//!
//! A `Node` is a kind tag plus an ordered list of named slots. Parsers hand
//! trees over in this shape; rules inspect and mutate them through the slot
//! accessors. Slot order is traversal order.

use serde::de::{MapAccess, Visitor as SerdeVisitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Structural kind of a node
///
/// Tags follow the php-parser naming convention (`Expr_FuncCall`,
/// `Scalar_LNumber`, ...). Kinds the engine itself never names travel as
/// `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    ConstFetch,
    Name,
    LNumber,
    DNumber,
    String,
    Array,
    ArrayItem,
    Arg,
    FuncCall,
    MethodCall,
    StaticCall,
    Variable,
    Expression,
    Other(std::string::String),
}

impl NodeKind {
    /// Parse a type tag, accepting the full tag or its short form
    /// (`Expr_FuncCall` and `FuncCall` both give `NodeKind::FuncCall`)
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Expr_ConstFetch" | "ConstFetch" => NodeKind::ConstFetch,
            "Name" => NodeKind::Name,
            "Scalar_LNumber" | "LNumber" => NodeKind::LNumber,
            "Scalar_DNumber" | "DNumber" => NodeKind::DNumber,
            "Scalar_String" | "String" | "String_" => NodeKind::String,
            "Expr_Array" | "Array" | "Array_" => NodeKind::Array,
            "Expr_ArrayItem" | "ArrayItem" => NodeKind::ArrayItem,
            "Arg" => NodeKind::Arg,
            "Expr_FuncCall" | "FuncCall" => NodeKind::FuncCall,
            "Expr_MethodCall" | "MethodCall" => NodeKind::MethodCall,
            "Expr_StaticCall" | "StaticCall" => NodeKind::StaticCall,
            "Expr_Variable" | "Variable" => NodeKind::Variable,
            "Stmt_Expression" | "Expression" => NodeKind::Expression,
            other => NodeKind::Other(other.to_string()),
        }
    }

    /// The full type tag
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::ConstFetch => "Expr_ConstFetch",
            NodeKind::Name => "Name",
            NodeKind::LNumber => "Scalar_LNumber",
            NodeKind::DNumber => "Scalar_DNumber",
            NodeKind::String => "Scalar_String",
            NodeKind::Array => "Expr_Array",
            NodeKind::ArrayItem => "Expr_ArrayItem",
            NodeKind::Arg => "Arg",
            NodeKind::FuncCall => "Expr_FuncCall",
            NodeKind::MethodCall => "Expr_MethodCall",
            NodeKind::StaticCall => "Expr_StaticCall",
            NodeKind::Variable => "Expr_Variable",
            NodeKind::Expression => "Stmt_Expression",
            NodeKind::Other(tag) => tag,
        }
    }

    /// Whether nodes of this kind are expressions
    pub fn is_expr(&self) -> bool {
        let tag = self.as_str();
        tag.starts_with("Expr_") || tag.starts_with("Scalar_")
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(NodeKind::from_tag(s))
    }
}

impl From<std::string::String> for NodeKind {
    fn from(tag: std::string::String) -> Self {
        NodeKind::from_tag(&tag)
    }
}

impl From<NodeKind> for std::string::String {
    fn from(kind: NodeKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Scalar slot content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    /// String content, if this is a string scalar
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Str(s) => f.write_str(s),
        }
    }
}

/// Content of a named child slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Slot {
    /// Explicitly empty optional sub-node (e.g. an array item without a key)
    Null,
    Scalar(Scalar),
    List(Vec<Node>),
    Node(Box<Node>),
}

impl Slot {
    /// The single child node, if any
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Slot::Node(node) => Some(node),
            _ => None,
        }
    }

    /// The child list, if this slot holds one
    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Slot::List(nodes) => Some(nodes),
            _ => None,
        }
    }

    /// The scalar payload, if any
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Slot::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Whether the slot is explicitly empty
    pub fn is_null(&self) -> bool {
        matches!(self, Slot::Null)
    }
}

impl From<Node> for Slot {
    fn from(node: Node) -> Self {
        Slot::Node(Box::new(node))
    }
}

impl From<Option<Node>> for Slot {
    fn from(node: Option<Node>) -> Self {
        node.map_or(Slot::Null, Slot::from)
    }
}

impl From<Vec<Node>> for Slot {
    fn from(nodes: Vec<Node>) -> Self {
        Slot::List(nodes)
    }
}

impl From<Scalar> for Slot {
    fn from(scalar: Scalar) -> Self {
        Slot::Scalar(scalar)
    }
}

/// A syntax tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    kind: NodeKind,
    #[serde(default, with = "ordered_slots")]
    slots: Vec<(String, Slot)>,
}

impl Node {
    /// Create a node with no slots
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            slots: Vec::new(),
        }
    }

    /// Builder-style slot setter
    pub fn with(mut self, name: impl Into<String>, slot: impl Into<Slot>) -> Self {
        self.set_slot(name, slot);
        self
    }

    /// The node's kind tag
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Look up a slot by name
    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots
            .iter()
            .find(|(slot_name, _)| slot_name == name)
            .map(|(_, slot)| slot)
    }

    /// Mutable slot lookup by name
    pub fn slot_mut(&mut self, name: &str) -> Option<&mut Slot> {
        self.slots
            .iter_mut()
            .find(|(slot_name, _)| slot_name == name)
            .map(|(_, slot)| slot)
    }

    /// Set a slot, replacing in place if it exists or appending otherwise
    pub fn set_slot(&mut self, name: impl Into<String>, slot: impl Into<Slot>) {
        let name = name.into();
        let slot = slot.into();
        match self.slot_mut(&name) {
            Some(existing) => *existing = slot,
            None => self.slots.push((name, slot)),
        }
    }

    /// Slot names in traversal order
    pub fn slot_names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|(name, _)| name.as_str())
    }

    /// Mutable access to a list slot, creating an empty one when absent or null
    ///
    /// Returns `None` when the slot holds a scalar or a single node.
    pub fn list_mut(&mut self, name: &str) -> Option<&mut Vec<Node>> {
        if matches!(self.slot(name), None | Some(Slot::Null)) {
            self.set_slot(name, Slot::List(Vec::new()));
        }
        match self.slot_mut(name) {
            Some(Slot::List(nodes)) => Some(nodes),
            _ => None,
        }
    }

    /// String content of a scalar slot
    pub fn str_value(&self, name: &str) -> Option<&str> {
        self.slot(name)
            .and_then(Slot::as_scalar)
            .and_then(Scalar::as_str)
    }

    pub(crate) fn slots_mut(&mut self) -> impl Iterator<Item = (&str, &mut Slot)> {
        self.slots
            .iter_mut()
            .map(|(name, slot)| (name.as_str(), slot))
    }

    // ==================== Literal constructors ====================

    /// `Name` node carrying an identifier
    pub fn name(name: impl Into<String>) -> Self {
        Node::new(NodeKind::Name).with("name", Scalar::Str(name.into()))
    }

    /// `null`
    pub fn null_const() -> Self {
        Node::new(NodeKind::ConstFetch).with("name", Node::name("null"))
    }

    /// `true` / `false`
    pub fn bool_const(value: bool) -> Self {
        let name = if value { "true" } else { "false" };
        Node::new(NodeKind::ConstFetch).with("name", Node::name(name))
    }

    /// Integer literal
    pub fn int(value: i64) -> Self {
        Node::new(NodeKind::LNumber).with("value", Scalar::Int(value))
    }

    /// Float literal
    pub fn float(value: f64) -> Self {
        Node::new(NodeKind::DNumber).with("value", Scalar::Float(value))
    }

    /// String literal
    pub fn string(value: impl Into<String>) -> Self {
        Node::new(NodeKind::String).with("value", Scalar::Str(value.into()))
    }

    /// Array literal from already-built items
    pub fn array(items: Vec<Node>) -> Self {
        Node::new(NodeKind::Array).with("items", items)
    }

    /// Array item; `key: None` makes it positional
    pub fn array_item(value: Node, key: Option<Node>) -> Self {
        Node::new(NodeKind::ArrayItem)
            .with("key", key)
            .with("value", value)
    }

    /// Call argument wrapping an expression
    pub fn arg(value: Node) -> Self {
        Node::new(NodeKind::Arg).with("value", value)
    }

    /// `$name`
    pub fn variable(name: impl Into<String>) -> Self {
        Node::new(NodeKind::Variable).with("name", Scalar::Str(name.into()))
    }

    /// `name(args...)`
    pub fn func_call(name: impl Into<String>, args: Vec<Node>) -> Self {
        Node::new(NodeKind::FuncCall)
            .with("name", Node::name(name))
            .with("args", args)
    }

    /// `$var->name(args...)`
    pub fn method_call(var: Node, name: impl Into<String>, args: Vec<Node>) -> Self {
        Node::new(NodeKind::MethodCall)
            .with("var", var)
            .with("name", Node::name(name))
            .with("args", args)
    }

    /// Expression statement
    pub fn expression(expr: Node) -> Self {
        Node::new(NodeKind::Expression).with("expr", expr)
    }
}

/// Serialize slots as a map while keeping encounter order on the way back in
mod ordered_slots {
    use super::*;

    pub fn serialize<S: Serializer>(slots: &[(String, Slot)], serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(slots.len()))?;
        for (name, slot) in slots {
            map.serialize_entry(name, slot)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<(String, Slot)>, D::Error> {
        struct SlotsVisitor;

        impl<'de> SerdeVisitor<'de> for SlotsVisitor {
            type Value = Vec<(String, Slot)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of slot names to slots")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut slots = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, slot)) = access.next_entry::<String, Slot>()? {
                    slots.push((name, slot));
                }
                Ok(slots)
            }
        }

        deserializer.deserialize_map(SlotsVisitor)
    }
}
