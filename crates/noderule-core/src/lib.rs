//! noderule-core: Tree model and stateless helpers for rule-driven rewriting
//!
//! This crate provides:
//! - `Node`: An owned syntax tree node with a kind tag and named slots
//! - `normalize_value()`: Lowering of native values into literal nodes
//! - `make_argument()` / `append_arguments()`: Call argument helpers
//! - `get_nested_attribute()`: Safe slot-path lookups for rule filters
//! - `NodeTraverser` / `NodeVisitor`: The enter/leave traversal driver

pub mod helpers;
pub mod node;
pub mod traverser;
pub mod value;

pub use helpers::{append_arguments, ArgumentError, get_attribute_path, get_nested_attribute, make_argument, Attr};
pub use node::{Node, NodeKind, Scalar, Slot};
pub use traverser::{traverse, Enter, Leave, NodeSource, NodeTraverser, NodeVisitor, RootEntry, TraverseError};
pub use value::{normalize_value, NormalizeError, Value};
