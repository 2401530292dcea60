//! Argument and attribute helpers for rule authors

use crate::node::{Node, NodeKind, Scalar, Slot};
use crate::value::{normalize_value, NormalizeError, Value};
use thiserror::Error;

/// Errors raised while appending call arguments
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArgumentError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("{kind} has a non-list args slot")]
    ArgsNotList { kind: NodeKind },
}

/// A borrowed view of whatever sits at the end of an attribute path
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Attr<'a> {
    Node(&'a Node),
    List(&'a [Node]),
    Scalar(&'a Scalar),
    Null,
}

impl<'a> Attr<'a> {
    fn from_slot(slot: &'a Slot) -> Self {
        match slot {
            Slot::Node(node) => Attr::Node(node),
            Slot::List(nodes) => Attr::List(nodes),
            Slot::Scalar(scalar) => Attr::Scalar(scalar),
            Slot::Null => Attr::Null,
        }
    }

    pub fn as_node(&self) -> Option<&'a Node> {
        match *self {
            Attr::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&'a Scalar> {
        match *self {
            Attr::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        self.as_scalar().and_then(Scalar::as_str)
    }
}

/// Wrap a value in an argument node
///
/// Expression nodes are wrapped as they are; anything else goes through
/// `normalize_value` first.
pub fn make_argument(value: impl Into<Value>) -> Result<Node, NormalizeError> {
    let expr = match value.into() {
        Value::Node(node) if node.kind().is_expr() => node,
        other => normalize_value(other)?,
    };
    Ok(Node::arg(expr))
}

/// Append arguments to a function or method call
///
/// Any other kind of node is left alone, so generic rule code can call this
/// unconditionally. A missing or null `args` slot becomes a fresh list; one
/// holding a scalar or a single node is an error and the call is untouched.
pub fn append_arguments<I>(node: &mut Node, values: I) -> Result<(), ArgumentError>
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    if !matches!(node.kind(), NodeKind::FuncCall | NodeKind::MethodCall) {
        return Ok(());
    }

    // Build every argument before touching the node
    let args = values
        .into_iter()
        .map(|value| make_argument(value))
        .collect::<Result<Vec<_>, _>>()?;

    let kind = node.kind().clone();
    let list = node
        .list_mut("args")
        .ok_or(ArgumentError::ArgsNotList { kind })?;
    list.extend(args);
    Ok(())
}

/// Walk a path of slot names from `node`
///
/// Returns `None` as soon as a segment does not exist. A numeric segment
/// indexes into a list slot. An empty path yields the node itself.
pub fn get_nested_attribute<'a>(node: &'a Node, path: &[&str]) -> Option<Attr<'a>> {
    let mut current = Attr::Node(node);

    for segment in path {
        current = match current {
            Attr::Node(node) => Attr::from_slot(node.slot(segment)?),
            Attr::List(nodes) => {
                let index: usize = segment.parse().ok()?;
                Attr::Node(nodes.get(index)?)
            }
            Attr::Scalar(_) | Attr::Null => return None,
        };
    }

    Some(current)
}

/// Dotted-path form of `get_nested_attribute` (`"name.name"`, `"args.0.value"`)
pub fn get_attribute_path<'a>(node: &'a Node, path: &str) -> Option<Attr<'a>> {
    let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
    get_nested_attribute(node, &segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call_args(node: &Node) -> &[Node] {
        node.slot("args").and_then(Slot::as_list).unwrap()
    }

    fn arg_value(arg: &Node) -> &Node {
        arg.slot("value").and_then(Slot::as_node).unwrap()
    }

    // ==================== make_argument ====================

    #[test]
    fn test_make_argument_wraps_literal() {
        let arg = make_argument(3).unwrap();
        assert_eq!(arg.kind(), &NodeKind::Arg);
        assert_eq!(arg_value(&arg), &Node::int(3));
    }

    #[test]
    fn test_make_argument_keeps_expression_node() {
        let var = Node::variable("x");
        let arg = make_argument(var.clone()).unwrap();
        assert_eq!(arg_value(&arg), &var);
    }

    // ==================== append_arguments ====================

    #[test]
    fn test_append_to_func_call() {
        let mut call = Node::func_call("foo", vec![Node::arg(Node::variable("a"))]);
        append_arguments(&mut call, vec![Value::from(1), Value::from("x")]).unwrap();

        let args = call_args(&call);
        assert_eq!(args.len(), 3);
        assert_eq!(arg_value(&args[0]), &Node::variable("a"));
        assert_eq!(arg_value(&args[1]), &Node::int(1));
        assert_eq!(arg_value(&args[2]), &Node::string("x"));
    }

    #[test]
    fn test_append_to_method_call() {
        let mut call = Node::method_call(Node::variable("this"), "run", vec![]);
        append_arguments(&mut call, [true]).unwrap();
        assert_eq!(arg_value(&call_args(&call)[0]), &Node::bool_const(true));
    }

    #[test]
    fn test_append_creates_missing_args_list() {
        let mut call = Node::new(NodeKind::FuncCall).with("name", Node::name("foo"));
        append_arguments(&mut call, [1]).unwrap();
        assert_eq!(call_args(&call).len(), 1);
    }

    #[test]
    fn test_append_fills_null_args_slot() {
        let mut call = Node::new(NodeKind::FuncCall)
            .with("name", Node::name("foo"))
            .with("args", Slot::Null);
        append_arguments(&mut call, [1, 2]).unwrap();

        let args = call_args(&call);
        assert_eq!(args.len(), 2);
        assert_eq!(arg_value(&args[0]), &Node::int(1));
        assert_eq!(arg_value(&args[1]), &Node::int(2));
    }

    #[test]
    fn test_append_rejects_scalar_args_slot() {
        let mut call = Node::new(NodeKind::MethodCall).with("args", Scalar::Str("oops".to_string()));
        let before = call.clone();

        let err = append_arguments(&mut call, [1]).unwrap_err();
        assert_eq!(err, ArgumentError::ArgsNotList { kind: NodeKind::MethodCall });
        assert_eq!(call, before);
    }

    #[test]
    fn test_append_is_noop_on_other_kinds() {
        let mut var = Node::variable("x");
        let before = var.clone();
        append_arguments(&mut var, [1, 2]).unwrap();
        assert_eq!(var, before);

        // Static calls are not touched either
        let mut call = Node::new(NodeKind::StaticCall).with("args", Vec::<Node>::new());
        append_arguments(&mut call, [1]).unwrap();
        assert!(call_args(&call).is_empty());
    }

    #[test]
    fn test_append_failure_leaves_call_untouched() {
        let mut call = Node::func_call("foo", vec![]);
        let result = append_arguments(
            &mut call,
            vec![Value::Int(1), Value::Opaque("stream".to_string())],
        );
        assert!(matches!(result, Err(ArgumentError::Normalize(_))));
        assert!(call_args(&call).is_empty());
    }

    // ==================== get_nested_attribute ====================

    #[test]
    fn test_nested_attribute_found() {
        let call = Node::func_call("var_dump", vec![]);
        let name = get_nested_attribute(&call, &["name", "name"]);
        assert_eq!(name.and_then(|a| a.as_str()), Some("var_dump"));
    }

    #[test]
    fn test_missing_leaf_is_absent() {
        let call = Node::func_call("foo", vec![]);
        assert!(get_nested_attribute(&call, &["name"]).is_some());
        assert_eq!(get_nested_attribute(&call, &["name", "missing"]), None);
    }

    #[test]
    fn test_path_through_scalar_is_absent() {
        let var = Node::variable("x");
        assert_eq!(get_nested_attribute(&var, &["name", "deeper"]), None);
    }

    #[test]
    fn test_list_index_segments() {
        let call = Node::func_call("foo", vec![Node::arg(Node::int(5))]);
        let value = get_attribute_path(&call, "args.0.value");
        assert_eq!(value.and_then(|a| a.as_node()), Some(&Node::int(5)));
        assert_eq!(get_attribute_path(&call, "args.3.value"), None);
        assert_eq!(get_attribute_path(&call, "args.first"), None);
    }

    #[test]
    fn test_empty_path_is_node_itself() {
        let var = Node::variable("x");
        assert_eq!(get_nested_attribute(&var, &[]), Some(Attr::Node(&var)));
    }

    #[test]
    fn test_null_slot_is_present_but_null() {
        let item = Node::array_item(Node::int(1), None);
        assert_eq!(get_nested_attribute(&item, &["key"]), Some(Attr::Null));
    }
}
