//! YAML rule schema definitions
//!
//! A declared rule names a node kind, a list of slot-path conditions that
//! must all hold, and one action to take on a match.

use noderule_core::{append_arguments, get_attribute_path, Attr, Node, NodeKind, Scalar, Value};
use serde::{Deserialize, Deserializer, Serialize};

use crate::engine::{Directive, Filter, FilterResult, RuleEngine, Transform};

/// A complete YAML-defined rule
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeclaredRule {
    /// Unique rule identifier (e.g., "drop_debug_calls")
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Kind of node the rule is registered for (e.g., `Expr_FuncCall` or `FuncCall`)
    pub node: NodeKind,

    /// Conditions that must all hold for the rule to match
    #[serde(default)]
    pub when: Vec<Condition>,

    /// What to do with a matching node
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub action: Action,
}

/// A test against the value at a slot path
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Condition {
    /// Dotted slot path, numeric segments index into lists (e.g. `args.0.value`)
    pub path: String,

    /// The value at `path` must be a scalar (or null) equal to this
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub equals: Option<serde_yaml::Value>,

    /// Whether the path must resolve at all; defaults to `true` when
    /// `equals` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,
}

/// Action taken on a matching node
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Claim the node without changing it
    Keep,
    Remove,
    /// Replace the node with a literal built from this value
    Replace(serde_yaml::Value),
    /// Append call arguments built from these values
    AppendArgs(Vec<serde_yaml::Value>),
}

impl DeclaredRule {
    /// Validate the rule structure
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Rule name cannot be empty".to_string());
        }

        for condition in &self.when {
            if condition.path.split('.').all(str::is_empty) {
                return Err(format!("Rule '{}': condition path cannot be empty", self.name));
            }
            if condition.equals.is_some() && condition.exists.is_some() {
                return Err(format!(
                    "Rule '{}': condition on '{}' cannot use both 'equals' and 'exists'",
                    self.name, condition.path
                ));
            }
        }

        if let Action::AppendArgs(values) = &self.action {
            if values.is_empty() {
                return Err(format!("Rule '{}': append_args needs at least one value", self.name));
            }
            if !matches!(self.node, NodeKind::FuncCall | NodeKind::MethodCall) {
                return Err(format!(
                    "Rule '{}': append_args only applies to function and method calls, not {}",
                    self.name, self.node
                ));
            }
        }

        Ok(())
    }

    /// Whether every condition holds for `node`
    pub fn matches(&self, node: &Node) -> bool {
        all_hold(&self.when, node)
    }

    /// Add this rule to `engine`
    pub fn register(&self, engine: &mut RuleEngine) {
        let conditions = self.when.clone();
        let filter = if conditions.is_empty() {
            Filter::always()
        } else {
            Filter::predicate(move |_, node| Ok(FilterResult::from(all_hold(&conditions, node))))
        };

        let transform = match self.action.clone() {
            Action::Keep => Transform::none(),
            Action::Remove => Transform::remove(),
            Action::Replace(value) => {
                Transform::new(move |_, _, _| Ok(Directive::Replace(Value::from(value.clone()))))
            }
            Action::AppendArgs(values) => Transform::new(move |_, node, _| {
                append_arguments(node, values.iter().cloned().map(Value::from))?;
                Ok(Directive::Keep)
            }),
        };

        tracing::debug!(rule = %self.name, kind = %self.node, "registering declared rule");
        engine.add_rule(self.node.clone(), filter, transform);
    }
}

impl Condition {
    /// Whether this condition holds for `node`
    pub fn holds(&self, node: &Node) -> bool {
        let found = get_attribute_path(node, &self.path);

        match (&self.equals, found) {
            (Some(expected), Some(attr)) => attr_equals(attr, expected),
            (Some(_), None) => false,
            (None, found) => found.is_some() == self.exists.unwrap_or(true),
        }
    }
}

fn all_hold(conditions: &[Condition], node: &Node) -> bool {
    conditions.iter().all(|condition| condition.holds(node))
}

/// Keeps an explicit `equals: null` distinct from a missing `equals`
fn present_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<serde_yaml::Value>, D::Error> {
    serde_yaml::Value::deserialize(deserializer).map(Some)
}

fn attr_equals(attr: Attr<'_>, expected: &serde_yaml::Value) -> bool {
    use serde_yaml::Value as Yaml;

    match (attr, expected) {
        (Attr::Null, Yaml::Null) => true,
        (Attr::Scalar(Scalar::Bool(a)), Yaml::Bool(b)) => a == b,
        (Attr::Scalar(Scalar::Int(a)), Yaml::Number(b)) => b.as_i64() == Some(*a),
        (Attr::Scalar(Scalar::Float(a)), Yaml::Number(b)) => b.as_f64() == Some(*a),
        (Attr::Scalar(Scalar::Str(a)), Yaml::String(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(yaml: &str) -> DeclaredRule {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_parse_actions() {
        let remove = rule("name: a\nnode: FuncCall\naction: remove\n");
        assert!(matches!(remove.action, Action::Remove));
        assert_eq!(remove.node, NodeKind::FuncCall);

        let replace = rule("name: b\nnode: Scalar_String\naction:\n  replace: new\n");
        assert!(matches!(replace.action, Action::Replace(serde_yaml::Value::String(ref s)) if s == "new"));

        let append = rule("name: c\nnode: FuncCall\naction:\n  append_args: [0, x]\n");
        assert!(matches!(append.action, Action::AppendArgs(ref v) if v.len() == 2));
    }

    #[test]
    fn test_conditions() {
        let declared = rule(
            r#"
name: drop_var_dump
node: Expr_FuncCall
when:
  - path: name.name
    equals: var_dump
  - path: args.0
action: remove
"#,
        );

        let with_arg = Node::func_call("var_dump", vec![Node::arg(Node::variable("x"))]);
        let without_arg = Node::func_call("var_dump", vec![]);
        let other = Node::func_call("print_r", vec![Node::arg(Node::variable("x"))]);

        assert!(declared.matches(&with_arg));
        assert!(!declared.matches(&without_arg));
        assert!(!declared.matches(&other));
    }

    #[test]
    fn test_exists_false() {
        let declared = rule("name: a\nnode: ArrayItem\nwhen:\n  - path: key.value\n    exists: false\naction: keep\n");
        assert!(declared.matches(&Node::array_item(Node::int(1), None)));
        assert!(!declared.matches(&Node::array_item(Node::int(1), Some(Node::int(0)))));
    }

    #[test]
    fn test_equals_numbers_and_null() {
        let int_rule = rule("name: a\nnode: LNumber\nwhen:\n  - path: value\n    equals: 42\naction: remove\n");
        assert!(int_rule.matches(&Node::int(42)));
        assert!(!int_rule.matches(&Node::int(7)));

        let null_rule = rule("name: b\nnode: ArrayItem\nwhen:\n  - path: key\n    equals: null\naction: keep\n");
        assert!(null_rule.matches(&Node::array_item(Node::int(1), None)));
    }

    #[test]
    fn test_validation() {
        assert!(rule("name: ''\nnode: FuncCall\naction: remove\n").validate().is_err());
        assert!(rule("name: a\nnode: Variable\naction:\n  append_args: [1]\n").validate().is_err());
        assert!(rule("name: a\nnode: FuncCall\naction:\n  append_args: []\n").validate().is_err());
        assert!(rule("name: a\nnode: FuncCall\nwhen:\n  - path: ''\naction: remove\n").validate().is_err());
        assert!(rule(
            "name: a\nnode: FuncCall\nwhen:\n  - path: name\n    equals: x\n    exists: true\naction: remove\n"
        )
        .validate()
        .is_err());
        assert!(rule("name: a\nnode: FuncCall\naction:\n  append_args: [1]\n").validate().is_ok());
    }

    #[test]
    fn test_register_adds_one_rule() {
        let mut engine = RuleEngine::new();
        rule("name: a\nnode: Scalar_String\naction:\n  replace: [1, 2]\n").register(&mut engine);
        assert_eq!(engine.rule_count(), 1);

        let mut node = Node::string("x");
        let leave = engine.leave(&mut node).unwrap();
        assert_eq!(
            leave,
            noderule_core::Leave::Replace(noderule_core::normalize_value(vec![1, 2]).unwrap())
        );
    }

    #[test]
    fn test_registered_filter_agrees_with_matches() {
        let declared = rule("name: a\nnode: FuncCall\nwhen:\n  - path: name.name\n    equals: dump\naction: remove\n");
        let mut engine = RuleEngine::new();
        declared.register(&mut engine);

        for name in ["dump", "print"] {
            let mut call = Node::func_call(name, vec![]);
            let removed = engine.leave(&mut call).unwrap() == noderule_core::Leave::Remove;
            assert_eq!(removed, declared.matches(&call), "{}", name);
        }
    }

    #[test]
    fn test_append_args_fills_null_args() {
        let mut engine = RuleEngine::new();
        rule("name: a\nnode: FuncCall\naction:\n  append_args: [0, flag]\n").register(&mut engine);

        let mut call = Node::new(NodeKind::FuncCall)
            .with("name", Node::name("json_encode"))
            .with("args", noderule_core::Slot::Null);
        assert_eq!(engine.leave(&mut call).unwrap(), noderule_core::Leave::Keep);

        let args = get_attribute_path(&call, "args").and_then(|a| match a {
            Attr::List(nodes) => Some(nodes.len()),
            _ => None,
        });
        assert_eq!(args, Some(2));
    }
}
