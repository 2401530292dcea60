//! noderule-rules: Rule-driven tree rewriting
//!
//! - `RuleEngine`: per-kind rule table with enter/leave traversal hooks
//! - `Filter` / `Transform` / `Directive`: the rule callback contract
//! - `declarative`: rules written in YAML and registered at runtime
//!
//! ```
//! use noderule_core::{Node, NodeKind};
//! use noderule_rules::{Filter, FilterResult, RuleEngine, Transform};
//!
//! let mut engine = RuleEngine::new();
//! engine.add_rule(
//!     NodeKind::Expression,
//!     Filter::predicate(|_, stmt| {
//!         let name = noderule_core::get_attribute_path(stmt, "expr.name.name").and_then(|a| a.as_str());
//!         Ok(FilterResult::from(name == Some("var_dump")))
//!     }),
//!     Transform::remove(),
//! );
//!
//! let dump = Node::expression(Node::func_call("var_dump", vec![]));
//! let kept = Node::expression(Node::func_call("print_r", vec![]));
//! let roots = engine.apply([dump, kept.clone()]).unwrap();
//! assert_eq!(roots, vec![kept]);
//! ```

pub mod declarative;
pub mod engine;

pub use declarative::{load_rules_from_dir, load_rules_from_file, load_rules_from_string, DeclaredRule};
pub use engine::{
    removal_directive, remove_node, Directive, Filter, FilterResult, RuleEngine, RuleError, Transform,
};
