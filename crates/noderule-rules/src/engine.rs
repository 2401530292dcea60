//! Rule table and the enter/leave hooks that apply it
//!
//! Rules are kept per node kind, in registration order. During a pass the
//! engine prunes every subtree whose root kind has no rules, and on the way
//! back up runs the first rule whose filter matches. Later rules for the
//! same node are never looked at once one matched, so order matters.

use noderule_core::{
    normalize_value, traverse, ArgumentError, Enter, Leave, Node, NodeKind, NodeVisitor, NormalizeError, RootEntry,
    TraverseError, Value,
};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Errors raised by rules
#[derive(Error, Debug)]
pub enum RuleError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// Raised by rule authors from their own filters and transforms
    #[error("{0}")]
    Callback(String),

    #[error("Rule #{index} for {kind} failed: {source}")]
    Rule {
        kind: NodeKind,
        index: usize,
        source: Box<RuleError>,
    },
}

impl RuleError {
    pub fn callback(message: impl Into<String>) -> Self {
        RuleError::Callback(message.into())
    }

    fn in_rule(self, kind: &NodeKind, index: usize) -> Self {
        RuleError::Rule {
            kind: kind.clone(),
            index,
            source: Box::new(self),
        }
    }
}

/// Outcome of a filter
#[derive(Debug, Clone, PartialEq)]
pub enum FilterResult {
    NoMatch,
    /// Matched; the payload is handed to the transform
    Match(Value),
}

impl FilterResult {
    /// A match without a meaningful payload
    pub fn matched() -> Self {
        FilterResult::Match(Value::Bool(true))
    }

    pub fn is_match(&self) -> bool {
        matches!(self, FilterResult::Match(_))
    }
}

impl From<bool> for FilterResult {
    fn from(matched: bool) -> Self {
        if matched {
            FilterResult::matched()
        } else {
            FilterResult::NoMatch
        }
    }
}

impl From<Option<Value>> for FilterResult {
    fn from(payload: Option<Value>) -> Self {
        payload.map_or(FilterResult::NoMatch, FilterResult::Match)
    }
}

/// What a transform wants done with the matched node
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Keep,
    /// Replace the node; non-node values are lowered to literals first
    Replace(Value),
    Remove,
}

impl Directive {
    pub fn replace(value: impl Into<Value>) -> Self {
        Directive::Replace(value.into())
    }
}

/// The "delete this node" directive
pub fn removal_directive() -> Directive {
    Directive::Remove
}

/// Transform that removes every node it is attached to
pub fn remove_node(_engine: &RuleEngine, _node: &mut Node, _payload: &Value) -> Result<Directive, RuleError> {
    Ok(removal_directive())
}

type FilterFn = dyn Fn(&RuleEngine, &Node) -> Result<FilterResult, RuleError> + Send + Sync;
type TransformFn = dyn Fn(&RuleEngine, &mut Node, &Value) -> Result<Directive, RuleError> + Send + Sync;

/// Decides whether a rule applies to a node
pub enum Filter {
    Constant(FilterResult),
    Predicate(Box<FilterFn>),
}

impl Filter {
    pub fn always() -> Self {
        Filter::Constant(FilterResult::matched())
    }

    pub fn never() -> Self {
        Filter::Constant(FilterResult::NoMatch)
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&RuleEngine, &Node) -> Result<FilterResult, RuleError> + Send + Sync + 'static,
    {
        Filter::Predicate(Box::new(f))
    }

    fn evaluate(&self, engine: &RuleEngine, node: &Node) -> Result<FilterResult, RuleError> {
        match self {
            Filter::Constant(result) => Ok(result.clone()),
            Filter::Predicate(f) => f(engine, node),
        }
    }
}

impl From<bool> for Filter {
    fn from(matched: bool) -> Self {
        Filter::Constant(FilterResult::from(matched))
    }
}

impl From<FilterResult> for Filter {
    fn from(result: FilterResult) -> Self {
        Filter::Constant(result)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Constant(result) => f.debug_tuple("Constant").field(result).finish(),
            Filter::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Computes the directive for a matched node
///
/// A rule without a transform still claims the nodes it matches, but leaves
/// them unchanged.
pub struct Transform(Option<Box<TransformFn>>);

impl Transform {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&RuleEngine, &mut Node, &Value) -> Result<Directive, RuleError> + Send + Sync + 'static,
    {
        Transform(Some(Box::new(f)))
    }

    pub fn none() -> Self {
        Transform(None)
    }

    /// Transform that removes the matched node
    pub fn remove() -> Self {
        Transform::new(remove_node)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Transform(..)"),
            None => f.write_str("Transform(none)"),
        }
    }
}

#[derive(Debug)]
struct Rule {
    filter: Filter,
    transform: Transform,
}

/// Rule table plus the traversal hooks that apply it
#[derive(Debug, Default)]
pub struct RuleEngine {
    rules: HashMap<NodeKind, Vec<Rule>>,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule for `kind`
    ///
    /// Rules for the same kind are tried in the order they were added.
    pub fn add_rule(&mut self, kind: NodeKind, filter: impl Into<Filter>, transform: Transform) {
        self.rules.entry(kind).or_default().push(Rule {
            filter: filter.into(),
            transform,
        });
    }

    /// Make the engine walk into nodes of `kind` without rewriting them
    ///
    /// Subtrees are only entered when their root kind has rules, so container
    /// kinds (statements, argument wrappers, ...) that sit between the roots
    /// and the nodes of interest need an entry of their own.
    pub fn descend_into(&mut self, kind: NodeKind) {
        self.add_rule(kind, Filter::never(), Transform::none());
    }

    /// Total number of registered rules
    pub fn rule_count(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn has_rules_for(&self, kind: &NodeKind) -> bool {
        self.rules.contains_key(kind)
    }

    /// Kinds with at least one rule, sorted by tag
    pub fn kinds(&self) -> Vec<&NodeKind> {
        let mut kinds: Vec<&NodeKind> = self.rules.keys().collect();
        kinds.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        kinds
    }

    /// Pre-order hook: descend only into nodes whose kind has rules
    pub fn enter(&self, node: &Node) -> Enter {
        if self.rules.contains_key(node.kind()) {
            Enter::Descend
        } else {
            tracing::trace!(kind = %node.kind(), "no rules, skipping subtree");
            Enter::SkipChildren
        }
    }

    /// Post-order hook: run the first matching rule for `node`
    pub fn leave(&self, node: &mut Node) -> Result<Leave, RuleError> {
        let kind = node.kind().clone();
        let Some(rules) = self.rules.get(&kind) else {
            return Ok(Leave::Keep);
        };

        for (index, rule) in rules.iter().enumerate() {
            let payload = match rule.filter.evaluate(self, node) {
                Ok(FilterResult::Match(payload)) => payload,
                Ok(FilterResult::NoMatch) => continue,
                Err(err) => return Err(err.in_rule(&kind, index)),
            };

            let Some(transform) = &rule.transform.0 else {
                tracing::warn!(%kind, index, "rule matched but has no transform, keeping node");
                return Ok(Leave::Keep);
            };

            let directive = transform(self, node, &payload).map_err(|err| err.in_rule(&kind, index))?;
            tracing::debug!(%kind, index, ?directive, "rule matched");

            return match directive {
                Directive::Keep => Ok(Leave::Keep),
                Directive::Remove => Ok(Leave::Remove),
                Directive::Replace(value) => normalize_value(value)
                    .map(Leave::Replace)
                    .map_err(|err| RuleError::from(err).in_rule(&kind, index)),
            };
        }

        Ok(Leave::Keep)
    }

    /// Run one pass over `entries` and return the rewritten roots
    pub fn apply<I>(&mut self, entries: I) -> Result<Vec<Node>, TraverseError>
    where
        I: IntoIterator,
        I::Item: Into<RootEntry>,
    {
        traverse(self, entries)
    }
}

impl NodeVisitor for RuleEngine {
    fn before_traverse(&mut self, entries: Vec<RootEntry>) -> Result<Vec<Node>, TraverseError> {
        tracing::debug!(roots = entries.len(), rules = self.rule_count(), "starting rewrite pass");
        Ok(entries.into_iter().map(RootEntry::into_node).collect())
    }

    fn enter_node(&mut self, node: &Node) -> Result<Enter, TraverseError> {
        Ok(self.enter(node))
    }

    fn leave_node(&mut self, node: &mut Node) -> Result<Leave, TraverseError> {
        self.leave(node).map_err(TraverseError::visitor)
    }
}
