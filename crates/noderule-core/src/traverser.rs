//! Enter/leave traversal over owned syntax trees
//!
//! `NodeTraverser` walks every root and, depth first, every node reachable
//! through slots. A `NodeVisitor` is asked on the way down whether to descend
//! (`enter_node`) and on the way up what to do with the node (`leave_node`).
//! Leave results are applied in place before the walk moves on, so a parent
//! always sees its already-rewritten children.

use crate::node::{Node, NodeKind, Slot};
use crate::value::NormalizeError;
use std::error::Error as StdError;
use thiserror::Error;

/// Errors that abort a traversal
#[derive(Error, Debug)]
pub enum TraverseError {
    #[error("Cannot remove {kind} from single-node slot `{slot}` of {parent}")]
    RemoveFromSingleSlot {
        parent: NodeKind,
        slot: String,
        kind: NodeKind,
    },

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Visitor(Box<dyn StdError + Send + Sync>),
}

impl TraverseError {
    /// Wrap an error raised inside a visitor hook
    pub fn visitor(err: impl StdError + Send + Sync + 'static) -> Self {
        TraverseError::Visitor(Box::new(err))
    }
}

/// What to do before visiting a node's children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enter {
    Descend,
    SkipChildren,
}

/// What to do with a node after its children were visited
#[derive(Debug, Clone, PartialEq)]
pub enum Leave {
    Keep,
    Replace(Node),
    Remove,
}

/// Wrapper objects that carry a node plus metadata of their own
pub trait NodeSource {
    fn into_node(self: Box<Self>) -> Node;
}

/// One entry of the root sequence handed to a traversal
pub enum RootEntry {
    Node(Node),
    Source(Box<dyn NodeSource>),
}

impl RootEntry {
    pub fn into_node(self) -> Node {
        match self {
            RootEntry::Node(node) => node,
            RootEntry::Source(source) => source.into_node(),
        }
    }
}

impl From<Node> for RootEntry {
    fn from(node: Node) -> Self {
        RootEntry::Node(node)
    }
}

impl<S: NodeSource + 'static> From<Box<S>> for RootEntry {
    fn from(source: Box<S>) -> Self {
        RootEntry::Source(source)
    }
}

/// Trait for visitors driven by `NodeTraverser`
///
/// Default implementations descend everywhere and change nothing.
pub trait NodeVisitor {
    /// Turn the root entries into plain nodes
    fn before_traverse(&mut self, entries: Vec<RootEntry>) -> Result<Vec<Node>, TraverseError> {
        Ok(entries.into_iter().map(RootEntry::into_node).collect())
    }

    fn enter_node(&mut self, _node: &Node) -> Result<Enter, TraverseError> {
        Ok(Enter::Descend)
    }

    fn leave_node(&mut self, _node: &mut Node) -> Result<Leave, TraverseError> {
        Ok(Leave::Keep)
    }

    fn after_traverse(&mut self, _nodes: &mut [Node]) -> Result<(), TraverseError> {
        Ok(())
    }
}

/// Single-pass depth-first driver
#[derive(Debug, Default)]
pub struct NodeTraverser;

impl NodeTraverser {
    pub fn new() -> Self {
        Self
    }

    /// Run `visitor` over `entries` and return the rewritten roots
    pub fn traverse<V, I>(&self, visitor: &mut V, entries: I) -> Result<Vec<Node>, TraverseError>
    where
        V: NodeVisitor + ?Sized,
        I: IntoIterator,
        I::Item: Into<RootEntry>,
    {
        let entries = entries.into_iter().map(Into::into).collect();
        let mut nodes = visitor.before_traverse(entries)?;
        traverse_list(visitor, &mut nodes)?;
        visitor.after_traverse(&mut nodes)?;
        Ok(nodes)
    }
}

/// Convenience wrapper around `NodeTraverser::traverse`
pub fn traverse<V, I>(visitor: &mut V, entries: I) -> Result<Vec<Node>, TraverseError>
where
    V: NodeVisitor + ?Sized,
    I: IntoIterator,
    I::Item: Into<RootEntry>,
{
    NodeTraverser::new().traverse(visitor, entries)
}

fn traverse_list<V: NodeVisitor + ?Sized>(
    visitor: &mut V,
    nodes: &mut Vec<Node>,
) -> Result<(), TraverseError> {
    let mut i = 0;
    while i < nodes.len() {
        match visit_node(visitor, &mut nodes[i])? {
            Leave::Keep => i += 1,
            Leave::Replace(replacement) => {
                nodes[i] = replacement;
                i += 1;
            }
            Leave::Remove => {
                nodes.remove(i);
            }
        }
    }
    Ok(())
}

fn traverse_children<V: NodeVisitor + ?Sized>(
    visitor: &mut V,
    node: &mut Node,
) -> Result<(), TraverseError> {
    let parent = node.kind().clone();

    for (name, slot) in node.slots_mut() {
        match slot {
            Slot::List(nodes) => traverse_list(visitor, nodes)?,
            Slot::Node(child) => match visit_node(visitor, child)? {
                Leave::Keep => {}
                Leave::Replace(replacement) => **child = replacement,
                Leave::Remove => {
                    return Err(TraverseError::RemoveFromSingleSlot {
                        parent,
                        slot: name.to_string(),
                        kind: child.kind().clone(),
                    })
                }
            },
            Slot::Scalar(_) | Slot::Null => {}
        }
    }
    Ok(())
}

fn visit_node<V: NodeVisitor + ?Sized>(
    visitor: &mut V,
    node: &mut Node,
) -> Result<Leave, TraverseError> {
    if visitor.enter_node(node)? == Enter::Descend {
        traverse_children(visitor, node)?;
    }
    visitor.leave_node(node)
}
