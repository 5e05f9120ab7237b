//! The grammar tree: the node structure describing the permitted call
//! order of a fluent chain.
//!
//! A node is either a [`Terminal`] (one concrete call, still unresolved
//! against the catalog) or a [`Tree`] (an ordered group of child nodes).
//! Both carry a [`Modifier`] and an optional author-chosen interface
//! name. `Display` renders the regex-like notation the textual front end
//! accepts, so a tree can always be echoed back in diagnostics.

use std::cmp::Ordering;
use std::fmt;

/// How often, or in which combination, a node may be satisfied.
///
/// The set is closed; the compiler matches exhaustively on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Modifier {
    /// Exactly once.
    Once,
    /// Zero or one times.
    Optional,
    /// Any number of times, including zero.
    ZeroOrMore,
    /// Exactly one of the alternative children.
    OneOf,
    /// Exactly one of the alternative children, all of which must be
    /// terminals. A flat choice compiled into a single interface.
    OneTerminalOf,
}

impl Modifier {
    /// The postfix the regex-like notation uses for this modifier.
    fn suffix(self) -> &'static str {
        match self {
            Modifier::Once => "",
            Modifier::Optional => "?",
            Modifier::ZeroOrMore => "*",
            Modifier::OneOf | Modifier::OneTerminalOf => "",
        }
    }
}

/// A leaf: one call of the subject, referenced by bare name or full
/// signature. The reference stays unresolved until compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminal {
    pub modifier: Modifier,
    pub method: String,
    pub name: Option<String>,
}

impl Terminal {
    pub fn new(modifier: Modifier, method: impl Into<String>) -> Self {
        Terminal {
            modifier,
            method: method.into(),
            name: None,
        }
    }
}

/// An internal node: an ordered group of child nodes under one modifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    pub modifier: Modifier,
    pub children: Vec<Node>,
    pub name: Option<String>,
}

impl Tree {
    pub fn new(modifier: Modifier, children: Vec<Node>) -> Self {
        Tree {
            modifier,
            children,
            name: None,
        }
    }
}

/// One element of the grammar tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Terminal(Terminal),
    Tree(Tree),
}

impl Node {
    pub fn modifier(&self) -> Modifier {
        match self {
            Node::Terminal(t) => t.modifier,
            Node::Tree(t) => t.modifier,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Node::Terminal(t) => t.name.as_deref(),
            Node::Tree(t) => t.name.as_deref(),
        }
    }

    /// The same node under a different modifier, keeping the name.
    pub fn with_modifier(&self, modifier: Modifier) -> Node {
        match self {
            Node::Terminal(t) => Node::Terminal(Terminal {
                modifier,
                method: t.method.clone(),
                name: t.name.clone(),
            }),
            Node::Tree(t) => Node::Tree(Tree {
                modifier,
                children: t.children.clone(),
                name: t.name.clone(),
            }),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Terminal(t) => write!(f, "{}{}", t.method, t.modifier.suffix()),
            Node::Tree(t) => {
                let sep = match t.modifier {
                    Modifier::OneOf | Modifier::OneTerminalOf => "|",
                    _ => " ",
                };
                let inner = t
                    .children
                    .iter()
                    .map(Node::to_string)
                    .collect::<Vec<_>>()
                    .join(sep);
                if sep == "|" || t.children.len() != 1 {
                    write!(f, "({}){}", inner, t.modifier.suffix())
                } else {
                    write!(f, "{}{}", inner, t.modifier.suffix())
                }
            }
        }
    }
}

/// Structural order, used to deduplicate alternatives: terminals sort
/// before trees, shorter trees before longer, then element-wise.
impl Ord for Node {
    fn cmp(&self, other: &Node) -> Ordering {
        match (self, other) {
            (Node::Terminal(a), Node::Terminal(b)) => a
                .method
                .cmp(&b.method)
                .then_with(|| a.modifier.cmp(&b.modifier)),
            (Node::Terminal(_), Node::Tree(_)) => Ordering::Less,
            (Node::Tree(_), Node::Terminal(_)) => Ordering::Greater,
            (Node::Tree(a), Node::Tree(b)) => a
                .children
                .len()
                .cmp(&b.children.len())
                .then_with(|| a.children.cmp(&b.children))
                .then_with(|| a.modifier.cmp(&b.modifier)),
        }
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Node) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
