//! The fluent grammar construction API.
//!
//! A [`FluentBuilder`] is a persistent value: every mutator consumes the
//! builder and returns the next snapshot, so sub-grammars can be built
//! independently, cloned, and embedded without aliasing surprises. Call
//! references are validated against the member catalog eagerly, at the
//! point the node is constructed.
//!
//! The `_sub` variants accept a whole sub-builder where the plain
//! variants accept a single call name, so any construct can be nested:
//! `b.optional_sub(b.sub().one_of(&["a", "b"])?)?`.

use std::fmt;

use crate::catalog::{MethodCatalog, SubjectSpec};
use crate::compile;
use crate::error::{ConfigurationError, Error, ResolutionError};
use crate::tree::{Modifier, Node, Terminal, Tree};

#[derive(Debug, Clone)]
pub struct FluentBuilder {
    catalog: MethodCatalog,
    nodes: Vec<Node>,
    start_method: Option<String>,
    last_type: Option<String>,
    implemented: Vec<String>,
    cloner: Option<String>,
    pending_name: Option<String>,
}

impl FluentBuilder {
    pub fn new(spec: &SubjectSpec) -> Result<Self, Error> {
        Ok(FluentBuilder::from_catalog(MethodCatalog::from_spec(spec)?))
    }

    pub fn from_catalog(catalog: MethodCatalog) -> Self {
        FluentBuilder {
            catalog,
            nodes: Vec::new(),
            start_method: None,
            last_type: None,
            implemented: Vec::new(),
            cloner: None,
            pending_name: None,
        }
    }

    /// An empty builder over the same subject, for building sub-grammars.
    pub fn sub(&self) -> Self {
        FluentBuilder::from_catalog(self.catalog.clone())
    }

    /// Attach an author-chosen interface name to the next constructed
    /// node, pre-empting synthetic allocation.
    pub fn name(mut self, label: &str) -> Self {
        if !label.is_empty() {
            self.pending_name = Some(label.to_string());
        }
        self
    }

    /// Name the generated factory entry point. Defaults to `start`.
    pub fn start(mut self, method: &str) -> Self {
        self.start_method = Some(method.to_string());
        self
    }

    /// Name the chain's declared exit type, emitted as an alias of the
    /// entry capability interface.
    pub fn fluent_type(mut self, type_name: &str) -> Self {
        self.last_type = Some(type_name.to_string());
        self
    }

    /// Add an extra interface name to the generated extends/implements
    /// lists.
    pub fn implement(mut self, interface: &str) -> Self {
        self.implemented.push(interface.to_string());
        self
    }

    /// Register the subject's cloning operation and switch the wrapper
    /// to persistent chains: every fluent call clones the subject first.
    pub fn cloner(mut self, method: &str) -> Result<Self, Error> {
        let key = self.catalog.resolve(method)?;
        let Some(entry) = self.catalog.entry(&key) else {
            return Err(ResolutionError::MethodNotFound {
                name: method.to_string(),
                subject: self.catalog.subject().to_string(),
            }
            .into());
        };
        if !entry.spec.params.is_empty() {
            return Err(ConfigurationError::ClonerHasParameters {
                name: method.to_string(),
            }
            .into());
        }
        if entry.spec.returns != self.catalog.subject()
            && entry.display_return != self.catalog.subject_display()
        {
            return Err(ConfigurationError::ClonerWrongReturnType {
                name: method.to_string(),
                subject: self.catalog.subject().to_string(),
            }
            .into());
        }
        self.cloner = Some(key);
        Ok(self)
    }

    /// Drop an operation from the fluent chain.
    pub fn exclude(mut self, method: &str) -> Result<Self, Error> {
        self.catalog.exclude(method)?;
        Ok(self)
    }

    /// Put an operation back into the fluent chain.
    pub fn include(mut self, method: &str) -> Result<Self, Error> {
        self.catalog.include(method)?;
        Ok(self)
    }

    pub fn one(mut self, method: &str) -> Result<Self, Error> {
        let node = self.new_terminal(Modifier::Once, method)?;
        Ok(self.push(node))
    }

    pub fn optional(mut self, method: &str) -> Result<Self, Error> {
        let node = self.new_terminal(Modifier::Optional, method)?;
        Ok(self.push(node))
    }

    pub fn zero_or_more(mut self, method: &str) -> Result<Self, Error> {
        let node = self.new_terminal(Modifier::ZeroOrMore, method)?;
        Ok(self.push(node))
    }

    /// One-or-more desugars to one-then-zero-or-more.
    pub fn one_or_more(mut self, method: &str) -> Result<Self, Error> {
        let once = self.new_terminal(Modifier::Once, method)?;
        let repeat = self.new_terminal(Modifier::ZeroOrMore, method)?;
        Ok(self.push(once).push(repeat))
    }

    /// A flat choice among sibling calls: compiles into one interface
    /// declaring one operation per alternative.
    pub fn one_of(mut self, methods: &[&str]) -> Result<Self, Error> {
        let mut children = Vec::with_capacity(methods.len());
        for method in methods {
            self.catalog.resolve(method)?;
            children.push(Node::Terminal(Terminal::new(Modifier::Once, *method)));
        }
        let node = self.new_tree(Modifier::OneTerminalOf, children);
        Ok(self.push(node))
    }

    pub fn one_sub(mut self, sub: FluentBuilder) -> Result<Self, Error> {
        self.assert_same_subject(&sub)?;
        let mut node = if sub.nodes.len() == 1 {
            let mut nodes = sub.nodes;
            nodes.remove(0)
        } else {
            Node::Tree(Tree::new(Modifier::Once, sub.nodes))
        };
        if let Some(label) = self.take_name() {
            set_name(&mut node, label);
        }
        Ok(self.push(node))
    }

    pub fn optional_sub(mut self, sub: FluentBuilder) -> Result<Self, Error> {
        self.assert_same_subject(&sub)?;
        let node = self.new_tree(Modifier::Optional, sub.nodes);
        Ok(self.push(node))
    }

    pub fn zero_or_more_sub(mut self, sub: FluentBuilder) -> Result<Self, Error> {
        self.assert_same_subject(&sub)?;
        let node = self.new_tree(Modifier::ZeroOrMore, sub.nodes);
        Ok(self.push(node))
    }

    pub fn one_or_more_sub(mut self, sub: FluentBuilder) -> Result<Self, Error> {
        self.assert_same_subject(&sub)?;
        let once = self.new_tree(Modifier::Once, sub.nodes.clone());
        let repeat = Node::Tree(Tree::new(Modifier::ZeroOrMore, sub.nodes));
        Ok(self.push(once).push(repeat))
    }

    /// A choice among alternative sub-grammars.
    pub fn one_of_subs(mut self, subs: Vec<FluentBuilder>) -> Result<Self, Error> {
        let mut children = Vec::with_capacity(subs.len());
        for sub in subs {
            self.assert_same_subject(&sub)?;
            children.push(Node::Tree(Tree::new(Modifier::Once, sub.nodes)));
        }
        let node = self.new_tree(Modifier::OneOf, children);
        Ok(self.push(node))
    }

    /// Normalize the tree: lift single-child sequences, flatten nested
    /// sequences and alternations, demote all-terminal alternations to
    /// the one-terminal form, and drop duplicate alternatives.
    pub fn optimize(mut self) -> Self {
        self.nodes = flatten_list(self.nodes, Modifier::Once);
        self.nodes = self
            .nodes
            .into_iter()
            .map(|node| match node {
                Node::Tree(t) => deduplicate(t),
                n => n,
            })
            .collect();
        self
    }

    /// Compile the grammar into the generated source text.
    pub fn generate(&self) -> Result<String, Error> {
        compile::compile(self)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn catalog(&self) -> &MethodCatalog {
        &self.catalog
    }

    pub fn start_method(&self) -> Option<&str> {
        self.start_method.as_deref()
    }

    pub fn last_type(&self) -> Option<&str> {
        self.last_type.as_deref()
    }

    pub fn implemented(&self) -> &[String] {
        &self.implemented
    }

    /// Signature of the registered cloning operation, if any.
    pub fn cloner_method(&self) -> Option<&str> {
        self.cloner.as_deref()
    }

    fn push(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    fn take_name(&mut self) -> Option<String> {
        self.pending_name.take()
    }

    fn new_terminal(&mut self, modifier: Modifier, method: &str) -> Result<Node, Error> {
        self.catalog.resolve(method)?;
        let mut terminal = Terminal::new(modifier, method);
        terminal.name = self.take_name();
        Ok(Node::Terminal(terminal))
    }

    fn new_tree(&mut self, modifier: Modifier, children: Vec<Node>) -> Node {
        let mut tree = Tree::new(modifier, children);
        tree.name = self.take_name();
        Node::Tree(tree)
    }

    fn assert_same_subject(&self, sub: &FluentBuilder) -> Result<(), Error> {
        if sub.catalog.subject() != self.catalog.subject() {
            return Err(ResolutionError::SubjectMismatch {
                expected: self.catalog.subject().to_string(),
                found: sub.catalog.subject().to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl fmt::Display for FluentBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .nodes
            .iter()
            .map(Node::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        f.write_str(&rendered)
    }
}

fn set_name(node: &mut Node, label: String) {
    match node {
        Node::Terminal(t) => t.name = Some(label),
        Node::Tree(t) => t.name = Some(label),
    }
}

/// Lift single-child ONCE trees to the node below them, recursively.
fn pull(node: Node) -> Node {
    match node {
        Node::Tree(mut tree) => {
            if tree.modifier == Modifier::Once && tree.children.len() == 1 {
                return pull(tree.children.remove(0));
            }
            tree.children = tree.children.into_iter().map(pull).collect();
            Node::Tree(tree)
        }
        n => n,
    }
}

/// Flatten an alternation: alternatives of alternatives sit on the same
/// level, and an alternation of plain calls is the one-terminal form.
fn flatten_alternation(tree: Tree) -> Node {
    if tree.modifier != Modifier::OneOf {
        return Node::Tree(tree);
    }
    let mut flat = Vec::new();
    for child in tree.children {
        let child = match child {
            Node::Tree(t) => flatten_alternation(t),
            n => n,
        };
        match child {
            Node::Tree(t) if t.modifier == Modifier::OneTerminalOf => flat.extend(t.children),
            other => flat.push(other),
        }
    }
    let modifier = if flat.iter().all(|n| matches!(n, Node::Terminal(_))) {
        Modifier::OneTerminalOf
    } else {
        Modifier::OneOf
    };
    Node::Tree(Tree {
        modifier,
        children: flat,
        name: tree.name,
    })
}

/// Flatten a node list under the given modifier: sequences that are part
/// of a sequence collapse onto the parent level.
fn flatten_list(nodes: Vec<Node>, modifier: Modifier) -> Vec<Node> {
    let flat: Vec<Node> = nodes
        .into_iter()
        .map(pull)
        .map(|node| match node {
            Node::Tree(t) => flatten_alternation(t),
            n => n,
        })
        .collect();

    let mut result = Vec::new();
    for node in flat {
        match node {
            Node::Terminal(t) => result.push(Node::Terminal(t)),
            Node::Tree(t) if modifier == Modifier::Once && t.modifier == Modifier::Once => {
                result.extend(flatten_list(t.children, Modifier::Once));
            }
            Node::Tree(t) => {
                let child_modifier = t.modifier;
                result.push(Node::Tree(Tree {
                    modifier: child_modifier,
                    children: flatten_list(t.children, child_modifier),
                    name: t.name,
                }));
            }
        }
    }
    result
}

/// Remove duplicate alternatives from alternation nodes, recursively.
fn deduplicate(mut tree: Tree) -> Node {
    tree.children = tree
        .children
        .into_iter()
        .map(|node| match node {
            Node::Tree(t) => deduplicate(t),
            n => n,
        })
        .collect();
    if matches!(tree.modifier, Modifier::OneOf | Modifier::OneTerminalOf) {
        tree.children.sort();
        tree.children.dedup();
    }
    Node::Tree(tree)
}
