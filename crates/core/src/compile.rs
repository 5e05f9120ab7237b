//! The type-state compiler: one backward pass over the grammar tree.
//!
//! `build_node(node, next)` returns the name of the capability interface
//! representing "the state just before `node` has been satisfied", with
//! the interface's source text already appended to the output buffer.
//! `next` is the interface reachable after `node` completes -- a
//! continuation, threaded right-to-left, so each call's return type is
//! known before the call's own declaration is emitted. For the very last
//! node the continuation is the chain's exit type itself.
//!
//! Wrapper assembly happens once, after the tree pass: a factory
//! function, the optional declared-exit alias, the parameter capability
//! interface when the subject appears among its own parameters, and the
//! single `Wrapper` class forwarding every referenced operation.

use std::collections::BTreeSet;

use crate::builder::FluentBuilder;
use crate::catalog::{MethodCatalog, MethodEntry};
use crate::emit::{self, TsWriter, WRAPPER_CLASS, WRAPPER_INTERFACE};
use crate::error::{Error, GrammarError};
use crate::exit;
use crate::names::NameAllocator;
use crate::tree::{Modifier, Node, Terminal, Tree};

/// Compile the builder's grammar into one block of TypeScript source.
///
/// Pure function of the builder: the catalog is copied for the run, so
/// referenced/chain-terminal flags never leak between compilations, and
/// compiling the same builder twice yields byte-identical output.
pub fn compile(fluent: &FluentBuilder) -> Result<String, Error> {
    let Some(last) = fluent.nodes().last() else {
        return Err(GrammarError::EmptyGrammar.into());
    };
    let mut catalog = fluent.catalog().clone();
    let exit_raw = exit::resolve(&mut catalog, last)?;
    let exit_display = catalog.display_type(&exit_raw);
    let compiler = Compiler {
        fluent,
        catalog,
        names: NameAllocator::new(),
    };
    compiler.run(&exit_display)
}

struct Compiler<'a> {
    fluent: &'a FluentBuilder,
    catalog: MethodCatalog,
    names: NameAllocator,
}

impl<'a> Compiler<'a> {
    fn run(mut self, exit_display: &str) -> Result<String, Error> {
        let fluent = self.fluent;
        let mut interfaces = String::new();
        let entry = self.build_list(fluent.nodes(), exit_display, &mut interfaces)?;

        let mut w = TsWriter::new();
        self.write_start(&mut w, &entry);
        self.write_wrapper_interface(&mut w);
        self.write_wrapper_class(&mut w);
        w.raw(&interfaces);
        Ok(w.finish())
    }

    // ── tree pass ────────────────────────────────────────────────────

    fn build_node(&mut self, node: &Node, next: &str, out: &mut String) -> Result<String, Error> {
        match node {
            Node::Terminal(t) => self.build_terminal(t, next, out),
            Node::Tree(t) => match t.modifier {
                Modifier::Once => self.build_list(&t.children, next, out),
                Modifier::Optional => self.build_optional(t, next, out),
                Modifier::ZeroOrMore => self.build_zero_or_more(t, next, out),
                Modifier::OneOf => self.build_one_of(t, next, out),
                Modifier::OneTerminalOf => self.build_one_terminal_of(t, next, out),
            },
        }
    }

    /// Fold a node list right-to-left, chaining each child's interface
    /// as the continuation of its left neighbor. Returns the head: the
    /// leftmost child's interface.
    fn build_list(
        &mut self,
        children: &[Node],
        next: &str,
        out: &mut String,
    ) -> Result<String, Error> {
        let mut next_name = next.to_string();
        for (i, node) in children.iter().enumerate().rev() {
            let head = self.build_node(node, &next_name, out)?;
            if i == 0 {
                return Ok(head);
            }
            next_name = head;
        }
        Err(GrammarError::EmptySequence.into())
    }

    fn build_terminal(
        &mut self,
        terminal: &Terminal,
        next: &str,
        out: &mut String,
    ) -> Result<String, Error> {
        let key = self.catalog.resolve(&terminal.method)?;
        let iface = self.names.allocate(terminal.name.as_deref())?;

        // An optional or repeating call may be skipped, so its interface
        // also extends the continuation.
        let mut parents = BTreeSet::new();
        if matches!(terminal.modifier, Modifier::Optional | Modifier::ZeroOrMore) {
            parents.insert(next.to_string());
            parents.extend(self.fluent.implemented().iter().cloned());
        }
        let return_type = if terminal.modifier == Modifier::ZeroOrMore {
            iface.clone()
        } else {
            next.to_string()
        };

        let Some(entry) = self.catalog.entry(&key) else {
            return Err(GrammarError::InconsistentTree {
                detail: format!("resolved method '{}' vanished from the catalog", key),
            }
            .into());
        };
        let mut w = TsWriter::new();
        w.open(&format!(
            "export interface {}{}",
            iface,
            self.extends_clause(&parents)
        ));
        w.line(&emit::interface_method(&self.catalog, entry, &return_type));
        w.close();
        out.push_str(&w.finish());
        Ok(iface)
    }

    /// The optional section can be entered or skipped: one new interface
    /// extending both the inner chain head and the continuation.
    fn build_optional(&mut self, tree: &Tree, next: &str, out: &mut String) -> Result<String, Error> {
        let iface = self.names.allocate(tree.name.as_deref())?;
        let inner = self.build_list(&tree.children, next, out)?;
        let mut parents: BTreeSet<String> = BTreeSet::new();
        parents.insert(next.to_string());
        parents.insert(inner);
        parents.extend(self.fluent.implemented().iter().cloned());
        out.push_str(&format!(
            "export interface {}{} {{}}\n",
            iface,
            self.extends_clause(&parents)
        ));
        Ok(iface)
    }

    /// Like optional, but the inner chain's tail loops back to the
    /// section's own interface so the whole group can repeat.
    fn build_zero_or_more(
        &mut self,
        tree: &Tree,
        next: &str,
        out: &mut String,
    ) -> Result<String, Error> {
        let iface = self.names.allocate(tree.name.as_deref())?;
        let inner = self.build_list(&tree.children, &iface, out)?;
        let mut parents: BTreeSet<String> = BTreeSet::new();
        parents.insert(next.to_string());
        parents.insert(inner);
        parents.extend(self.fluent.implemented().iter().cloned());
        out.push_str(&format!(
            "export interface {}{} {{}}\n",
            iface,
            self.extends_clause(&parents)
        ));
        Ok(iface)
    }

    /// Each alternative compiles against the same continuation; one
    /// umbrella interface extends the union of the alternatives.
    fn build_one_of(&mut self, tree: &Tree, next: &str, out: &mut String) -> Result<String, Error> {
        if tree.children.is_empty() {
            return Err(GrammarError::EmptyAlternation.into());
        }
        let mut parents = BTreeSet::new();
        for child in &tree.children {
            parents.insert(self.build_node(child, next, out)?);
        }
        let iface = self.names.allocate(tree.name.as_deref())?;
        parents.extend(self.fluent.implemented().iter().cloned());
        out.push_str(&format!(
            "export interface {}{} {{}}\n",
            iface,
            self.extends_clause(&parents)
        ));
        Ok(iface)
    }

    /// A flat choice among sibling calls: one interface declaring one
    /// operation per alternative, each returning the continuation.
    fn build_one_terminal_of(
        &mut self,
        tree: &Tree,
        next: &str,
        out: &mut String,
    ) -> Result<String, Error> {
        if tree.children.is_empty() {
            return Err(GrammarError::EmptyAlternation.into());
        }
        let iface = self.names.allocate(tree.name.as_deref())?;
        let mut w = TsWriter::new();
        w.open(&format!("export interface {}", iface));
        for child in &tree.children {
            let Node::Terminal(terminal) = child else {
                return Err(GrammarError::NonTerminalAlternative {
                    node: child.to_string(),
                }
                .into());
            };
            let key = self.catalog.resolve(&terminal.method)?;
            let Some(entry) = self.catalog.entry(&key) else {
                return Err(GrammarError::InconsistentTree {
                    detail: format!("resolved method '{}' vanished from the catalog", key),
                }
                .into());
            };
            w.line(&emit::interface_method(&self.catalog, entry, next));
        }
        w.close();
        out.push_str(&w.finish());
        Ok(iface)
    }

    fn extends_clause(&self, parents: &BTreeSet<String>) -> String {
        let mut set = parents.clone();
        if self.catalog.needs_wrapper_interface() {
            set.insert(WRAPPER_INTERFACE.to_string());
        }
        if set.is_empty() {
            String::new()
        } else {
            format!(
                " extends {}",
                set.iter().cloned().collect::<Vec<_>>().join(", ")
            )
        }
    }

    // ── wrapper assembly ─────────────────────────────────────────────

    fn write_start(&self, w: &mut TsWriter, entry: &str) {
        let start = self.fluent.start_method().unwrap_or("start");
        let entry_type = match self.fluent.last_type() {
            Some(alias) => {
                w.line(&format!("export interface {} extends {} {{}}", alias, entry));
                alias
            }
            None => entry,
        };
        w.open(&format!("export function {}(): {}", start, entry_type));
        w.line(&format!("return new {}();", WRAPPER_CLASS));
        w.close();
    }

    fn write_wrapper_interface(&self, w: &mut TsWriter) {
        if self.catalog.needs_wrapper_interface() {
            w.line(&format!("export interface {} {{}}", WRAPPER_INTERFACE));
        }
    }

    fn write_wrapper_class(&self, w: &mut TsWriter) {
        let mut implements = self.names.all_names().clone();
        if let Some(alias) = self.fluent.last_type() {
            implements.insert(alias.to_string());
        }
        for name in self.fluent.implemented() {
            implements.insert(name.clone());
        }
        if self.catalog.needs_wrapper_interface() {
            implements.insert(WRAPPER_INTERFACE.to_string());
        }
        let subject = self.catalog.subject_display().to_string();
        w.open(&format!(
            "export class {} implements {}",
            WRAPPER_CLASS,
            implements.iter().cloned().collect::<Vec<_>>().join(", ")
        ));
        w.line(&format!("that: {};", subject));
        w.open(&format!("constructor(that?: {})", subject));
        w.line(&format!("this.that = that ?? new {}();", subject));
        w.close();
        for key in self.catalog.referenced_signatures() {
            if Some(key.as_str()) == self.fluent.cloner_method() {
                continue;
            }
            if let Some(entry) = self.catalog.entry(&key) {
                self.write_wrapper_method(w, entry);
            }
        }
        w.close();
    }

    fn write_wrapper_method(&self, w: &mut TsWriter, entry: &MethodEntry) {
        let call = emit::forwarding_call(&self.catalog, entry);
        // Chain-terminal and excluded operations forward with their real
        // return type; everything else chains.
        if entry.chain_terminal || !entry.included {
            let return_type = entry.display_return.clone();
            w.open(&emit::wrapper_method(&self.catalog, entry, &return_type));
            if return_type == "void" {
                w.line(&format!("this.that.{};", call));
            } else {
                w.line(&format!("return this.that.{};", call));
            }
            w.close();
            return;
        }
        w.open(&emit::wrapper_method(&self.catalog, entry, WRAPPER_CLASS));
        match self.cloner_entry() {
            Some(cloner) => {
                w.line(&format!(
                    "const next = new {}(this.that.{}());",
                    WRAPPER_CLASS, cloner.spec.name
                ));
                w.line(&format!("next.that.{};", call));
                w.line("return next;");
            }
            None => {
                w.line(&format!("this.that.{};", call));
                w.line("return this;");
            }
        }
        w.close();
    }

    fn cloner_entry(&self) -> Option<&MethodEntry> {
        self.fluent
            .cloner_method()
            .and_then(|key| self.catalog.entry(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MethodSpec, SubjectSpec};

    fn subject() -> SubjectSpec {
        SubjectSpec {
            name: "Order".to_string(),
            methods: vec![
                MethodSpec {
                    name: "a".to_string(),
                    params: vec![],
                    returns: "Order".to_string(),
                },
                MethodSpec {
                    name: "b".to_string(),
                    params: vec![],
                    returns: "Order".to_string(),
                },
                MethodSpec {
                    name: "c".to_string(),
                    params: vec![],
                    returns: "Order".to_string(),
                },
            ],
        }
    }

    fn builder() -> FluentBuilder {
        FluentBuilder::new(&subject()).unwrap()
    }

    #[test]
    fn test_two_terminal_chain_full_output() {
        let generated = builder()
            .one("a")
            .unwrap()
            .one("b")
            .unwrap()
            .generate()
            .unwrap();
        let expected = concat!(
            "export function start(): Ukeg {\n",
            "    return new Wrapper();\n",
            "}\n",
            "export class Wrapper implements Anuf, Ukeg {\n",
            "    that: Order;\n",
            "    constructor(that?: Order) {\n",
            "        this.that = that ?? new Order();\n",
            "    }\n",
            "    a(): Wrapper {\n",
            "        this.that.a();\n",
            "        return this;\n",
            "    }\n",
            "    b(): Order {\n",
            "        return this.that.b();\n",
            "    }\n",
            "}\n",
            "export interface Anuf {\n",
            "    b(): Order;\n",
            "}\n",
            "export interface Ukeg {\n",
            "    a(): Anuf;\n",
            "}\n",
        );
        assert_eq!(generated, expected);
    }

    #[test]
    fn test_empty_grammar_fails() {
        let err = builder().generate().unwrap_err();
        assert_eq!(err, Error::Grammar(GrammarError::EmptyGrammar));
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let b = builder()
            .optional("a")
            .unwrap()
            .zero_or_more("b")
            .unwrap()
            .one("c")
            .unwrap();
        assert_eq!(b.generate().unwrap(), b.generate().unwrap());
    }

    #[test]
    fn test_optional_terminal_extends_continuation() {
        let generated = builder()
            .optional("a")
            .unwrap()
            .one("b")
            .unwrap()
            .generate()
            .unwrap();
        // b compiles first (Anuf), then the optional a (Ukeg) which can
        // be skipped by going to Anuf directly.
        assert!(generated.contains("export interface Ukeg extends Anuf {\n    a(): Anuf;\n}\n"));
        assert!(generated.contains("export function start(): Ukeg {"));
    }

    #[test]
    fn test_zero_or_more_terminal_loops_on_itself() {
        let generated = builder()
            .zero_or_more("a")
            .unwrap()
            .one("b")
            .unwrap()
            .generate()
            .unwrap();
        assert!(generated.contains("export interface Ukeg extends Anuf {\n    a(): Ukeg;\n}\n"));
    }

    #[test]
    fn test_optional_group_extends_both_paths() {
        let b = builder();
        let group = b.sub().one("a").unwrap();
        let generated = b
            .optional_sub(group)
            .unwrap()
            .one("b")
            .unwrap()
            .generate()
            .unwrap();
        // Anuf: b alone. Ukeg: the composite. Ohug: a-then-b.
        assert!(generated.contains("export interface Ohug {\n    a(): Anuf;\n}\n"));
        assert!(generated.contains("export interface Ukeg extends Anuf, Ohug {}\n"));
        assert!(generated.contains("export function start(): Ukeg {"));
    }

    #[test]
    fn test_zero_or_more_group_loops_back() {
        let b = builder();
        let group = b.sub().one("a").unwrap().one("b").unwrap();
        let generated = b
            .zero_or_more_sub(group)
            .unwrap()
            .one("c")
            .unwrap()
            .generate()
            .unwrap();
        // Anuf: c. Ukeg: the repeating group. Ohug: b looping back to
        // Ukeg. Efeh: a leading into Ohug.
        assert!(generated.contains("export interface Ohug {\n    b(): Ukeg;\n}\n"));
        assert!(generated.contains("export interface Efeh {\n    a(): Ohug;\n}\n"));
        assert!(generated.contains("export interface Ukeg extends Anuf, Efeh {}\n"));
    }

    #[test]
    fn test_one_terminal_of_declares_all_alternatives() {
        let generated = builder()
            .one_of(&["a", "b"])
            .unwrap()
            .one("c")
            .unwrap()
            .generate()
            .unwrap();
        assert!(generated
            .contains("export interface Ukeg {\n    a(): Anuf;\n    b(): Anuf;\n}\n"));
    }

    #[test]
    fn test_one_of_builds_umbrella_interface() {
        let b = builder();
        let generated = b
            .clone()
            .one_of_subs(vec![b.sub().one("a").unwrap(), b.sub().one("b").unwrap()])
            .unwrap()
            .one("c")
            .unwrap()
            .generate()
            .unwrap();
        // Anuf: c. Ukeg: a branch. Ohug: b branch. Efeh: umbrella.
        assert!(generated.contains("export interface Ukeg {\n    a(): Anuf;\n}\n"));
        assert!(generated.contains("export interface Ohug {\n    b(): Anuf;\n}\n"));
        assert!(generated.contains("export interface Efeh extends Ohug, Ukeg {}\n"));
        assert!(generated.contains("export function start(): Efeh {"));
    }

    #[test]
    fn test_author_name_pre_empts_synthetic() {
        let generated = builder()
            .one("a")
            .unwrap()
            .name("Finish")
            .one("b")
            .unwrap()
            .generate()
            .unwrap();
        assert!(generated.contains("export interface Finish {\n    b(): Order;\n}\n"));
        assert!(generated.contains("a(): Finish;"));
    }

    #[test]
    fn test_duplicate_author_name_fails() {
        let err = builder()
            .name("Same")
            .one("a")
            .unwrap()
            .name("Same")
            .one("b")
            .unwrap()
            .generate()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration(crate::error::ConfigurationError::DuplicateInterfaceName { .. })
        ));
    }

    #[test]
    fn test_start_method_and_fluent_type() {
        let generated = builder()
            .start("begin")
            .fluent_type("OrderApi")
            .one("a")
            .unwrap()
            .one("b")
            .unwrap()
            .generate()
            .unwrap();
        assert!(generated.contains("export interface OrderApi extends Ukeg {}\n"));
        assert!(generated.contains("export function begin(): OrderApi {"));
        assert!(generated.contains("export class Wrapper implements Anuf, OrderApi, Ukeg {"));
    }

    #[test]
    fn test_cloner_switches_to_persistent_chains() {
        let spec = SubjectSpec {
            name: "Order".to_string(),
            methods: vec![
                MethodSpec {
                    name: "a".to_string(),
                    params: vec![],
                    returns: "Order".to_string(),
                },
                MethodSpec {
                    name: "b".to_string(),
                    params: vec![],
                    returns: "number".to_string(),
                },
                MethodSpec {
                    name: "copy".to_string(),
                    params: vec![],
                    returns: "Order".to_string(),
                },
            ],
        };
        let generated = FluentBuilder::new(&spec)
            .unwrap()
            .cloner("copy")
            .unwrap()
            .one("a")
            .unwrap()
            .one("b")
            .unwrap()
            .generate()
            .unwrap();
        assert!(generated.contains("const next = new Wrapper(this.that.copy());"));
        assert!(generated.contains("next.that.a();"));
        assert!(generated.contains("return next;"));
        // The cloner itself is not a wrapper method.
        assert!(!generated.contains("copy(): Wrapper"));
        // The chain-terminal call still forwards directly.
        assert!(generated.contains("return this.that.b();"));
    }

    #[test]
    fn test_subject_parameter_uses_wrapper_interface() {
        let spec = SubjectSpec {
            name: "Order".to_string(),
            methods: vec![
                MethodSpec {
                    name: "merge".to_string(),
                    params: vec!["Order".to_string()],
                    returns: "Order".to_string(),
                },
                MethodSpec {
                    name: "b".to_string(),
                    params: vec![],
                    returns: "Order".to_string(),
                },
            ],
        };
        let generated = FluentBuilder::new(&spec)
            .unwrap()
            .one("merge")
            .unwrap()
            .one("b")
            .unwrap()
            .generate()
            .unwrap();
        assert!(generated.contains("export interface WrapperInterface {}\n"));
        assert!(generated
            .contains("export interface Ukeg extends WrapperInterface {\n    merge(arg1: WrapperInterface): Anuf;\n}\n"));
        assert!(generated.contains("merge(arg1: WrapperInterface): Wrapper {"));
        assert!(generated.contains("this.that.merge((arg1 as Wrapper).that);"));
        assert!(generated.contains("implements Anuf, Ukeg, WrapperInterface {"));
    }

    #[test]
    fn test_excluded_method_forwards_without_chaining() {
        let spec = SubjectSpec {
            name: "Order".to_string(),
            methods: vec![
                MethodSpec {
                    name: "a".to_string(),
                    params: vec![],
                    returns: "Order".to_string(),
                },
                MethodSpec {
                    name: "b".to_string(),
                    params: vec![],
                    returns: "Order".to_string(),
                },
                MethodSpec {
                    name: "log".to_string(),
                    params: vec!["string".to_string()],
                    returns: "void".to_string(),
                },
            ],
        };
        let generated = FluentBuilder::new(&spec)
            .unwrap()
            .exclude("log")
            .unwrap()
            .include("log")
            .unwrap()
            .exclude("log")
            .unwrap()
            .one("a")
            .unwrap()
            .one("b")
            .unwrap()
            .generate()
            .unwrap();
        // Referenced via include(), excluded from chaining: forwards with
        // its real (void) return type.
        assert!(generated.contains("log(arg1: string): void {\n        this.that.log(arg1);\n    }\n"));
    }

    #[test]
    fn test_implement_adds_extra_parent() {
        let generated = builder()
            .implement("AutoCloseable")
            .optional("a")
            .unwrap()
            .one("b")
            .unwrap()
            .generate()
            .unwrap();
        assert!(generated.contains("export interface Ukeg extends Anuf, AutoCloseable {"));
        assert!(generated.contains("export class Wrapper implements Anuf, AutoCloseable, Ukeg {"));
    }
}
