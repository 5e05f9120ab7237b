//! Exit-type resolution.
//!
//! The calls inside a fluent chain all return the chain handle; only the
//! call(s) that can legally come last return the composed result the
//! chain was built for. This pass walks the tail of the grammar tree
//! once, before compilation, determines that result type, and flags
//! every terminal that can be last as chain-terminal in the catalog.
//!
//! Alternation tails must agree: when several calls can be last, they
//! must all declare the identical return type. A repeating or optional
//! node can never be last, because its repetition makes the exit
//! ambiguous.

use std::collections::BTreeSet;

use crate::catalog::MethodCatalog;
use crate::error::{Error, ExitTypeError, GrammarError};
use crate::tree::{Modifier, Node, Terminal, Tree};

/// Resolve the exit type of the last reachable call(s) under `last`,
/// marking them chain-terminal in the catalog. Returns the raw declared
/// return type; callers normalize it for display.
pub fn resolve(catalog: &mut MethodCatalog, last: &Node) -> Result<String, Error> {
    match last {
        Node::Terminal(t) => terminal_exit(catalog, t),
        Node::Tree(t) => tree_exit(catalog, t),
    }
}

fn terminal_exit(catalog: &mut MethodCatalog, last: &Terminal) -> Result<String, Error> {
    match last.modifier {
        Modifier::Once => {
            let key = catalog.mark_chain_terminal(&last.method)?;
            let Some(entry) = catalog.entry(&key) else {
                return Err(GrammarError::InconsistentTree {
                    detail: format!("resolved method '{}' vanished from the catalog", key),
                }
                .into());
            };
            Ok(entry.spec.returns.clone())
        }
        Modifier::Optional => Err(ExitTypeError::OptionalLast {
            node: last.method.clone(),
        }
        .into()),
        Modifier::ZeroOrMore => Err(ExitTypeError::RepeatingLast {
            node: last.method.clone(),
        }
        .into()),
        Modifier::OneOf | Modifier::OneTerminalOf => Err(GrammarError::InconsistentTree {
            detail: format!("terminal '{}' carries an alternation modifier", last.method),
        }
        .into()),
    }
}

fn tree_exit(catalog: &mut MethodCatalog, last: &Tree) -> Result<String, Error> {
    let rendered = || Node::Tree(last.clone()).to_string();
    match last.modifier {
        Modifier::Once => match last.children.last() {
            Some(child) => resolve(catalog, child),
            None => Err(ExitTypeError::NoExitType.into()),
        },
        Modifier::OneOf | Modifier::OneTerminalOf => {
            let mut types = BTreeSet::new();
            for child in &last.children {
                types.insert(resolve(catalog, child)?);
            }
            match types.len() {
                0 => Err(ExitTypeError::NoExitType.into()),
                1 => Ok(types
                    .into_iter()
                    .next()
                    .unwrap_or_default()),
                _ => Err(ExitTypeError::DisagreeingExitTypes {
                    types: types.into_iter().collect(),
                }
                .into()),
            }
        }
        Modifier::Optional => Err(ExitTypeError::OptionalLast { node: rendered() }.into()),
        Modifier::ZeroOrMore => Err(ExitTypeError::RepeatingLast { node: rendered() }.into()),
    }
}
