//! typeweave-core: fluent grammar compiler core library.
//!
//! Compiles a declarative grammar describing the legal call order of a
//! fluent API into TypeScript source text: a minimal set of capability
//! interfaces plus one `Wrapper` class that routes every permitted call
//! through the underlying subject instance. A caller chaining through
//! the wrapper can only reach, via the host type checker, the calls the
//! grammar currently permits.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`FluentBuilder`] -- the grammar construction API
//! - [`SubjectSpec`] / [`MethodSpec`] -- subject type descriptors
//! - [`MethodCatalog`] -- the indexed, overload-aware member catalog
//! - [`compile()`] -- run one compilation over a finished builder
//! - [`Error`] -- the error taxonomy
//!
//! Compilation is pure, synchronous, single-threaded computation over a
//! finite tree; nothing is cached or shared between runs.

pub mod builder;
pub mod catalog;
pub mod compile;
pub mod emit;
pub mod error;
pub mod exit;
pub mod names;
pub mod tree;

pub use builder::FluentBuilder;
pub use catalog::{MethodCatalog, MethodEntry, MethodSpec, SubjectSpec};
pub use compile::compile;
pub use error::{ConfigurationError, Error, ExitTypeError, GrammarError, ResolutionError};
pub use names::NameAllocator;
pub use tree::{Modifier, Node, Terminal, Tree};
